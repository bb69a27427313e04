//! Project configuration: a `pipit.toml` file overriding diagnostic rule
//! severities, loaded with `toml`/`serde` the way the teacher's own project
//! configuration is loaded, just reduced to the one thing this checker core
//! actually consults -- rule levels (spec §6).

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use camino::Utf8Path;
use pipit_db::Severity;
use pipit_python_semantic::diagnostics::{DiagnosticRule, DiagnosticSettings};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    rules: BTreeMap<String, String>,
    #[serde(default)]
    exclude: Vec<String>,
}

#[derive(Debug, Default, Clone)]
pub struct Config {
    pub settings: DiagnosticSettingsHandle,
    pub exclude: Vec<String>,
}

/// A cheaply-cloneable wrapper: [`DiagnosticSettings`] itself isn't `Clone`
/// in a way we want to expose past load time, so the CLI treats it as
/// shared, immutable state for the duration of one run.
#[derive(Debug, Default, Clone)]
pub struct DiagnosticSettingsHandle(std::sync::Arc<DiagnosticSettings>);

impl DiagnosticSettingsHandle {
    pub fn get(&self) -> &DiagnosticSettings {
        &self.0
    }
}

impl Config {
    pub fn load(path: Option<&Utf8Path>) -> Result<Self> {
        let default_path = Utf8Path::new("pipit.toml");
        let path = path.unwrap_or(default_path);

        let Ok(text) = std::fs::read_to_string(path) else {
            return Ok(Self::default());
        };

        let raw: RawConfig =
            toml::from_str(&text).with_context(|| format!("failed to parse {path}"))?;

        let mut settings = DiagnosticSettings::default();
        for (name, level) in &raw.rules {
            let Some(rule) = DiagnosticRule::from_name(name) else {
                tracing::warn!(rule = %name, "unknown diagnostic rule in config, ignoring");
                continue;
            };
            let Some(severity) = parse_severity(level) else {
                tracing::warn!(rule = %name, level = %level, "unknown severity level, ignoring");
                continue;
            };
            settings.set_level(rule, severity);
        }

        Ok(Self {
            settings: DiagnosticSettingsHandle(std::sync::Arc::new(settings)),
            exclude: raw.exclude,
        })
    }
}

fn parse_severity(level: &str) -> Option<Severity> {
    match level {
        "error" => Some(Severity::Error),
        "warning" => Some(Severity::Warning),
        "unused" => Some(Severity::Unused),
        "info" => Some(Severity::Info),
        _ => None,
    }
}
