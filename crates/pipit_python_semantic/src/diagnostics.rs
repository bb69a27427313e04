//! Diagnostic rules and settings (spec §6, "Diagnostic rules (enumerated)").

use pipit_db::TextRange;

pub use pipit_db::Severity;

/// One entry per spec §6's enumerated rule set. Each has a configurable
/// [`Severity`] (spec calls it a level: `none|warning|error`); `None` means
/// "do not report, but still run the check if it has a side effect" (spec
/// §7, "User-visible behavior").
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum DiagnosticRule {
    ReportUntypedBaseClass,
    ReportUntypedClassDecorator,
    ReportUntypedFunctionDecorator,
    ReportUnknownParameterType,
    ReportUnknownLambdaType,
    ReportUnknownVariableType,
    ReportUnknownMemberType,
    ReportUnusedClass,
    ReportUnusedFunction,
    ReportUnusedVariable,
    ReportUnusedImport,
    ReportPrivateUsage,
    ReportConstantRedefinition,
    ReportIncompatibleMethodOverride,
    ReportUnnecessaryIsInstance,
    ReportCallInDefaultInitializer,
    ReportOptionalContextManager,
}

impl DiagnosticRule {
    pub fn name(self) -> &'static str {
        match self {
            DiagnosticRule::ReportUntypedBaseClass => "reportUntypedBaseClass",
            DiagnosticRule::ReportUntypedClassDecorator => "reportUntypedClassDecorator",
            DiagnosticRule::ReportUntypedFunctionDecorator => "reportUntypedFunctionDecorator",
            DiagnosticRule::ReportUnknownParameterType => "reportUnknownParameterType",
            DiagnosticRule::ReportUnknownLambdaType => "reportUnknownLambdaType",
            DiagnosticRule::ReportUnknownVariableType => "reportUnknownVariableType",
            DiagnosticRule::ReportUnknownMemberType => "reportUnknownMemberType",
            DiagnosticRule::ReportUnusedClass => "reportUnusedClass",
            DiagnosticRule::ReportUnusedFunction => "reportUnusedFunction",
            DiagnosticRule::ReportUnusedVariable => "reportUnusedVariable",
            DiagnosticRule::ReportUnusedImport => "reportUnusedImport",
            DiagnosticRule::ReportPrivateUsage => "reportPrivateUsage",
            DiagnosticRule::ReportConstantRedefinition => "reportConstantRedefinition",
            DiagnosticRule::ReportIncompatibleMethodOverride => "reportIncompatibleMethodOverride",
            DiagnosticRule::ReportUnnecessaryIsInstance => "reportUnnecessaryIsInstance",
            DiagnosticRule::ReportCallInDefaultInitializer => "reportCallInDefaultInitializer",
            DiagnosticRule::ReportOptionalContextManager => "reportOptionalContextManager",
        }
    }

    /// The inverse of [`Self::name`], for a host loading rule overrides by
    /// name out of a config file.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "reportUntypedBaseClass" => DiagnosticRule::ReportUntypedBaseClass,
            "reportUntypedClassDecorator" => DiagnosticRule::ReportUntypedClassDecorator,
            "reportUntypedFunctionDecorator" => DiagnosticRule::ReportUntypedFunctionDecorator,
            "reportUnknownParameterType" => DiagnosticRule::ReportUnknownParameterType,
            "reportUnknownLambdaType" => DiagnosticRule::ReportUnknownLambdaType,
            "reportUnknownVariableType" => DiagnosticRule::ReportUnknownVariableType,
            "reportUnknownMemberType" => DiagnosticRule::ReportUnknownMemberType,
            "reportUnusedClass" => DiagnosticRule::ReportUnusedClass,
            "reportUnusedFunction" => DiagnosticRule::ReportUnusedFunction,
            "reportUnusedVariable" => DiagnosticRule::ReportUnusedVariable,
            "reportUnusedImport" => DiagnosticRule::ReportUnusedImport,
            "reportPrivateUsage" => DiagnosticRule::ReportPrivateUsage,
            "reportConstantRedefinition" => DiagnosticRule::ReportConstantRedefinition,
            "reportIncompatibleMethodOverride" => DiagnosticRule::ReportIncompatibleMethodOverride,
            "reportUnnecessaryIsInstance" => DiagnosticRule::ReportUnnecessaryIsInstance,
            "reportCallInDefaultInitializer" => DiagnosticRule::ReportCallInDefaultInitializer,
            "reportOptionalContextManager" => DiagnosticRule::ReportOptionalContextManager,
            _ => return None,
        })
    }
}

/// Per-rule level configuration (spec §6); a host loads this from TOML
/// (see the CLI's `Configuration`) and passes it down as part of `FileInfo`.
#[derive(Clone, Debug)]
pub struct DiagnosticSettings {
    levels: rustc_hash::FxHashMap<DiagnosticRule, Severity>,
}

impl Default for DiagnosticSettings {
    fn default() -> Self {
        use DiagnosticRule::{
            ReportCallInDefaultInitializer, ReportConstantRedefinition,
            ReportIncompatibleMethodOverride, ReportOptionalContextManager, ReportPrivateUsage,
            ReportUnknownLambdaType, ReportUnknownMemberType, ReportUnknownParameterType,
            ReportUnknownVariableType, ReportUnnecessaryIsInstance, ReportUntypedBaseClass,
            ReportUntypedClassDecorator, ReportUntypedFunctionDecorator, ReportUnusedClass,
            ReportUnusedFunction, ReportUnusedImport, ReportUnusedVariable,
        };
        let mut levels = rustc_hash::FxHashMap::default();
        for rule in [
            ReportUntypedBaseClass,
            ReportUntypedClassDecorator,
            ReportUntypedFunctionDecorator,
            ReportUnknownParameterType,
            ReportUnknownLambdaType,
            ReportUnknownVariableType,
            ReportUnknownMemberType,
            ReportCallInDefaultInitializer,
            ReportOptionalContextManager,
        ] {
            levels.insert(rule, Severity::Warning);
        }
        for rule in [
            ReportUnusedClass,
            ReportUnusedFunction,
            ReportUnusedVariable,
            ReportUnusedImport,
            ReportPrivateUsage,
        ] {
            levels.insert(rule, Severity::Unused);
        }
        for rule in [
            ReportConstantRedefinition,
            ReportIncompatibleMethodOverride,
            ReportUnnecessaryIsInstance,
        ] {
            levels.insert(rule, Severity::Error);
        }
        Self { levels }
    }
}

impl DiagnosticSettings {
    pub fn level(&self, rule: DiagnosticRule) -> Severity {
        self.levels.get(&rule).copied().unwrap_or(Severity::Error)
    }

    pub fn set_level(&mut self, rule: DiagnosticRule, severity: Severity) {
        self.levels.insert(rule, severity);
    }
}

/// A diagnostic keyed to an optional rule, ready to hand to a
/// [`pipit_db::DiagnosticSink`]; `range` is always populated since every
/// diagnostic here originates from a syntax node.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub range: TextRange,
    pub rule: Option<DiagnosticRule>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>, range: TextRange) -> Self {
        Self {
            severity,
            message: message.into(),
            range,
            rule: None,
        }
    }

    #[must_use]
    pub fn with_rule(mut self, rule: DiagnosticRule) -> Self {
        self.rule = rule.into();
        self
    }

    pub fn into_db_diagnostic(self) -> pipit_db::Diagnostic {
        let mut diagnostic = pipit_db::Diagnostic::new(self.severity, self.message, self.range);
        if let Some(rule) = self.rule {
            diagnostic = diagnostic.with_rule(rule.name());
        }
        diagnostic
    }
}
