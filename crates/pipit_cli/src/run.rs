//! Drives the checker over a set of paths: discover files, parse, analyze,
//! render diagnostics. One panic in one file's analysis does not take down
//! the whole run -- a per-file `catch_unwind` boundary reports it as a
//! synthetic diagnostic and moves on, the way the teacher's own project
//! driver isolates per-file failures.

use std::panic::{catch_unwind, AssertUnwindSafe};

use camino::{Utf8Path, Utf8PathBuf};
use pipit_db::{render, Diagnostic, File, Severity};
use pipit_python_semantic::analyze_file;
use pipit_python_semantic::diagnostics::DiagnosticSettings;

use crate::config::Config;

pub struct RunSummary {
    pub files_checked: usize,
    pub error_count: usize,
    pub diagnostic_count: usize,
}

pub fn run(paths: &[Utf8PathBuf], config: &Config) -> RunSummary {
    let roots: Vec<Utf8PathBuf> = if paths.is_empty() {
        vec![Utf8PathBuf::from(".")]
    } else {
        paths.to_vec()
    };

    let mut files = Vec::new();
    for root in &roots {
        collect_python_files(root, &config.exclude, &mut files);
    }
    files.sort();
    files.dedup();

    let settings = config.settings.get();

    let mut error_count = 0;
    let mut diagnostic_count = 0;

    for path in &files {
        tracing::debug!(%path, "checking file");
        match check_one_file(path, settings) {
            Ok((file, diagnostics)) => {
                for diagnostic in &diagnostics {
                    if diagnostic.severity == Severity::Error {
                        error_count += 1;
                    }
                    diagnostic_count += 1;
                    emit(&file, diagnostic);
                }
            }
            Err(message) => {
                error_count += 1;
                diagnostic_count += 1;
                tracing::error!(%path, %message, "failed to check file");
            }
        }
    }

    RunSummary {
        files_checked: files.len(),
        error_count,
        diagnostic_count,
    }
}

fn check_one_file(path: &Utf8Path, settings: &DiagnosticSettings) -> Result<(File, Vec<Diagnostic>), String> {
    let text = std::fs::read_to_string(path).map_err(|err| err.to_string())?;
    let file = File::new(path, text.clone());

    let result = catch_unwind(AssertUnwindSafe(|| analyze_one(path, &text, settings)));

    match result {
        Ok(Ok(diagnostics)) => Ok((file, diagnostics)),
        Ok(Err(message)) => Err(message),
        Err(_) => Err("internal error: analysis panicked".to_string()),
    }
}

fn analyze_one(path: &Utf8Path, text: &str, settings: &DiagnosticSettings) -> Result<Vec<Diagnostic>, String> {
    let (ast, module) = pipit_parser::parse_module(text, path).map_err(|err| err.to_string())?;
    let analyzed = analyze_file(&ast, path, module, settings);
    Ok(analyzed
        .diagnostics
        .into_iter()
        .map(pipit_python_semantic::diagnostics::Diagnostic::into_db_diagnostic)
        .collect())
}

#[allow(clippy::print_stdout)]
fn emit(file: &File, diagnostic: &Diagnostic) {
    println!("{}", render(file, diagnostic));
}

fn collect_python_files(root: &Utf8Path, exclude: &[String], out: &mut Vec<Utf8PathBuf>) {
    if is_excluded(root, exclude) {
        return;
    }
    let Ok(metadata) = std::fs::metadata(root) else {
        return;
    };
    if metadata.is_file() {
        if root.extension() == Some("py") {
            out.push(root.to_path_buf());
        }
        return;
    }
    let Ok(entries) = std::fs::read_dir(root) else {
        return;
    };
    let mut children: Vec<Utf8PathBuf> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| Utf8PathBuf::from_path_buf(entry.path()).ok())
        .collect();
    children.sort();
    for child in children {
        let name = child.file_name().unwrap_or_default();
        if name.starts_with('.') || name == "__pycache__" {
            continue;
        }
        collect_python_files(&child, exclude, out);
    }
}

fn is_excluded(path: &Utf8Path, exclude: &[String]) -> bool {
    exclude.iter().any(|pattern| path.as_str().contains(pattern.as_str()))
}
