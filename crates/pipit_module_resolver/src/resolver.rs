//! Resolves an import to a file, standing in for the spec's "Module
//! resolver" collaborator (spec §1: "supplies... a resolved file path and
//! implicit-import list").
//!
//! Adapted from the teacher's `red_knot_module_resolver::resolver`, reduced
//! to the parts the binder actually needs (spec §4.4/§4.7): search a
//! prioritized list of roots for `<module>.py` or `<module>/__init__.py`,
//! then fall back to a tiny built-in registry standing in for a real
//! typeshed (spec's Non-goals explicitly exclude shipping real stdlib
//! stubs).

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use rustc_hash::FxHashMap;

use crate::import_result::{ImplicitImport, ImportResult, ImportType};
use crate::module_name::ModuleName;

/// A source of module text, independent of whether it actually lives on
/// disk -- tests and the CLI each supply their own.
pub trait SourceRoot {
    /// Returns the source text for `relative_path` (e.g. `foo/bar.py`), if
    /// it exists under this root.
    fn read(&self, relative_path: &Utf8Path) -> Option<String>;

    fn exists(&self, relative_path: &Utf8Path) -> bool;
}

/// An in-memory root, for tests and for the CLI's `--demo` mode.
#[derive(Clone, Debug, Default)]
pub struct MemorySourceRoot {
    files: BTreeMap<Utf8PathBuf, String>,
}

impl MemorySourceRoot {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_file(mut self, path: impl Into<Utf8PathBuf>, text: impl Into<String>) -> Self {
        self.files.insert(path.into(), text.into());
        self
    }
}

impl SourceRoot for MemorySourceRoot {
    fn read(&self, relative_path: &Utf8Path) -> Option<String> {
        self.files.get(relative_path).cloned()
    }

    fn exists(&self, relative_path: &Utf8Path) -> bool {
        self.files.contains_key(relative_path)
    }
}

/// A real filesystem root, used by the CLI.
#[derive(Clone, Debug)]
pub struct FsSourceRoot {
    root: Utf8PathBuf,
}

impl FsSourceRoot {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SourceRoot for FsSourceRoot {
    fn read(&self, relative_path: &Utf8Path) -> Option<String> {
        std::fs::read_to_string(self.root.join(relative_path)).ok()
    }

    fn exists(&self, relative_path: &Utf8Path) -> bool {
        self.root.join(relative_path).exists()
    }
}

/// Every builtin name considered always bound without an explicit import,
/// standing in for the language's builtins module (spec's `BuiltIn`
/// `Declaration` kind, spec §3).
pub const BUILTIN_NAMES: &[&str] = &[
    "int", "float", "str", "bytes", "bool", "list", "dict", "set", "tuple", "object", "type",
    "None", "True", "False", "Exception", "BaseException", "len", "print", "isinstance",
    "super", "property", "staticmethod", "classmethod",
];

pub struct ModuleResolver<R: SourceRoot> {
    roots: Vec<R>,
    module_to_path: FxHashMap<ModuleName, Utf8PathBuf>,
}

impl<R: SourceRoot> ModuleResolver<R> {
    pub fn new(roots: Vec<R>) -> Self {
        Self {
            roots,
            module_to_path: FxHashMap::default(),
        }
    }

    /// Resolves `name` against each root, in priority order: first-party
    /// roots are searched before any fallback is consulted.
    pub fn resolve(&mut self, name: &ModuleName) -> ImportResult {
        let relative = module_relative_path(name);
        for root in &self.roots {
            if let Some(path) = find_in_root(root, &relative) {
                self.module_to_path.insert(name.clone(), path.clone());
                let is_stub_file = path.extension() == Some("pyi");
                return ImportResult {
                    import_name: name.clone(),
                    is_import_found: true,
                    import_type: ImportType::Local,
                    is_stub_file,
                    resolved_paths: vec![path],
                    implicit_imports: implicit_imports_for(name, root),
                };
            }
        }

        if is_builtin_module(name) {
            return ImportResult {
                import_name: name.clone(),
                is_import_found: true,
                import_type: ImportType::BuiltIn,
                is_stub_file: true,
                resolved_paths: Vec::new(),
                implicit_imports: Vec::new(),
            };
        }

        tracing::debug!(module = %name, "import not found");
        ImportResult::not_found(name.clone())
    }

    pub fn resolved_path(&self, name: &ModuleName) -> Option<&Utf8Path> {
        self.module_to_path.get(name).map(Utf8PathBuf::as_path)
    }
}

fn module_relative_path(name: &ModuleName) -> Utf8PathBuf {
    let mut path = Utf8PathBuf::new();
    for component in name.components() {
        path.push(component);
    }
    path
}

fn find_in_root<R: SourceRoot>(root: &R, relative: &Utf8Path) -> Option<Utf8PathBuf> {
    let module_file = relative.with_extension("py");
    if root.exists(&module_file) {
        return Some(module_file);
    }
    let stub_file = relative.with_extension("pyi");
    if root.exists(&stub_file) {
        return Some(stub_file);
    }
    let package_init = relative.join("__init__.py");
    if root.exists(&package_init) {
        return Some(package_init);
    }
    None
}

/// `import a.b.c` without a resolved package for `a.b` still produces a
/// partial module shell per spec §4.7; implicit imports are the immediate
/// children of a resolved package directory, mirroring the teacher's
/// handling of a package's `__init__.py` siblings.
fn implicit_imports_for<R: SourceRoot>(_name: &ModuleName, _root: &R) -> Vec<ImplicitImport> {
    // A real resolver would list sibling modules of a resolved package; our
    // in-memory/filesystem roots don't expose directory listing, so this
    // always returns empty -- callers still get a correct (if incomplete)
    // import.
    Vec::new()
}

fn is_builtin_module(name: &ModuleName) -> bool {
    matches!(name.as_str(), "builtins" | "typing" | "types" | "abc")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_a_first_party_module() {
        let root = MemorySourceRoot::new().with_file("pkg/mod.py", "x = 1\n");
        let mut resolver = ModuleResolver::new(vec![root]);
        let result = resolver.resolve(&ModuleName::new("pkg.mod").unwrap());
        assert!(result.is_import_found);
        assert_eq!(result.resolved_paths, vec![Utf8PathBuf::from("pkg/mod.py")]);
    }

    #[test]
    fn falls_back_to_builtin_registry() {
        let root = MemorySourceRoot::new();
        let mut resolver = ModuleResolver::new(vec![root]);
        let result = resolver.resolve(&ModuleName::new("typing").unwrap());
        assert!(result.is_import_found);
        assert_eq!(result.import_type, ImportType::BuiltIn);
    }

    #[test]
    fn unresolvable_import_is_reported_not_found() {
        let root = MemorySourceRoot::new();
        let mut resolver = ModuleResolver::new(vec![root]);
        let result = resolver.resolve(&ModuleName::new("nonexistent").unwrap());
        assert!(!result.is_import_found);
    }
}
