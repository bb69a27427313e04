//! The result the resolver hands back for one import node, per spec §6's
//! `ImportResult`.

use camino::Utf8PathBuf;

use crate::module_name::ModuleName;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ImportType {
    BuiltIn,
    ThirdParty,
    Local,
}

#[derive(Clone, Debug)]
pub struct ImplicitImport {
    pub name: compact_str::CompactString,
    pub path: Utf8PathBuf,
}

/// Per spec §6: `{ isImportFound, importType, isStubFile, resolvedPaths,
/// implicitImports, importName }`.
#[derive(Clone, Debug)]
pub struct ImportResult {
    pub import_name: ModuleName,
    pub is_import_found: bool,
    pub import_type: ImportType,
    pub is_stub_file: bool,
    pub resolved_paths: Vec<Utf8PathBuf>,
    pub implicit_imports: Vec<ImplicitImport>,
}

impl ImportResult {
    pub fn not_found(import_name: ModuleName) -> Self {
        Self {
            import_name,
            is_import_found: false,
            import_type: ImportType::Local,
            is_stub_file: false,
            resolved_paths: Vec::new(),
            implicit_imports: Vec::new(),
        }
    }
}
