//! Resolves import statements to files, standing in for the external
//! "Module resolver" collaborator spec §1 describes as out of scope to
//! build in full but necessary to model at the boundary.

pub mod import_result;
pub mod module_name;
pub mod resolver;

pub use import_result::{ImplicitImport, ImportResult, ImportType};
pub use module_name::ModuleName;
pub use resolver::{FsSourceRoot, MemorySourceRoot, ModuleResolver, SourceRoot, BUILTIN_NAMES};
