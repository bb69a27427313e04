//! The per-file arena: every scope, symbol, declaration, flow node, and
//! cached expression type for one file lives here, addressed by index
//! rather than by pointer or incremental-query key (design notes on
//! "cyclic reference graphs" and "global mutable state").

use pipit_db::index::IndexVec;
use pipit_db::newtype_index;
use pipit_python_ast::NodeId;

use crate::declaration::Declaration;
use crate::flow::FlowNode;
use crate::scope::ScopeData;
use crate::symbol::Symbol;
use crate::types::assign::TypeContext;
use crate::types::class::{ClassData, LiteralValue};
use crate::types::function::FunctionData;
use crate::types::module::ModuleData;
use crate::types::TypeCache;

newtype_index!(pub struct ScopeId;);
newtype_index!(pub struct SymbolId;);
newtype_index!(pub struct DeclarationId;);
newtype_index!(pub struct FlowNodeId;);
newtype_index!(pub struct ClassId;);
newtype_index!(pub struct FunctionId;);
newtype_index!(pub struct ModuleId;);

/// A node's identity across analyses of the same file. Distinct files never
/// share a [`NodeKey`] even if their `NodeId` numbering coincides, since
/// each is paired with the path it came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct NodeKey {
    pub node: NodeId,
}

impl NodeKey {
    pub fn new(node: NodeId) -> Self {
        Self { node }
    }
}

/// The pass counter driving fixed-point convergence (spec §4.7,
/// "Convergence"). Every analyzer pass increments this before re-walking
/// the tree; a [`TypeCache`] entry's `write_version` is compared against it
/// to decide whether a cached type is still current.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, PartialOrd, Ord)]
pub struct AnalysisVersion(u32);

impl AnalysisVersion {
    pub const fn zero() -> Self {
        Self(0)
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// Owns every arena-indexed structure for one file's semantic analysis.
/// Per-node annotations (the `typeCache` side table) are discarded and
/// rebuilt by [`FileArena::clear_node_analysis_info`] between re-binds, per
/// the "Persisted state: none" clause.
#[derive(Debug, Default)]
pub struct FileArena {
    pub scopes: IndexVec<ScopeId, ScopeData>,
    pub symbols: IndexVec<SymbolId, Symbol>,
    pub declarations: IndexVec<DeclarationId, Declaration>,
    pub flow_nodes: IndexVec<FlowNodeId, FlowNode>,
    pub classes: IndexVec<ClassId, ClassData>,
    pub functions: IndexVec<FunctionId, FunctionData>,
    pub modules: IndexVec<ModuleId, ModuleData>,
    type_cache: rustc_hash::FxHashMap<NodeKey, TypeCache>,
    version: AnalysisVersion,
}

impl FileArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(&self) -> AnalysisVersion {
        self.version
    }

    pub fn begin_pass(&mut self) -> AnalysisVersion {
        self.version = self.version.next();
        self.version
    }

    pub fn type_cache_entry(&mut self, key: NodeKey) -> &mut TypeCache {
        self.type_cache.entry(key).or_default()
    }

    pub fn type_cache_get(&self, key: NodeKey) -> Option<&TypeCache> {
        self.type_cache.get(&key)
    }

    /// A snapshot of every node's currently cached type, used by the
    /// analyzer to detect whether a pass changed anything (spec §4.7,
    /// "Convergence").
    pub fn type_cache_snapshot(&self) -> rustc_hash::FxHashMap<NodeKey, crate::types::Type> {
        self.type_cache
            .iter()
            .filter_map(|(key, cache)| cache.ty.clone().map(|ty| (*key, ty)))
            .collect()
    }

    /// Drops every per-node annotation. Scopes, symbols, and declarations
    /// are unaffected: they are rebuilt fresh by the next binder pass, which
    /// allocates a brand new [`FileArena`] in practice, but a host that
    /// wants to keep arena capacity can call this instead.
    pub fn clear_node_analysis_info(&mut self) {
        self.type_cache.clear();
        self.version = AnalysisVersion::zero();
    }

    /// Looks up (or allocates) the unparametrized class for a builtin name,
    /// so repeated evaluator passes over the same literal/annotation share
    /// one `ClassId` instead of minting a fresh one every pass.
    pub fn builtin_class(&mut self, name: &str) -> ClassId {
        if let Some((id, _)) = self
            .classes
            .iter_enumerated()
            .find(|(_, data)| data.name == name && data.alias_class.is_none())
        {
            return id;
        }
        self.classes.push(ClassData::new(name))
    }

    /// Looks up (or allocates) the literal-valued class aliasing `base_name`
    /// (e.g. the class for the literal `1`, aliasing `int`), per the literal
    /// typing design in [`crate::types::class::ClassData`].
    pub fn literal_class(&mut self, base_name: &str, literal: LiteralValue) -> ClassId {
        let base = self.builtin_class(base_name);
        if let Some((id, _)) = self
            .classes
            .iter_enumerated()
            .find(|(_, data)| data.alias_class == Some(base) && data.literal_value.as_ref() == Some(&literal))
        {
            return id;
        }
        let mut data = ClassData::new(base_name);
        data.alias_class = Some(base);
        data.literal_value = Some(literal);
        self.classes.push(data)
    }
}

impl TypeContext for FileArena {
    fn class(&self, id: ClassId) -> Option<&ClassData> {
        self.classes.get(id)
    }

    fn function(&self, id: FunctionId) -> Option<&FunctionData> {
        self.functions.get(id)
    }
}
