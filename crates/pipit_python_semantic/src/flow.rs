//! `FlowNode` (tagged): `Start|Label{antecedents}|Assignment{target,
//! antecedent}|WildcardImport{names, antecedent}|Condition{expr,
//! antecedent, sense}|Unreachable` (spec §3).

use compact_str::CompactString;
use pipit_python_ast::NodeId;
use smallvec::SmallVec;

use crate::arena::FlowNodeId;
use crate::types::narrow::Sense;

#[derive(Clone, Debug)]
pub enum FlowNode {
    Start,
    /// A merge point; `antecedents.len() > 1` at an `if`/`try` join, exactly
    /// one at the top of a straight-line block, two at a loop header (entry
    /// plus the back edge from the loop body's tail).
    Label { antecedents: SmallVec<[FlowNodeId; 2]> },
    Assignment { target: NodeId, antecedent: FlowNodeId },
    WildcardImport { names: Vec<CompactString>, antecedent: FlowNodeId },
    Condition { expr: NodeId, antecedent: FlowNodeId, sense: Sense },
    /// Reached only through a path the binder proved unreachable (follows
    /// an unconditional raise/return/break/continue), per spec §4.4,
    /// "Tracks 'reachable from entry'".
    Unreachable,
}

impl FlowNode {
    pub fn antecedents(&self) -> SmallVec<[FlowNodeId; 2]> {
        match self {
            FlowNode::Start | FlowNode::Unreachable => SmallVec::new(),
            FlowNode::Label { antecedents } => antecedents.clone(),
            FlowNode::Assignment { antecedent, .. }
            | FlowNode::WildcardImport { antecedent, .. }
            | FlowNode::Condition { antecedent, .. } => SmallVec::from_slice(&[*antecedent]),
        }
    }
}
