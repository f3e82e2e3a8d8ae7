//! Nested, serializable view of a document tree.

use serde::Serialize;

use super::{DocTree, NodeId, NodeKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSnapshot {
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

impl NodeSnapshot {
    pub fn capture(tree: &DocTree, node: NodeId) -> Self {
        Self {
            kind: tree.kind(node).clone(),
            line: tree.line(node),
            children: tree
                .children(node)
                .iter()
                .map(|&child| Self::capture(tree, child))
                .collect(),
        }
    }
}

pub fn snapshot(tree: &DocTree) -> NodeSnapshot {
    NodeSnapshot::capture(tree, tree.root())
}
