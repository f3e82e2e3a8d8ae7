//! Open-section bookkeeping for heading reconciliation.

use std::collections::BTreeMap;

use crate::tree::NodeId;

/// Levels of currently open sections, always holding `0 -> document root`.
///
/// The open levels form the chain of sections from the root down to the
/// cursor. A heading at level `L` closes every level `>= L` and nests under
/// the deepest level left open, so jumps like h1 to h3 need no synthetic
/// intermediate sections.
#[derive(Debug, Clone)]
pub(crate) struct SectionStack {
    root: NodeId,
    open: BTreeMap<u8, NodeId>,
}

impl SectionStack {
    pub fn new(root: NodeId) -> Self {
        Self {
            root,
            open: BTreeMap::from([(0, root)]),
        }
    }

    /// Close levels `>= level` and return the section a new heading at
    /// `level` nests under.
    pub fn reconcile(&mut self, level: u8) -> NodeId {
        let level = level.max(1);
        self.open.split_off(&level);
        self.deepest()
    }

    pub fn push(&mut self, level: u8, section: NodeId) {
        self.open.insert(level.max(1), section);
    }

    pub fn deepest(&self) -> NodeId {
        self.open
            .last_key_value()
            .map_or(self.root, |(_, &node)| node)
    }

    pub fn depth(&self) -> usize {
        self.open.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{DocTree, NodeKind};

    fn section(tree: &mut DocTree, level: u8) -> NodeId {
        tree.create(NodeKind::Section {
            level,
            ids: vec![],
            names: vec![],
        })
    }

    #[test]
    fn jumps_nest_under_deepest_open_level() {
        let mut tree = DocTree::new("x");
        let root = tree.root();
        let mut stack = SectionStack::new(root);

        assert_eq!(stack.reconcile(1), root);
        let h1 = section(&mut tree, 1);
        stack.push(1, h1);

        assert_eq!(stack.reconcile(3), h1);
        let h3 = section(&mut tree, 3);
        stack.push(3, h3);
        assert_eq!(stack.depth(), 2);

        assert_eq!(stack.reconcile(2), h1);
        assert_eq!(stack.depth(), 1);

        assert_eq!(stack.reconcile(1), root);
        assert_eq!(stack.depth(), 0);
    }
}
