//! # Document Tree
//!
//! An arena of nodes addressed by stable [`NodeId`] indices.
//!
//! Each node record owns the ordered list of its children's ids and keeps a
//! back-reference to its parent for upward navigation only. Ownership flows
//! strictly downward: [`DocTree::attach`] detaches a node from any previous
//! parent before adopting it and refuses to create cycles, and
//! [`DocTree::replace`] swaps entries in the parent's child list instead of
//! handing out references into the old subtree.
//!
//! Replaced or detached nodes stay in the arena as unreachable records; the
//! whole arena is discarded together once the host is done with the tree.

pub mod names;
mod node;
pub mod pformat;
pub mod snapshot;

pub use names::{IdRegistry, Registered, make_id, normalize_name};
pub use node::NodeKind;

use serde::Serialize;

use crate::diagnostics::Diagnostics;

/// Stable index of a node inside its [`DocTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("attaching node {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
    #[error("the document root cannot be detached or replaced")]
    Root,
    #[error("node {0:?} has no parent to be replaced in")]
    Detached(NodeId),
}

#[derive(Debug, Clone)]
pub struct NodeData {
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Best-effort 1-based source line.
    pub line: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct DocTree {
    nodes: Vec<NodeData>,
    targets: IdRegistry,
    diagnostics: Diagnostics,
}

impl DocTree {
    const ROOT: NodeId = NodeId(0);

    pub fn new(source: impl Into<String>) -> Self {
        let root = NodeData {
            kind: NodeKind::Document {
                source: source.into(),
            },
            parent: None,
            children: Vec::new(),
            line: None,
        };
        Self {
            nodes: vec![root],
            targets: IdRegistry::default(),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    /// Source identifier the document was parsed from.
    pub fn source(&self) -> &str {
        match &self.nodes[0].kind {
            NodeKind::Document { source } => source,
            _ => "",
        }
    }

    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.0].kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn line(&self, id: NodeId) -> Option<usize> {
        self.nodes[id.0].line
    }

    pub fn set_line(&mut self, id: NodeId, line: Option<usize>) {
        self.nodes[id.0].line = line;
    }

    /// Line of the node, or of its nearest ancestor that has one.
    pub fn effective_line(&self, id: NodeId) -> Option<usize> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find_map(|n| self.nodes[n.0].line)
    }

    /// Create a detached node.
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
            line: None,
        });
        id
    }

    /// Create a node as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.create(kind);
        self.nodes[id.0].parent = Some(parent);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Move `child` (and its subtree) to the end of `parent`'s children.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.check_adoptable(parent, child)?;
        self.unlink(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        Ok(())
    }

    pub fn detach(&mut self, id: NodeId) -> Result<(), TreeError> {
        if id == Self::ROOT {
            return Err(TreeError::Root);
        }
        self.unlink(id);
        Ok(())
    }

    /// Replace `old` in its parent's child list with `replacements`, in order.
    ///
    /// An empty replacement list deletes `old`. Siblings keep their order.
    pub fn replace(&mut self, old: NodeId, replacements: &[NodeId]) -> Result<(), TreeError> {
        if old == Self::ROOT {
            return Err(TreeError::Root);
        }
        let parent = self.parent(old).ok_or(TreeError::Detached(old))?;
        for &new in replacements {
            if new == old {
                continue;
            }
            self.check_adoptable(parent, new)?;
        }

        for &new in replacements {
            if new != old {
                self.unlink(new);
            }
        }
        let index = self.nodes[parent.0]
            .children
            .iter()
            .position(|&c| c == old)
            .ok_or(TreeError::Detached(old))?;
        self.nodes[parent.0]
            .children
            .splice(index..=index, replacements.iter().copied());
        if !replacements.contains(&old) {
            self.nodes[old.0].parent = None;
        }
        for &new in replacements {
            self.nodes[new.0].parent = Some(parent);
        }
        Ok(())
    }

    /// Ancestors from the parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&n| self.parent(n))
    }

    /// Nearest enclosing `Section` of `id`, not counting `id` itself.
    pub fn nearest_section(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id)
            .find(|&n| matches!(self.kind(n), NodeKind::Section { .. }))
    }

    /// The `Title` child of a section, if it has one.
    pub fn section_title(&self, section: NodeId) -> Option<NodeId> {
        self.children(section)
            .iter()
            .copied()
            .find(|&c| matches!(self.kind(c), NodeKind::Title))
    }

    /// Pre-order walk of `id` and everything below it.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev().copied());
        }
        out
    }

    /// Flattened text of a subtree. Raw passthrough content is not text.
    pub fn astext(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            NodeKind::Text { content } => out.push_str(content),
            NodeKind::Literal { text } | NodeKind::LiteralBlock { text, .. } => {
                out.push_str(text)
            }
            NodeKind::Image { alt, .. } => out.push_str(alt),
            NodeKind::RawPassthrough { .. } => {}
            _ => {
                for &child in self.children(id) {
                    self.collect_text(child, out);
                }
            }
        }
    }

    /// Register a section's ids and names as link targets.
    ///
    /// Returns the identifier actually assigned, which differs from
    /// `requested_id` when another target already holds it.
    pub fn register_target(&mut self, node: NodeId, requested_id: &str, name: &str) -> Registered {
        let registered = self.targets.register(node, requested_id, name);
        if let NodeKind::Section { ids, names, .. } = self.kind_mut(node) {
            if !registered.id.is_empty() {
                ids.push(registered.id.clone());
            }
            if !name.is_empty() {
                names.push(name.to_string());
            }
        }
        registered
    }

    pub fn targets(&self) -> &IdRegistry {
        &self.targets
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    /// First node in document order matching `predicate`.
    pub fn find(&self, predicate: impl Fn(&NodeKind) -> bool) -> Option<NodeId> {
        self.descendants(Self::ROOT)
            .into_iter()
            .find(|&n| predicate(self.kind(n)))
    }

    /// All nodes in document order matching `predicate`.
    pub fn find_all(&self, predicate: impl Fn(&NodeKind) -> bool) -> Vec<NodeId> {
        self.descendants(Self::ROOT)
            .into_iter()
            .filter(|&n| predicate(self.kind(n)))
            .collect()
    }

    fn check_adoptable(&self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        if child == Self::ROOT {
            return Err(TreeError::Root);
        }
        if child == parent || self.ancestors(parent).any(|a| a == child) {
            return Err(TreeError::Cycle { parent, child });
        }
        Ok(())
    }

    fn unlink(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (DocTree, NodeId, NodeId, NodeId) {
        let mut tree = DocTree::new("<string>");
        let root = tree.root();
        let para = tree.append(root, NodeKind::Paragraph);
        let first = tree.append(para, NodeKind::text("one "));
        let second = tree.append(para, NodeKind::Emphasis);
        tree.append(second, NodeKind::text("two"));
        (tree, para, first, second)
    }

    #[test]
    fn append_links_parent_and_child() {
        let (tree, para, first, second) = sample();
        assert_eq!(tree.children(para), &[first, second]);
        assert_eq!(tree.parent(first), Some(para));
        assert_eq!(tree.parent(para), Some(tree.root()));
        assert_eq!(tree.source(), "<string>");
    }

    #[test]
    fn astext_flattens_inline_content() {
        let (tree, para, _, _) = sample();
        assert_eq!(tree.astext(para), "one two");
    }

    #[test]
    fn replace_splices_in_place() {
        let (mut tree, para, first, second) = sample();
        let a = tree.create(NodeKind::text("a"));
        let b = tree.create(NodeKind::text("b"));

        tree.replace(first, &[a, b]).unwrap();

        assert_eq!(tree.children(para), &[a, b, second]);
        assert_eq!(tree.parent(first), None);
        assert_eq!(tree.parent(a), Some(para));
    }

    #[test]
    fn replace_with_nothing_deletes() {
        let (mut tree, para, first, second) = sample();
        tree.replace(first, &[]).unwrap();
        assert_eq!(tree.children(para), &[second]);
    }

    #[test]
    fn attach_moves_without_double_ownership() {
        let (mut tree, para, first, second) = sample();
        tree.attach(second, first).unwrap();

        assert_eq!(tree.children(para), &[second]);
        assert_eq!(tree.children(second).last(), Some(&first));
        assert_eq!(tree.parent(first), Some(second));
    }

    #[test]
    fn attach_rejects_cycles() {
        let (mut tree, para, _, second) = sample();
        let err = tree.attach(second, para).unwrap_err();
        assert_eq!(
            err,
            TreeError::Cycle {
                parent: second,
                child: para
            }
        );
        assert_eq!(tree.attach(para, para).unwrap_err(), TreeError::Cycle { parent: para, child: para });
    }

    #[test]
    fn root_cannot_be_replaced_or_detached() {
        let (mut tree, _, _, _) = sample();
        let root = tree.root();
        assert_eq!(tree.replace(root, &[]), Err(TreeError::Root));
        assert_eq!(tree.detach(root), Err(TreeError::Root));
    }

    #[test]
    fn replacing_a_detached_node_fails() {
        let mut tree = DocTree::new("x");
        let loose = tree.create(NodeKind::Paragraph);
        assert_eq!(tree.replace(loose, &[]), Err(TreeError::Detached(loose)));
    }

    #[test]
    fn effective_line_walks_up() {
        let (mut tree, para, first, second) = sample();
        tree.set_line(para, Some(3));
        tree.set_line(second, Some(4));
        let inner = tree.children(second)[0];

        assert_eq!(tree.effective_line(first), Some(3));
        assert_eq!(tree.effective_line(inner), Some(4));
        assert_eq!(tree.effective_line(tree.root()), None);
    }

    #[test]
    fn descendants_are_pre_order() {
        let (tree, para, first, second) = sample();
        let inner = tree.children(second)[0];
        assert_eq!(
            tree.descendants(tree.root()),
            vec![tree.root(), para, first, second, inner]
        );
    }

    #[test]
    fn register_target_fills_section_attributes() {
        let mut tree = DocTree::new("x");
        let root = tree.root();
        let section = tree.append(
            root,
            NodeKind::Section {
                level: 1,
                ids: vec![],
                names: vec![],
            },
        );
        let registered = tree.register_target(section, "intro", "intro");

        assert_eq!(registered.id, "intro");
        assert_eq!(
            tree.kind(section),
            &NodeKind::Section {
                level: 1,
                ids: vec!["intro".into()],
                names: vec!["intro".into()]
            }
        );
        assert_eq!(tree.targets().lookup_id("intro"), Some(section));
    }
}
