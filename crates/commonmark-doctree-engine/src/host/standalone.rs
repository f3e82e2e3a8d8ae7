use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::embedded::{CellToken, parse_cell, parse_grid_table};
use super::{Host, HostError};
use crate::instruction::Instruction;
use crate::transform::normalize_path;
use crate::tree::{DocTree, NodeId, NodeKind};

/// Filesystem-backed host for tools and tests.
///
/// Instructions are kept declarative as `Pending` nodes, and embedded markup
/// other than grid tables is passed through as raw `rst`.
#[derive(Debug, Clone)]
pub struct StandaloneHost {
    root: PathBuf,
    targets: BTreeMap<String, NodeId>,
}

impl StandaloneHost {
    /// `root` is normalized lexically, the same way reference paths are.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: normalize_path(&root.into()),
            targets: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Identifiers noted during the last transform pass.
    pub fn targets(&self) -> &BTreeMap<String, NodeId> {
        &self.targets
    }
}

impl Host for StandaloneHost {
    fn resolve_local_document(&self, path: &Path) -> bool {
        path.starts_with(&self.root) && path.is_file()
    }

    fn run_structural_instruction(
        &mut self,
        tree: &mut DocTree,
        instruction: &Instruction,
    ) -> Result<Vec<NodeId>, HostError> {
        log::debug!("keeping `{}` as a pending node", instruction.name());
        let node = tree.create(NodeKind::Pending {
            instruction: instruction.clone(),
        });
        Ok(vec![node])
    }

    fn parse_embedded(
        &mut self,
        tree: &mut DocTree,
        text: &str,
        source: &str,
    ) -> Result<Vec<NodeId>, HostError> {
        if let Some(grid) = parse_grid_table(text) {
            log::debug!("{source}: embedded grid table with {} rows", grid.header.len() + grid.body.len());
            return Ok(vec![build_table(tree, &grid.header, &grid.body)]);
        }
        let raw = tree.create(NodeKind::RawPassthrough {
            format: "rst".to_string(),
            content: text.to_string(),
        });
        Ok(vec![raw])
    }

    fn note_target(&mut self, tree: &DocTree, node: NodeId) {
        if let NodeKind::Section { ids, .. } = tree.kind(node) {
            for id in ids {
                self.targets.insert(id.clone(), node);
            }
        }
    }
}

fn build_table(tree: &mut DocTree, header: &[Vec<String>], body: &[Vec<String>]) -> NodeId {
    let table = tree.create(NodeKind::Table);
    if !header.is_empty() {
        let head = tree.append(table, NodeKind::TableHead);
        build_rows(tree, head, header);
    }
    let tbody = tree.append(table, NodeKind::TableBody);
    build_rows(tree, tbody, body);
    table
}

fn build_rows(tree: &mut DocTree, parent: NodeId, rows: &[Vec<String>]) {
    for cells in rows {
        let row = tree.append(parent, NodeKind::Row);
        for cell in cells {
            let entry = tree.append(row, NodeKind::Entry);
            if cell.is_empty() {
                continue;
            }
            let paragraph = tree.append(entry, NodeKind::Paragraph);
            for token in parse_cell(cell) {
                match token {
                    CellToken::Text(text) => {
                        tree.append(paragraph, NodeKind::text(text));
                    }
                    CellToken::Reference { title, uri } => {
                        let reference =
                            tree.append(paragraph, NodeKind::Reference { uri, title: None });
                        tree.append(reference, NodeKind::text(title));
                    }
                    CellToken::CrossRef { title, target } => {
                        let pending = tree.append(
                            paragraph,
                            NodeKind::PendingCrossRef {
                                target: target.clone(),
                                explicit_title: true,
                                title: None,
                            },
                        );
                        let reference = tree.append(
                            pending,
                            NodeKind::Reference {
                                uri: target,
                                title: None,
                            },
                        );
                        tree.append(reference, NodeKind::text(title));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::pformat::pformat_node;
    use tempfile::TempDir;

    #[test]
    fn resolves_existing_files_under_root_only() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("guide.md"), "# Guide").unwrap();
        let host = StandaloneHost::new(dir.path());

        assert!(host.resolve_local_document(&dir.path().join("guide.md")));
        assert!(!host.resolve_local_document(&dir.path().join("missing.md")));
        assert!(!host.resolve_local_document(Path::new("/elsewhere/guide.md")));
    }

    #[test]
    fn roots_with_dot_segments_still_match() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs/guide.md"), "# Guide").unwrap();
        let host = StandaloneHost::new(dir.path().join("docs/../docs/."));

        assert_eq!(host.root(), dir.path().join("docs"));
        assert!(host.resolve_local_document(&dir.path().join("docs/guide.md")));
    }

    #[test]
    fn embedded_grid_table_becomes_table_nodes() {
        let mut tree = DocTree::new("t.md");
        let mut host = StandaloneHost::new("/");
        let text = "+-----+\n| `a <https://a.org/>`__ |\n+=====+\n| b |\n+-----+";

        let nodes = host.parse_embedded(&mut tree, text, "t.md").unwrap();

        insta::assert_snapshot!(pformat_node(&tree, nodes[0]), @r#"
        <table>
            <thead>
                <row>
                    <entry>
                        <paragraph>
                            <reference refuri="https://a.org/">
                                a
            <tbody>
                <row>
                    <entry>
                        <paragraph>
                            b
        "#);
    }

    #[test]
    fn other_embedded_markup_is_raw_rst() {
        let mut tree = DocTree::new("t.md");
        let mut host = StandaloneHost::new("/");
        let nodes = host.parse_embedded(&mut tree, ".. note:: hi", "t.md").unwrap();
        assert_eq!(
            tree.kind(nodes[0]),
            &NodeKind::RawPassthrough {
                format: "rst".into(),
                content: ".. note:: hi".into()
            }
        );
    }

    #[test]
    fn instructions_stay_pending() {
        let mut tree = DocTree::new("t.md");
        let mut host = StandaloneHost::new("/");
        let instruction = Instruction::math_block("x^2");
        let nodes = host.run_structural_instruction(&mut tree, &instruction).unwrap();
        assert_eq!(tree.kind(nodes[0]), &NodeKind::Pending { instruction });
    }
}
