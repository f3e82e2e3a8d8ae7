//! # Transform Engine
//!
//! A single pre-order pass over a finished tree that rewrites known shapes
//! into host constructs. At each node the patterns are tried in order:
//!
//! 1. bullet/enumerated list of links → `toctree`
//! 2. reference to a local document → `doc` role (others get their uri
//!    rewritten in place)
//! 3. literal block with a language → language transformer
//! 4. `$...$` inline literal → `math` role
//! 5. pipe-fenced paragraph → grid table parsed by the host
//!
//! When a pattern fires, the node is replaced among its parent's children and
//! neither it nor its replacement is visited further.

mod code_block;
mod config;
mod refs;
mod table;
mod toc;

pub use config::{CodeBlockContext, CodeBlockTransformer, TransformConfig, UrlResolver};
pub use refs::normalize as normalize_path;

use std::path::Path;

use serde::Serialize;

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::host::{Host, HostError};
use crate::instruction::Instruction;
use crate::tree::{DocTree, NodeId, NodeKind, TreeError};
use refs::{RefContext, Resolution};

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error(transparent)]
    Host(#[from] HostError),
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Counts of what one pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransformReport {
    pub toc_trees: usize,
    pub doc_refs: usize,
    pub rewritten_uris: usize,
    pub code_blocks: usize,
    pub inline_math: usize,
    pub tables: usize,
}

impl TransformReport {
    pub fn replacements(&self) -> usize {
        self.toc_trees + self.doc_refs + self.code_blocks + self.inline_math + self.tables
    }
}

/// Run the pass over `tree`, a document under the project directory `root`.
///
/// Does nothing unless the document's source ends with one of the configured
/// `commonmark_suffixes`. Host failures abort the pass and are returned as
/// they were raised.
pub fn apply(
    tree: &mut DocTree,
    host: &mut dyn Host,
    config: &TransformConfig,
    root: &Path,
) -> Result<TransformReport, TransformError> {
    if !config.applies_to(tree.source()) {
        log::debug!("{}: not a commonmark source, transform skipped", tree.source());
        return Ok(TransformReport::default());
    }

    let refs = RefContext::new(root, tree.source());
    let mut pass = Pass {
        tree,
        host,
        config,
        refs,
        report: TransformReport::default(),
    };
    let root_node = pass.tree.root();
    pass.visit(root_node)?;

    let report = pass.report;
    log::info!(
        "{}: {} replacements, {} uris rewritten",
        pass.tree.source(),
        report.replacements(),
        report.rewritten_uris
    );
    Ok(report)
}

struct Pass<'a> {
    tree: &'a mut DocTree,
    host: &'a mut dyn Host,
    config: &'a TransformConfig,
    refs: RefContext,
    report: TransformReport,
}

impl Pass<'_> {
    fn visit(&mut self, node: NodeId) -> Result<(), TransformError> {
        if let Some(replacements) = self.try_replace(node)? {
            let line = self.tree.effective_line(node);
            for &new in &replacements {
                if self.tree.line(new).is_none() {
                    self.tree.set_line(new, line);
                }
            }
            self.tree.replace(node, &replacements)?;
            return Ok(());
        }

        if let NodeKind::Section { ids, .. } = self.tree.kind(node) {
            if !ids.is_empty() {
                self.host.note_target(self.tree, node);
            }
        }

        let children = self.tree.children(node).to_vec();
        for child in children {
            self.visit(child)?;
        }
        Ok(())
    }

    fn try_replace(&mut self, node: NodeId) -> Result<Option<Vec<NodeId>>, TransformError> {
        let replaced = match self.tree.kind(node) {
            NodeKind::BulletList | NodeKind::EnumeratedList if self.config.enable_auto_toc_tree => {
                self.toc_tree(node)?
            }
            NodeKind::PendingCrossRef { .. } => self.pending_doc_ref(node)?,
            NodeKind::Reference { .. } => self.doc_ref(node)?,
            NodeKind::LiteralBlock {
                language: Some(_), ..
            } => self.code_block(node)?,
            NodeKind::Literal { .. } if self.config.enable_inline_math => self.inline_math(node)?,
            NodeKind::Paragraph if self.config.enable_table_extension => self.table(node)?,
            _ => None,
        };
        Ok(replaced)
    }

    fn run(&mut self, instruction: &Instruction) -> Result<Vec<NodeId>, HostError> {
        self.host.run_structural_instruction(self.tree, instruction)
    }

    fn toc_tree(&mut self, list: NodeId) -> Result<Option<Vec<NodeId>>, HostError> {
        let Some(instruction) = toc::toc_instruction(self.tree, list, &self.refs, self.config, &*self.host)
        else {
            return Ok(None);
        };
        log::debug!("{}: list became a toctree", self.tree.source());
        self.report.toc_trees += 1;
        self.run(&instruction).map(Some)
    }

    /// A cross-ref whose reference names a local document is replaced whole.
    fn pending_doc_ref(&mut self, wrapper: NodeId) -> Result<Option<Vec<NodeId>>, HostError> {
        match self.tree.children(wrapper) {
            [reference] if matches!(self.tree.kind(*reference), NodeKind::Reference { .. }) => {
                let reference = *reference;
                match self.document_ref(reference) {
                    Some(instruction) => {
                        self.report.doc_refs += 1;
                        self.run(&instruction).map(Some)
                    }
                    None => Ok(None),
                }
            }
            _ => Ok(None),
        }
    }

    fn doc_ref(&mut self, reference: NodeId) -> Result<Option<Vec<NodeId>>, HostError> {
        if let Some(instruction) = self.document_ref(reference) {
            self.report.doc_refs += 1;
            return self.run(&instruction).map(Some);
        }

        let NodeKind::Reference { uri, .. } = self.tree.kind(reference) else {
            return Ok(None);
        };
        if let Resolution::Uri(resolved) = self.refs.resolve(uri, self.config, &*self.host) {
            if resolved != *uri {
                log::debug!("{}: rewrote {uri} to {resolved}", self.tree.source());
                self.report.rewritten_uris += 1;
                if let NodeKind::Reference { uri, .. } = self.tree.kind_mut(reference) {
                    *uri = resolved;
                }
            }
        }
        Ok(None)
    }

    /// The `doc` role for a reference to a local document, if it is one and
    /// document references are enabled.
    fn document_ref(&self, reference: NodeId) -> Option<Instruction> {
        if !self.config.enable_auto_doc_ref {
            return None;
        }
        let NodeKind::Reference { uri, .. } = self.tree.kind(reference) else {
            return None;
        };
        let resolution = self.refs.resolve(uri, self.config, &*self.host);
        if !matches!(resolution, Resolution::Document { .. }) {
            return None;
        }
        let title = self.tree.astext(reference);
        if title.is_empty() {
            return None;
        }
        Some(Instruction::doc_ref(&title, &resolution.target()))
    }

    fn code_block(&mut self, node: NodeId) -> Result<Option<Vec<NodeId>>, HostError> {
        let mut context = CodeBlockContext {
            tree: &mut *self.tree,
            host: &mut *self.host,
            config: self.config,
        };
        let replaced = code_block::expand(&mut context, node)?;
        if replaced.is_some() {
            self.report.code_blocks += 1;
        }
        Ok(replaced)
    }

    fn inline_math(&mut self, node: NodeId) -> Result<Option<Vec<NodeId>>, HostError> {
        let NodeKind::Literal { text } = self.tree.kind(node) else {
            return Ok(None);
        };
        let trimmed = text.trim();
        if trimmed.len() < 2 || !trimmed.starts_with('$') || !trimmed.ends_with('$') {
            return Ok(None);
        }
        let instruction = Instruction::inline_math(&trimmed[1..trimmed.len() - 1]);
        self.report.inline_math += 1;
        self.run(&instruction).map(Some)
    }

    fn table(&mut self, paragraph: NodeId) -> Result<Option<Vec<NodeId>>, HostError> {
        if !table::looks_like_table(self.tree, paragraph) {
            return Ok(None);
        }
        let parsed = match table::parse_pipe_table(self.tree, paragraph) {
            Ok(parsed) => parsed,
            Err(problem) => {
                let diagnostic = Diagnostic::warning(
                    DiagnosticKind::AmbiguousTableShape,
                    format!("table paragraph {problem}; left as a paragraph"),
                    self.tree.source(),
                )
                .with_line(self.tree.effective_line(paragraph));
                self.tree.diagnostics_mut().push(diagnostic);
                return Ok(None);
            }
        };

        let rendered = table::render_grid(&parsed);
        let source = self.tree.source().to_string();
        let nodes = self.host.parse_embedded(self.tree, &rendered, &source)?;
        self.report.tables += 1;
        Ok(Some(nodes))
    }
}
