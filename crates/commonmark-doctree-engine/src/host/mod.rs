//! # Host Collaborator Interface
//!
//! Services the transform pass delegates to the surrounding documentation
//! system. The pass describes what it needs; the host materializes it as nodes
//! in the same arena and returns their ids for splicing.

mod embedded;
mod standalone;

pub use embedded::{CellToken, GridTable, parse_cell, parse_grid_table};
pub use standalone::StandaloneHost;

use std::path::Path;

use crate::instruction::Instruction;
use crate::tree::{DocTree, NodeId};

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("instruction `{name}` failed: {message}")]
    Instruction { name: String, message: String },
    #[error("embedded markup from {source_id} could not be parsed: {message}")]
    Embedded { source_id: String, message: String },
    #[error(transparent)]
    Tree(#[from] crate::tree::TreeError),
}

pub trait Host {
    /// Whether `path` (absolute) names an existing document under the project.
    fn resolve_local_document(&self, path: &Path) -> bool;

    /// Materialize a directive or role as zero or more detached nodes.
    fn run_structural_instruction(
        &mut self,
        tree: &mut DocTree,
        instruction: &Instruction,
    ) -> Result<Vec<NodeId>, HostError>;

    /// Parse markup in the host's native language into detached nodes.
    fn parse_embedded(
        &mut self,
        tree: &mut DocTree,
        text: &str,
        source: &str,
    ) -> Result<Vec<NodeId>, HostError>;

    /// Record a node that carries identifiers for later anchor resolution.
    fn note_target(&mut self, tree: &DocTree, node: NodeId);
}
