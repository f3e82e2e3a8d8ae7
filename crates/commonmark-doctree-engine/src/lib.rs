//! Converts CommonMark text into a semantic document tree and rewrites known
//! tree shapes into host constructs.
//!
//! ```text
//! text -> source (events) -> builder -> DocTree -> transform -> host
//! ```

pub mod builder;
pub mod diagnostics;
pub mod events;
pub mod host;
pub mod instruction;
pub mod parser;
pub mod source;
pub mod transform;
pub mod tree;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use builder::{BuilderOptions, TreeBuilder};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use host::{Host, HostError, StandaloneHost};
pub use instruction::Instruction;
pub use parser::{ParserOptions, Pipeline, parse};
pub use transform::{TransformConfig, TransformError, TransformReport, apply, normalize_path};
pub use tree::{DocTree, NodeId, NodeKind, TreeError};
