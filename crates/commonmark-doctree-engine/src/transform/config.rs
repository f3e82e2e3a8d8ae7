//! Transform pass options and the language transformer registry.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::host::{Host, HostError};
use crate::tree::{DocTree, NodeId};

/// Maps a project-relative path to the URI a non-document link should use.
pub type UrlResolver = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// What a code block transformer sees while it runs.
pub struct CodeBlockContext<'a> {
    pub tree: &'a mut DocTree,
    pub host: &'a mut dyn Host,
    pub config: &'a TransformConfig,
}

/// Expands a literal block. `Ok(None)` leaves the block as it is.
pub type CodeBlockTransformer = Arc<
    dyn Fn(&mut CodeBlockContext<'_>, NodeId) -> Result<Option<Vec<NodeId>>, HostError>
        + Send
        + Sync,
>;

/// Read-only once built; share it between threads with `clone()`.
#[derive(Clone)]
pub struct TransformConfig {
    pub enable_auto_toc_tree: bool,
    /// Restrict TOC generation to lists under a section with this exact title.
    pub auto_toc_tree_section: Option<String>,
    pub enable_auto_doc_ref: bool,
    pub url_resolver: Option<UrlResolver>,
    pub enable_eval_rst: bool,
    pub enable_math: bool,
    pub enable_inline_math: bool,
    pub enable_table_extension: bool,
    /// Source suffixes the pass applies to at all, e.g. `.md`.
    pub commonmark_suffixes: Vec<String>,
    /// Suffixes (without dot) a local link must have to count as a document.
    pub document_suffixes: Vec<String>,
    /// User transformers; merged over the built-in ones.
    pub auto_code_block_transformers: BTreeMap<String, CodeBlockTransformer>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            enable_auto_toc_tree: true,
            auto_toc_tree_section: None,
            enable_auto_doc_ref: true,
            url_resolver: None,
            enable_eval_rst: true,
            enable_math: true,
            enable_inline_math: true,
            enable_table_extension: false,
            commonmark_suffixes: vec![".md".to_string()],
            document_suffixes: vec!["md".to_string(), "rst".to_string()],
            auto_code_block_transformers: BTreeMap::new(),
        }
    }
}

impl fmt::Debug for TransformConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformConfig")
            .field("enable_auto_toc_tree", &self.enable_auto_toc_tree)
            .field("auto_toc_tree_section", &self.auto_toc_tree_section)
            .field("enable_auto_doc_ref", &self.enable_auto_doc_ref)
            .field("url_resolver", &self.url_resolver.is_some())
            .field("enable_eval_rst", &self.enable_eval_rst)
            .field("enable_math", &self.enable_math)
            .field("enable_inline_math", &self.enable_inline_math)
            .field("enable_table_extension", &self.enable_table_extension)
            .field("commonmark_suffixes", &self.commonmark_suffixes)
            .field("document_suffixes", &self.document_suffixes)
            .field("languages", &self.languages())
            .finish()
    }
}

impl TransformConfig {
    pub fn with_url_resolver(mut self, resolver: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.url_resolver = Some(Arc::new(resolver));
        self
    }

    pub fn with_code_block_transformer(
        mut self,
        language: &str,
        transformer: impl Fn(&mut CodeBlockContext<'_>, NodeId) -> Result<Option<Vec<NodeId>>, HostError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.auto_code_block_transformers
            .insert(language.to_string(), Arc::new(transformer));
        self
    }

    /// Whether the pass applies to a document with this source identifier.
    pub fn applies_to(&self, source: &str) -> bool {
        self.commonmark_suffixes
            .iter()
            .any(|suffix| source.ends_with(suffix.as_str()))
    }

    /// Languages with a registered transformer, built-in or user, sorted.
    pub fn languages(&self) -> Vec<String> {
        let mut languages: Vec<String> = super::code_block::BUILTIN_LANGUAGES
            .iter()
            .map(|l| l.to_string())
            .chain(self.auto_code_block_transformers.keys().cloned())
            .collect();
        languages.sort();
        languages.dedup();
        languages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = TransformConfig::default();
        assert!(config.enable_auto_toc_tree);
        assert!(config.enable_auto_doc_ref);
        assert!(config.enable_eval_rst);
        assert!(config.enable_math);
        assert!(config.enable_inline_math);
        assert!(!config.enable_table_extension);
        assert_eq!(config.commonmark_suffixes, vec![".md"]);
        assert_eq!(config.document_suffixes, vec!["md", "rst"]);
    }

    #[test]
    fn applies_only_to_configured_suffixes() {
        let config = TransformConfig::default();
        assert!(config.applies_to("docs/index.md"));
        assert!(!config.applies_to("docs/index.rst"));
    }

    #[test]
    fn user_transformers_merge_with_builtins() {
        let config = TransformConfig::default()
            .with_code_block_transformer("plantuml", |_, _| Ok(None))
            .with_code_block_transformer("math", |_, _| Ok(None));
        assert_eq!(config.languages(), vec!["eval_rst", "math", "plantuml"]);
    }

    #[test]
    fn config_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<TransformConfig>();
    }
}
