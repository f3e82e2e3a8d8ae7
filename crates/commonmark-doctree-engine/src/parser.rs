//! Markdown text to document tree, through either event pipeline.

use serde::{Deserialize, Serialize};

use crate::builder::{BuilderOptions, TreeBuilder};
use crate::source::{html_pipeline_events, markdown_events};
use crate::tree::DocTree;

/// Which event source feeds the builder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pipeline {
    /// pulldown-cmark events mapped directly.
    #[default]
    Events,
    /// Markdown rendered to HTML, then tokenized into element events.
    Html,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserOptions {
    /// Schemes that mark a link as external. `None` accepts any scheme.
    pub known_url_schemes: Option<Vec<String>>,
    pub pipeline: Pipeline,
    /// Let the markdown parser recognize pipe tables itself. Off by default,
    /// leaving pipe tables to the transform pass.
    pub tables: bool,
}

/// Parse `text` into a document tree. `source` identifies the document in
/// diagnostics and is the base for resolving relative links.
pub fn parse(text: &str, source: &str, options: &ParserOptions) -> DocTree {
    let builder_options = BuilderOptions {
        known_url_schemes: options.known_url_schemes.clone(),
    };
    match options.pipeline {
        Pipeline::Events => TreeBuilder::new(source, builder_options)
            .build(markdown_events(text, options.tables)),
        Pipeline::Html => {
            let mut tree = DocTree::new(source);
            let events = html_pipeline_events(text, options.tables, source, tree.diagnostics_mut());
            TreeBuilder::with_tree(tree, builder_options).build(events)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::pformat::pformat;

    #[test]
    fn both_pipelines_agree_on_simple_documents() {
        let text = "# Title\n\nSome *emphasis* and [a link](https://example.com).\n\n* one\n* two\n";
        let events = parse(text, "a.md", &ParserOptions::default());
        let html = parse(
            text,
            "a.md",
            &ParserOptions {
                pipeline: Pipeline::Html,
                ..ParserOptions::default()
            },
        );
        assert_eq!(pformat(&events), pformat(&html));
    }
}
