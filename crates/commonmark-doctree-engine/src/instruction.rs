//! Declarative structural instructions handed to the host.
//!
//! The transform pass never executes directives or roles itself. It describes
//! what should happen ("run `toctree` with these entries") and the host decides
//! how to materialize it.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Instruction {
    /// A block-level directive: `name`, positional arguments, ordered options
    /// and body lines.
    Directive {
        name: String,
        arguments: Vec<String>,
        options: Vec<(String, String)>,
        content: Vec<String>,
    },
    /// An inline role applied to `content`.
    Role { name: String, content: String },
}

impl Instruction {
    pub fn directive(name: &str, content: Vec<String>) -> Self {
        Self::Directive {
            name: name.to_string(),
            arguments: Vec::new(),
            options: Vec::new(),
            content,
        }
    }

    pub fn role(name: &str, content: impl Into<String>) -> Self {
        Self::Role {
            name: name.to_string(),
            content: content.into(),
        }
    }

    /// `toctree` listing `(title, target)` entries, one level deep.
    pub fn toctree(entries: &[(String, String)], numbered: bool) -> Self {
        Self::Directive {
            name: "toctree".to_string(),
            arguments: Vec::new(),
            options: vec![
                ("maxdepth".to_string(), "1".to_string()),
                ("numbered".to_string(), u8::from(numbered).to_string()),
            ],
            content: entries
                .iter()
                .map(|(title, target)| format!("{title} <{target}>"))
                .collect(),
        }
    }

    pub fn math_block(text: &str) -> Self {
        Self::directive("math", split_lines(text))
    }

    pub fn code_block(language: &str, text: &str) -> Self {
        Self::Directive {
            name: "code-block".to_string(),
            arguments: vec![language.to_string()],
            options: Vec::new(),
            content: split_lines(text),
        }
    }

    /// Cross-document reference to a project-relative document path.
    pub fn doc_ref(title: &str, target: &str) -> Self {
        Self::role("doc", format!("{title} <{target}>"))
    }

    pub fn inline_math(text: &str) -> Self {
        Self::role("math", text)
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Directive { name, .. } | Self::Role { name, .. } => name,
        }
    }
}

/// Content lines as the host sees them. An empty body is one empty line.
pub(crate) fn split_lines(text: &str) -> Vec<String> {
    text.split('\n').map(str::to_string).collect()
}
