use serde::Serialize;

use crate::instruction::Instruction;

/// The semantic variant of a document tree node, with its attributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    /// Tree root; `source` is the document's path or label.
    Document { source: String },
    Section {
        level: u8,
        ids: Vec<String>,
        names: Vec<String>,
    },
    Title,
    Paragraph,
    Emphasis,
    Strong,
    Literal { text: String },
    LiteralBlock {
        text: String,
        language: Option<String>,
    },
    Reference {
        uri: String,
        title: Option<String>,
    },
    /// Unresolved link target. Its single child is the wrapped `Reference`.
    PendingCrossRef {
        target: String,
        explicit_title: bool,
        title: Option<String>,
    },
    Image {
        uri: String,
        alt: String,
        title: Option<String>,
    },
    BulletList,
    EnumeratedList,
    ListItem,
    Table,
    TableHead,
    TableBody,
    Row,
    Entry,
    BlockQuote,
    Transition,
    RawPassthrough { format: String, content: String },
    Text { content: String },
    /// A structural instruction the host kept declarative.
    Pending { instruction: Instruction },
}

impl NodeKind {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    pub fn raw_html(content: impl Into<String>) -> Self {
        Self::RawPassthrough {
            format: "html".to_string(),
            content: content.into(),
        }
    }

    /// Element name used in pseudo-XML output and diagnostics.
    pub fn tag_name(&self) -> &'static str {
        match self {
            Self::Document { .. } => "document",
            Self::Section { .. } => "section",
            Self::Title => "title",
            Self::Paragraph => "paragraph",
            Self::Emphasis => "emphasis",
            Self::Strong => "strong",
            Self::Literal { .. } => "literal",
            Self::LiteralBlock { .. } => "literal_block",
            Self::Reference { .. } => "reference",
            Self::PendingCrossRef { .. } => "pending_xref",
            Self::Image { .. } => "image",
            Self::BulletList => "bullet_list",
            Self::EnumeratedList => "enumerated_list",
            Self::ListItem => "list_item",
            Self::Table => "table",
            Self::TableHead => "thead",
            Self::TableBody => "tbody",
            Self::Row => "row",
            Self::Entry => "entry",
            Self::BlockQuote => "block_quote",
            Self::Transition => "transition",
            Self::RawPassthrough { .. } => "raw",
            Self::Text { .. } => "#text",
            Self::Pending { .. } => "pending",
        }
    }

    /// Nodes whose text lives in an attribute rather than in `Text` children.
    ///
    /// While the builder cursor sits on one of these, incoming text is
    /// appended to the attribute and nested inline containers are flattened.
    pub fn is_text_sink(&self) -> bool {
        matches!(
            self,
            Self::Literal { .. }
                | Self::LiteralBlock { .. }
                | Self::Image { .. }
                | Self::RawPassthrough { .. }
        )
    }

    pub(crate) fn push_text(&mut self, more: &str) {
        match self {
            Self::Literal { text } | Self::LiteralBlock { text, .. } => text.push_str(more),
            Self::Image { alt, .. } => alt.push_str(more),
            Self::RawPassthrough { content, .. } | Self::Text { content } => {
                content.push_str(more)
            }
            _ => {}
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::BulletList | Self::EnumeratedList)
    }

    /// Containers that may directly hold sections and body blocks.
    pub fn is_section_like(&self) -> bool {
        matches!(self, Self::Document { .. } | Self::Section { .. })
    }
}
