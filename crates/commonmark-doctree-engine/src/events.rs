//! The typed event stream consumed by the tree builder.
//!
//! Every source (markdown or HTML) is adapted into this closed set of
//! variants. An `Enter` is always matched by a later `Exit` of the same
//! [`TagKind`] at the same depth; `Leaf` events stand alone.

/// A container being opened, with the attributes it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    Document,
    /// `id` is `Some` only when the source attached an explicit identifier.
    Heading { level: u8, id: Option<String> },
    Paragraph,
    Emphasis,
    Strong,
    InlineCode,
    Link {
        destination: String,
        title: Option<String>,
        autolink: bool,
    },
    /// `alt` is `Some` when the source already knows the label (HTML `alt`).
    Image {
        destination: String,
        title: Option<String>,
        alt: Option<String>,
    },
    List { ordered: bool },
    Item,
    BlockQuote,
    CodeBlock { language: Option<String> },
    HtmlBlock,
    Table,
    TableHead,
    TableBody,
    TableRow,
    TableCell,
    /// A raw element from the HTML pipeline, not yet disambiguated.
    Element {
        name: String,
        attrs: Vec<(String, String)>,
    },
    /// A container the converter has no model for.
    Unsupported(String),
}

/// Attribute-free mirror of [`Tag`], carried by `Exit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagKind {
    Document,
    Heading(u8),
    Paragraph,
    Emphasis,
    Strong,
    InlineCode,
    Link,
    Image,
    List,
    Item,
    BlockQuote,
    CodeBlock,
    HtmlBlock,
    Table,
    TableHead,
    TableBody,
    TableRow,
    TableCell,
    Element(String),
    Unsupported(String),
}

impl Tag {
    pub fn kind(&self) -> TagKind {
        match self {
            Tag::Document => TagKind::Document,
            Tag::Heading { level, .. } => TagKind::Heading(*level),
            Tag::Paragraph => TagKind::Paragraph,
            Tag::Emphasis => TagKind::Emphasis,
            Tag::Strong => TagKind::Strong,
            Tag::InlineCode => TagKind::InlineCode,
            Tag::Link { .. } => TagKind::Link,
            Tag::Image { .. } => TagKind::Image,
            Tag::List { .. } => TagKind::List,
            Tag::Item => TagKind::Item,
            Tag::BlockQuote => TagKind::BlockQuote,
            Tag::CodeBlock { .. } => TagKind::CodeBlock,
            Tag::HtmlBlock => TagKind::HtmlBlock,
            Tag::Table => TagKind::Table,
            Tag::TableHead => TagKind::TableHead,
            Tag::TableBody => TagKind::TableBody,
            Tag::TableRow => TagKind::TableRow,
            Tag::TableCell => TagKind::TableCell,
            Tag::Element { name, .. } => TagKind::Element(name.clone()),
            Tag::Unsupported(name) => TagKind::Unsupported(name.clone()),
        }
    }

    /// Block-level containers close an implicit list-item paragraph.
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            Tag::Heading { .. }
                | Tag::Paragraph
                | Tag::List { .. }
                | Tag::Item
                | Tag::BlockQuote
                | Tag::CodeBlock { .. }
                | Tag::HtmlBlock
                | Tag::Table
                | Tag::TableHead
                | Tag::TableBody
                | Tag::TableRow
                | Tag::TableCell
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Leaf {
    Text(String),
    /// Inline code span with its content.
    Code(String),
    /// Inline raw HTML, or one chunk of an HTML block.
    Html(String),
    SoftBreak,
    HardBreak,
    Rule,
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Enter(Tag),
    Leaf(Leaf),
    Exit(TagKind),
}

/// An event with its best-effort 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub event: Event,
    pub line: Option<usize>,
}

impl Located {
    pub fn new(event: Event, line: Option<usize>) -> Self {
        Self { event, line }
    }

    pub fn enter(tag: Tag) -> Self {
        Self::new(Event::Enter(tag), None)
    }

    pub fn exit(kind: TagKind) -> Self {
        Self::new(Event::Exit(kind), None)
    }

    pub fn leaf(leaf: Leaf) -> Self {
        Self::new(Event::Leaf(leaf), None)
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::leaf(Leaf::Text(content.into()))
    }

    pub fn at(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}
