//! # Tree Builder
//!
//! Consumes a [`Located`] event stream and grows a [`DocTree`] in a single
//! pass. All traversal state lives in [`TreeBuilder`]: the cursor, the open
//! section levels, and one [`Frame`] per entered container describing how to
//! restore the cursor when that container exits.
//!
//! Unsupported kinds never abort the build. They are recorded as diagnostics
//! and their content flows into the current node.

mod html;
mod links;
mod sections;

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::events::{Event, Leaf, Located, Tag, TagKind};
use crate::tree::{DocTree, NodeId, NodeKind, make_id, normalize_name};

use html::Interpretation;
use links::{LinkTarget, classify};
use sections::SectionStack;

/// How an entered container is undone on its exit.
#[derive(Debug, Clone)]
enum Frame {
    /// Move the cursor back to `restore`.
    Restore(NodeId),
    /// Heading title being filled; registered as a target on exit.
    Heading {
        section: NodeId,
        title: NodeId,
        explicit_id: Option<String>,
    },
    /// Code block whose single trailing newline is trimmed on exit.
    CodeBlock { node: NodeId, restore: NodeId },
    /// List item or table cell that may hold an implicit paragraph.
    Container { restore: NodeId },
    /// `<pre>` wrapper in the HTML pipeline.
    Pre,
    /// Skipped or flattened container; the cursor is left alone.
    Transparent,
}

/// Verbatim capture of an uninterpretable HTML element and its descendants.
#[derive(Debug, Clone)]
struct Capture {
    node: NodeId,
    depth: usize,
}

#[derive(Debug, Clone, Default)]
pub struct BuilderOptions {
    /// Schemes treated as external links. `None` accepts any scheme.
    pub known_url_schemes: Option<Vec<String>>,
}

pub struct TreeBuilder {
    tree: DocTree,
    cursor: NodeId,
    sections: SectionStack,
    frames: Vec<Frame>,
    implicit_paragraph: Option<NodeId>,
    capture: Option<Capture>,
    in_pre: usize,
    line: Option<usize>,
    options: BuilderOptions,
}

impl TreeBuilder {
    pub fn new(source: impl Into<String>, options: BuilderOptions) -> Self {
        Self::with_tree(DocTree::new(source), options)
    }

    /// Adopt a tree that already carries diagnostics from the event source.
    pub fn with_tree(tree: DocTree, options: BuilderOptions) -> Self {
        let root = tree.root();
        Self {
            tree,
            cursor: root,
            sections: SectionStack::new(root),
            frames: Vec::new(),
            implicit_paragraph: None,
            capture: None,
            in_pre: 0,
            line: None,
            options,
        }
    }

    pub fn build(mut self, events: impl IntoIterator<Item = Located>) -> DocTree {
        for located in events {
            self.feed(located);
        }
        self.finish()
    }

    pub fn feed(&mut self, located: Located) {
        if located.line.is_some() {
            self.line = located.line;
        }
        if self.capture.is_some() {
            self.capture_event(located.event);
            return;
        }
        match located.event {
            Event::Enter(tag) => self.enter(tag),
            Event::Leaf(leaf) => self.leaf(leaf),
            Event::Exit(kind) => self.exit(kind),
        }
    }

    pub fn finish(self) -> DocTree {
        if !self.frames.is_empty() {
            log::debug!(
                "{}: event stream ended with {} open containers",
                self.tree.source(),
                self.frames.len()
            );
        }
        self.tree
    }

    pub fn cursor(&self) -> NodeId {
        self.cursor
    }

    fn enter(&mut self, tag: Tag) {
        if self.tree.kind(self.cursor).is_text_sink() {
            self.frames.push(Frame::Transparent);
            return;
        }
        if tag.is_block() {
            self.close_implicit_paragraph();
        }

        match tag {
            Tag::Document => self.frames.push(Frame::Transparent),
            Tag::Heading { level, id } => self.enter_heading(level, id),
            Tag::Paragraph => self.open(NodeKind::Paragraph),
            Tag::Emphasis => self.open_inline(NodeKind::Emphasis),
            Tag::Strong => self.open_inline(NodeKind::Strong),
            Tag::InlineCode => self.open_inline(NodeKind::Literal {
                text: String::new(),
            }),
            Tag::Link {
                destination,
                title,
                autolink,
            } => self.enter_link(destination, title, autolink),
            Tag::Image {
                destination,
                title,
                alt,
            } => self.open_inline(NodeKind::Image {
                uri: destination,
                alt: alt.unwrap_or_default(),
                title,
            }),
            Tag::List { ordered } => self.open(if ordered {
                NodeKind::EnumeratedList
            } else {
                NodeKind::BulletList
            }),
            Tag::Item => self.open_container(NodeKind::ListItem),
            Tag::BlockQuote => self.open(NodeKind::BlockQuote),
            Tag::CodeBlock { language } => {
                let restore = self.cursor;
                let node = self.add(NodeKind::LiteralBlock {
                    text: String::new(),
                    language,
                });
                self.frames.push(Frame::CodeBlock { node, restore });
                self.cursor = node;
            }
            Tag::HtmlBlock => self.open(NodeKind::raw_html("")),
            Tag::Table => self.open(NodeKind::Table),
            Tag::TableHead => self.open(NodeKind::TableHead),
            Tag::TableBody => self.open(NodeKind::TableBody),
            Tag::TableRow => self.open(NodeKind::Row),
            Tag::TableCell => self.open_container(NodeKind::Entry),
            Tag::Element { name, attrs } => self.enter_element(name, attrs),
            Tag::Unsupported(name) => {
                self.warn(
                    DiagnosticKind::UnsupportedConstruct,
                    format!("unsupported construct skipped: {name}"),
                );
                self.frames.push(Frame::Transparent);
            }
        }
    }

    fn leaf(&mut self, leaf: Leaf) {
        if self.tree.kind(self.cursor).is_text_sink() {
            match &leaf {
                Leaf::Text(text) | Leaf::Code(text) | Leaf::Html(text) => {
                    self.tree.kind_mut(self.cursor).push_text(text)
                }
                Leaf::SoftBreak | Leaf::HardBreak => {
                    self.tree.kind_mut(self.cursor).push_text("\n")
                }
                Leaf::Rule | Leaf::Unsupported(_) => {}
            }
            return;
        }

        match leaf {
            Leaf::Text(text) => {
                if text.trim().is_empty() && self.at_block_level() {
                    return;
                }
                self.ensure_inline_context();
                self.add(NodeKind::text(text));
            }
            Leaf::Code(text) => {
                self.ensure_inline_context();
                self.add(NodeKind::Literal { text });
            }
            Leaf::Html(markup) => {
                if markup.trim().is_empty() && self.at_block_level() {
                    return;
                }
                self.ensure_inline_context();
                self.add(NodeKind::raw_html(markup));
            }
            Leaf::SoftBreak => {
                self.ensure_inline_context();
                self.add(NodeKind::text("\n"));
            }
            Leaf::HardBreak => {
                self.ensure_inline_context();
                self.add(NodeKind::raw_html("<br />"));
            }
            Leaf::Rule => {
                self.close_implicit_paragraph();
                self.add(NodeKind::Transition);
            }
            Leaf::Unsupported(name) => self.warn(
                DiagnosticKind::UnsupportedConstruct,
                format!("unsupported construct skipped: {name}"),
            ),
        }
    }

    fn exit(&mut self, kind: TagKind) {
        let Some(frame) = self.frames.pop() else {
            log::debug!("{}: unmatched exit {kind:?} ignored", self.tree.source());
            return;
        };

        match frame {
            Frame::Restore(restore) => self.cursor = restore,
            Frame::Heading {
                section,
                title,
                explicit_id,
            } => self.finish_heading(section, title, explicit_id),
            Frame::CodeBlock { node, restore } => {
                if let NodeKind::LiteralBlock { text, .. } = self.tree.kind_mut(node) {
                    if text.ends_with('\n') {
                        text.pop();
                    }
                }
                self.cursor = restore;
            }
            Frame::Container { restore } => {
                self.implicit_paragraph = None;
                self.cursor = restore;
            }
            Frame::Pre => self.in_pre = self.in_pre.saturating_sub(1),
            Frame::Transparent => {}
        }
    }

    fn enter_heading(&mut self, level: u8, explicit_id: Option<String>) {
        if !self.tree.kind(self.cursor).is_section_like() {
            self.warn(
                DiagnosticKind::UnsupportedConstruct,
                format!("heading level {level} inside a container rendered as strong text"),
            );
            let restore = self.cursor;
            let paragraph = self.add(NodeKind::Paragraph);
            let strong = self.tree.append(paragraph, NodeKind::Strong);
            self.tree.set_line(strong, self.line);
            self.frames.push(Frame::Restore(restore));
            self.cursor = strong;
            return;
        }

        let parent = self.sections.reconcile(level);
        let section = self.tree.append(
            parent,
            NodeKind::Section {
                level,
                ids: Vec::new(),
                names: Vec::new(),
            },
        );
        self.tree.set_line(section, self.line);
        self.sections.push(level, section);

        let title = self.tree.append(section, NodeKind::Title);
        self.tree.set_line(title, self.line);
        self.frames.push(Frame::Heading {
            section,
            title,
            explicit_id,
        });
        self.cursor = title;
    }

    fn finish_heading(&mut self, section: NodeId, title: NodeId, explicit_id: Option<String>) {
        let text = self.tree.astext(title);
        let name = normalize_name(&text);
        let requested = match explicit_id {
            Some(id) if id.trim().is_empty() => {
                self.warn(
                    DiagnosticKind::MalformedAttributes,
                    format!("heading \"{text}\" has an empty identifier"),
                );
                String::new()
            }
            Some(id) => id,
            None => make_id(&text),
        };

        let registered = self.tree.register_target(section, &requested, &name);
        if let Some(original) = registered.collided_with {
            let diagnostic = Diagnostic::info(
                DiagnosticKind::DuplicateIdentifier,
                format!(
                    "duplicate section identifier \"{original}\" renamed to \"{}\"",
                    registered.id
                ),
                self.tree.source(),
            )
            .with_line(self.tree.effective_line(section));
            self.tree.diagnostics_mut().push(diagnostic);
        }
        self.cursor = section;
    }

    fn enter_link(&mut self, destination: String, title: Option<String>, autolink: bool) {
        self.ensure_inline_context();
        let restore = self.cursor;
        let reference = NodeKind::Reference {
            uri: destination.clone(),
            title: title.clone(),
        };

        let node = match classify(&destination, self.options.known_url_schemes.as_deref()) {
            LinkTarget::External | LinkTarget::SamePage => self.add(reference),
            LinkTarget::CrossRef { target } => {
                let wrapper = self.add(NodeKind::PendingCrossRef {
                    target,
                    explicit_title: !autolink,
                    title,
                });
                let node = self.tree.append(wrapper, reference);
                self.tree.set_line(node, self.line);
                node
            }
        };
        self.frames.push(Frame::Restore(restore));
        self.cursor = node;
    }

    fn enter_element(&mut self, name: String, attrs: Vec<(String, String)>) {
        match html::interpret(&name, &attrs, self.in_pre > 0) {
            Interpretation::Semantic(tag) => self.enter(tag),
            Interpretation::Degraded(tag, problem) => {
                self.warn(DiagnosticKind::MalformedAttributes, format!("<{name}>: {problem}"));
                self.enter(tag);
            }
            Interpretation::Leaf(leaf) => {
                self.leaf(leaf);
                self.frames.push(Frame::Transparent);
            }
            Interpretation::Pre => {
                self.close_implicit_paragraph();
                self.in_pre += 1;
                self.frames.push(Frame::Pre);
            }
            Interpretation::Raw => {
                let node = self.add(NodeKind::raw_html(html::start_tag(&name, &attrs)));
                self.capture = Some(Capture { node, depth: 1 });
            }
        }
    }

    /// Serialize events verbatim into the capturing raw node.
    fn capture_event(&mut self, event: Event) {
        let Some(capture) = self.capture.as_mut() else {
            return;
        };
        let node = capture.node;
        let markup = match event {
            Event::Enter(Tag::Element { name, attrs }) => {
                capture.depth += 1;
                html::start_tag(&name, &attrs)
            }
            Event::Exit(TagKind::Element(name)) => {
                capture.depth -= 1;
                if capture.depth == 0 {
                    self.capture = None;
                }
                if crate::source::html::is_void_element(&name) {
                    String::new()
                } else {
                    format!("</{name}>")
                }
            }
            Event::Leaf(Leaf::Text(text)) => html_escape::encode_text(&text).into_owned(),
            Event::Leaf(Leaf::Html(markup)) => markup,
            other => {
                log::debug!("non-element event inside raw capture dropped: {other:?}");
                String::new()
            }
        };
        self.tree.kind_mut(node).push_text(&markup);
    }

    /// Append at the cursor and descend into the new node.
    fn open(&mut self, kind: NodeKind) {
        let restore = self.cursor;
        let node = self.add(kind);
        self.frames.push(Frame::Restore(restore));
        self.cursor = node;
    }

    fn open_inline(&mut self, kind: NodeKind) {
        self.ensure_inline_context();
        self.open(kind);
    }

    fn open_container(&mut self, kind: NodeKind) {
        let restore = self.cursor;
        let node = self.add(kind);
        self.frames.push(Frame::Container { restore });
        self.cursor = node;
    }

    /// Inline content directly in a list item or table cell is wrapped in a
    /// paragraph that stays open until a block arrives or the container ends.
    fn ensure_inline_context(&mut self) {
        if matches!(self.tree.kind(self.cursor), NodeKind::ListItem | NodeKind::Entry) {
            let paragraph = self.add(NodeKind::Paragraph);
            self.implicit_paragraph = Some(paragraph);
            self.cursor = paragraph;
        }
    }

    fn close_implicit_paragraph(&mut self) {
        if let Some(paragraph) = self.implicit_paragraph {
            if self.cursor == paragraph {
                if let Some(parent) = self.tree.parent(paragraph) {
                    self.cursor = parent;
                }
                self.implicit_paragraph = None;
            }
        }
    }

    fn at_block_level(&self) -> bool {
        matches!(
            self.tree.kind(self.cursor),
            NodeKind::Document { .. }
                | NodeKind::Section { .. }
                | NodeKind::BulletList
                | NodeKind::EnumeratedList
                | NodeKind::ListItem
                | NodeKind::BlockQuote
                | NodeKind::Table
                | NodeKind::TableHead
                | NodeKind::TableBody
                | NodeKind::Row
                | NodeKind::Entry
        )
    }

    fn add(&mut self, kind: NodeKind) -> NodeId {
        let node = self.tree.append(self.cursor, kind);
        self.tree.set_line(node, self.line);
        node
    }

    fn warn(&mut self, kind: DiagnosticKind, message: String) {
        let diagnostic = Diagnostic::warning(kind, message, self.tree.source()).with_line(self.line);
        self.tree.diagnostics_mut().push(diagnostic);
    }
}
