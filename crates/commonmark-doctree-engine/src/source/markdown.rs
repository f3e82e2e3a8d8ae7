//! Markdown event source backed by pulldown-cmark.

use pulldown_cmark::{CodeBlockKind, Event as MdEvent, LinkType, Options, Parser, Tag as MdTag, TagEnd};

use crate::events::{Event, Leaf, Located, Tag, TagKind};

/// Byte offset to 1-based line lookup.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { starts }
    }

    pub fn line_of(&self, offset: usize) -> usize {
        match self.starts.binary_search(&offset) {
            Ok(i) => i + 1,
            Err(i) => i,
        }
    }
}

pub(crate) fn parser_options(tables: bool) -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    if tables {
        options.insert(Options::ENABLE_TABLES);
    }
    options
}

/// Adapt pulldown-cmark's stream into located events wrapped in a document.
///
/// pulldown-cmark has no table body container and puts header cells directly
/// under the head, so both are synthesized here to keep rows uniform.
pub fn markdown_events(text: &str, tables: bool) -> Vec<Located> {
    let index = LineIndex::new(text);
    let mut events = vec![Located::enter(Tag::Document).at(1)];
    let mut in_table_body = false;

    for (event, range) in Parser::new_ext(text, parser_options(tables)).into_offset_iter() {
        let line = index.line_of(range.start);
        let at = |event: Event| Located::new(event, Some(line));

        match event {
            MdEvent::Start(MdTag::TableHead) => {
                events.push(at(Event::Enter(Tag::TableHead)));
                events.push(at(Event::Enter(Tag::TableRow)));
            }
            MdEvent::End(TagEnd::TableHead) => {
                events.push(at(Event::Exit(TagKind::TableRow)));
                events.push(at(Event::Exit(TagKind::TableHead)));
            }
            MdEvent::Start(MdTag::TableRow) if !in_table_body => {
                in_table_body = true;
                events.push(at(Event::Enter(Tag::TableBody)));
                events.push(at(Event::Enter(Tag::TableRow)));
            }
            MdEvent::End(TagEnd::Table) => {
                if in_table_body {
                    in_table_body = false;
                    events.push(at(Event::Exit(TagKind::TableBody)));
                }
                events.push(at(Event::Exit(TagKind::Table)));
            }
            MdEvent::Start(tag) => events.push(at(Event::Enter(convert_tag(tag)))),
            MdEvent::End(tag) => events.push(at(Event::Exit(convert_end(tag)))),
            MdEvent::Text(text) => events.push(at(Event::Leaf(Leaf::Text(text.into_string())))),
            MdEvent::Code(code) => events.push(at(Event::Leaf(Leaf::Code(code.into_string())))),
            MdEvent::Html(html) | MdEvent::InlineHtml(html) => {
                events.push(at(Event::Leaf(Leaf::Html(html.into_string()))))
            }
            MdEvent::SoftBreak => events.push(at(Event::Leaf(Leaf::SoftBreak))),
            MdEvent::HardBreak => events.push(at(Event::Leaf(Leaf::HardBreak))),
            MdEvent::Rule => events.push(at(Event::Leaf(Leaf::Rule))),
            other => events.push(at(Event::Leaf(Leaf::Unsupported(variant_name(&other))))),
        }
    }

    events.push(Located::exit(TagKind::Document));
    events
}

fn convert_tag(tag: MdTag<'_>) -> Tag {
    match tag {
        MdTag::Paragraph => Tag::Paragraph,
        MdTag::Heading { level, id, .. } => Tag::Heading {
            level: level as u8,
            id: id.map(|id| id.into_string()),
        },
        MdTag::BlockQuote { .. } => Tag::BlockQuote,
        MdTag::CodeBlock(CodeBlockKind::Fenced(info)) => {
            let info = info.trim();
            Tag::CodeBlock {
                language: (!info.is_empty()).then(|| info.to_string()),
            }
        }
        MdTag::CodeBlock(CodeBlockKind::Indented) => Tag::CodeBlock { language: None },
        MdTag::HtmlBlock => Tag::HtmlBlock,
        MdTag::List(start) => Tag::List {
            ordered: start.is_some(),
        },
        MdTag::Item => Tag::Item,
        MdTag::Table(_) => Tag::Table,
        MdTag::TableHead => Tag::TableHead,
        MdTag::TableRow => Tag::TableRow,
        MdTag::TableCell => Tag::TableCell,
        MdTag::Emphasis => Tag::Emphasis,
        MdTag::Strong => Tag::Strong,
        MdTag::Link {
            link_type,
            dest_url,
            title,
            ..
        } => {
            let autolink = matches!(link_type, LinkType::Autolink | LinkType::Email);
            let mut destination = dest_url.into_string();
            if link_type == LinkType::Email && !destination.starts_with("mailto:") {
                destination.insert_str(0, "mailto:");
            }
            Tag::Link {
                destination,
                title: non_empty(title.into_string()),
                autolink,
            }
        }
        MdTag::Image {
            dest_url, title, ..
        } => Tag::Image {
            destination: dest_url.into_string(),
            title: non_empty(title.into_string()),
            alt: None,
        },
        other => Tag::Unsupported(variant_name(&other)),
    }
}

fn convert_end(tag: TagEnd) -> TagKind {
    match tag {
        TagEnd::Paragraph => TagKind::Paragraph,
        TagEnd::Heading(level) => TagKind::Heading(level as u8),
        TagEnd::BlockQuote { .. } => TagKind::BlockQuote,
        TagEnd::CodeBlock => TagKind::CodeBlock,
        TagEnd::HtmlBlock => TagKind::HtmlBlock,
        TagEnd::List { .. } => TagKind::List,
        TagEnd::Item => TagKind::Item,
        TagEnd::Table => TagKind::Table,
        TagEnd::TableHead => TagKind::TableHead,
        TagEnd::TableRow => TagKind::TableRow,
        TagEnd::TableCell => TagKind::TableCell,
        TagEnd::Emphasis => TagKind::Emphasis,
        TagEnd::Strong => TagKind::Strong,
        TagEnd::Link => TagKind::Link,
        TagEnd::Image => TagKind::Image,
        other => TagKind::Unsupported(variant_name(&other)),
    }
}

/// Lowercase variant name from a `Debug` rendering, so a start tag and its end
/// tag agree (`Strikethrough` and `FootnoteDefinition("a")` both work).
fn variant_name(value: &impl std::fmt::Debug) -> String {
    let debug = format!("{value:?}");
    debug
        .split(|c: char| !c.is_alphanumeric())
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}
