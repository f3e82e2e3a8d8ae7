//! HTML event source: markdown rendered to HTML, then tokenized back into
//! element events.

use pulldown_cmark::{Event as MdEvent, Parser, Tag as MdTag, TagEnd, html};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event as XmlEvent};

use super::markdown::parser_options;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::events::{Leaf, Located, Tag, TagKind};
use crate::tree::make_id;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements that never have content or a closing tag.
pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name.to_ascii_lowercase().as_str())
}

/// Render markdown to HTML, giving every heading without an explicit id a
/// slug derived from its text.
pub fn render_html(text: &str, tables: bool) -> String {
    let mut events: Vec<MdEvent<'_>> = Parser::new_ext(text, parser_options(tables)).collect();

    let mut i = 0;
    while i < events.len() {
        if let MdEvent::Start(MdTag::Heading { id: None, .. }) = &events[i] {
            let mut title = String::new();
            for event in &events[i + 1..] {
                match event {
                    MdEvent::End(TagEnd::Heading(_)) => break,
                    MdEvent::Text(t) | MdEvent::Code(t) => title.push_str(t),
                    _ => {}
                }
            }
            let slug = make_id(&title);
            if let MdEvent::Start(MdTag::Heading { id, .. }) = &mut events[i] {
                if !slug.is_empty() {
                    *id = Some(slug.into());
                }
            }
        }
        i += 1;
    }

    let mut out = String::new();
    html::push_html(&mut out, events.into_iter());
    out
}

/// Markdown through the HTML pipeline into balanced element events.
pub fn html_pipeline_events(text: &str, tables: bool, source: &str, diagnostics: &mut Diagnostics) -> Vec<Located> {
    html_events(&render_html(text, tables), source, diagnostics)
}

/// Tokenize an HTML fragment into a balanced event stream wrapped in a
/// document.
///
/// Void elements close immediately, end tags without a matching open element
/// are dropped, and elements still open at the end are closed. If the
/// tokenizer fails, the rest of the input becomes one raw-html leaf.
pub fn html_events(markup: &str, source: &str, diagnostics: &mut Diagnostics) -> Vec<Located> {
    let mut reader = Reader::from_str(markup);
    reader.config_mut().check_end_names = false;

    let mut events = vec![Located::enter(Tag::Document)];
    let mut open: Vec<String> = Vec::new();

    loop {
        let position = reader.buffer_position() as usize;
        match reader.read_event() {
            Ok(XmlEvent::Start(e)) => {
                let (name, attrs) = element(&e);
                let void = is_void_element(&name);
                events.push(Located::enter(Tag::Element {
                    name: name.clone(),
                    attrs,
                }));
                if void {
                    events.push(Located::exit(TagKind::Element(name)));
                } else {
                    open.push(name);
                }
            }
            Ok(XmlEvent::Empty(e)) => {
                let (name, attrs) = element(&e);
                events.push(Located::enter(Tag::Element {
                    name: name.clone(),
                    attrs,
                }));
                events.push(Located::exit(TagKind::Element(name)));
            }
            Ok(XmlEvent::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_lowercase();
                if let Some(depth) = open.iter().rposition(|n| *n == name) {
                    while open.len() > depth {
                        if let Some(inner) = open.pop() {
                            events.push(Located::exit(TagKind::Element(inner)));
                        }
                    }
                } else {
                    log::debug!("{source}: dropping stray end tag </{name}>");
                }
            }
            Ok(XmlEvent::Text(e)) => {
                let raw = String::from_utf8_lossy(&e.into_inner()).into_owned();
                let decoded = html_escape::decode_html_entities(&raw).into_owned();
                if !decoded.is_empty() {
                    events.push(Located::text(decoded));
                }
            }
            Ok(XmlEvent::CData(e)) => {
                let raw = String::from_utf8_lossy(&e.into_inner()).into_owned();
                events.push(Located::text(raw));
            }
            Ok(XmlEvent::Comment(e)) => {
                let raw = String::from_utf8_lossy(&e.into_inner()).into_owned();
                events.push(Located::leaf(Leaf::Html(format!("<!--{raw}-->"))));
            }
            Ok(XmlEvent::Eof) => break,
            Ok(other) => {
                let end = reader.buffer_position() as usize;
                let raw = markup.get(position..end).unwrap_or_default();
                log::debug!("{source}: passing through {other:?}");
                events.push(Located::leaf(Leaf::Html(raw.to_string())));
            }
            Err(err) => {
                diagnostics.push(Diagnostic::warning(
                    DiagnosticKind::MalformedMarkup,
                    format!("HTML tokenizer failed at byte {position}: {err}; passing the rest through"),
                    source,
                ));
                let rest = markup.get(position..).unwrap_or_default();
                if !rest.is_empty() {
                    events.push(Located::leaf(Leaf::Html(rest.to_string())));
                }
                break;
            }
        }
    }

    while let Some(name) = open.pop() {
        events.push(Located::exit(TagKind::Element(name)));
    }
    events.push(Located::exit(TagKind::Document));
    events
}

fn element(e: &BytesStart<'_>) -> (String, Vec<(String, String)>) {
    let name = String::from_utf8_lossy(e.name().as_ref()).to_lowercase();
    let attrs = e
        .html_attributes()
        .filter_map(Result::ok)
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_lowercase();
            let raw = String::from_utf8_lossy(&attr.value).into_owned();
            (key, html_escape::decode_html_entities(&raw).into_owned())
        })
        .collect();
    (name, attrs)
}
