//! Disambiguation of raw HTML elements into semantic tags.
//!
//! An element maps to a semantic node only when its attribute set is one the
//! node can represent. `<p class="note">` carries information a paragraph has
//! no slot for, so it is passed through raw instead of silently losing the
//! class.

use crate::events::{Leaf, Tag};
use crate::source::html::is_void_element;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Interpretation {
    Semantic(Tag),
    /// Semantic, but an expected attribute was missing and defaulted.
    Degraded(Tag, String),
    Leaf(Leaf),
    /// `<pre>`: no node of its own, marks code context for its children.
    Pre,
    /// Not representable; the element and its content pass through verbatim.
    Raw,
}

pub(crate) fn interpret(name: &str, attrs: &[(String, String)], in_pre: bool) -> Interpretation {
    let bare = attrs.is_empty();
    let attr = |key: &str| {
        attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    };

    let tag = match name {
        "p" if bare => Tag::Paragraph,
        "ul" if bare => Tag::List { ordered: false },
        "ol" if bare => Tag::List { ordered: true },
        "li" if bare => Tag::Item,
        "blockquote" if bare => Tag::BlockQuote,
        "em" if bare => Tag::Emphasis,
        "strong" if bare => Tag::Strong,
        "table" if bare => Tag::Table,
        "thead" if bare => Tag::TableHead,
        "tbody" if bare => Tag::TableBody,
        "tr" if bare => Tag::TableRow,
        "th" | "td" if bare => Tag::TableCell,
        "hr" if bare => return Interpretation::Leaf(Leaf::Rule),
        "br" if bare => return Interpretation::Leaf(Leaf::HardBreak),
        "pre" if bare => return Interpretation::Pre,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" if has_only(attrs, &["id"]) => {
            let level = name[1..].parse().unwrap_or(1);
            Tag::Heading {
                level,
                id: attr("id"),
            }
        }
        "a" if has_only(attrs, &["href", "title"]) => match attr("href") {
            Some(destination) => Tag::Link {
                destination,
                title: attr("title").filter(|t| !t.is_empty()),
                autolink: false,
            },
            None => return Interpretation::Raw,
        },
        "img" if has_only(attrs, &["src", "alt", "title"]) => {
            let tag = Tag::Image {
                destination: attr("src").unwrap_or_default(),
                title: attr("title").filter(|t| !t.is_empty()),
                alt: Some(attr("alt").unwrap_or_default()),
            };
            if attr("src").is_none() {
                return Interpretation::Degraded(tag, "image without src".to_string());
            }
            tag
        }
        "code" if in_pre && has_only(attrs, &["class"]) => Tag::CodeBlock {
            language: attr("class").and_then(|class| {
                class
                    .split_whitespace()
                    .find_map(|c| c.strip_prefix("language-"))
                    .map(str::to_string)
            }),
        },
        "code" if bare => Tag::InlineCode,
        _ => return Interpretation::Raw,
    };
    Interpretation::Semantic(tag)
}

fn has_only(attrs: &[(String, String)], allowed: &[&str]) -> bool {
    attrs.iter().all(|(k, _)| allowed.contains(&k.as_str()))
}

/// Serialize a start tag back to markup.
pub(crate) fn start_tag(name: &str, attrs: &[(String, String)]) -> String {
    let mut out = format!("<{name}");
    for (key, value) in attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&html_escape::encode_double_quoted_attribute(value));
        out.push('"');
    }
    if is_void_element(name) {
        out.push_str(" />");
    } else {
        out.push('>');
    }
    out
}
