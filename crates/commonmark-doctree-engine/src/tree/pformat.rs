//! Indented pseudo-XML rendering of a document tree.
//!
//! One element per line, children indented by four spaces, text content on
//! its own lines. Attribute values are escaped the same way element text is.

use std::fmt::Write;

use super::{DocTree, NodeId, NodeKind};
use crate::instruction::Instruction;

const INDENT: &str = "    ";

/// Render the whole tree.
pub fn pformat(tree: &DocTree) -> String {
    pformat_node(tree, tree.root())
}

/// Render the subtree rooted at `node`.
pub fn pformat_node(tree: &DocTree, node: NodeId) -> String {
    let mut out = String::new();
    write_node(tree, node, 0, &mut out);
    out
}

fn write_node(tree: &DocTree, node: NodeId, depth: usize, out: &mut String) {
    let pad = INDENT.repeat(depth);
    let kind = tree.kind(node);

    if let NodeKind::Text { content } = kind {
        write_text(content, &pad, out);
        return;
    }

    let attrs = attributes(kind);
    let _ = write!(out, "{pad}<{}", kind.tag_name());
    for (name, value) in &attrs {
        let _ = write!(out, " {name}=\"{}\"", escape(value));
    }
    out.push_str(">\n");

    let inner = INDENT.repeat(depth + 1);
    match kind {
        NodeKind::Literal { text } | NodeKind::LiteralBlock { text, .. } => {
            write_text(text, &inner, out);
        }
        NodeKind::RawPassthrough { content, .. } => write_text(content, &inner, out),
        NodeKind::Pending { instruction } => write_instruction(instruction, &inner, out),
        _ => {}
    }

    for &child in tree.children(node) {
        write_node(tree, child, depth + 1, out);
    }
}

fn write_text(text: &str, pad: &str, out: &mut String) {
    for line in text.split('\n') {
        let _ = writeln!(out, "{pad}{}", escape(line));
    }
}

fn write_instruction(instruction: &Instruction, pad: &str, out: &mut String) {
    match instruction {
        Instruction::Directive {
            name,
            arguments,
            options,
            content,
        } => {
            let _ = write!(out, "{pad}.. {name}::");
            for argument in arguments {
                let _ = write!(out, " {argument}");
            }
            out.push('\n');
            for (key, value) in options {
                let _ = writeln!(out, "{pad}{INDENT}:{key}: {value}");
            }
            if !content.is_empty() {
                out.push('\n');
                for line in content {
                    let _ = writeln!(out, "{pad}{INDENT}{line}");
                }
            }
        }
        Instruction::Role { name, content } => {
            let _ = writeln!(out, "{pad}:{name}:`{content}`");
        }
    }
}

fn attributes(kind: &NodeKind) -> Vec<(&'static str, String)> {
    let mut attrs = Vec::new();
    match kind {
        NodeKind::Document { source } => attrs.push(("source", source.clone())),
        NodeKind::Section { level, ids, names } => {
            attrs.push(("ids", ids.join(" ")));
            attrs.push(("level", level.to_string()));
            attrs.push(("names", names.join(" ")));
        }
        NodeKind::LiteralBlock {
            language: Some(language),
            ..
        } => attrs.push(("language", language.clone())),
        NodeKind::Reference { uri, title } => {
            attrs.push(("refuri", uri.clone()));
            if let Some(title) = title {
                attrs.push(("title", title.clone()));
            }
        }
        NodeKind::PendingCrossRef {
            target,
            explicit_title,
            title,
        } => {
            attrs.push(("refexplicit", explicit_title.to_string()));
            attrs.push(("reftarget", target.clone()));
            if let Some(title) = title {
                attrs.push(("title", title.clone()));
            }
        }
        NodeKind::Image { uri, alt, title } => {
            attrs.push(("alt", alt.clone()));
            if let Some(title) = title {
                attrs.push(("title", title.clone()));
            }
            attrs.push(("uri", uri.clone()));
        }
        NodeKind::RawPassthrough { format, .. } => attrs.push(("format", format.clone())),
        NodeKind::Pending { instruction } => attrs.push(("instruction", instruction.name().to_string())),
        _ => {}
    }
    attrs
}

fn escape(value: &str) -> String {
    html_escape::encode_double_quoted_attribute(value).into_owned()
}
