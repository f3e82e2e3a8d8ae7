//! Literal blocks dispatched on their language.

use std::sync::LazyLock;

use regex::Regex;

use super::config::CodeBlockContext;
use crate::host::HostError;
use crate::instruction::Instruction;
use crate::tree::{NodeId, NodeKind};

pub(crate) const BUILTIN_LANGUAGES: &[&str] = &["eval_rst", "math"];

static LANGUAGE_KEY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\w-]+").expect("Invalid language key regex"));

type Builtin = fn(&mut CodeBlockContext<'_>, NodeId) -> Result<Option<Vec<NodeId>>, HostError>;

/// Registry key of an info string: its first word.
pub(crate) fn language_key(info: &str) -> &str {
    LANGUAGE_KEY.find(info).map_or(info, |m| m.as_str())
}

fn block_text(context: &CodeBlockContext<'_>, node: NodeId) -> String {
    match context.tree.kind(node) {
        NodeKind::LiteralBlock { text, .. } => text.clone(),
        _ => String::new(),
    }
}

fn math(context: &mut CodeBlockContext<'_>, node: NodeId) -> Result<Option<Vec<NodeId>>, HostError> {
    if !context.config.enable_math {
        return Ok(None);
    }
    let instruction = Instruction::math_block(&block_text(context, node));
    context
        .host
        .run_structural_instruction(context.tree, &instruction)
        .map(Some)
}

fn eval_rst(context: &mut CodeBlockContext<'_>, node: NodeId) -> Result<Option<Vec<NodeId>>, HostError> {
    if !context.config.enable_eval_rst {
        return Ok(None);
    }
    let text = block_text(context, node);
    let source = context.tree.source().to_string();
    context.host.parse_embedded(context.tree, &text, &source).map(Some)
}

fn builtin(key: &str) -> Option<Builtin> {
    match key {
        "math" => Some(math as Builtin),
        "eval_rst" => Some(eval_rst as Builtin),
        _ => None,
    }
}

/// Expand a literal block with a language. User transformers win over the
/// built-ins; unregistered languages become a `code-block` instruction.
pub(crate) fn expand(context: &mut CodeBlockContext<'_>, node: NodeId) -> Result<Option<Vec<NodeId>>, HostError> {
    let NodeKind::LiteralBlock {
        language: Some(language),
        text,
    } = context.tree.kind(node)
    else {
        return Ok(None);
    };
    let key = language_key(language).to_string();
    let text = text.clone();

    if let Some(transformer) = context.config.auto_code_block_transformers.get(&key).cloned() {
        log::debug!("{}: user transformer for `{key}`", context.tree.source());
        return transformer(context, node);
    }
    if let Some(transformer) = builtin(&key) {
        return transformer(context, node);
    }

    let instruction = Instruction::code_block(&key, &text);
    context
        .host
        .run_structural_instruction(context.tree, &instruction)
        .map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("rust", "rust")]
    #[case("python {linenos}", "python")]
    #[case("eval_rst", "eval_rst")]
    #[case("c++", "c")]
    #[case("{.weird}", "{.weird}")]
    fn keys_on_first_word(#[case] info: &str, #[case] expected: &str) {
        assert_eq!(language_key(info), expected);
    }
}
