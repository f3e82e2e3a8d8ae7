//! Lists of links rewritten into table-of-contents instructions.

use super::refs::{RefContext, Resolution};
use super::config::TransformConfig;
use crate::host::Host;
use crate::instruction::Instruction;
use crate::tree::{DocTree, NodeId, NodeKind};

/// The single reference a TOC-shaped list item holds, unwrapping a
/// `PendingCrossRef` around it.
fn item_reference(tree: &DocTree, item: NodeId) -> Option<NodeId> {
    let [paragraph] = tree.children(item) else {
        return None;
    };
    if !matches!(tree.kind(*paragraph), NodeKind::Paragraph) {
        return None;
    }
    let [inner] = tree.children(*paragraph) else {
        return None;
    };
    match tree.kind(*inner) {
        NodeKind::Reference { .. } => Some(*inner),
        NodeKind::PendingCrossRef { .. } => match tree.children(*inner) {
            [reference] if matches!(tree.kind(*reference), NodeKind::Reference { .. }) => {
                Some(*reference)
            }
            _ => None,
        },
        _ => None,
    }
}

/// Build the `toctree` instruction for `list`, or `None` when any item is
/// not a single usable cross-document link.
pub(crate) fn toc_instruction(
    tree: &DocTree,
    list: NodeId,
    context: &RefContext,
    config: &TransformConfig,
    host: &dyn Host,
) -> Option<Instruction> {
    let numbered = match tree.kind(list) {
        NodeKind::BulletList => false,
        NodeKind::EnumeratedList => true,
        _ => return None,
    };

    if let Some(scope) = &config.auto_toc_tree_section {
        let section = tree.nearest_section(list)?;
        let title = tree.section_title(section)?;
        if tree.astext(title) != *scope {
            return None;
        }
    }

    let mut entries = Vec::new();
    for &item in tree.children(list) {
        let reference = item_reference(tree, item)?;
        let NodeKind::Reference { uri, .. } = tree.kind(reference) else {
            return None;
        };
        let title = tree.astext(reference);
        let resolution = context.resolve(uri, config, host);
        let target = match &resolution {
            Resolution::Uri(resolved) if resolved.starts_with('#') => return None,
            _ => resolution.target(),
        };
        if title.is_empty() {
            return None;
        }
        entries.push((title, target));
    }

    if entries.is_empty() {
        return None;
    }
    Some(Instruction::toctree(&entries, numbered))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::StandaloneHost;
    use crate::parser::{ParserOptions, parse};
    use crate::tests::create_test_project;

    fn first_list(tree: &DocTree) -> NodeId {
        tree.find(NodeKind::is_list).unwrap()
    }

    #[test]
    fn list_of_document_links_becomes_toctree() {
        let project = create_test_project(&[("guide.md", "# Guide"), ("api.md", "# API")]);
        let host = StandaloneHost::new(project.path());
        let context = RefContext::new(project.path(), "index.md");
        let tree = parse(
            "1. [Guide](guide.md)\n2. [Python](https://www.python.org/)\n3. [API](api.md)\n",
            "index.md",
            &ParserOptions::default(),
        );

        let instruction =
            toc_instruction(&tree, first_list(&tree), &context, &TransformConfig::default(), &host);

        assert_eq!(
            instruction,
            Some(Instruction::toctree(
                &[
                    ("Guide".into(), "guide".into()),
                    ("Python".into(), "https://www.python.org/".into()),
                    ("API".into(), "api".into()),
                ],
                true
            ))
        );
    }

    #[test]
    fn anchor_entries_disable_the_toc() {
        let project = create_test_project(&[("guide.md", "# Guide")]);
        let host = StandaloneHost::new(project.path());
        let context = RefContext::new(project.path(), "index.md");
        let tree = parse(
            "* [Guide](guide.md)\n* [Below](#below)\n",
            "index.md",
            &ParserOptions::default(),
        );

        assert_eq!(
            toc_instruction(&tree, first_list(&tree), &context, &TransformConfig::default(), &host),
            None
        );
    }

    #[test]
    fn extra_text_disables_the_toc() {
        let project = create_test_project(&[("guide.md", "# Guide")]);
        let host = StandaloneHost::new(project.path());
        let context = RefContext::new(project.path(), "index.md");
        let tree = parse("* [Guide](guide.md) and more\n", "index.md", &ParserOptions::default());

        assert_eq!(
            toc_instruction(&tree, first_list(&tree), &context, &TransformConfig::default(), &host),
            None
        );
    }

    #[test]
    fn scoped_section_must_match_title() {
        let project = create_test_project(&[("guide.md", "# Guide")]);
        let host = StandaloneHost::new(project.path());
        let context = RefContext::new(project.path(), "index.md");
        let config = TransformConfig {
            auto_toc_tree_section: Some("Contents".into()),
            ..TransformConfig::default()
        };
        let tree = parse(
            "# Other\n\n* [Guide](guide.md)\n\n# Contents\n\n* [Guide](guide.md)\n",
            "index.md",
            &ParserOptions::default(),
        );
        let lists = tree.find_all(NodeKind::is_list);

        assert_eq!(toc_instruction(&tree, lists[0], &context, &config, &host), None);
        assert!(toc_instruction(&tree, lists[1], &context, &config, &host).is_some());
    }
}
