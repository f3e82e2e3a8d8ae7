use std::path::Path;
use std::sync::Arc;
use std::thread;

use commonmark_doctree_engine::tree::pformat::{pformat, pformat_node};
use commonmark_doctree_engine::{
    DocTree, Host, HostError, Instruction, NodeId, NodeKind, ParserOptions, StandaloneHost,
    TransformConfig, TransformError, apply, parse,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (path, content) in files {
        let path = dir.path().join(path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }
    dir
}

/// Standalone host that also records everything the pass asked of it.
struct RecordingHost {
    inner: StandaloneHost,
    instructions: Vec<Instruction>,
    embedded: Vec<String>,
}

impl RecordingHost {
    fn new(root: &Path) -> Self {
        Self {
            inner: StandaloneHost::new(root),
            instructions: Vec::new(),
            embedded: Vec::new(),
        }
    }
}

impl Host for RecordingHost {
    fn resolve_local_document(&self, path: &Path) -> bool {
        self.inner.resolve_local_document(path)
    }

    fn run_structural_instruction(
        &mut self,
        tree: &mut DocTree,
        instruction: &Instruction,
    ) -> Result<Vec<NodeId>, HostError> {
        self.instructions.push(instruction.clone());
        self.inner.run_structural_instruction(tree, instruction)
    }

    fn parse_embedded(
        &mut self,
        tree: &mut DocTree,
        text: &str,
        source: &str,
    ) -> Result<Vec<NodeId>, HostError> {
        self.embedded.push(text.to_string());
        self.inner.parse_embedded(tree, text, source)
    }

    fn note_target(&mut self, tree: &DocTree, node: NodeId) {
        self.inner.note_target(tree, node)
    }
}

/// Refuses every instruction.
struct FailingHost;

impl Host for FailingHost {
    fn resolve_local_document(&self, _path: &Path) -> bool {
        false
    }

    fn run_structural_instruction(
        &mut self,
        _tree: &mut DocTree,
        instruction: &Instruction,
    ) -> Result<Vec<NodeId>, HostError> {
        Err(HostError::Instruction {
            name: instruction.name().to_string(),
            message: "not available".to_string(),
        })
    }

    fn parse_embedded(
        &mut self,
        _tree: &mut DocTree,
        _text: &str,
        source: &str,
    ) -> Result<Vec<NodeId>, HostError> {
        Err(HostError::Embedded {
            source_id: source.to_string(),
            message: "not available".to_string(),
        })
    }

    fn note_target(&mut self, _tree: &DocTree, _node: NodeId) {}
}

fn run(text: &str, dir: &TempDir, config: &TransformConfig) -> (DocTree, RecordingHost) {
    let mut tree = parse(text, "index.md", &ParserOptions::default());
    let mut host = RecordingHost::new(dir.path());
    apply(&mut tree, &mut host, config, dir.path()).unwrap();
    (tree, host)
}

#[test]
fn links_to_documents_become_doc_roles() {
    let dir = project(&[("guide.md", "# Guide")]);
    let (tree, host) = run("[Guide](guide.md)", &dir, &TransformConfig::default());

    assert_eq!(host.instructions, vec![Instruction::role("doc", "Guide <guide>")]);
    assert!(tree.find(|k| matches!(k, NodeKind::PendingCrossRef { .. })).is_none());
    insta::assert_snapshot!(pformat(&tree), @r#"
    <document source="index.md">
        <paragraph>
            <pending instruction="doc">
                :doc:`Guide <guide>`
    "#);
}

#[test]
fn missing_documents_keep_their_link() {
    let dir = project(&[]);
    let (tree, host) = run("[Gone](gone.md)", &dir, &TransformConfig::default());

    assert!(host.instructions.is_empty());
    assert!(tree.find(|k| matches!(k, NodeKind::PendingCrossRef { .. })).is_some());
}

#[test]
fn lists_of_document_links_become_toctrees() {
    let dir = project(&[("guide.md", "# Guide"), ("api/index.md", "# API")]);
    let (tree, host) = run(
        "# Contents\n\n* [Guide](guide.md)\n* [API](api/index.md#top)\n",
        &dir,
        &TransformConfig::default(),
    );

    assert_eq!(
        host.instructions,
        vec![Instruction::toctree(
            &[
                ("Guide".to_string(), "guide".to_string()),
                ("API".to_string(), "api/index#top".to_string()),
            ],
            false
        )]
    );
    assert!(tree.find(|k| matches!(k, NodeKind::BulletList)).is_none());
    assert!(host.inner.targets().contains_key("contents"));
}

#[test]
fn lists_with_same_page_anchors_stay_lists() {
    let dir = project(&[("guide.md", "# Guide")]);
    let (tree, host) = run(
        "* [Guide](guide.md)\n* [Below](#below)\n",
        &dir,
        &TransformConfig::default(),
    );

    assert!(tree.find(|k| matches!(k, NodeKind::BulletList)).is_some());
    // the document link inside is still rewritten on its own
    assert_eq!(host.instructions, vec![Instruction::role("doc", "Guide <guide>")]);
}

#[test]
fn toc_generation_can_be_scoped_to_one_section() {
    let dir = project(&[("a.md", ""), ("b.md", "")]);
    let config = TransformConfig {
        auto_toc_tree_section: Some("Contents".to_string()),
        enable_auto_doc_ref: false,
        ..TransformConfig::default()
    };
    let (tree, host) = run(
        "# Intro\n\n* [A](a.md)\n\n# Contents\n\n1. [B](b.md)\n",
        &dir,
        &config,
    );

    assert_eq!(host.instructions.len(), 1);
    assert!(matches!(
        &host.instructions[0],
        Instruction::Directive { name, options, .. }
            if name == "toctree" && options.contains(&("numbered".to_string(), "1".to_string()))
    ));
    assert!(tree.find(|k| matches!(k, NodeKind::BulletList)).is_some());
}

#[test]
fn non_document_links_go_through_the_url_resolver() {
    let dir = project(&[("src/lib.rs", "")]);
    let config = TransformConfig::default()
        .with_url_resolver(|path| format!("https://example.com/blob/main/{path}"));
    let mut tree = parse("[lib](src/lib.rs)", "index.md", &ParserOptions::default());
    let mut host = StandaloneHost::new(dir.path());

    let report = apply(&mut tree, &mut host, &config, dir.path()).unwrap();

    assert_eq!(report.rewritten_uris, 1);
    let reference = tree.find(|k| matches!(k, NodeKind::Reference { .. })).unwrap();
    assert_eq!(
        tree.kind(reference),
        &NodeKind::Reference {
            uri: "https://example.com/blob/main/src/lib.rs".into(),
            title: None
        }
    );
}

#[test]
fn pipe_tables_are_rendered_as_grid_tables() {
    let dir = project(&[]);
    let config = TransformConfig {
        enable_table_extension: true,
        ..TransformConfig::default()
    };
    let (tree, host) = run("| one | two |\n| --- | --- |\n| ONE | TWO |\n", &dir, &config);

    assert_eq!(
        host.embedded,
        vec![
            "\
+-----+-----+
| one | two |
+=====+=====+
| ONE | TWO |
+-----+-----+"
        ]
    );
    let table = tree.find(|k| matches!(k, NodeKind::Table)).unwrap();
    insta::assert_snapshot!(pformat_node(&tree, table), @r#"
    <table>
        <thead>
            <row>
                <entry>
                    <paragraph>
                        one
                <entry>
                    <paragraph>
                        two
        <tbody>
            <row>
                <entry>
                    <paragraph>
                        ONE
                <entry>
                    <paragraph>
                        TWO
    "#);
}

#[test]
fn table_rendering_is_repeatable() {
    let dir = project(&[]);
    let config = TransformConfig {
        enable_table_extension: true,
        ..TransformConfig::default()
    };
    let text = "| name | value |\n| --- | --- |\n| [site](https://example.com/) | 1 |\n| b | 22 |\n";

    let (first_tree, first_host) = run(text, &dir, &config);
    let (second_tree, second_host) = run(text, &dir, &config);

    assert_eq!(first_host.embedded.len(), 1);
    assert_eq!(first_host.embedded, second_host.embedded);
    assert_eq!(pformat(&first_tree), pformat(&second_tree));
}

#[test]
fn roots_with_dot_segments_still_find_documents() {
    let dir = project(&[("docs/guide.md", "# Guide")]);
    let root = dir.path().join("docs/../docs");
    let mut tree = parse("[Guide](guide.md)", "index.md", &ParserOptions::default());
    let mut host = StandaloneHost::new(&root);

    let report = apply(&mut tree, &mut host, &TransformConfig::default(), &root).unwrap();

    assert_eq!(report.doc_refs, 1);
}

#[test]
fn tables_with_nested_markup_are_left_with_a_warning() {
    let dir = project(&[]);
    let config = TransformConfig {
        enable_table_extension: true,
        ..TransformConfig::default()
    };
    let (tree, host) = run("| *one* | two |\n| --- | --- |\n", &dir, &config);

    assert!(host.embedded.is_empty());
    assert!(tree.find(|k| matches!(k, NodeKind::Table)).is_none());
    let warnings: Vec<String> = tree.diagnostics().warnings().map(ToString::to_string).collect();
    assert_eq!(
        warnings,
        vec!["index.md:1: warning: table paragraph contains <emphasis>; left as a paragraph"]
    );
}

#[test]
fn unregistered_languages_fall_back_to_code_block() {
    let dir = project(&[]);
    let (tree, host) = run(
        "# Title\n\n```rust\nfn main() {}\n```\n",
        &dir,
        &TransformConfig::default(),
    );

    assert_eq!(host.instructions, vec![Instruction::code_block("rust", "fn main() {}")]);
    let pending = tree.find(|k| matches!(k, NodeKind::Pending { .. })).unwrap();
    assert_eq!(tree.line(pending), Some(3));
}

#[test]
fn math_and_eval_rst_blocks() {
    let dir = project(&[]);
    let (tree, host) = run(
        "```math\nE = mc^2\n```\n\n```eval_rst\n.. note:: hi\n```\n",
        &dir,
        &TransformConfig::default(),
    );

    assert_eq!(host.instructions, vec![Instruction::math_block("E = mc^2")]);
    assert_eq!(host.embedded, vec![".. note:: hi"]);
    assert!(tree.find(|k| matches!(k, NodeKind::LiteralBlock { .. })).is_none());
}

#[test]
fn disabled_builtins_leave_blocks_untouched() {
    let dir = project(&[]);
    let config = TransformConfig {
        enable_math: false,
        enable_eval_rst: false,
        ..TransformConfig::default()
    };
    let (tree, host) = run("```math\nx\n```\n\n```eval_rst\ny\n```\n", &dir, &config);

    assert!(host.instructions.is_empty());
    assert!(host.embedded.is_empty());
    assert_eq!(tree.find_all(|k| matches!(k, NodeKind::LiteralBlock { .. })).len(), 2);
}

#[test]
fn user_transformers_override_builtins() {
    let dir = project(&[]);
    let config = TransformConfig::default().with_code_block_transformer("math", |context, _node| {
        let node = context.tree.create(NodeKind::text("custom"));
        Ok(Some(vec![node]))
    });
    let (tree, host) = run("```math\nx\n```\n", &dir, &config);

    assert!(host.instructions.is_empty());
    assert_eq!(tree.astext(tree.root()), "custom");
}

#[test]
fn dollar_literals_become_inline_math() {
    let dir = project(&[]);
    let (_, host) = run(
        "Euler: `$e^{i\\pi} + 1 = 0$` and `code`",
        &dir,
        &TransformConfig::default(),
    );

    assert_eq!(host.instructions, vec![Instruction::inline_math("e^{i\\pi} + 1 = 0")]);
}

#[test]
fn host_failures_abort_the_pass() {
    let dir = project(&[]);
    let mut tree = parse("```math\nx\n```\n", "index.md", &ParserOptions::default());

    let result = apply(&mut tree, &mut FailingHost, &TransformConfig::default(), dir.path());

    match result {
        Err(TransformError::Host(HostError::Instruction { name, .. })) => assert_eq!(name, "math"),
        other => panic!("expected a host error, got {other:?}"),
    }
}

#[test]
fn other_sources_are_not_transformed() {
    let dir = project(&[("guide.md", "")]);
    let mut tree = parse("[Guide](guide.md)\n\n```math\nx\n```\n", "index.rst", &ParserOptions::default());
    let before = pformat(&tree);
    let mut host = RecordingHost::new(dir.path());

    let report = apply(&mut tree, &mut host, &TransformConfig::default(), dir.path()).unwrap();

    assert_eq!(report.replacements(), 0);
    assert!(host.instructions.is_empty());
    assert_eq!(pformat(&tree), before);
}

#[test]
fn report_counts_replacements() {
    let dir = project(&[("guide.md", "")]);
    let mut tree = parse(
        "[Guide](guide.md) and `$x$`\n\n```rust\nx\n```\n",
        "index.md",
        &ParserOptions::default(),
    );
    let mut host = StandaloneHost::new(dir.path());

    let report = apply(&mut tree, &mut host, &TransformConfig::default(), dir.path()).unwrap();

    assert_eq!(report.doc_refs, 1);
    assert_eq!(report.inline_math, 1);
    assert_eq!(report.code_blocks, 1);
    assert_eq!(report.replacements(), 3);
}

#[test]
fn documents_transform_in_parallel_with_a_shared_config() {
    let dir = project(&[("guide.md", "# Guide")]);
    let config = Arc::new(
        TransformConfig::default().with_url_resolver(|path| format!("https://example.com/{path}")),
    );
    let sources: Vec<String> = (0..8).map(|i| format!("page{i}.md")).collect();

    let outputs: Vec<String> = thread::scope(|scope| {
        let handles: Vec<_> = sources
            .iter()
            .map(|source| {
                let config = Arc::clone(&config);
                let root = dir.path();
                scope.spawn(move || {
                    let mut tree = parse("* [Guide](guide.md)\n", source, &ParserOptions::default());
                    let mut host = StandaloneHost::new(root);
                    apply(&mut tree, &mut host, &config, root).unwrap();
                    pformat_node(&tree, tree.children(tree.root())[0])
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(outputs.iter().all(|o| o == &outputs[0]));
    assert!(outputs[0].contains("Guide <guide>"));
}
