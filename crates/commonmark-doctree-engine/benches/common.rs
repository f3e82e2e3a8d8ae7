// Shared by the benchmark files in this directory; each one only uses some
// of the helpers.
#[allow(dead_code)]
pub fn generate_markdown_content(size: usize) -> String {
    let base = "# Title\n\n## Section\n\nParagraph with *some* content and a [link](https://example.com).\n\n- Bullet point\n  - Nested item\n- Another item\n\n```rust\nfn example() {\n    println!(\"Hello\");\n}\n```\n\n";
    base.repeat(size)
}

/// Documents full of shapes the transform pass rewrites.
#[allow(dead_code)]
pub fn generate_transformable_markdown(sections: usize) -> String {
    let mut content = String::new();
    for section in 0..sections {
        content.push_str(&format!("# Section {section}\n\n"));
        content.push_str("* [Guide](guide.md)\n* [Reference](reference.md)\n\n");
        content.push_str("See [the guide](guide.md#install) and `$x^2$`.\n\n");
        content.push_str("| name | value |\n| --- | --- |\n| a | 1 |\n| b | 2 |\n\n");
        content.push_str("```math\nE = mc^2\n```\n\n");
    }
    content
}
