//! Pipe tables written as plain paragraphs, re-rendered as grid tables.
//!
//! Without a table extension in the markdown parser a pipe table arrives as
//! one paragraph of text, soft breaks and links. The paragraph is flattened
//! back into text, split into rows and cells, and rendered as a grid table
//! the host can parse.

use unicode_width::UnicodeWidthStr;

use crate::tree::{DocTree, NodeId, NodeKind};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Text(String),
    /// Inline markup that must not be split on `|` or newlines.
    Markup(String),
}

/// Rows of trimmed cells, with the number of leading header rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PipeTable {
    pub header_rows: usize,
    pub rows: Vec<Vec<String>>,
}

/// Whether the paragraph's text is fenced by pipes.
pub(crate) fn looks_like_table(tree: &DocTree, paragraph: NodeId) -> bool {
    let text = tree.astext(paragraph);
    let text = text.trim();
    text.len() > 1 && text.starts_with('|') && text.ends_with('|')
}

fn flatten(tree: &DocTree, paragraph: NodeId) -> Result<Vec<Token>, &'static str> {
    let mut tokens = Vec::new();
    for &child in tree.children(paragraph) {
        let token = match tree.kind(child) {
            NodeKind::Text { content } => Token::Text(content.clone()),
            NodeKind::Reference { uri, .. } => {
                Token::Markup(format!("`{} <{}>`__", tree.astext(child), uri))
            }
            NodeKind::PendingCrossRef { target, .. } => {
                Token::Markup(format!(":any:`{} <{}>`", tree.astext(child), target))
            }
            other => return Err(other.tag_name()),
        };
        tokens.push(token);
    }
    Ok(tokens)
}

/// Split the paragraph into rows and cells.
///
/// Fails with the name of the first child that is neither text nor a link.
pub(crate) fn parse_pipe_table(tree: &DocTree, paragraph: NodeId) -> Result<PipeTable, String> {
    let tokens = flatten(tree, paragraph).map_err(|name| format!("contains <{name}>"))?;

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cell = String::new();
    for token in tokens {
        match token {
            Token::Markup(markup) => cell.push_str(&markup),
            Token::Text(text) => {
                for (i, line) in text.split('\n').enumerate() {
                    if i > 0 {
                        row.push(std::mem::take(&mut cell));
                        rows.push(std::mem::take(&mut row));
                    }
                    for (j, piece) in line.split('|').enumerate() {
                        if j > 0 {
                            row.push(std::mem::take(&mut cell));
                        }
                        cell.push_str(piece);
                    }
                }
            }
        }
    }
    row.push(cell);
    rows.push(row);

    let mut rows: Vec<Vec<String>> = rows
        .into_iter()
        .map(|cells| trim_outer(cells.iter().map(|c| c.trim().to_string()).collect()))
        .filter(|cells| !cells.is_empty())
        .collect();
    if rows.is_empty() {
        return Err("has no cells".to_string());
    }

    let mut header_rows = 0;
    if let Some(separator) = rows.iter().position(|cells| is_separator(cells)) {
        header_rows = separator;
        rows.remove(separator);
    }
    rows.retain(|cells| !is_separator(cells));
    if rows.is_empty() {
        return Err("has only separator rows".to_string());
    }

    Ok(PipeTable { header_rows, rows })
}

fn trim_outer(mut cells: Vec<String>) -> Vec<String> {
    if cells.first().is_some_and(String::is_empty) {
        cells.remove(0);
    }
    if cells.last().is_some_and(String::is_empty) {
        cells.pop();
    }
    cells
}

fn is_separator(cells: &[String]) -> bool {
    cells.iter().all(|c| {
        c.contains('-') && c.chars().all(|ch| matches!(ch, '-' | ':' | ' '))
    })
}

/// Render as a grid table with a uniform column width, measured in terminal
/// columns so wide characters keep the borders aligned.
pub(crate) fn render_grid(table: &PipeTable) -> String {
    let columns = table.rows.iter().map(Vec::len).max().unwrap_or(0);
    let width = table
        .rows
        .iter()
        .flatten()
        .map(|c| c.width())
        .max()
        .unwrap_or(0);

    let border = |fill: char| {
        let segment: String = std::iter::repeat_n(fill, width + 2).collect();
        format!("+{}", format!("{segment}+").repeat(columns))
    };

    let mut lines = vec![border('-')];
    for (index, cells) in table.rows.iter().enumerate() {
        let mut line = String::from("|");
        for column in 0..columns {
            let cell = cells.get(column).map(String::as_str).unwrap_or("");
            let padding = " ".repeat(width - cell.width());
            line.push_str(&format!(" {cell}{padding} |"));
        }
        lines.push(line);
        let fill = if index + 1 == table.header_rows { '=' } else { '-' };
        lines.push(border(fill));
    }
    lines.join("\n")
}
