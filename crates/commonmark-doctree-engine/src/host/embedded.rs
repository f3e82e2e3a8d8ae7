//! Minimal reader for the embedded markup the transform pass produces.
//!
//! Grid tables are the only block construct understood here, with anonymous
//! hyperlinks and `:any:` cross-references inside cells.

use std::sync::LazyLock;

use regex::Regex;

static CELL_MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"`([^`<]*?)\s*<([^`>]*)>`__|:any:`([^`<]*?)\s*<([^`>]*)>`").expect("Invalid cell markup regex")
});

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridTable {
    pub header: Vec<Vec<String>>,
    pub body: Vec<Vec<String>>,
}

/// Inline pieces of a table cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellToken {
    Text(String),
    Reference { title: String, uri: String },
    CrossRef { title: String, target: String },
}

/// Parse a grid table. Returns `None` when `text` is not one.
///
/// Rows spanning several lines have their cell lines joined with a space.
/// Rows above a `+===+` border form the header.
pub fn parse_grid_table(text: &str) -> Option<GridTable> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let first = lines.first()?;
    if !first.starts_with('+') || !lines.last()?.starts_with('+') {
        return None;
    }

    let mut table = GridTable::default();
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut pending: Option<Vec<String>> = None;

    for line in &lines {
        if line.starts_with('+') {
            if let Some(row) = pending.take() {
                rows.push(row);
            }
            if line.contains('=') {
                table.header.append(&mut rows);
            }
        } else if let Some(inner) = line.strip_prefix('|').and_then(|l| l.strip_suffix('|')) {
            let cells: Vec<String> = inner.split('|').map(|c| c.trim().to_string()).collect();
            match pending.as_mut() {
                Some(row) => {
                    for (existing, more) in row.iter_mut().zip(cells) {
                        if !more.is_empty() {
                            if !existing.is_empty() {
                                existing.push(' ');
                            }
                            existing.push_str(&more);
                        }
                    }
                }
                None => pending = Some(cells),
            }
        } else {
            return None;
        }
    }
    table.body = rows;
    Some(table)
}

pub fn parse_cell(text: &str) -> Vec<CellToken> {
    let mut tokens = Vec::new();
    let mut last = 0;
    for caps in CELL_MARKUP.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            tokens.push(CellToken::Text(text[last..whole.start()].to_string()));
        }
        if let (Some(title), Some(uri)) = (caps.get(1), caps.get(2)) {
            tokens.push(CellToken::Reference {
                title: title.as_str().to_string(),
                uri: uri.as_str().to_string(),
            });
        } else if let (Some(title), Some(target)) = (caps.get(3), caps.get(4)) {
            tokens.push(CellToken::CrossRef {
                title: title.as_str().to_string(),
                target: target.as_str().to_string(),
            });
        }
        last = whole.end();
    }
    if last < text.len() {
        tokens.push(CellToken::Text(text[last..].to_string()));
    }
    tokens
}
