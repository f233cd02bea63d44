//! Table plugin: retypes a finalized paragraph block into a `Table` block
//! when its raw text matches the GFM table grammar (a header row, a
//! delimiter row of dashes/colons, and one or more data rows). Tables aren't
//! a distinct block-opener in the block extractor — like footnote
//! aggregation, detecting one is a whole-block-text classification that
//! belongs in a document plugin rather than the line-by-line block opener.

use serde_json::json;

use crate::model::{Block, BlockType};

use super::{DocumentPlugin, PluginOutput};

pub struct TablesPlugin;

impl DocumentPlugin for TablesPlugin {
    fn key(&self) -> &'static str {
        "tables"
    }

    fn apply(&mut self, _content: &str, blocks: Vec<Block>, protected: Vec<super::ProtectedRange>) -> PluginOutput {
        let blocks = blocks
            .into_iter()
            .map(|block| {
                if block.block_type == BlockType::Paragraph && block.is_finalized {
                    if let Some(table) = try_parse_table(&block) {
                        return table;
                    }
                }
                block
            })
            .collect();
        PluginOutput { blocks, protected_ranges: protected }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    None,
    Left,
    Center,
    Right,
}

impl Align {
    fn as_str(self) -> &'static str {
        match self {
            Align::None => "none",
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
        }
    }
}

fn try_parse_table(block: &Block) -> Option<Block> {
    let lines: Vec<&str> = block.payload.raw.lines().collect();
    if lines.len() < 2 {
        return None;
    }
    let header = split_row(lines[0])?;
    let align = parse_delimiter_row(lines[1], header.len())?;

    let rows: Vec<Vec<String>> = lines[2..]
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| split_row(l).unwrap_or_default())
        .collect();

    let mut table = Block::new(BlockType::Table, block.payload.range, block.payload.raw.clone());
    table.is_finalized = true;
    table.payload.meta.insert("header".to_string(), json!(header));
    table.payload.meta.insert("align".to_string(), json!(align.iter().map(|a| a.as_str()).collect::<Vec<_>>()));
    table.payload.meta.insert("rows".to_string(), json!(rows));
    Some(table)
}

/// Splits a `| a | b |` style row on unescaped pipes, trimming the leading
/// and trailing empty cells that a row's outer pipes produce.
fn split_row(line: &str) -> Option<Vec<String>> {
    let trimmed = line.trim();
    if !trimmed.contains('|') {
        return None;
    }
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = trimmed.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                current.push(next);
                chars.next();
                continue;
            }
        }
        if c == '|' {
            cells.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(c);
        }
    }
    cells.push(current.trim().to_string());

    if cells.first().map(|c| c.is_empty()).unwrap_or(false) {
        cells.remove(0);
    }
    if cells.last().map(|c| c.is_empty()).unwrap_or(false) {
        cells.pop();
    }
    if cells.is_empty() { None } else { Some(cells) }
}

/// Validates (and reads alignment from) a GFM delimiter row, e.g.
/// `| --- | :---: | ---: |`. Returns `None` if the row isn't a valid
/// delimiter row for the given column count.
fn parse_delimiter_row(line: &str, expected_cols: usize) -> Option<Vec<Align>> {
    let cells = split_row(line)?;
    if cells.len() != expected_cols {
        return None;
    }
    cells
        .iter()
        .map(|cell| {
            let c = cell.trim();
            let core = c.trim_start_matches(':').trim_end_matches(':');
            if core.is_empty() || !core.chars().all(|ch| ch == '-') {
                return None;
            }
            let left = c.starts_with(':');
            let right = c.ends_with(':');
            Some(match (left, right) {
                (true, true) => Align::Center,
                (true, false) => Align::Left,
                (false, true) => Align::Right,
                (false, false) => Align::None,
            })
        })
        .collect()
}
