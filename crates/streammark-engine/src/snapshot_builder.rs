//! Snapshot builder (SB): lowers an enriched `Block` into the `NodeSnapshot`
//! tree the differ consumes. Most block types lower to a single node whose
//! children mirror their inline node sequence; code blocks lower to one
//! child per line (so the differ's `appendLines` fast path has something to
//! diff against); list blocks get full item-level lowering with stable
//! per-item ids and task-marker stripping, since lists are the one
//! container type called out by name for this treatment.

use serde_json::json;

use crate::model::{Block, BlockType, InlineNode, NodeSnapshot};
use crate::parsing::inline::parse_inline;

pub fn build(block: &Block) -> NodeSnapshot {
    let children = match block.block_type {
        BlockType::Code => code_lines(block),
        BlockType::List => list_items(block),
        BlockType::Table => table_rows(block),
        _ => block
            .payload
            .inline
            .as_ref()
            .map(|nodes| inline_children(&block.id.0, nodes))
            .unwrap_or_default(),
    };

    // Some meta keys exist purely to feed the children-lowering above
    // (`body` for code lines, `header`/`rows` for table rows) and would
    // otherwise duplicate that data as a root-level prop, turning every
    // single-line/single-cell edit into both a child patch and a redundant
    // whole-block setProps. `align` has no child-level representation (it's
    // per-column, not per-cell), so it stays a root prop.
    let excluded: &[&str] = match block.block_type {
        BlockType::Code => &["body", "line_html"],
        BlockType::Table => &["header", "rows"],
        _ => &[],
    };
    let mut props: std::collections::BTreeMap<String, serde_json::Value> =
        block.payload.meta.iter().filter(|(k, _)| !excluded.contains(&k.as_str())).map(|(k, v)| (k.clone(), v.clone())).collect();
    props.insert("finalized".to_string(), json!(block.is_finalized));
    if let Some(html) = &block.payload.highlighted_html {
        props.insert("html".to_string(), json!(html));
    }
    if let Some(sanitized) = &block.payload.sanitized_html {
        props.insert("sanitizedHtml".to_string(), json!(sanitized));
    }

    NodeSnapshot {
        id: block.id.0.clone(),
        node_type: block.block_type.to_string(),
        props,
        range: Some(block.payload.range),
        children,
    }
}

fn inline_node_type(node: &InlineNode) -> &'static str {
    match node {
        InlineNode::Text { .. } => "text",
        InlineNode::Strong { .. } => "strong",
        InlineNode::Em { .. } => "em",
        InlineNode::Strike { .. } => "strike",
        InlineNode::Code { .. } => "code",
        InlineNode::Link { .. } => "link",
        InlineNode::Image { .. } => "image",
        InlineNode::Br => "br",
        InlineNode::Mention { .. } => "mention",
        InlineNode::Citation { .. } => "citation",
        InlineNode::MathInline { .. } => "math-inline",
        InlineNode::MathDisplay { .. } => "math-display",
        InlineNode::FootnoteRef { .. } => "footnote-ref",
    }
}

fn inline_props(node: &InlineNode) -> serde_json::Map<String, serde_json::Value> {
    let mut props = serde_json::Map::new();
    match node {
        InlineNode::Text { value } => {
            props.insert("value".to_string(), json!(value));
        }
        InlineNode::Code { value } => {
            props.insert("value".to_string(), json!(value));
        }
        InlineNode::Link { href, .. } => {
            props.insert("href".to_string(), json!(href));
        }
        InlineNode::Image { src, alt } => {
            props.insert("src".to_string(), json!(src));
            props.insert("alt".to_string(), json!(alt));
        }
        InlineNode::Mention { handle } => {
            props.insert("handle".to_string(), json!(handle));
        }
        InlineNode::Citation { key } => {
            props.insert("key".to_string(), json!(key));
        }
        InlineNode::MathInline { tex } | InlineNode::MathDisplay { tex } => {
            props.insert("tex".to_string(), json!(tex));
        }
        InlineNode::FootnoteRef { label } => {
            props.insert("label".to_string(), json!(label));
        }
        InlineNode::Strong { .. } | InlineNode::Em { .. } | InlineNode::Strike { .. } | InlineNode::Br => {}
    }
    props
}

fn inline_children(parent_id: &str, nodes: &[InlineNode]) -> Vec<NodeSnapshot> {
    nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let id = format!("{parent_id}::inline:{i}");
            let children = match node {
                InlineNode::Strong { children } | InlineNode::Em { children } | InlineNode::Strike { children } => {
                    inline_children(&id, children)
                }
                InlineNode::Link { children, .. } => inline_children(&id, children),
                _ => Vec::new(),
            };
            NodeSnapshot {
                id,
                node_type: inline_node_type(node).to_string(),
                props: inline_props(node).into_iter().collect(),
                range: None,
                children,
            }
        })
        .collect()
}

fn code_lines(block: &Block) -> Vec<NodeSnapshot> {
    let body = block
        .payload
        .meta
        .get("body")
        .and_then(|v| v.as_str())
        .unwrap_or(&block.payload.raw);
    let line_html: Vec<String> = block
        .payload
        .meta
        .get("line_html")
        .and_then(|v| v.as_array())
        .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default();
    body.lines()
        .enumerate()
        .map(|(i, line)| {
            let mut snap = NodeSnapshot::leaf(format!("{}::line:{i}", block.id.0), "code-line")
                .with_prop("text", json!(line));
            if let Some(highlight) = line_html.get(i) {
                snap = snap.with_prop("highlight", json!(highlight));
            }
            snap
        })
        .collect()
}

struct TaskMarker {
    task: bool,
    checked: bool,
    rest: String,
}

fn strip_task_marker(text: &str) -> TaskMarker {
    let trimmed = text.trim_start();
    for (marker, checked) in [("[ ]", false), ("[x]", true), ("[X]", true), ("[-]", true)] {
        if let Some(rest) = trimmed.strip_prefix(marker) {
            return TaskMarker { task: true, checked, rest: rest.trim_start().to_string() };
        }
    }
    TaskMarker { task: false, checked: false, rest: text.to_string() }
}

/// Splits a list block's raw text into items by top-level marker lines
/// (zero leading indent), then lowers each item's first line through
/// task-marker stripping and an independent inline parse. Nested content
/// inside an item's continuation lines is carried as plain text for now —
/// nested list recursion is out of scope for the first cut of list
/// lowering and is noted as a follow-up in the design ledger.
fn list_items(block: &Block) -> Vec<NodeSnapshot> {
    use crate::parsing::blocks::kinds::ListMarkers;

    let raw = &block.payload.raw;
    let mut item_starts = Vec::new();
    for (i, line) in raw.lines().enumerate() {
        if ListMarkers::detect(line).is_some() {
            item_starts.push(i);
        }
    }
    if item_starts.is_empty() {
        return Vec::new();
    }

    let lines: Vec<&str> = raw.lines().collect();
    let mut out = Vec::new();
    for (idx, &start) in item_starts.iter().enumerate() {
        let end = item_starts.get(idx + 1).copied().unwrap_or(lines.len());
        let item_lines = &lines[start..end];
        let first_line = item_lines[0];
        let marker = ListMarkers::detect(first_line).expect("marker line");
        let after_marker = &first_line[marker.width.min(first_line.len())..];
        let marker_result = strip_task_marker(after_marker);

        let mut item_text = marker_result.rest.clone();
        for cont in &item_lines[1..] {
            item_text.push('\n');
            item_text.push_str(cont);
        }

        let item_id = format!("{}::item:{idx}", block.id.0);
        let inline_nodes = parse_inline(&item_text);
        let mut props = serde_json::Map::new();
        if marker_result.task {
            props.insert("task".to_string(), json!(true));
            props.insert("checked".to_string(), json!(marker_result.checked));
        }
        out.push(NodeSnapshot {
            id: item_id.clone(),
            node_type: "list-item".to_string(),
            props: props.into_iter().collect(),
            range: None,
            children: inline_children(&item_id, &inline_nodes),
        });
    }
    out
}

/// Lowers a table block's `meta.header`/`meta.rows` into one `table-row`
/// child per row (row 0 is the header row), each carrying `table-cell`
/// children with their own independent inline parse. Row/cell ids are
/// stable by position (`::row:<r>`, `::cell:<c>`) so an edit to a single
/// cell's text diffs down to one `setProps`, not a row-level replace.
fn table_rows(block: &Block) -> Vec<NodeSnapshot> {
    let header: Vec<String> = block
        .payload
        .meta
        .get("header")
        .and_then(|v| v.as_array())
        .map(|a| a.iter().filter_map(|c| c.as_str().map(str::to_string)).collect())
        .unwrap_or_default();
    let rows: Vec<Vec<String>> = block
        .payload
        .meta
        .get("rows")
        .and_then(|v| v.as_array())
        .map(|rows| {
            rows.iter()
                .map(|row| {
                    row.as_array()
                        .map(|cells| cells.iter().filter_map(|c| c.as_str().map(str::to_string)).collect())
                        .unwrap_or_default()
                })
                .collect()
        })
        .unwrap_or_default();

    let mut out = Vec::new();
    if !header.is_empty() {
        out.push(table_row(&block.id.0, 0, &header, true));
    }
    for (i, row) in rows.iter().enumerate() {
        out.push(table_row(&block.id.0, i + 1, row, false));
    }
    out
}

/// Cells are leaves carrying only a `value` prop, not a separate inline-
/// parsed child tree: a table cell's text is one flat `setProps` away from
/// its rendered form, so an edit to one cell never touches anything besides
/// that cell's own snapshot node.
fn table_row(block_id: &str, index: usize, cells: &[String], is_header: bool) -> NodeSnapshot {
    let row_id = format!("{block_id}::row:{index}");
    let children = cells
        .iter()
        .enumerate()
        .map(|(c, text)| NodeSnapshot::leaf(format!("{row_id}::cell:{c}"), "table-cell").with_prop("value", json!(text)))
        .collect();
    NodeSnapshot::leaf(row_id, "table-row").with_prop("header", json!(is_header)).with_children(children)
}
