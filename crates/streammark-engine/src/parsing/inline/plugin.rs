//! The ordered plugin fold that powers the inline parser.
//!
//! A plugin is a tagged variant: `Regex` plugins tokenize a text node by
//! finding non-overlapping matches (via `regex::Regex` or, where Rust's regex
//! engine can't express the match — variable-length backtick runs, balanced
//! delimiters — a small hand-written scanner with the same shape); `Ast`
//! plugins instead walk the tree and may rewrite nodes in place. Application
//! is a single ordered fold: for each registered plugin, walk the current
//! node list, and for each text node either skip it (`fast_check` rejects) or
//! tokenize it, splicing matches in; container nodes recurse into their
//! children with the same plugin. Because later plugins only ever revisit the
//! *children* of container nodes, leaf nodes produced by an earlier plugin
//! (code spans, math) are naturally a raw zone: nothing after them can split
//! their content.

use crate::model::InlineNode;

pub struct TokenMatch {
    pub range: std::ops::Range<usize>,
    pub node: InlineNode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginKind {
    Regex,
    Ast,
}

/// Anticipation metadata consumed by `regex_anticipation_append` (see
/// `parsing::inline::anticipation`).
pub struct AnticipationSpec {
    pub start: &'static str,
    pub end: &'static str,
    pub append: &'static str,
    pub max_scan_chars: Option<usize>,
}

pub struct InlinePlugin {
    pub name: &'static str,
    pub priority: i32,
    pub kind: PluginKind,
    pub fast_check: Option<fn(&str) -> bool>,
    /// Finds ordered, non-overlapping matches within a single text node's
    /// content. Absent for pure `Ast` plugins.
    pub tokenize: Option<fn(&str) -> Vec<TokenMatch>>,
    pub anticipation: Option<AnticipationSpec>,
}

/// Applies a single plugin's tokenizer to one text node's string, splicing
/// matches into a list of nodes (untouched text between matches stays text).
fn apply_tokenize(text: &str, tokenize: fn(&str) -> Vec<TokenMatch>) -> Vec<InlineNode> {
    let matches = tokenize(text);
    if matches.is_empty() {
        return vec![InlineNode::text(text)];
    }
    let mut out = Vec::new();
    let mut cursor = 0usize;
    for m in matches {
        if m.range.start > cursor {
            out.push(InlineNode::text(&text[cursor..m.range.start]));
        }
        out.push(m.node);
        cursor = m.range.end;
    }
    if cursor < text.len() {
        out.push(InlineNode::text(&text[cursor..]));
    }
    out
}

fn recurse_children(children: Vec<InlineNode>, plugin: &InlinePlugin) -> Vec<InlineNode> {
    apply_plugin(children, plugin)
}

/// Runs one plugin over a node list, recursing into container children.
pub fn apply_plugin(nodes: Vec<InlineNode>, plugin: &InlinePlugin) -> Vec<InlineNode> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            InlineNode::Text { value } => {
                if let Some(fast_check) = plugin.fast_check {
                    if !fast_check(&value) {
                        out.push(InlineNode::Text { value });
                        continue;
                    }
                }
                match plugin.tokenize {
                    Some(tok) => out.extend(apply_tokenize(&value, tok)),
                    None => out.push(InlineNode::Text { value }),
                }
            }
            InlineNode::Strong { children } => out.push(InlineNode::Strong {
                children: recurse_children(children, plugin),
            }),
            InlineNode::Em { children } => out.push(InlineNode::Em {
                children: recurse_children(children, plugin),
            }),
            InlineNode::Strike { children } => out.push(InlineNode::Strike {
                children: recurse_children(children, plugin),
            }),
            InlineNode::Link { href, children } => out.push(InlineNode::Link {
                href,
                children: recurse_children(children, plugin),
            }),
            leaf => out.push(leaf),
        }
    }
    out
}

/// Runs the full ordered fold: lower-priority-first, each plugin applied in
/// turn over the accumulated node list.
pub fn fold(initial_text: &str, plugins: &[InlinePlugin]) -> Vec<InlineNode> {
    let mut nodes = vec![InlineNode::text(initial_text)];
    for plugin in plugins {
        if plugin.kind == PluginKind::Regex {
            nodes = apply_plugin(nodes, plugin);
        }
        // Ast plugins (none in the default set) would visit `nodes` here.
    }
    nodes
}
