//! Core data model shared by every component: blocks, inline nodes, mixed-content
//! segments, snapshots, and the patch tagged union that the differ emits.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Half-open byte range into the document's rope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub from: usize,
    pub to: usize,
}

impl Range {
    pub fn new(from: usize, to: usize) -> Self {
        debug_assert!(from <= to);
        Self { from, to }
    }

    pub fn len(&self) -> usize {
        self.to - self.from
    }

    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }
}

/// Top-level unit of the document. Only the last block in a document may be dirty.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: BlockId,
    pub block_type: BlockType,
    pub is_finalized: bool,
    pub payload: BlockPayload,
}

impl Block {
    /// `Block.id` is a pure function of `(type, from)`: two re-parses that agree on
    /// the prefix must produce identical ids for prefix blocks.
    pub fn make_id(block_type: BlockType, from: usize) -> BlockId {
        BlockId(format!("{block_type}:{from}"))
    }

    pub fn new(block_type: BlockType, range: Range, raw: String) -> Self {
        let id = Self::make_id(block_type, range.from);
        Self {
            id,
            block_type,
            is_finalized: false,
            payload: BlockPayload::new(range, raw),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockId(pub String);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockType {
    Paragraph,
    Heading,
    Code,
    List,
    Blockquote,
    Html,
    Mdx,
    Table,
    FootnoteDef,
    Footnotes,
    Hr,
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BlockType::Paragraph => "paragraph",
            BlockType::Heading => "heading",
            BlockType::Code => "code",
            BlockType::List => "list",
            BlockType::Blockquote => "blockquote",
            BlockType::Html => "html",
            BlockType::Mdx => "mdx",
            BlockType::Table => "table",
            BlockType::FootnoteDef => "footnote-def",
            BlockType::Footnotes => "footnotes",
            BlockType::Hr => "hr",
        };
        write!(f, "{s}")
    }
}

/// A sparse map of type-specific fields (heading level, code lang, mdx status, ...).
/// Kept as a `serde_json::Value` map rather than a closed struct because each
/// block type owns a different subset and plugins may add arbitrary keys.
pub type Meta = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct BlockPayload {
    pub raw: String,
    pub range: Range,
    pub inline: Option<Vec<InlineNode>>,
    pub highlighted_html: Option<String>,
    pub sanitized_html: Option<String>,
    pub compiled_mdx_ref: Option<CompiledMdxRef>,
    pub compiled_mdx_module: Option<CompiledMdxModule>,
    pub meta: Meta,
}

impl BlockPayload {
    pub fn new(range: Range, raw: String) -> Self {
        Self {
            raw,
            range,
            inline: None,
            highlighted_html: None,
            sanitized_html: None,
            compiled_mdx_ref: None,
            compiled_mdx_module: None,
            meta: Meta::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledMdxRef {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledMdxModule {
    pub id: String,
    pub code: String,
    pub deps: Vec<String>,
    pub source: String,
}

/// Tagged union of inline nodes. Container variants own an ordered child sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum InlineNode {
    Text { value: String },
    Strong { children: Vec<InlineNode> },
    Em { children: Vec<InlineNode> },
    Strike { children: Vec<InlineNode> },
    Code { value: String },
    Link { href: String, children: Vec<InlineNode> },
    Image { src: String, alt: String },
    Br,
    Mention { handle: String },
    Citation { key: String },
    MathInline { tex: String },
    MathDisplay { tex: String },
    FootnoteRef { label: String },
}

impl InlineNode {
    pub fn text(value: impl Into<String>) -> Self {
        InlineNode::Text { value: value.into() }
    }
}

/// Ordered segment of a block's raw text: plain text, inline HTML, or an MDX
/// expression/component candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SegmentKind {
    Text,
    Html,
    Mdx,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixedContentSegment {
    pub kind: SegmentKind,
    pub value: String,
    pub range: Option<Range>,
    pub inline: Option<Vec<InlineNode>>,
    pub sanitized: Option<String>,
    pub status: Option<MdxStatus>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MdxStatus {
    Pending,
    Compiled,
    Error,
}

/// Arena node id for a snapshot forest. Distinct from the structural [`BlockId`]/
/// node-path ids used for diffing: this is purely a local index.
pub type NodeId = u32;

/// Intermediate tree representation that the differ consumes. Each `Block` lowers
/// to a root snapshot whose `props["block"]` carries a clone of the block and
/// whose `children` expose structural substructure (list items, table rows,
/// code lines, mixed segments).
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSnapshot {
    pub id: String,
    pub node_type: String,
    pub props: BTreeMap<String, serde_json::Value>,
    pub range: Option<Range>,
    pub children: Vec<NodeSnapshot>,
}

impl NodeSnapshot {
    pub fn leaf(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            props: BTreeMap::new(),
            range: None,
            children: Vec::new(),
        }
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.props.insert(key.into(), value);
        self
    }

    pub fn with_children(mut self, children: Vec<NodeSnapshot>) -> Self {
        self.children = children;
        self
    }
}

/// Target of a [`Patch`]: identifies a node either by block id alone, or by a
/// block id plus a nested node id / index path into that block's snapshot tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePath {
    pub block_id: BlockId,
    pub node_id: Option<String>,
    pub index_path: Option<Vec<usize>>,
}

impl NodePath {
    pub fn root(block_id: BlockId) -> Self {
        Self {
            block_id,
            node_id: None,
            index_path: None,
        }
    }

    pub fn child(block_id: BlockId, node_id: impl Into<String>) -> Self {
        Self {
            block_id,
            node_id: Some(node_id.into()),
            index_path: None,
        }
    }
}

/// Per-line payload for `appendLines`: the new code-line's plain text and, once
/// highlighted, its per-line HTML fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppendedLine {
    pub text: String,
    pub highlight: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Patch {
    InsertChild {
        at: NodePath,
        index: usize,
        node: Box<SerializedSnapshot>,
    },
    DeleteChild {
        at: NodePath,
        index: usize,
    },
    ReplaceChild {
        at: NodePath,
        index: usize,
        node: Box<SerializedSnapshot>,
    },
    SetProps {
        at: NodePath,
        props: BTreeMap<String, serde_json::Value>,
    },
    SetPropsBatch {
        entries: Vec<(NodePath, BTreeMap<String, serde_json::Value>)>,
    },
    Finalize {
        at: NodePath,
    },
    /// Single-element move within a generic (non-list) children diff. Never
    /// emitted for list children: list diffs only ever delete+insert.
    Reorder {
        at: NodePath,
        from: usize,
        to: usize,
        count: usize,
    },
    AppendLines {
        at: NodePath,
        start_index: usize,
        lines: Vec<AppendedLine>,
    },
    SetHtml {
        at: NodePath,
        html: String,
        sanitized: bool,
    },
}

impl Patch {
    pub fn at(&self) -> &NodePath {
        match self {
            Patch::InsertChild { at, .. }
            | Patch::DeleteChild { at, .. }
            | Patch::ReplaceChild { at, .. }
            | Patch::SetProps { at, .. }
            | Patch::Finalize { at }
            | Patch::Reorder { at, .. }
            | Patch::AppendLines { at, .. }
            | Patch::SetHtml { at, .. } => at,
            Patch::SetPropsBatch { entries } => &entries[0].0,
        }
    }
}

/// `NodeSnapshot` flattened into a serializable owned tree for embedding in a
/// [`Patch`] (insert/replace carry a whole subtree, not just an id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedSnapshot {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub props: BTreeMap<String, serde_json::Value>,
    pub children: Vec<SerializedSnapshot>,
}

impl From<&NodeSnapshot> for SerializedSnapshot {
    fn from(s: &NodeSnapshot) -> Self {
        Self {
            id: s.id.clone(),
            node_type: s.node_type.clone(),
            props: s.props.clone(),
            children: s.children.iter().map(SerializedSnapshot::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatchMetrics {
    pub parse_ms: f64,
    pub enrich_ms: f64,
    pub diff_ms: f64,
    pub serialize_ms: f64,
    pub coalesce_ms: f64,
    pub patch_count: usize,
    pub patch_bytes: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub tx: u64,
    pub parse_ms: f64,
    pub enrich_ms: f64,
    pub diff_ms: f64,
    pub serialize_ms: f64,
    pub coalesce_ms: f64,
    pub highlighter_ms: BTreeMap<String, f64>,
    pub mdx_detection_ms: f64,
    pub patch_count: usize,
    pub patch_bytes: usize,
    pub queue_depth: usize,
    pub append_line_batches: usize,
    pub block_counts: BTreeMap<String, usize>,
    pub grammar_engine: String,
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

impl PerformanceMetrics {
    /// All numeric fields are rounded to 0.001 precision before being exported.
    pub fn rounded(mut self) -> Self {
        self.parse_ms = round3(self.parse_ms);
        self.enrich_ms = round3(self.enrich_ms);
        self.diff_ms = round3(self.diff_ms);
        self.serialize_ms = round3(self.serialize_ms);
        self.coalesce_ms = round3(self.coalesce_ms);
        self.mdx_detection_ms = round3(self.mdx_detection_ms);
        for v in self.highlighter_ms.values_mut() {
            *v = round3(*v);
        }
        self
    }
}
