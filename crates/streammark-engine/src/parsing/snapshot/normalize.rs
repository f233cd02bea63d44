use std::collections::BTreeMap;

use serde::Serialize;
use xi_rope::Rope;

use crate::model::InlineNode;
use crate::parsing::{
    blocks::{BlockKind, BlockNode},
    parse_inline_for_block,
    rope::{slice::preview, span::Span},
};

#[derive(Serialize)]
pub struct Snap {
    pub blocks: Vec<BlockSnap>,
}

#[derive(Serialize)]
pub struct BlockSnap {
    pub kind: String,
    pub span: (usize, usize),
    pub text: String,
    pub inline: Vec<InlineSnap>,
}

#[derive(Serialize)]
pub struct InlineSnap {
    pub kind: String,
    pub parts: BTreeMap<String, String>,
}

fn kind_name(kind: &BlockKind) -> String {
    match kind {
        BlockKind::Paragraph => "Paragraph".to_string(),
        BlockKind::Heading { level } => format!("Heading({level})"),
        BlockKind::FencedCode { kind } => format!("FencedCode({kind:?})"),
        BlockKind::IndentedCode => "IndentedCode".to_string(),
        BlockKind::List { marker } => format!("List({marker:?})"),
        BlockKind::BlockQuote => "BlockQuote".to_string(),
        BlockKind::Html => "Html".to_string(),
        BlockKind::Hr => "Hr".to_string(),
        BlockKind::FootnoteDef { label } => format!("FootnoteDef({label})"),
    }
}

fn inline_snap(node: &InlineNode) -> InlineSnap {
    let mut parts = BTreeMap::new();
    let kind = match node {
        InlineNode::Text { value } => {
            parts.insert("value".into(), value.clone());
            "Text"
        }
        InlineNode::Strong { .. } => "Strong",
        InlineNode::Em { .. } => "Em",
        InlineNode::Strike { .. } => "Strike",
        InlineNode::Code { value } => {
            parts.insert("value".into(), value.clone());
            "Code"
        }
        InlineNode::Link { href, .. } => {
            parts.insert("href".into(), href.clone());
            "Link"
        }
        InlineNode::Image { src, alt } => {
            parts.insert("src".into(), src.clone());
            parts.insert("alt".into(), alt.clone());
            "Image"
        }
        InlineNode::Br => "Br",
        InlineNode::Mention { handle } => {
            parts.insert("handle".into(), handle.clone());
            "Mention"
        }
        InlineNode::Citation { key } => {
            parts.insert("key".into(), key.clone());
            "Citation"
        }
        InlineNode::MathInline { tex } => {
            parts.insert("tex".into(), tex.clone());
            "MathInline"
        }
        InlineNode::MathDisplay { tex } => {
            parts.insert("tex".into(), tex.clone());
            "MathDisplay"
        }
        InlineNode::FootnoteRef { label } => {
            parts.insert("label".into(), label.clone());
            "FootnoteRef"
        }
    };
    InlineSnap {
        kind: kind.to_string(),
        parts,
    }
}

pub fn normalize(rope: &Rope, blocks: &[BlockNode]) -> Snap {
    let blocks = blocks
        .iter()
        .map(|b| {
            let inline = parse_inline_for_block(rope, b).iter().map(inline_snap).collect();
            BlockSnap {
                kind: kind_name(&b.kind),
                span: (b.span.start, b.span.end),
                text: preview(
                    rope,
                    Span {
                        start: b.span.start,
                        end: b.span.end,
                    },
                    80,
                ),
                inline,
            }
        })
        .collect();

    Snap { blocks }
}
