//! Footnotes plugin: removes individual `FootnoteDef` blocks from the main
//! flow and re-appends a single aggregated `Footnotes` block at the tail,
//! gated on the document's tail being finalized (a still-dirty last block
//! might still turn into more footnote definitions on the next append).

use serde_json::json;

use crate::model::{Block, BlockType, Range};

use super::{DocumentPlugin, PluginOutput};

pub struct FootnotesPlugin;

impl DocumentPlugin for FootnotesPlugin {
    fn key(&self) -> &'static str {
        "footnotes"
    }

    fn apply(&mut self, _content: &str, blocks: Vec<Block>, protected: Vec<super::ProtectedRange>) -> PluginOutput {
        let tail_finalized = blocks.last().map(|b| b.is_finalized).unwrap_or(true);
        if !tail_finalized {
            return PluginOutput { blocks, protected_ranges: protected };
        }

        let mut defs = Vec::new();
        let mut rest = Vec::new();
        for block in blocks {
            if block.block_type == BlockType::FootnoteDef {
                defs.push(block);
            } else {
                rest.push(block);
            }
        }
        if defs.is_empty() {
            return PluginOutput { blocks: rest, protected_ranges: protected };
        }

        let from = defs.first().map(|b| b.payload.range.from).unwrap_or(0);
        let to = defs.last().map(|b| b.payload.range.to).unwrap_or(from);
        let mut aggregate = Block::new(BlockType::Footnotes, Range::new(from, to), String::new());
        aggregate.is_finalized = true;
        let labels: Vec<_> = defs
            .iter()
            .map(|b| b.payload.meta.get("label").cloned().unwrap_or(json!(null)))
            .collect();
        aggregate.payload.meta.insert("definitions".to_string(), json!(labels));
        rest.push(aggregate);
        PluginOutput { blocks: rest, protected_ranges: protected }
    }
}
