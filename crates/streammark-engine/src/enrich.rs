//! Block extractor enrichment: turns the flat, purely-structural
//! `BlockNode` list from `parsing::blocks` into the public `Block`/
//! `BlockPayload` model, running the per-type enrichment rules
//! (inline parsing + anticipation for prose, the mixed-content
//! splitter for blocks that may carry raw HTML/MDX, the code enricher for
//! fenced/indented code, markers stripped into `meta` for headings/lists).

use serde_json::json;
use xi_rope::Rope;

use crate::anticipator::{self, AnticipationConfig};
use crate::code_enrich;
use crate::highlight::{HighlightCache, Highlighter};
use crate::mixed;
use crate::model::{Block, BlockType, Range};
use crate::parsing::blocks::kinds::Heading;
use crate::parsing::blocks::{BlockKind, BlockNode};
use crate::parsing::inline::InlineParser;
use crate::sanitize::HtmlSanitizer;

fn to_range(span: crate::parsing::rope::span::Span) -> Range {
    Range::new(span.start, span.end)
}

fn map_block_type(kind: &BlockKind) -> BlockType {
    match kind {
        BlockKind::Paragraph => BlockType::Paragraph,
        BlockKind::Heading { .. } => BlockType::Heading,
        BlockKind::FencedCode { .. } | BlockKind::IndentedCode => BlockType::Code,
        BlockKind::List { .. } => BlockType::List,
        BlockKind::BlockQuote => BlockType::Blockquote,
        BlockKind::Html => BlockType::Html,
        BlockKind::Hr => BlockType::Hr,
        BlockKind::FootnoteDef { .. } => BlockType::FootnoteDef,
    }
}

pub struct Enricher<'a> {
    pub inline: InlineParser,
    pub highlighter: &'a dyn Highlighter,
    pub highlight_cache: &'a mut HighlightCache,
    pub sanitizer: &'a dyn HtmlSanitizer,
    pub anticipation: AnticipationConfig,
}

impl<'a> Enricher<'a> {
    /// `force_finalize` is set on the final flush of a document: a block is
    /// finalized once something else begins after it, or the caller has
    /// explicitly finalized the stream.
    pub fn enrich(&mut self, rope: &Rope, node: &BlockNode, is_last: bool, force_finalize: bool) -> Block {
        let raw = node.content.join_content(rope);
        let range = to_range(node.span);
        let is_finalized = !is_last || force_finalize;
        let block_type = map_block_type(&node.kind);
        let mut block = Block::new(block_type, range, raw.clone());
        block.is_finalized = is_finalized;

        match &node.kind {
            BlockKind::Paragraph => {
                let segments = self.enrich_prose(&mut block, &raw, is_finalized);
                if crate::mdx::is_mdx_candidate(&segments) {
                    retype_to_mdx(&mut block, BlockType::Paragraph, range.from);
                }
            }
            BlockKind::BlockQuote | BlockKind::FootnoteDef { .. } => {
                self.enrich_prose(&mut block, &raw, is_finalized);
                if let BlockKind::FootnoteDef { label } = &node.kind {
                    block.payload.meta.insert("label".to_string(), json!(label));
                }
            }
            BlockKind::Heading { level } => {
                let text = Heading::strip_markers(&raw, *level);
                block.payload.meta.insert("heading_level".to_string(), json!(level));
                block.payload.meta.insert("heading_text".to_string(), json!(text.clone()));
                block.payload.inline = Some(self.inline.parse(&text, is_finalized));
            }
            BlockKind::List { .. } => {
                self.enrich_prose(&mut block, &raw, is_finalized);
            }
            BlockKind::FencedCode { .. } | BlockKind::IndentedCode => {
                let (info, body) = split_fence(&raw, matches!(node.kind, BlockKind::FencedCode { .. }));
                let enriched = code_enrich::enrich(
                    &info,
                    &body,
                    is_finalized,
                    force_finalize,
                    self.highlighter,
                    self.highlight_cache,
                );
                block.payload.meta.insert("language".to_string(), json!(enriched.language));
                block.payload.meta.insert("flags".to_string(), json!(enriched.flags));
                block.payload.meta.insert("body".to_string(), json!(enriched.body));
                block.payload.meta.insert("line_html".to_string(), json!(enriched.line_html));
                block.payload.highlighted_html = enriched.html;
            }
            BlockKind::Html => {
                let sanitized = self.sanitizer.sanitize(&raw);
                block.payload.sanitized_html = Some(sanitized);
                let segments = mixed::split(&raw, self.sanitizer);
                if crate::mdx::is_mdx_candidate(&segments) {
                    retype_to_mdx(&mut block, BlockType::Html, range.from);
                }
            }
            BlockKind::Hr => {}
        }

        block
    }

    fn enrich_prose(&mut self, block: &mut Block, raw: &str, is_finalized: bool) -> Vec<crate::model::MixedContentSegment> {
        let has_embedded = raw.contains('<') || raw.contains('{');
        // Anticipation only makes sense for the still-streaming tail: once a
        // block is finalized there's no more input coming, so an unterminated
        // delimiter is genuinely unterminated and must render as literal text
        // rather than being spuriously closed.
        let anticipation = if is_finalized { AnticipationConfig::Bool(false) } else { self.anticipation };
        let prepared = anticipator::prepare(raw, anticipation);
        let (text, status) = match prepared {
            anticipator::PrepareResult::Raw { reason } => {
                block.payload.meta.insert("anticipation".to_string(), json!(reason));
                (raw.to_string(), "raw")
            }
            anticipator::PrepareResult::Parse { content, status, .. } => {
                let status_str = match status {
                    anticipator::ParseStatus::Complete => "complete",
                    anticipator::ParseStatus::Anticipated => "anticipated",
                };
                (content, status_str)
            }
        };
        block.payload.meta.insert("status".to_string(), json!(status));

        let segments = if has_embedded {
            let segments = mixed::split(&text, self.sanitizer);
            block.payload.meta.insert("segment_count".to_string(), json!(segments.len()));
            segments
        } else {
            Vec::new()
        };
        block.payload.inline = Some(self.inline.parse(&text, is_finalized));
        segments
    }
}

/// Retypes a paragraph/HTML block to `mdx`: records what it was before
/// under `meta.original_type`, regenerates the id for the new type (ids
/// are `(type, from)`), and marks the MDX compilation lifecycle as
/// just-started.
fn retype_to_mdx(block: &mut Block, original: BlockType, from: usize) {
    block.payload.meta.insert("original_type".to_string(), json!(original.to_string()));
    block.payload.meta.insert("mdxStatus".to_string(), json!(crate::model::MdxStatus::Pending));
    block.block_type = BlockType::Mdx;
    block.id = Block::make_id(BlockType::Mdx, from);
}

fn split_fence(raw: &str, fenced: bool) -> (String, String) {
    if !fenced {
        return (String::new(), raw.to_string());
    }
    let mut lines = raw.lines();
    let info = lines.next().unwrap_or("").trim_start_matches(['`', '~']).to_string();
    let mut body_lines: Vec<&str> = lines.collect();
    if body_lines.last().map(|l| l.trim_start_matches(['`', '~']).trim().is_empty()).unwrap_or(false) {
        body_lines.pop();
    }
    (info, body_lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::PlainHighlighter;
    use crate::sanitize::AllowListSanitizer;
    use crate::parsing::parse_document;

    #[test]
    fn paragraph_gets_inline_nodes() {
        let rope = Rope::from("Hello **world**\n");
        let doc = parse_document(&rope);
        let mut cache = HighlightCache::new(10);
        let highlighter = PlainHighlighter;
        let sanitizer = AllowListSanitizer;
        let mut enricher = Enricher {
            inline: InlineParser::default(),
            highlighter: &highlighter,
            highlight_cache: &mut cache,
            sanitizer: &sanitizer,
            anticipation: AnticipationConfig::Bool(true),
        };
        let block = enricher.enrich(&rope, &doc.blocks[0], true, true);
        assert_eq!(block.block_type, BlockType::Paragraph);
        assert!(block.payload.inline.is_some());
    }

    #[test]
    fn paragraph_with_mdx_expression_retypes_to_mdx() {
        let rope = Rope::from("Value is {x}\n");
        let doc = parse_document(&rope);
        let mut cache = HighlightCache::new(10);
        let highlighter = PlainHighlighter;
        let sanitizer = AllowListSanitizer;
        let mut enricher = Enricher {
            inline: InlineParser::default(),
            highlighter: &highlighter,
            highlight_cache: &mut cache,
            sanitizer: &sanitizer,
            anticipation: AnticipationConfig::Bool(true),
        };
        let block = enricher.enrich(&rope, &doc.blocks[0], true, true);
        assert_eq!(block.block_type, BlockType::Mdx);
        assert_eq!(block.payload.meta.get("original_type").unwrap(), "paragraph");
        assert_eq!(block.payload.meta.get("mdxStatus").unwrap(), "pending");
    }

    #[test]
    fn html_with_capitalized_component_retypes_to_mdx() {
        let rope = Rope::from("<Foo/>\n");
        let doc = parse_document(&rope);
        let mut cache = HighlightCache::new(10);
        let highlighter = PlainHighlighter;
        let sanitizer = AllowListSanitizer;
        let mut enricher = Enricher {
            inline: InlineParser::default(),
            highlighter: &highlighter,
            highlight_cache: &mut cache,
            sanitizer: &sanitizer,
            anticipation: AnticipationConfig::Bool(true),
        };
        let block = enricher.enrich(&rope, &doc.blocks[0], true, true);
        assert_eq!(block.block_type, BlockType::Mdx);
        assert_eq!(block.payload.meta.get("original_type").unwrap(), "html");
    }

    #[test]
    fn heading_strips_markers_into_meta() {
        let rope = Rope::from("## Title\n");
        let doc = parse_document(&rope);
        let mut cache = HighlightCache::new(10);
        let highlighter = PlainHighlighter;
        let sanitizer = AllowListSanitizer;
        let mut enricher = Enricher {
            inline: InlineParser::default(),
            highlighter: &highlighter,
            highlight_cache: &mut cache,
            sanitizer: &sanitizer,
            anticipation: AnticipationConfig::Bool(true),
        };
        let block = enricher.enrich(&rope, &doc.blocks[0], true, true);
        assert_eq!(block.payload.meta.get("heading_text").unwrap(), "Title");
    }
}
