//! # Markdown Parsing
//!
//! A pure-Rust markdown parser built from span-based, two-phase block
//! parsing plus an ordered-fold inline plugin engine.
//!
//! ## Architecture
//!
//! - All parsed structures store byte spans via [`rope::Span`] into the
//!   `xi_rope::Rope`; the rope is the single source of truth and slicing any
//!   span reproduces the exact source text.
//! - **Block extraction** ([`blocks`]) is a flat, top-level-only walk: line
//!   classification then block construction, with no recursive container
//!   nesting. Nested structure inside a blockquote or list item is
//!   reconstructed from the block's own content at snapshot-lowering time,
//!   not represented here.
//! - **Inline parsing** ([`inline`]) tokenizes a block's text via an ordered
//!   fold of regex/AST plugins (knowledge ownership: each plugin owns its
//!   own delimiters), with a bounded LRU cache.
//!
//! ## Usage Pattern
//!
//! ```rust
//! use xi_rope::Rope;
//! use streammark_engine::parsing::{parse_document, parse_inline_for_block};
//!
//! let rope = Rope::from("Hello *world*!\n\n> Quote with `code`");
//! let doc = parse_document(&rope);
//! for block in &doc.blocks {
//!     let inlines = parse_inline_for_block(&rope, block);
//!     let _ = inlines;
//! }
//! ```

pub mod blocks;
pub mod inline;
pub mod rope;
pub mod snapshot;

#[cfg(test)]
mod tests;

use xi_rope::Rope;

use crate::model::InlineNode;
use blocks::{BlockBuilder, BlockKind, BlockNode, MarkdownLineClassifier};
use rope::lines_with_spans;

/// A parsed markdown document containing all top-level blocks.
#[derive(Debug)]
pub struct ParsedDoc {
    pub blocks: Vec<BlockNode>,
}

/// Parses a rope into a flat document structure (block extraction only).
/// Inline parsing is a separate pass via [`parse_inline_for_block`].
pub fn parse_document(rope: &Rope) -> ParsedDoc {
    let classifier = MarkdownLineClassifier;
    let lines: Vec<_> = lines_with_spans(rope).map(|lr| classifier.classify(&lr)).collect();
    ParsedDoc {
        blocks: BlockBuilder::build(&lines),
    }
}

/// Parses inline content for a block node. Paragraphs, headings,
/// blockquotes, list items, and footnote definitions carry inline content;
/// code, HTML, and thematic breaks are raw zones and return empty.
pub fn parse_inline_for_block(rope: &Rope, b: &BlockNode) -> Vec<InlineNode> {
    match b.kind {
        BlockKind::Paragraph
        | BlockKind::Heading { .. }
        | BlockKind::BlockQuote
        | BlockKind::List { .. }
        | BlockKind::FootnoteDef { .. } => {
            let text = b.content.join_content(rope);
            inline::parse_inline(&text)
        }
        BlockKind::FencedCode { .. } | BlockKind::IndentedCode | BlockKind::Html | BlockKind::Hr => {
            vec![]
        }
    }
}
