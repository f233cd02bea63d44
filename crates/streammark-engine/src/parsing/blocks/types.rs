use crate::parsing::rope::span::Span;

use super::content::ContentView;
use super::kinds::{FenceKind, ListMarkerKind};

/// The structural kind of a top-level block, as classified purely from its
/// source text. Maps 1:1 onto [`crate::model::BlockType`] once BE finishes
/// enrichment; kept as a separate type because it carries parse-time-only
/// detail (fence style, heading level) that the public `Block` flattens into
/// `meta`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    /// Default leaf block when no other opener matches.
    Paragraph,
    Heading {
        level: u8,
    },
    FencedCode {
        kind: FenceKind,
    },
    IndentedCode,
    List {
        marker: ListMarkerKind,
    },
    BlockQuote,
    Html,
    Hr,
    FootnoteDef {
        label: String,
    },
}

/// A parsed top-level block with its kind and source span.
///
/// Unlike the container-nested model markdown grammars often use, blocks here
/// are always flat: a blockquote or list block's *own* text is what `content`
/// projects (for blockquote, per-line with the `>` prefixes stripped), while
/// any further substructure inside it is reconstructed later by the snapshot
/// builder directly from the raw span, not represented as nested `BlockNode`s.
#[derive(Debug, Clone)]
pub struct BlockNode {
    pub kind: BlockKind,
    /// Full byte span of the block including delimiters.
    pub span: Span,
    /// Content projection for inline parsing and editing.
    pub content: ContentView,
}
