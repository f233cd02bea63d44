use super::classify::LineClass;
use super::kinds::{CodeFence, FenceKind, ListMarkerKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockOpen {
    BlockQuote,
    FencedCode { kind: FenceKind },
    IndentedCode,
    Heading { level: u8 },
    Hr,
    FootnoteDef { label: String },
    Html,
    List { marker: ListMarkerKind },
}

/// Minimum indent (in spaces) for an indented code block, per CommonMark.
pub const INDENTED_CODE_MIN_INDENT: usize = 4;

/// Decides which block kind opens on a fresh (non-blank, not-already-open) line.
///
/// Precedence: blockquote beats everything else (nested structure is not
/// decomposed at this level); then fence, heading, hr, footnote-def, html,
/// list, indented-code, with paragraph as the fallback (`None`).
pub fn try_open_leaf(c: &LineClass) -> Option<BlockOpen> {
    if c.quote_depth > 0 {
        return Some(BlockOpen::BlockQuote);
    }
    if let Some(sig) = c.fence_sig {
        return Some(BlockOpen::FencedCode {
            kind: CodeFence::kind(sig),
        });
    }
    if let Some(level) = c.heading_level {
        return Some(BlockOpen::Heading { level });
    }
    if c.is_hr {
        return Some(BlockOpen::Hr);
    }
    if let Some(label) = &c.footnote_label {
        return Some(BlockOpen::FootnoteDef {
            label: label.clone(),
        });
    }
    if c.is_html_open {
        return Some(BlockOpen::Html);
    }
    if let Some(marker) = c.list_marker {
        return Some(BlockOpen::List { marker: marker.kind });
    }
    if c.indent >= INDENTED_CODE_MIN_INDENT {
        return Some(BlockOpen::IndentedCode);
    }
    None
}
