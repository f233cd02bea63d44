use crate::parsing::rope::{lines::LineRef, span::Span};

use super::kinds::{
    BlockQuote, CodeFence, FenceSig, FootnoteDef, Heading, HtmlBlock, ListMarker, ListMarkers,
    ThematicBreak,
};

/// Per-line facts computed independently of any other line. The builder turns
/// a sequence of these into [`super::types::BlockNode`]s.
#[derive(Debug, Clone)]
pub struct LineClass {
    pub line: Span,
    pub is_blank: bool,

    pub quote_depth: u8,
    /// Byte span of the stripped `>` prefix(es), empty if not a blockquote line.
    pub prefix_span: Span,
    /// Bytes in the rope after stripping blockquote prefixes.
    pub remainder_span: Span,
    pub remainder_text: String,

    pub indent: usize,
    pub fence_sig: Option<FenceSig>,
    pub heading_level: Option<u8>,
    pub is_hr: bool,
    pub list_marker: Option<ListMarker>,
    pub is_html_open: bool,
    pub footnote_label: Option<String>,
}

pub struct MarkdownLineClassifier;

impl MarkdownLineClassifier {
    pub fn classify(&self, lr: &LineRef) -> LineClass {
        let trimmed = lr.text.trim_end_matches(['\r', '\n']);

        let (quote_depth, idx) = BlockQuote::strip_prefixes(trimmed);
        let remainder = &trimmed[idx..];
        let prefix_span = Span {
            start: lr.span.start,
            end: lr.span.start + idx,
        };
        let remainder_span = Span {
            start: lr.span.start + idx,
            end: lr.span.start + trimmed.len(),
        };

        let indent = remainder.bytes().take_while(|&b| b == b' ').count();
        let is_blank = remainder.trim().is_empty();

        LineClass {
            line: lr.span,
            is_blank,
            quote_depth,
            prefix_span,
            remainder_span,
            remainder_text: remainder.to_string(),
            indent,
            fence_sig: CodeFence::sig(remainder),
            heading_level: Heading::detect(remainder),
            is_hr: ThematicBreak::detect(remainder),
            list_marker: ListMarkers::detect(remainder),
            is_html_open: HtmlBlock::detect(remainder),
            footnote_label: FootnoteDef::detect(remainder).map(str::to_string),
        }
    }
}
