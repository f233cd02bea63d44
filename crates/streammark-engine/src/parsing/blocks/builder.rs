use crate::parsing::rope::span::Span;

use super::{
    classify::LineClass,
    content::{ContentLine, ContentView},
    kinds::CodeFence,
    open::{BlockOpen, try_open_leaf},
    types::{BlockKind, BlockNode},
};

/// Two-phase block construction, phase two: turns a fully classified line
/// sequence into a flat, ordered list of top-level [`BlockNode`]s.
///
/// Unlike a push-based streaming state machine, `build` takes the whole
/// classified slice at once so multi-line block closers (lists, blockquotes)
/// can use bounded lookahead to decide whether a blank line is a lazy
/// continuation or the end of the block. This matches how the block
/// extractor is actually invoked: against the entire current content on
/// every append, not incrementally line by line.
pub struct BlockBuilder;

impl BlockBuilder {
    pub fn build(lines: &[LineClass]) -> Vec<BlockNode> {
        let mut out = Vec::new();
        let mut i = 0;
        while i < lines.len() {
            let c = &lines[i];
            if c.is_blank && c.quote_depth == 0 {
                i += 1;
                continue;
            }
            i = match try_open_leaf(c) {
                Some(BlockOpen::BlockQuote) => Self::consume_blockquote(lines, i, &mut out),
                Some(BlockOpen::FencedCode { kind }) => {
                    Self::consume_fence(lines, i, kind, &mut out)
                }
                Some(BlockOpen::IndentedCode) => Self::consume_indented_code(lines, i, &mut out),
                Some(BlockOpen::Heading { level }) => {
                    Self::emit_single_line(lines, i, BlockKind::Heading { level }, &mut out)
                }
                Some(BlockOpen::Hr) => Self::emit_single_line(lines, i, BlockKind::Hr, &mut out),
                Some(BlockOpen::FootnoteDef { label }) => {
                    Self::consume_paragraph_like(lines, i, BlockKind::FootnoteDef { label }, &mut out)
                }
                Some(BlockOpen::Html) => Self::consume_html(lines, i, &mut out),
                Some(BlockOpen::List { marker }) => Self::consume_list(lines, i, marker, &mut out),
                None => Self::consume_paragraph_like(lines, i, BlockKind::Paragraph, &mut out),
            };
        }
        out
    }

    fn content_line(c: &LineClass) -> ContentLine {
        ContentLine {
            raw_line: c.line,
            prefix: c.prefix_span,
            content: c.remainder_span,
        }
    }

    fn contiguous_view(lines_used: &[&LineClass]) -> ContentView {
        let first = lines_used.first().unwrap();
        let last = lines_used.last().unwrap();
        ContentView::Contiguous(Span {
            start: first.remainder_span.start,
            end: last.remainder_span.end,
        })
    }

    fn emit_single_line(
        lines: &[LineClass],
        i: usize,
        kind: BlockKind,
        out: &mut Vec<BlockNode>,
    ) -> usize {
        let c = &lines[i];
        out.push(BlockNode {
            kind,
            span: c.line,
            content: Self::contiguous_view(&[c]),
        });
        i + 1
    }

    /// Consumes consecutive non-blank lines that do not open a new block
    /// (lazy continuation), used for paragraphs and footnote definitions.
    fn consume_paragraph_like(
        lines: &[LineClass],
        start: usize,
        kind: BlockKind,
        out: &mut Vec<BlockNode>,
    ) -> usize {
        let mut j = start;
        let mut used = Vec::new();
        loop {
            used.push(&lines[j]);
            let next = j + 1;
            if next >= lines.len() {
                j = next;
                break;
            }
            let nc = &lines[next];
            if nc.is_blank || try_open_leaf(nc).is_some() {
                j = next;
                break;
            }
            j = next;
        }
        let span = Span {
            start: used.first().unwrap().line.start,
            end: used.last().unwrap().line.end,
        };
        out.push(BlockNode {
            kind,
            span,
            content: Self::contiguous_view(&used),
        });
        j
    }

    fn consume_fence(
        lines: &[LineClass],
        start: usize,
        kind: super::kinds::FenceKind,
        out: &mut Vec<BlockNode>,
    ) -> usize {
        let mut j = start + 1;
        while j < lines.len() {
            let c = &lines[j];
            if CodeFence::closes(kind, c.fence_sig) {
                j += 1;
                break;
            }
            j += 1;
        }
        let last = j.saturating_sub(1).min(lines.len() - 1);
        let content_lines: Vec<ContentLine> = lines[start..=last].iter().map(Self::content_line).collect();
        let span = Span {
            start: lines[start].line.start,
            end: lines[last].line.end,
        };
        out.push(BlockNode {
            kind: BlockKind::FencedCode { kind },
            span,
            content: ContentView::Lines(content_lines),
        });
        j
    }

    fn consume_indented_code(lines: &[LineClass], start: usize, out: &mut Vec<BlockNode>) -> usize {
        let mut last_content = start;
        let mut j = start + 1;
        while j < lines.len() {
            let c = &lines[j];
            if c.is_blank {
                j += 1;
                continue;
            }
            if c.indent >= super::open::INDENTED_CODE_MIN_INDENT {
                last_content = j;
                j += 1;
            } else {
                break;
            }
        }
        let used: Vec<&LineClass> = lines[start..=last_content].iter().collect();
        let span = Span {
            start: lines[start].line.start,
            end: lines[last_content].line.end,
        };
        out.push(BlockNode {
            kind: BlockKind::IndentedCode,
            span,
            content: Self::contiguous_view(&used),
        });
        last_content + 1
    }

    fn consume_blockquote(lines: &[LineClass], start: usize, out: &mut Vec<BlockNode>) -> usize {
        let mut j = start;
        while j < lines.len() && lines[j].quote_depth > 0 {
            j += 1;
        }
        let content_lines: Vec<ContentLine> = lines[start..j].iter().map(Self::content_line).collect();
        let span = Span {
            start: lines[start].line.start,
            end: lines[j - 1].line.end,
        };
        out.push(BlockNode {
            kind: BlockKind::BlockQuote,
            span,
            content: ContentView::Lines(content_lines),
        });
        j
    }

    fn consume_html(lines: &[LineClass], start: usize, out: &mut Vec<BlockNode>) -> usize {
        let mut j = start + 1;
        while j < lines.len() && !lines[j].is_blank {
            j += 1;
        }
        let last = j - 1;
        let used: Vec<&LineClass> = lines[start..=last].iter().collect();
        let span = Span {
            start: lines[start].line.start,
            end: lines[last].line.end,
        };
        out.push(BlockNode {
            kind: BlockKind::Html,
            span,
            content: Self::contiguous_view(&used),
        });
        j
    }

    fn consume_list(
        lines: &[LineClass],
        start: usize,
        marker: super::kinds::ListMarkerKind,
        out: &mut Vec<BlockNode>,
    ) -> usize {
        let item_width = lines[start]
            .list_marker
            .map(|m| m.width.max(2))
            .unwrap_or(2);
        let mut last_content = start;
        let mut cursor = start + 1;
        loop {
            if cursor >= lines.len() {
                break;
            }
            let c = &lines[cursor];
            if c.is_blank {
                match Self::next_nonblank(lines, cursor) {
                    Some(j)
                        if lines[j].list_marker.is_some() || lines[j].indent >= item_width =>
                    {
                        last_content = j;
                        cursor = j + 1;
                    }
                    _ => break,
                }
            } else if c.list_marker.is_some() || c.indent >= item_width {
                last_content = cursor;
                cursor += 1;
            } else {
                break;
            }
        }
        let used: Vec<&LineClass> = lines[start..=last_content].iter().collect();
        let span = Span {
            start: lines[start].line.start,
            end: lines[last_content].line.end,
        };
        out.push(BlockNode {
            kind: BlockKind::List { marker },
            span,
            content: Self::contiguous_view(&used),
        });
        last_content + 1
    }

    fn next_nonblank(lines: &[LineClass], from: usize) -> Option<usize> {
        ((from + 1)..lines.len()).find(|&k| !lines[k].is_blank)
    }
}
