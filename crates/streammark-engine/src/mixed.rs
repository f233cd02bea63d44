//! Mixed-content splitter (MS): splits a block's raw text into ordered
//! text / inline-HTML / MDX-expression segments, two passes over the text.
//!
//! Pass one finds HTML-like tags (`<div>...</div>`, void elements, MDX
//! components) and carves them into [`SegmentKind::Html`] segments, nesting
//! aware for same-named tags, sanitizing each one's value as it's carved out
//! so `sanitized` is always populated alongside `value`. Pass two walks the
//! remaining text segments looking for flat, brace-delimited `{expr}` MDX
//! expressions (a `{` containing another `{` before its closing `}` is not
//! a match), skipping over math-like spans (`$...$`, `` `...` ``) so `${x}`
//! in an inline code span is never mistaken for an expression.

use crate::model::{MixedContentSegment, SegmentKind};
use crate::sanitize::HtmlSanitizer;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Tags left unterminated for longer than this many newlines are treated as
/// auto-closed (void-like) rather than swallowing the rest of the document.
const MAX_NEWLINES_UNCLOSED: usize = 50;

/// Splits `text` into ordered segments, sanitizing each HTML segment's
/// value once (via `sanitizer`) as it's carved out by the tag pass.
pub fn split(text: &str, sanitizer: &dyn HtmlSanitizer) -> Vec<MixedContentSegment> {
    let tag_segments = tag_pass(text, sanitizer);
    let mut out = Vec::new();
    for seg in tag_segments {
        match seg.kind {
            SegmentKind::Html => out.push(seg),
            SegmentKind::Text => out.extend(expression_pass(&seg.value)),
            SegmentKind::Mdx => out.push(seg),
        }
    }
    merge_and_prune(out)
}

struct RawTag {
    start: usize,
    end: usize,
    name: String,
    self_closing: bool,
}

fn find_next_tag(text: &str, from: usize) -> Option<RawTag> {
    let bytes = text.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        if bytes[i] == b'<' {
            let rest = &text[i..];
            if rest.starts_with("</") {
                i += 1;
                continue;
            }
            if let Some(close) = rest.find('>') {
                let inner = &rest[1..close];
                let name: String = inner
                    .chars()
                    .take_while(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
                    .collect();
                if !name.is_empty() && name.chars().next().unwrap().is_alphabetic() {
                    let self_closing = inner.trim_end().ends_with('/');
                    return Some(RawTag {
                        start: i,
                        end: i + close + 1,
                        name: name.to_ascii_lowercase(),
                        self_closing,
                    });
                }
            }
        }
        i += 1;
    }
    None
}

fn find_matching_close(text: &str, name: &str, from: usize) -> Option<usize> {
    let open_needle = format!("<{name}");
    let close_needle = format!("</{name}>");
    let mut depth = 1usize;
    let mut i = from;
    let mut newlines_since = 0usize;
    while i < text.len() {
        let rest = &text[i..];
        if rest.starts_with(&close_needle) {
            depth -= 1;
            if depth == 0 {
                return Some(i + close_needle.len());
            }
            i += close_needle.len();
            continue;
        }
        if rest.starts_with(&open_needle) {
            let after = &rest[open_needle.len()..];
            let boundary = after.chars().next().map(|c| !c.is_alphanumeric()).unwrap_or(true);
            if boundary {
                if let Some(gt) = rest.find('>') {
                    if !rest[..gt].trim_end().ends_with('/') {
                        depth += 1;
                    }
                    i += gt + 1;
                    continue;
                }
            }
        }
        if rest.starts_with('\n') {
            newlines_since += 1;
            if newlines_since > MAX_NEWLINES_UNCLOSED {
                return None;
            }
        }
        i += rest.chars().next().map(|c| c.len_utf8()).unwrap_or(1);
    }
    None
}

fn tag_pass(text: &str, sanitizer: &dyn HtmlSanitizer) -> Vec<MixedContentSegment> {
    let mut out = Vec::new();
    let mut cursor = 0usize;
    while let Some(tag) = find_next_tag(text, cursor) {
        if tag.start > cursor {
            out.push(text_segment(&text[cursor..tag.start]));
        }
        let is_void = VOID_ELEMENTS.contains(&tag.name.as_str()) || tag.self_closing;
        if is_void {
            out.push(html_segment(&text[tag.start..tag.end], sanitizer));
            cursor = tag.end;
            continue;
        }
        match find_matching_close(text, &tag.name, tag.end) {
            Some(close_end) => {
                out.push(html_segment(&text[tag.start..close_end], sanitizer));
                cursor = close_end;
            }
            None => {
                // Unterminated beyond the patience window: treat the open tag
                // alone as an (auto-closed) HTML segment and keep scanning.
                out.push(html_segment(&text[tag.start..tag.end], sanitizer));
                cursor = tag.end;
            }
        }
    }
    if cursor < text.len() {
        out.push(text_segment(&text[cursor..]));
    }
    out
}

fn text_segment(value: &str) -> MixedContentSegment {
    MixedContentSegment {
        kind: SegmentKind::Text,
        value: value.to_string(),
        range: None,
        inline: None,
        sanitized: None,
        status: None,
        error: None,
    }
}

fn html_segment(value: &str, sanitizer: &dyn HtmlSanitizer) -> MixedContentSegment {
    MixedContentSegment {
        kind: SegmentKind::Html,
        value: value.to_string(),
        range: None,
        inline: None,
        sanitized: Some(sanitizer.sanitize(value)),
        status: None,
        error: None,
    }
}

fn mdx_segment(value: &str) -> MixedContentSegment {
    MixedContentSegment {
        kind: SegmentKind::Mdx,
        value: value.to_string(),
        range: None,
        inline: None,
        sanitized: None,
        status: Some(crate::model::MdxStatus::Pending),
        error: None,
    }
}

/// Finds flat `{expr}` spans (no brace nested inside) in plain text,
/// skipping over `$...$`/`` `...` `` runs so math/code text is never
/// mistaken for MDX. A `{` that encounters another `{` before its closing
/// `}` is not a match at that position; scanning resumes from the next
/// byte, so a shorter flat span nested inside it can still match.
fn expression_pass(text: &str) -> Vec<MixedContentSegment> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut plain_start = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'$' | b'`' => {
                let delim = bytes[i];
                let close = text[i + 1..].find(delim as char).map(|p| i + 1 + p + 1);
                i = close.unwrap_or(text.len());
            }
            b'{' => {
                let mut j = i + 1;
                let mut end = None;
                while j < bytes.len() {
                    match bytes[j] {
                        b'{' => break,
                        b'}' => {
                            end = Some(j + 1);
                            break;
                        }
                        _ => j += 1,
                    }
                }
                if let Some(end) = end {
                    if i > plain_start {
                        out.push(text_segment(&text[plain_start..i]));
                    }
                    out.push(mdx_segment(&text[i..end]));
                    plain_start = end;
                    i = end;
                    continue;
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
    if plain_start < text.len() {
        out.push(text_segment(&text[plain_start..]));
    }
    out
}

fn merge_and_prune(segments: Vec<MixedContentSegment>) -> Vec<MixedContentSegment> {
    let mut out: Vec<MixedContentSegment> = Vec::new();
    for seg in segments {
        if seg.value.is_empty() {
            continue;
        }
        if let (SegmentKind::Text, Some(last)) = (&seg.kind, out.last_mut()) {
            if last.kind == SegmentKind::Text {
                last.value.push_str(&seg.value);
                continue;
            }
        }
        out.push(seg);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitize::AllowListSanitizer;

    fn split(text: &str) -> Vec<MixedContentSegment> {
        super::split(text, &AllowListSanitizer)
    }

    #[test]
    fn plain_text_stays_a_single_segment() {
        let segs = split("just plain text");
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].kind, SegmentKind::Text);
    }

    #[test]
    fn void_element_becomes_its_own_html_segment() {
        let segs = split("before <br/> after");
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[1].kind, SegmentKind::Html);
        assert_eq!(segs[1].value, "<br/>");
    }

    #[test]
    fn html_segment_carries_its_sanitized_value() {
        let segs = split("<script>evil()</script>ok");
        assert_eq!(segs[0].kind, SegmentKind::Html);
        assert_eq!(segs[0].value, "<script>evil()</script>");
        assert_eq!(segs[0].sanitized, Some("evil()".to_string()));
    }

    #[test]
    fn nested_same_name_tags_are_depth_tracked() {
        let segs = split("<div><div>inner</div>outer</div> tail");
        assert_eq!(segs[0].kind, SegmentKind::Html);
        assert_eq!(segs[0].value, "<div><div>inner</div>outer</div>");
        assert_eq!(segs[1].value, " tail");
    }

    #[test]
    fn mdx_expression_is_extracted_from_text() {
        let segs = split("value is {1 + 2} here");
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[1].kind, SegmentKind::Mdx);
        assert_eq!(segs[1].value, "{1 + 2}");
    }

    #[test]
    fn braces_inside_math_are_not_mdx() {
        let segs = split("math $\\{x\\}$ stays text");
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].kind, SegmentKind::Text);
    }

    #[test]
    fn brace_spans_with_nested_braces_are_not_mdx() {
        let segs = split("{ outer { inner } } tail");
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[0].kind, SegmentKind::Text);
        assert_eq!(segs[0].value, "{ outer ");
        assert_eq!(segs[1].kind, SegmentKind::Mdx);
        assert_eq!(segs[1].value, "{ inner }");
        assert_eq!(segs[2].kind, SegmentKind::Text);
        assert_eq!(segs[2].value, " } tail");
    }
}
