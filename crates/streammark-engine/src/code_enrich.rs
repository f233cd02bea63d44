//! Code enricher (CE): turns a raw fenced/indented code block into a
//! rendered payload. Strips the fence and common leading indent, resolves
//! the info string into a language plus meta flags, and (once the block is
//! finalized, or highlighting is explicitly forced) runs the highlighter.

use std::collections::BTreeMap;

use crate::highlight::{HighlightCache, Highlighter};

fn language_alias(lang: &str) -> String {
    let lower = lang.to_ascii_lowercase();
    match lower.as_str() {
        "js" | "javascript" | "mjs" | "cjs" => "javascript".to_string(),
        "ts" | "typescript" => "typescript".to_string(),
        "rs" => "rust".to_string(),
        "py" | "python3" => "python".to_string(),
        "sh" | "bash" | "zsh" => "shell".to_string(),
        "yml" => "yaml".to_string(),
        "md" => "markdown".to_string(),
        "" => "text".to_string(),
        _ => lower,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoString {
    pub language: String,
    pub flags: BTreeMap<String, String>,
}

/// Parses a fence info string (`rust`, `rust title="x" {1,3-5}`) into a
/// language plus a flat key/value flag map; bare words after the language
/// become boolean-ish flags keyed to themselves.
pub fn parse_info_string(info: &str) -> InfoString {
    let info = info.trim();
    if info.is_empty() {
        return InfoString { language: "text".to_string(), flags: BTreeMap::new() };
    }
    let mut parts = info.split_whitespace();
    let language = language_alias(parts.next().unwrap_or("text")).to_string();
    let mut flags = BTreeMap::new();
    for part in parts {
        if let Some((k, v)) = part.split_once('=') {
            flags.insert(k.to_string(), v.trim_matches('"').to_string());
        } else {
            flags.insert(part.to_string(), "true".to_string());
        }
    }
    InfoString { language, flags }
}

fn common_indent(lines: &[&str]) -> usize {
    lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches(' ').len())
        .min()
        .unwrap_or(0)
}

/// Strips a shared leading indent from every non-blank line, the inverse of
/// the indentation a fenced block may carry when nested inside a list item.
pub fn dedent(body: &str) -> String {
    let lines: Vec<&str> = body.lines().collect();
    let indent = common_indent(&lines);
    if indent == 0 {
        return body.to_string();
    }
    lines
        .iter()
        .map(|l| if l.len() >= indent { &l[indent..] } else { l.trim_start_matches(' ') })
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct EnrichedCode {
    pub language: String,
    pub flags: BTreeMap<String, String>,
    pub body: String,
    pub html: Option<String>,
    /// One entry per line of `body`, each the line's own `<span class="line"
    /// data-line="N">...</span>` pulled out of `html`, feeding the
    /// `appendLines`/code-line snapshot per-line highlight prop. Empty when
    /// `html` is `None`.
    pub line_html: Vec<String>,
}

const PLACEHOLDER_THEME: &str = "placeholder";
const TRANSPARENT_BG_STYLE: &str = "--shiki-light-bg:transparent;--shiki-dark-bg:transparent;background-color:transparent";

/// `finalized` gates highlighting: a still-dirty (last, in-flight) code
/// block is rendered as plain escaped text until an APPEND/FINALIZE closes
/// it, to avoid re-highlighting on every keystroke.
pub fn enrich(
    info_string: &str,
    raw_body: &str,
    finalized: bool,
    force_finalize: bool,
    highlighter: &dyn Highlighter,
    cache: &mut HighlightCache,
) -> EnrichedCode {
    let info = parse_info_string(info_string);
    let body = dedent(raw_body);
    let (html, line_html) = if finalized || force_finalize {
        let language = info.language.clone();
        let html = cache.get_or_insert(highlighter, &info.language, &info.language, &body, move |raw| {
            post_process(&raw, &language)
        });
        let line_html = extract_line_spans(&html);
        (Some(html), line_html)
    } else {
        (None, Vec::new())
    };
    EnrichedCode { language: info.language, flags: info.flags, body, html, line_html }
}

/// Finalized-highlight post-processing: numbers each `<span class="line">`
/// with `data-line`, stamps `data-language`/`data-theme` on `<code>` (wrapping
/// in a fresh `<pre><code>` shell if the highlighter didn't provide one), and
/// normalizes `<pre>`'s inline style so the highlighter's own background
/// never overrides the host page's.
fn post_process(html: &str, language: &str) -> String {
    let numbered = number_lines(html);
    if numbered.contains("<pre") {
        strip_pre_background(&stamp_code_attrs(&numbered, language))
    } else {
        format!(
            "<pre style=\"{TRANSPARENT_BG_STYLE}\"><code data-language=\"{language}\" data-theme=\"{PLACEHOLDER_THEME}\">{numbered}</code></pre>"
        )
    }
}

fn number_lines(html: &str) -> String {
    const NEEDLE: &str = "<span class=\"line\">";
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    let mut line = 1usize;
    while let Some(pos) = rest.find(NEEDLE) {
        out.push_str(&rest[..pos]);
        out.push_str(&format!("<span class=\"line\" data-line=\"{line}\">"));
        rest = &rest[pos + NEEDLE.len()..];
        line += 1;
    }
    out.push_str(rest);
    out
}

fn stamp_code_attrs(html: &str, language: &str) -> String {
    let Some(pos) = html.find("<code") else {
        return html.to_string();
    };
    let Some(gt) = html[pos..].find('>') else {
        return html.to_string();
    };
    let insert_at = pos + gt;
    format!(
        "{} data-language=\"{language}\" data-theme=\"{PLACEHOLDER_THEME}\"{}",
        &html[..insert_at],
        &html[insert_at..]
    )
}

/// Strips `background`/`background-color`/`--shiki-*-bg` declarations from
/// `<pre>`'s inline `style`, then appends the transparent-background custom
/// properties, matching nested-tag-aware scanning used elsewhere in this
/// module's pass-based helpers rather than a regex.
fn strip_pre_background(html: &str) -> String {
    let Some(pos) = html.find("<pre") else {
        return html.to_string();
    };
    let Some(tag_end) = html[pos..].find('>') else {
        return html.to_string();
    };
    let tag_end = pos + tag_end;
    let tag = &html[pos..tag_end];

    let new_tag = if let Some(style_pos) = tag.find("style=\"") {
        let value_start = style_pos + "style=\"".len();
        let value_end = tag[value_start..].find('"').map(|p| value_start + p).unwrap_or(tag.len());
        let declarations = &tag[value_start..value_end];
        let kept: Vec<&str> = declarations
            .split(';')
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .filter(|d| {
                let key = d.split(':').next().unwrap_or("").trim();
                !key.eq_ignore_ascii_case("background")
                    && !key.eq_ignore_ascii_case("background-color")
                    && !(key.starts_with("--shiki-") && key.ends_with("-bg"))
            })
            .collect();
        let mut new_style = kept.join(";");
        if !new_style.is_empty() {
            new_style.push(';');
        }
        new_style.push_str(TRANSPARENT_BG_STYLE);
        format!("{}style=\"{}{}", &tag[..style_pos], new_style, &tag[value_end..])
    } else {
        format!("{tag} style=\"{TRANSPARENT_BG_STYLE}\"")
    };
    format!("{}{}{}", &html[..pos], new_tag, &html[tag_end..])
}

/// Pulls each numbered `<span class="line" data-line="N">...</span>` out of
/// `html` as its own string, depth-tracking nested `<span>`s the same way
/// the mixed-content splitter depth-tracks nested tags.
fn extract_line_spans(html: &str) -> Vec<String> {
    const OPEN_NEEDLE: &str = "<span class=\"line\" data-line=\"";
    let mut out = Vec::new();
    let mut cursor = 0usize;
    while let Some(rel) = html[cursor..].find(OPEN_NEEDLE) {
        let start = cursor + rel;
        let mut depth = 0usize;
        let mut i = start;
        let mut end = None;
        while i < html.len() {
            if html[i..].starts_with("<span") {
                depth += 1;
                i += "<span".len();
            } else if html[i..].starts_with("</span>") {
                depth -= 1;
                i += "</span>".len();
                if depth == 0 {
                    end = Some(i);
                    break;
                }
            } else {
                i += 1;
            }
        }
        match end {
            Some(end) => {
                out.push(html[start..end].to_string());
                cursor = end;
            }
            None => break,
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::PlainHighlighter;

    #[test]
    fn resolves_language_alias() {
        assert_eq!(parse_info_string("js").language, "javascript");
        assert_eq!(parse_info_string("rs title=\"x\"").language, "rust");
    }

    #[test]
    fn dedents_shared_leading_spaces() {
        let body = "  let a = 1;\n  let b = 2;\n";
        assert_eq!(dedent(body), "let a = 1;\nlet b = 2;");
    }

    #[test]
    fn dirty_block_skips_highlighting() {
        let mut cache = HighlightCache::new(10);
        let h = PlainHighlighter;
        let out = enrich("rust", "fn x() {}", false, false, &h, &mut cache);
        assert!(out.html.is_none());
    }

    #[test]
    fn finalized_block_is_highlighted() {
        let mut cache = HighlightCache::new(10);
        let h = PlainHighlighter;
        let out = enrich("rust", "fn x() {}", true, false, &h, &mut cache);
        assert!(out.html.is_some());
    }

    #[test]
    fn finalized_html_is_numbered_and_stamped() {
        let mut cache = HighlightCache::new(10);
        let h = PlainHighlighter;
        let out = enrich("rust", "fn x() {}\nlet y = 1;", true, false, &h, &mut cache);
        let html = out.html.unwrap();
        assert!(html.contains("data-line=\"1\""));
        assert!(html.contains("data-line=\"2\""));
        assert!(html.contains("data-language=\"rust\""));
        assert!(html.contains("data-theme=\""));
        assert!(!html.contains("background-color:#"));
        assert!(html.contains(TRANSPARENT_BG_STYLE));
    }

    #[test]
    fn finalized_html_yields_one_line_html_entry_per_line() {
        let mut cache = HighlightCache::new(10);
        let h = PlainHighlighter;
        let out = enrich("rust", "a\nb\nc", true, false, &h, &mut cache);
        assert_eq!(out.line_html.len(), 3);
        assert!(out.line_html[0].contains("data-line=\"1\""));
        assert!(out.line_html[1].contains("data-line=\"2\""));
    }

    #[test]
    fn strip_pre_background_removes_shiki_bg_vars() {
        let html = "<pre style=\"background-color:#fff;--shiki-light-bg:#fff;color:red\"><code>x</code></pre>";
        let out = strip_pre_background(html);
        assert!(!out.contains("background-color:#fff"));
        assert!(!out.contains("--shiki-light-bg:#fff"));
        assert!(out.contains("color:red"));
        assert!(out.contains(TRANSPARENT_BG_STYLE));
    }
}
