//! `strong-emphasis`, `strikethrough`, `emphasis`, priorities 9-11.
//!
//! `regex` has no lookbehind, so intraword underscore rejection (the `_`
//! delimiter must not sit between two word characters) is a post-filter on
//! the matched byte indices rather than part of the pattern, per the
//! documented fallback for lookbehind-less regex engines.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::InlineNode;
use crate::parsing::inline::plugin::{InlinePlugin, PluginKind, TokenMatch};

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn intraword(text: &str, range: &std::ops::Range<usize>) -> bool {
    let bytes = text.as_bytes();
    let before = range.start > 0 && is_word_byte(bytes[range.start - 1]);
    let after = range.end < bytes.len() && is_word_byte(bytes[range.end]);
    before && after
}

fn triple_star_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*\*([^*]+)\*\*\*").unwrap())
}
fn triple_underscore_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"___([^_]+)___").unwrap())
}
fn double_star_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap())
}
fn double_underscore_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"__([^_]+)__").unwrap())
}
fn tilde_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"~~([^~]+)~~").unwrap())
}
fn star_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*([^*]+)\*").unwrap())
}
fn underscore_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_([^_]+)_").unwrap())
}

fn strong_em(value: &str) -> InlineNode {
    InlineNode::Strong {
        children: vec![InlineNode::Em {
            children: vec![InlineNode::text(value.to_string())],
        }],
    }
}

fn strong(value: &str) -> InlineNode {
    InlineNode::Strong {
        children: vec![InlineNode::text(value.to_string())],
    }
}

fn em(value: &str) -> InlineNode {
    InlineNode::Em {
        children: vec![InlineNode::text(value.to_string())],
    }
}

fn find_first<'a>(
    text: &'a str,
    candidates: &[(&'a Regex, bool, fn(&str) -> InlineNode)],
) -> Option<TokenMatch> {
    let mut best: Option<(std::ops::Range<usize>, InlineNode)> = None;
    for (re, reject_intraword, build) in candidates {
        if let Some(cap) = re.captures(text) {
            let whole = cap.get(0).unwrap();
            let range = whole.range();
            if *reject_intraword && intraword(text, &range) {
                continue;
            }
            let replace = match &best {
                Some((best_range, _)) => range.start < best_range.start,
                None => true,
            };
            if replace {
                best = Some((range, build(&cap[1])));
            }
        }
    }
    best.map(|(range, node)| TokenMatch { range, node })
}

fn tokenize_strong(text: &str) -> Vec<TokenMatch> {
    let mut out = Vec::new();
    let mut offset = 0usize;
    loop {
        let rest = &text[offset..];
        let candidates: [(&Regex, bool, fn(&str) -> InlineNode); 4] = [
            (triple_star_re(), false, strong_em as fn(&str) -> InlineNode),
            (triple_underscore_re(), true, strong_em as fn(&str) -> InlineNode),
            (double_star_re(), false, strong as fn(&str) -> InlineNode),
            (double_underscore_re(), true, strong as fn(&str) -> InlineNode),
        ];
        match find_first(rest, &candidates) {
            Some(m) => {
                out.push(TokenMatch {
                    range: (offset + m.range.start)..(offset + m.range.end),
                    node: m.node,
                });
                offset += m.range.end;
            }
            None => break,
        }
    }
    out
}

fn tokenize_strike(text: &str) -> Vec<TokenMatch> {
    tilde_re()
        .captures_iter(text)
        .map(|cap| {
            let whole = cap.get(0).unwrap();
            TokenMatch {
                range: whole.range(),
                node: InlineNode::Strike {
                    children: vec![InlineNode::text(cap[1].to_string())],
                },
            }
        })
        .collect()
}

fn tokenize_emphasis(text: &str) -> Vec<TokenMatch> {
    let mut out = Vec::new();
    let mut offset = 0usize;
    loop {
        let rest = &text[offset..];
        let candidates: [(&Regex, bool, fn(&str) -> InlineNode); 2] = [
            (star_re(), false, em as fn(&str) -> InlineNode),
            (underscore_re(), true, em as fn(&str) -> InlineNode),
        ];
        match find_first(rest, &candidates) {
            Some(m) => {
                out.push(TokenMatch {
                    range: (offset + m.range.start)..(offset + m.range.end),
                    node: m.node,
                });
                offset += m.range.end;
            }
            None => break,
        }
    }
    out
}

pub fn strong_emphasis() -> InlinePlugin {
    InlinePlugin {
        name: "strong-emphasis",
        priority: 9,
        kind: PluginKind::Regex,
        fast_check: Some(|s| s.contains("**") || s.contains("__")),
        tokenize: Some(tokenize_strong),
        anticipation: None,
    }
}

pub fn strikethrough() -> InlinePlugin {
    InlinePlugin {
        name: "strikethrough",
        priority: 10,
        kind: PluginKind::Regex,
        fast_check: Some(|s| s.contains("~~")),
        tokenize: Some(tokenize_strike),
        anticipation: None,
    }
}

pub fn emphasis() -> InlinePlugin {
    InlinePlugin {
        name: "emphasis",
        priority: 11,
        kind: PluginKind::Regex,
        fast_check: Some(|s| s.contains('*') || s.contains('_')),
        tokenize: Some(tokenize_emphasis),
        anticipation: None,
    }
}
