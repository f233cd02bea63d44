//! `math-display` and `math-inline`, priorities 1-2. Must run before
//! `escaped-character` so a literal `\\` inside `$$...$$` is preserved rather
//! than being unescaped first.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::InlineNode;
use crate::parsing::inline::plugin::{InlinePlugin, PluginKind, TokenMatch};

fn display_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\$\$(.+?)\$\$").unwrap())
}

fn inline_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$([^\$\n]+)\$").unwrap())
}

fn tokenize_display(text: &str) -> Vec<TokenMatch> {
    display_re()
        .captures_iter(text)
        .map(|cap| {
            let whole = cap.get(0).unwrap();
            TokenMatch {
                range: whole.range(),
                node: InlineNode::MathDisplay {
                    tex: cap[1].to_string(),
                },
            }
        })
        .collect()
}

fn tokenize_inline(text: &str) -> Vec<TokenMatch> {
    inline_re()
        .captures_iter(text)
        .map(|cap| {
            let whole = cap.get(0).unwrap();
            TokenMatch {
                range: whole.range(),
                node: InlineNode::MathInline {
                    tex: cap[1].to_string(),
                },
            }
        })
        .collect()
}

pub fn math_display() -> InlinePlugin {
    InlinePlugin {
        name: "math-display",
        priority: 1,
        kind: PluginKind::Regex,
        fast_check: Some(|s| s.contains("$$")),
        tokenize: Some(tokenize_display),
        anticipation: None,
    }
}

pub fn math_inline() -> InlinePlugin {
    InlinePlugin {
        name: "math-inline",
        priority: 2,
        kind: PluginKind::Regex,
        fast_check: Some(|s| s.contains('$')),
        tokenize: Some(tokenize_inline),
        anticipation: None,
    }
}
