//! `citations`, `mentions`, priorities 12-13.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::InlineNode;
use crate::parsing::inline::plugin::{InlinePlugin, PluginKind, TokenMatch};

fn citation_brace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@cite\{([^}]+)\}").unwrap())
}
fn citation_colon_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{cite:([^}]+)\}").unwrap())
}
fn mention_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@([A-Za-z0-9_]+)").unwrap())
}

fn tokenize_citations(text: &str) -> Vec<TokenMatch> {
    let mut matches: Vec<TokenMatch> = citation_brace_re()
        .captures_iter(text)
        .map(|cap| {
            let whole = cap.get(0).unwrap();
            TokenMatch {
                range: whole.range(),
                node: InlineNode::Citation {
                    key: cap[1].to_string(),
                },
            }
        })
        .chain(citation_colon_re().captures_iter(text).map(|cap| {
            let whole = cap.get(0).unwrap();
            TokenMatch {
                range: whole.range(),
                node: InlineNode::Citation {
                    key: cap[1].to_string(),
                },
            }
        }))
        .collect();
    matches.sort_by_key(|m| m.range.start);
    matches
}

fn tokenize_mentions(text: &str) -> Vec<TokenMatch> {
    mention_re()
        .captures_iter(text)
        .map(|cap| {
            let whole = cap.get(0).unwrap();
            TokenMatch {
                range: whole.range(),
                node: InlineNode::Mention {
                    handle: cap[1].to_string(),
                },
            }
        })
        .collect()
}

pub fn citations() -> InlinePlugin {
    InlinePlugin {
        name: "citations",
        priority: 12,
        kind: PluginKind::Regex,
        fast_check: Some(|s| s.contains("@cite{") || s.contains("{cite:")),
        tokenize: Some(tokenize_citations),
        anticipation: None,
    }
}

pub fn mentions() -> InlinePlugin {
    InlinePlugin {
        name: "mentions",
        priority: 13,
        kind: PluginKind::Regex,
        fast_check: Some(|s| s.contains('@')),
        tokenize: Some(tokenize_mentions),
        anticipation: None,
    }
}
