//! `links`, `images`, `footnote-refs`, priorities 6-8.
//!
//! Link/image text is a single non-greedy bracket match; nested `[...]` in
//! link text is not supported, matching the plugin's regex-shaped nature.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::InlineNode;
use crate::parsing::inline::plugin::{InlinePlugin, PluginKind, TokenMatch};

fn link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\[([^\]]*)\]\(([^)\s]+)(?:\s+"[^"]*")?\)"#).unwrap())
}

fn image_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"!\[([^\]]*)\]\(([^)\s]+)(?:\s+"[^"]*")?\)"#).unwrap())
}

fn footnote_ref_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[\^([^\]]+)\]").unwrap())
}

fn tokenize_links(text: &str) -> Vec<TokenMatch> {
    link_re()
        .captures_iter(text)
        .filter(|cap| {
            let start = cap.get(0).unwrap().start();
            start == 0 || text.as_bytes()[start - 1] != b'!'
        })
        .map(|cap| {
            let whole = cap.get(0).unwrap();
            TokenMatch {
                range: whole.range(),
                node: InlineNode::Link {
                    href: cap[2].to_string(),
                    children: vec![InlineNode::text(cap[1].to_string())],
                },
            }
        })
        .collect()
}

fn tokenize_images(text: &str) -> Vec<TokenMatch> {
    image_re()
        .captures_iter(text)
        .map(|cap| {
            let whole = cap.get(0).unwrap();
            TokenMatch {
                range: whole.range(),
                node: InlineNode::Image {
                    src: cap[2].to_string(),
                    alt: cap[1].to_string(),
                },
            }
        })
        .collect()
}

fn tokenize_footnote_refs(text: &str) -> Vec<TokenMatch> {
    footnote_ref_re()
        .captures_iter(text)
        .map(|cap| {
            let whole = cap.get(0).unwrap();
            TokenMatch {
                range: whole.range(),
                node: InlineNode::FootnoteRef {
                    label: cap[1].to_string(),
                },
            }
        })
        .collect()
}

pub fn links() -> InlinePlugin {
    InlinePlugin {
        name: "links",
        priority: 6,
        kind: PluginKind::Regex,
        fast_check: Some(|s| s.contains('[')),
        tokenize: Some(tokenize_links),
        anticipation: None,
    }
}

pub fn images() -> InlinePlugin {
    InlinePlugin {
        name: "images",
        priority: 7,
        kind: PluginKind::Regex,
        fast_check: Some(|s| s.contains("![")),
        tokenize: Some(tokenize_images),
        anticipation: None,
    }
}

pub fn footnote_refs() -> InlinePlugin {
    InlinePlugin {
        name: "footnote-refs",
        priority: 8,
        kind: PluginKind::Regex,
        fast_check: Some(|s| s.contains("[^")),
        tokenize: Some(tokenize_footnote_refs),
        anticipation: None,
    }
}
