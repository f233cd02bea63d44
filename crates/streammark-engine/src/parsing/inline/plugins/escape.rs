//! `escaped-character` and `hard-break`, priorities 3-4.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::InlineNode;
use crate::parsing::inline::plugin::{InlinePlugin, PluginKind, TokenMatch};

fn escape_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\\([!-/:-@\[-`{-~])"#).unwrap())
}

fn hard_break_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\\\n)|( {2,}\n)").unwrap())
}

fn tokenize_escape(text: &str) -> Vec<TokenMatch> {
    escape_re()
        .captures_iter(text)
        .map(|cap| {
            let whole = cap.get(0).unwrap();
            TokenMatch {
                range: whole.range(),
                node: InlineNode::text(cap[1].to_string()),
            }
        })
        .collect()
}

fn tokenize_hard_break(text: &str) -> Vec<TokenMatch> {
    hard_break_re()
        .find_iter(text)
        .map(|m| TokenMatch {
            range: m.range(),
            node: InlineNode::Br,
        })
        .collect()
}

pub fn escaped_character() -> InlinePlugin {
    InlinePlugin {
        name: "escaped-character",
        priority: 3,
        kind: PluginKind::Regex,
        fast_check: Some(|s| s.contains('\\')),
        tokenize: Some(tokenize_escape),
        anticipation: None,
    }
}

pub fn hard_break() -> InlinePlugin {
    InlinePlugin {
        name: "hard-break",
        priority: 4,
        kind: PluginKind::Regex,
        fast_check: Some(|s| s.contains('\n')),
        tokenize: Some(tokenize_hard_break),
        anticipation: None,
    }
}
