//! `code-spans`, priority 5. Hand-scanned rather than `regex::Regex`-backed
//! because the closing delimiter's length must equal the opening run's,
//! which needs a backreference the `regex` crate doesn't support.

use crate::model::InlineNode;
use crate::parsing::inline::kinds::CodeSpan;
use crate::parsing::inline::plugin::{InlinePlugin, PluginKind, TokenMatch};

fn tokenize(text: &str) -> Vec<TokenMatch> {
    let mut out = Vec::new();
    let mut from = 0;
    while let Some((open_start, content_start, content_end, close_end)) = CodeSpan::find(text, from) {
        let raw = &text[content_start..content_end];
        let value = CodeSpan::trim_content(raw).replace('\n', " ");
        out.push(TokenMatch {
            range: open_start..close_end,
            node: InlineNode::Code { value },
        });
        from = close_end;
    }
    out
}

pub fn code_spans() -> InlinePlugin {
    InlinePlugin {
        name: "code-spans",
        priority: 5,
        kind: PluginKind::Regex,
        fast_check: Some(|s| s.contains('`')),
        tokenize: Some(tokenize),
        anticipation: None,
    }
}
