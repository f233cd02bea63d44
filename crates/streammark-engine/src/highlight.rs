//! Syntax highlighter seam used by the code enricher (CE). The engine ships
//! a small built-in highlighter (HTML-escape plus a `data-language`
//! attribute) and a bounded LRU cache in front of it, keyed on the language
//! actually used to render plus the body text so a cache hit never depends
//! on outcome of alias resolution happening twice.

use std::num::NonZeroUsize;

use lru::LruCache;

pub trait Highlighter: Send + Sync {
    /// Renders `body` (already dedented/fence-stripped) as HTML for `lang`.
    /// `lang` has already been through alias resolution.
    fn highlight(&self, lang: &str, body: &str) -> String;
}

/// Escapes the body and wraps each line in a `<span class="line">`, enough
/// structure for the line-numbering/`data-language` post-processing the
/// code enricher performs without pulling in a full grammar highlighter.
pub struct PlainHighlighter;

impl Highlighter for PlainHighlighter {
    fn highlight(&self, _lang: &str, body: &str) -> String {
        body.lines()
            .map(|line| format!("<span class=\"line\">{}</span>", escape_html(line)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Cap and key scheme per spec: `lang::body`, capacity 200, dual-keyed under
/// both the resolved language and the language as originally requested so a
/// later re-parse that requests the alias form still hits.
pub struct HighlightCache {
    inner: LruCache<String, String>,
}

impl HighlightCache {
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap());
        Self { inner: LruCache::new(cap) }
    }

    fn key(lang: &str, body: &str) -> String {
        format!("{lang}::{body}")
    }

    /// `post_process` runs once on a cache miss, before the result is
    /// stored, so the cache always holds the fully enhanced HTML rather
    /// than the highlighter's raw output.
    pub fn get_or_insert(
        &mut self,
        highlighter: &dyn Highlighter,
        requested_lang: &str,
        resolved_lang: &str,
        body: &str,
        post_process: impl FnOnce(String) -> String,
    ) -> String {
        let resolved_key = Self::key(resolved_lang, body);
        if let Some(hit) = self.inner.get(&resolved_key) {
            return hit.clone();
        }
        let raw = highlighter.highlight(resolved_lang, body);
        let html = post_process(raw);
        self.inner.put(resolved_key, html.clone());
        if requested_lang != resolved_lang {
            self.inner.put(Self::key(requested_lang, body), html.clone());
        }
        html
    }
}

impl Default for HighlightCache {
    fn default() -> Self {
        Self::new(200)
    }
}
