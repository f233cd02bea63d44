use crate::model::InlineNode;

use super::cache::InlineCache;
use super::plugin::fold;
use super::plugins::default_plugins;

/// Tokenizes a text run into a tree of inline nodes using the ordered
/// regex/AST plugin fold, with an optional LRU cache keyed by the raw text.
pub struct InlineParser {
    cache: InlineCache,
}

impl InlineParser {
    pub fn new(max_cache_entries: usize) -> Self {
        Self {
            cache: InlineCache::new(max_cache_entries),
        }
    }

    /// `cache=false` must neither read nor write the cache.
    pub fn parse(&mut self, text: &str, cache: bool) -> Vec<InlineNode> {
        if cache {
            if let Some(hit) = self.cache.get(text) {
                return hit;
            }
        }
        let nodes = fold(text, &default_plugins());
        if cache {
            self.cache.put(text.to_string(), nodes.clone());
        }
        nodes
    }
}

impl Default for InlineParser {
    fn default() -> Self {
        Self::new(2000)
    }
}

/// One-shot parse with no cache, for call sites that don't hold a long-lived
/// [`InlineParser`] (block extraction during a single APPEND).
pub fn parse_inline(text: &str) -> Vec<InlineNode> {
    fold(text, &default_plugins())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_text() {
        let nodes = parse_inline("hello world");
        assert_eq!(nodes, vec![InlineNode::text("hello world")]);
    }

    #[test]
    fn parses_code_span() {
        let nodes = parse_inline("a `code` b");
        assert_eq!(
            nodes,
            vec![
                InlineNode::text("a "),
                InlineNode::Code { value: "code".into() },
                InlineNode::text(" b"),
            ]
        );
    }

    #[test]
    fn math_runs_before_escape_so_backslash_survives() {
        let nodes = parse_inline("$$a \\\\ b$$");
        assert_eq!(
            nodes,
            vec![InlineNode::MathDisplay {
                tex: "a \\\\ b".into()
            }]
        );
    }

    #[test]
    fn intraword_underscore_does_not_emphasize() {
        let nodes = parse_inline("snake_case_value");
        assert_eq!(nodes, vec![InlineNode::text("snake_case_value")]);
    }

    #[test]
    fn strong_then_emphasis_nest_correctly() {
        let nodes = parse_inline("**bold** and *em*");
        assert_eq!(
            nodes,
            vec![
                InlineNode::Strong {
                    children: vec![InlineNode::text("bold")]
                },
                InlineNode::text(" and "),
                InlineNode::Em {
                    children: vec![InlineNode::text("em")]
                },
            ]
        );
    }

    #[test]
    fn code_span_is_a_raw_zone_for_later_plugins() {
        let nodes = parse_inline("`*not emphasis*`");
        assert_eq!(
            nodes,
            vec![InlineNode::Code {
                value: "*not emphasis*".into()
            }]
        );
    }

    #[test]
    fn cache_hit_returns_same_result() {
        let mut parser = InlineParser::new(10);
        let first = parser.parse("hello", true);
        let second = parser.parse("hello", true);
        assert_eq!(first, second);
    }

    #[test]
    fn cache_disabled_flag_still_parses() {
        let mut parser = InlineParser::new(10);
        let nodes = parser.parse("hello", false);
        assert_eq!(nodes, vec![InlineNode::text("hello")]);
    }

    #[test]
    fn link_then_image_precedence() {
        let nodes = parse_inline("![alt](img.png)");
        assert_eq!(
            nodes,
            vec![InlineNode::Image {
                src: "img.png".into(),
                alt: "alt".into(),
            }]
        );
    }

    #[test]
    fn footnote_ref_and_mention_coexist() {
        let nodes = parse_inline("see [^1] cc @alice");
        assert_eq!(
            nodes,
            vec![
                InlineNode::text("see "),
                InlineNode::FootnoteRef { label: "1".into() },
                InlineNode::text(" cc "),
                InlineNode::Mention {
                    handle: "alice".into()
                },
            ]
        );
    }
}
