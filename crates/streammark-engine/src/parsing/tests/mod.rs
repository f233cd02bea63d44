//! Integration tests for the parsing module: block extraction plus inline
//! parsing, checked against the structural invariants and serialized via
//! `insta` for readable diffs.

use crate::model::InlineNode;
use crate::parsing::{blocks::BlockKind, parse_document, parse_inline_for_block, snapshot};

fn parse(md: &str) -> (xi_rope::Rope, crate::parsing::ParsedDoc) {
    let rope = xi_rope::Rope::from(md);
    let doc = parse_document(&rope);
    snapshot::invariants(&rope, &doc.blocks).expect("parser must uphold its structural invariants");
    (rope, doc)
}

#[test]
fn heading_paragraph_and_code_fence_snapshot() {
    let (rope, doc) = parse("# Title\n\nSome *em* and `code`.\n\n```rust\nfn f() {}\n```\n");
    let snap = snapshot::normalize(&rope, &doc.blocks);
    insta::assert_yaml_snapshot!(snap);
}

#[test]
fn blockquote_and_list_snapshot() {
    let (rope, doc) = parse("> quoted **bold**\n> line two\n\n- first\n- second\n");
    let snap = snapshot::normalize(&rope, &doc.blocks);
    insta::assert_yaml_snapshot!(snap);
}

#[test]
fn lossless_span_invariant() {
    let (rope, doc) = parse("Hello *world*!");
    for block in &doc.blocks {
        let text = rope.slice_to_cow(block.span.start..block.span.end);
        assert!(!text.is_empty());
    }
}

#[test]
fn raw_zones_suppress_inline_parsing() {
    let (rope, doc) = parse("`*not emphasis*`");
    assert_eq!(doc.blocks.len(), 1);
    assert!(matches!(doc.blocks[0].kind, BlockKind::Paragraph));

    let inlines = parse_inline_for_block(&rope, &doc.blocks[0]);
    assert_eq!(inlines.len(), 1);
    assert!(matches!(inlines[0], InlineNode::Code { .. }));
}

#[test]
fn unclosed_constructs_become_text() {
    let (rope, doc) = parse("unclosed *em and `unclosed code");
    let inlines = parse_inline_for_block(&rope, &doc.blocks[0]);
    assert!(inlines.iter().all(|n| matches!(n, InlineNode::Text { .. })));
}

#[test]
fn empty_document() {
    let (_, doc) = parse("");
    assert!(doc.blocks.is_empty());
}

#[test]
fn blank_lines_only() {
    let (_, doc) = parse("\n\n\n");
    assert!(doc.blocks.is_empty());
}

#[test]
fn fenced_code_is_a_raw_zone_for_inline() {
    let (rope, doc) = parse("```\n*not emphasis*\n```\n");
    assert_eq!(doc.blocks.len(), 1);
    let inlines = parse_inline_for_block(&rope, &doc.blocks[0]);
    assert!(inlines.is_empty());
}
