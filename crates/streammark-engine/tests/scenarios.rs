//! End-to-end streaming scenarios driven through `PipelineController`, one
//! per documented streaming behavior: emphasis anticipation across appends,
//! code-block append/finalize, list growth, a single-cell table edit, mixed
//! text/HTML content, and document finalization.

use streammark_engine::model::{InlineNode, NodeSnapshot, Patch};
use streammark_engine::pipeline::{PipelineController, WorkerIn, WorkerOut};

fn patches_of(outs: Vec<WorkerOut>) -> Vec<Patch> {
    outs.into_iter()
        .find_map(|out| match out {
            WorkerOut::Patch { patches, .. } => Some(patches),
            _ => None,
        })
        .expect("expected a Patch message")
}

fn find_em<'a>(nodes: &'a [NodeSnapshot]) -> Option<&'a NodeSnapshot> {
    for n in nodes {
        if n.node_type == "em" {
            return Some(n);
        }
        if let Some(found) = find_em(&n.children) {
            return Some(found);
        }
    }
    None
}

fn enrich_one(raw: &str, is_last: bool, force_finalize: bool) -> streammark_engine::model::Block {
    use streammark_engine::anticipator::AnticipationConfig;
    use streammark_engine::enrich::Enricher;
    use streammark_engine::highlight::{HighlightCache, PlainHighlighter};
    use streammark_engine::parsing::inline::InlineParser;
    use streammark_engine::parsing::parse_document;
    use streammark_engine::sanitize::AllowListSanitizer;

    let rope = xi_rope::Rope::from(raw);
    let doc = parse_document(&rope);
    let mut cache = HighlightCache::new(10);
    let highlighter = PlainHighlighter;
    let sanitizer = AllowListSanitizer;
    let mut enricher = Enricher {
        inline: InlineParser::default(),
        highlighter: &highlighter,
        highlight_cache: &mut cache,
        sanitizer: &sanitizer,
        anticipation: AnticipationConfig::Bool(true),
    };
    enricher.enrich(&rope, &doc.blocks[0], is_last, force_finalize)
}

/// S1: streaming emphasis. The first append leaves `*world` unterminated;
/// anticipation closes it so the snapshot already carries an `em` node
/// around "world". The second append supplies the real closing `*` and the
/// tree keeps the same shape — no structural churn, only inline re-parse.
#[test]
fn s1_streaming_emphasis_anticipates_then_settles() {
    let first = enrich_one("hello *world", true, false);
    let first_snap = streammark_engine::snapshot_builder::build(&first);
    let em = find_em(&first_snap.children).expect("anticipated em around the dirty tail");
    let text: Vec<_> = em.children.iter().filter_map(|c| c.props.get("value")).collect();
    assert_eq!(text, vec![&serde_json::json!("world")]);
    assert_eq!(first.payload.meta.get("status").unwrap(), "anticipated");

    let second = enrich_one("hello *world*", true, false);
    let second_snap = streammark_engine::snapshot_builder::build(&second);
    find_em(&second_snap.children).expect("em survives once the real closing delimiter arrives");
    assert_eq!(second.payload.meta.get("status").unwrap(), "complete");

    // Completing the emphasis is a pure prop update at the pipeline level,
    // never a structural change to the block list.
    let mut pipeline = PipelineController::new();
    pipeline.handle(WorkerIn::Init { content: "hello *world".to_string() });
    let out = pipeline.handle(WorkerIn::Append { content: "*".to_string() });
    let patches = patches_of(out);
    assert!(patches.iter().all(|p| matches!(p, Patch::SetProps { .. } | Patch::SetPropsBatch { .. })));
}

/// S2: code append. Highlighted HTML stays absent while the code block is
/// still the dirty tail, and each content-only append produces an
/// `appendLines` patch; once FINALIZE lands, a `setProps` carrying `html`
/// and a `finalize` patch both appear.
#[test]
fn s2_code_append_then_finalize_produces_html_and_finalize() {
    let mut pipeline = PipelineController::new();
    pipeline.handle(WorkerIn::Init { content: "```js\nconst x = 1;\n".to_string() });

    let out = pipeline.handle(WorkerIn::Append { content: "const y = 2;\n".to_string() });
    let patches = patches_of(out);
    assert!(patches.iter().any(|p| matches!(p, Patch::AppendLines { .. })));
    assert!(!patches.iter().any(|p| matches!(p, Patch::SetProps { props, .. } if props.contains_key("html"))));

    let out = pipeline.handle(WorkerIn::Append { content: "```\n".to_string() });
    let patches = patches_of(out);
    assert!(!patches.iter().any(|p| matches!(p, Patch::SetProps { props, .. } if props.contains_key("html"))));

    let out = pipeline.handle(WorkerIn::Finalize);
    let patches = patches_of(out);
    assert!(patches.iter().any(|p| matches!(p, Patch::Finalize { .. })));
    assert!(patches.iter().any(|p| {
        matches!(p, Patch::SetProps { props, .. } if props.contains_key("html"))
            || matches!(p, Patch::SetPropsBatch { entries } if entries.iter().any(|(_, props)| props.contains_key("html")))
    }));
}

/// S3: list growth. Appending a third item must insert exactly one child at
/// index 2 under the list node, never re-inserting items 0/1.
#[test]
fn s3_list_growth_inserts_one_child_at_tail() {
    let mut pipeline = PipelineController::new();
    pipeline.handle(WorkerIn::Init { content: "- a\n- b\n".to_string() });
    let out = pipeline.handle(WorkerIn::Append { content: "- c\n".to_string() });
    let patches = patches_of(out);

    let inserts: Vec<_> = patches
        .iter()
        .filter_map(|p| match p {
            Patch::InsertChild { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(inserts, vec![2]);
    assert!(!patches.iter().any(|p| matches!(p, Patch::DeleteChild { .. } | Patch::ReplaceChild { .. })));
}

/// S4: table edit. Rewriting a single data cell must diff down to one
/// `setProps` on that cell's snapshot, never a row-level replace.
#[test]
fn s4_table_cell_edit_is_a_single_set_props() {
    use streammark_engine::model::{Block, BlockType, Range};
    use streammark_engine::snapshot_builder::build;

    let mut old = Block::new(BlockType::Table, Range::new(0, 1), String::new());
    old.is_finalized = true;
    old.payload.meta.insert("header".to_string(), serde_json::json!(["a", "b"]));
    old.payload.meta.insert("rows".to_string(), serde_json::json!([["1", "2"], ["3", "4"]]));

    let mut new = old.clone();
    new.payload.meta.insert("rows".to_string(), serde_json::json!([["changed", "2"], ["3", "4"]]));

    let old_snap = build(&old);
    let new_snap = build(&new);
    let at = streammark_engine::model::NodePath::root(old.id.clone());
    let patches = streammark_engine::differ::diff_node(&at, &old_snap, &new_snap);

    assert_eq!(patches.len(), 1);
    match &patches[0] {
        Patch::SetProps { at, props } => {
            assert!(at.node_id.as_deref().unwrap().ends_with("::row:1::cell:0"));
            assert_eq!(props.get("value").unwrap(), &serde_json::json!("changed"));
        }
        other => panic!("expected a single SetProps on the edited cell, got {other:?}"),
    }
}

/// S5: mixed content. A paragraph containing inline HTML splits into a text
/// segment followed by an HTML segment; the next paragraph (after the blank
/// line) is a separate block entirely.
#[test]
fn s5_mixed_content_splits_text_and_html_segments() {
    use streammark_engine::model::SegmentKind;
    use streammark_engine::sanitize::AllowListSanitizer;

    let segments = streammark_engine::mixed::split("Text <kbd>`code`</kbd>", &AllowListSanitizer);
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].kind, SegmentKind::Text);
    assert_eq!(segments[0].value, "Text ");
    assert_eq!(segments[1].kind, SegmentKind::Html);
    assert_eq!(segments[1].value, "<kbd>`code`</kbd>");

    let rope = xi_rope::Rope::from("Text <kbd>`code`</kbd>\n\nnext");
    let parsed = streammark_engine::parsing::parse_document(&rope);
    assert_eq!(parsed.blocks.len(), 2);
}

/// S6: finalize. A dirty tail paragraph containing unterminated `**bold`
/// re-enriches without anticipation on FINALIZE: the strong delimiter no
/// longer closes, so the inline tree keeps the raw text as a plain text
/// node, and the patch sequence includes both a `finalize` and a `setProps`
/// replacing `inline`.
#[test]
fn s6_finalize_drops_anticipation_and_emits_finalize() {
    let mut pipeline = PipelineController::new();
    pipeline.handle(WorkerIn::Init { content: "**bold".to_string() });
    let out = pipeline.handle(WorkerIn::Finalize);
    let patches = patches_of(out);

    assert!(patches.iter().any(|p| matches!(p, Patch::Finalize { .. })));
    let touches_inline = patches.iter().any(|p| match p {
        Patch::SetProps { props, .. } => props.contains_key("inline") || props.contains_key("finalized"),
        Patch::SetPropsBatch { entries } => entries.iter().any(|(_, props)| props.contains_key("inline") || props.contains_key("finalized")),
        _ => false,
    });
    assert!(touches_inline);

    // Directly confirm the anticipation-disabled-on-finalize rule: a
    // finalized enrich of "**bold" must NOT produce a Strong node.
    use streammark_engine::anticipator::AnticipationConfig;
    use streammark_engine::enrich::Enricher;
    use streammark_engine::highlight::{HighlightCache, PlainHighlighter};
    use streammark_engine::parsing::inline::InlineParser;
    use streammark_engine::parsing::parse_document;
    use streammark_engine::sanitize::AllowListSanitizer;

    let rope = xi_rope::Rope::from("**bold");
    let doc = parse_document(&rope);
    let mut cache = HighlightCache::new(10);
    let highlighter = PlainHighlighter;
    let sanitizer = AllowListSanitizer;
    let mut enricher = Enricher {
        inline: InlineParser::default(),
        highlighter: &highlighter,
        highlight_cache: &mut cache,
        sanitizer: &sanitizer,
        anticipation: AnticipationConfig::Bool(true),
    };
    let block = enricher.enrich(&rope, &doc.blocks[0], true, true);
    let inline = block.payload.inline.unwrap();
    assert!(!inline.iter().any(|n| matches!(n, InlineNode::Strong { .. })));
    assert!(inline.iter().any(|n| matches!(n, InlineNode::Text { value } if value == "**bold")));
}
