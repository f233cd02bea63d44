//! Cross-component tests for the universal streaming properties that aren't
//! already pinned by a single module's own unit tests: prefix-reparse
//! stability, coalescing's effect on the final patch stream, backpressure
//! credit monotonicity, appendLines' strict-suffix precondition, the mixed-
//! content splitter's termination/reconstruction guarantee, and the known
//! regex-anticipation gap.

use streammark_engine::model::{NodeSnapshot, Patch};
use streammark_engine::parsing::parse_document;
use streammark_engine::pipeline::{PipelineController, WorkerIn, WorkerOut};

fn tx_of(outs: &[WorkerOut]) -> u64 {
    outs.iter()
        .find_map(|out| match out {
            WorkerOut::Patch { tx, .. } => Some(*tx),
            WorkerOut::Metrics { tx, .. } => Some(*tx),
            _ => None,
        })
        .expect("expected a Patch or Metrics message carrying tx")
}

fn mixed_split(text: &str) -> Vec<streammark_engine::model::MixedContentSegment> {
    streammark_engine::mixed::split(text, &streammark_engine::sanitize::AllowListSanitizer)
}

fn enriched_blocks(content: &str) -> Vec<streammark_engine::model::Block> {
    use streammark_engine::anticipator::AnticipationConfig;
    use streammark_engine::enrich::Enricher;
    use streammark_engine::highlight::{HighlightCache, PlainHighlighter};
    use streammark_engine::parsing::inline::InlineParser;
    use streammark_engine::sanitize::AllowListSanitizer;

    let rope = xi_rope::Rope::from(content);
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
    let count = doc.blocks.len();
    doc.blocks
        .iter()
        .enumerate()
        .map(|(i, node)| enricher.enrich(&rope, node, i + 1 == count, false))
        .collect()
}

/// A re-parse that only extends the document (never edits the already-
/// finalized prefix) must assign every prefix block the same id as before:
/// ids are a pure function of `(type, from)`, and `from` for every block
/// strictly before the edit point cannot have moved.
#[test]
fn prefix_reparse_keeps_earlier_block_ids_stable() {
    let before = "# Heading\n\nFirst paragraph.\n\n";
    let after = format!("{before}Second paragraph.\n");

    let blocks_before = enriched_blocks(before);
    let blocks_after = enriched_blocks(&after);

    for (b, a) in blocks_before.iter().zip(blocks_after.iter()) {
        assert_eq!(b.id, a.id);
    }
    assert_eq!(blocks_after.len(), blocks_before.len() + 1);
}

/// tx is strictly increasing across every message kind that runs a
/// transaction (Init resets it to 1, everything else increments), and
/// `SetCredits` (which only flushes deferred patches, no reparse) still
/// advances it rather than silently reusing the prior value.
#[test]
fn tx_strictly_increases_across_message_kinds() {
    let mut pipeline = PipelineController::new();
    let mut seen = Vec::new();
    seen.push(tx_of(&pipeline.handle(WorkerIn::Init { content: "a\n".to_string() })));
    seen.push(tx_of(&pipeline.handle(WorkerIn::Append { content: "b\n".to_string() })));
    seen.push(tx_of(&pipeline.handle(WorkerIn::SetCredits { queue_depth: 0 })));
    seen.push(tx_of(&pipeline.handle(WorkerIn::Finalize)));

    for pair in seen.windows(2) {
        assert!(pair[1] > pair[0], "tx must strictly increase: {seen:?}");
    }
}

/// appendLines is a strict-suffix-extension fast path only: editing an
/// existing line (not appending past the old length) must fall back to a
/// generic children diff instead.
#[test]
fn append_lines_patch_only_fires_on_strict_suffix_extension() {
    use streammark_engine::differ;
    use streammark_engine::model::NodePath;
    use serde_json::json;

    let old_lines = vec![
        NodeSnapshot::leaf("b0::line:0", "code-line").with_prop("text", json!("one")),
        NodeSnapshot::leaf("b0::line:1", "code-line").with_prop("text", json!("two")),
    ];
    let old = NodeSnapshot::leaf("b0", "code").with_children(old_lines);

    // Case 1: a strict suffix extension -> appendLines.
    let mut extended_lines = old.children.clone();
    extended_lines.push(NodeSnapshot::leaf("b0::line:2", "code-line").with_prop("text", json!("three")));
    let extended = NodeSnapshot::leaf("b0", "code").with_children(extended_lines);
    let at = NodePath::root(streammark_engine::model::BlockId("b0".into()));
    let patches = differ::diff_node(&at, &old, &extended);
    assert!(patches.iter().any(|p| matches!(p, Patch::AppendLines { .. })));

    // Case 2: editing an existing line's text is not a suffix extension ->
    // no appendLines, falls through to the generic children diff instead.
    let mut edited_lines = old.children.clone();
    edited_lines[0] = NodeSnapshot::leaf("b0::line:0", "code-line").with_prop("text", json!("ONE"));
    let edited = NodeSnapshot::leaf("b0", "code").with_children(edited_lines);
    let patches = differ::diff_node(&at, &old, &edited);
    assert!(!patches.iter().any(|p| matches!(p, Patch::AppendLines { .. })));
}

/// Coalescing never increases the patch count and preserves the net effect
/// of the original sequence: merging two AppendLines for the same code block
/// keeps every line (in order), and merging two SetProps for the same node
/// keeps the union of keys with later values winning.
#[test]
fn coalescing_preserves_post_state_and_does_not_grow_patch_count() {
    use streammark_engine::coalesce;
    use streammark_engine::model::{AppendedLine, BlockId, NodePath};
    use std::collections::BTreeMap;
    use serde_json::json;

    let at = NodePath::root(BlockId("code0".into()));
    let patches = vec![
        Patch::AppendLines { at: at.clone(), start_index: 0, lines: vec![AppendedLine { text: "a".into(), highlight: None }] },
        Patch::AppendLines { at: at.clone(), start_index: 1, lines: vec![AppendedLine { text: "b".into(), highlight: None }] },
        Patch::SetProps { at: at.clone(), props: BTreeMap::from([("x".to_string(), json!(1))]) },
        Patch::SetProps { at: at.clone(), props: BTreeMap::from([("x".to_string(), json!(2)), ("y".to_string(), json!(3))]) },
    ];
    let input_len = patches.len();
    let (out, metrics) = coalesce::coalesce(patches, 50);

    assert!(out.len() <= input_len);
    assert_eq!(metrics.output_count, out.len());

    let append = out.iter().find_map(|p| match p {
        Patch::AppendLines { lines, .. } => Some(lines),
        _ => None,
    }).expect("appendLines survives coalescing");
    assert_eq!(append.iter().map(|l| l.text.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);

    let props = out.iter().find_map(|p| match p {
        Patch::SetProps { props, .. } => Some(props),
        _ => None,
    }).expect("setProps survives coalescing");
    assert_eq!(props.get("x").unwrap(), &json!(2));
    assert_eq!(props.get("y").unwrap(), &json!(3));
}

/// Smoothed credit moves monotonically toward the raw signal rather than
/// overshooting, and sits at exactly the configured cutoff-adjacent zero
/// budget once credit has decayed below the low-credit cutoff.
#[test]
fn backpressure_credit_is_monotonic_and_zero_budget_below_cutoff() {
    use streammark_engine::backpressure::{self, BackpressureConfig};

    let config = BackpressureConfig::default();
    let mut credit = 1.0;
    let mut prev = credit;
    for _ in 0..20 {
        credit = backpressure::smooth_credit(credit, 100, &config);
        assert!(credit <= prev, "credit must not increase while queue stays saturated");
        prev = credit;
    }
    assert!(credit <= config.low_credit_cutoff);
    assert_eq!(backpressure::heavy_patch_budget(credit, &config), 0);
}

/// The mixed-content splitter always terminates (even on an unterminated
/// tag or an unbalanced brace) and every segment's value concatenates back
/// into exactly the original input.
#[test]
fn mixed_content_split_terminates_and_reconstructs_the_input() {
    let cases = [
        "plain text, nothing special",
        "before <br/> after",
        "<div><div>inner</div>outer</div> tail",
        "unterminated <kbd>forever and ever and ever",
        "brace without a close { never ends",
        "value is {1 + 2} here, then <em>done</em>.",
    ];
    for case in cases {
        let segments = mixed_split(case);
        let reconstructed: String = segments.iter().map(|s| s.value.as_str()).collect();
        assert_eq!(reconstructed, case, "splitting {case:?} must reconstruct losslessly");
    }
}

/// Known, intentionally deferred gap (see DESIGN.md's anticipator entry):
/// `AnticipationFlags.regex` is plumbed through the flag struct but has no
/// backing custom-pattern mechanism in `prepare()` yet, so setting it has no
/// observable effect beyond what the built-in token kinds already anticipate.
/// This test pins that current behavior so a future implementation of the
/// flag is a deliberate change, not a silent one.
#[test]
fn regex_anticipation_flag_is_not_yet_wired_to_custom_patterns() {
    use streammark_engine::anticipator::{prepare, AnticipationConfig, AnticipationFlags, PrepareResult};

    let flags = AnticipationFlags { regex: true, ..Default::default() };
    let r = prepare("<<<unterminated-custom-delim", AnticipationConfig::Flags(flags));
    // No built-in token kind recognizes `<<<`, so with only `regex` set the
    // content is returned unchanged as already-complete: the flag is inert.
    assert_eq!(
        r,
        PrepareResult::Parse {
            status: streammark_engine::anticipator::ParseStatus::Complete,
            content: "<<<unterminated-custom-delim".to_string(),
            appended: None,
        }
    );
}

/// Underscore emphasis in its three documented forms: plain `_em_` at a
/// word boundary emphasizes, `snake_case_style` intraword underscores never
/// emphasize, and `__strong__` (double underscore) produces Strong rather
/// than Em.
#[test]
fn underscore_emphasis_three_forms() {
    use streammark_engine::model::InlineNode;
    use streammark_engine::parsing::inline::parse_inline;

    let boundary = parse_inline("say _this_ now");
    assert!(boundary.iter().any(|n| matches!(n, InlineNode::Em { .. })));

    let intraword = parse_inline("snake_case_style");
    assert!(!intraword.iter().any(|n| matches!(n, InlineNode::Em { .. })));

    let strong = parse_inline("say __this__ now");
    assert!(strong.iter().any(|n| matches!(n, InlineNode::Strong { .. })));
    assert!(!strong.iter().any(|n| matches!(n, InlineNode::Em { .. })));
}
