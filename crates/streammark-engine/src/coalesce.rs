//! Patch coalescer (PC): merges adjacent same-target patches within a
//! bounded window so a burst of small edits produces one patch instead of
//! many. Never increases the patch count, never reorders patches that
//! target different nodes, and always emits [`CoalescingMetrics`] alongside
//! the coalesced output so the pipeline can report on how much merging
//! happened.

use std::collections::BTreeMap;

use crate::model::{NodePath, Patch};

const MAX_APPEND_LINES_MERGE: usize = 10;
const MAX_SET_PROPS_MERGE: usize = 10;
const MAX_SET_PROPS_BATCH_ENTRIES: usize = 24;

#[derive(Debug, Clone, Default)]
pub struct CoalescingMetrics {
    pub input_count: usize,
    pub output_count: usize,
    pub per_op_counts: BTreeMap<String, usize>,
    pub elapsed_ms: f64,
}

fn path_key(at: &NodePath) -> String {
    format!("{}|{:?}|{:?}", at.block_id, at.node_id, at.index_path)
}

fn op_name(p: &Patch) -> &'static str {
    match p {
        Patch::InsertChild { .. } => "insertChild",
        Patch::DeleteChild { .. } => "deleteChild",
        Patch::ReplaceChild { .. } => "replaceChild",
        Patch::SetProps { .. } => "setProps",
        Patch::SetPropsBatch { .. } => "setPropsBatch",
        Patch::Finalize { .. } => "finalize",
        Patch::Reorder { .. } => "reorder",
        Patch::AppendLines { .. } => "appendLines",
        Patch::SetHtml { .. } => "setHtml",
    }
}

/// `max_window` bounds how far back a patch may look to find a merge
/// candidate; default 50 per the default pipeline configuration.
pub fn coalesce(patches: Vec<Patch>, max_window: usize) -> (Vec<Patch>, CoalescingMetrics) {
    let input_count = patches.len();
    let mut out: Vec<Patch> = Vec::new();
    let mut merge_run: BTreeMap<usize, usize> = BTreeMap::new();

    for patch in patches {
        let window_start = out.len().saturating_sub(max_window);
        let mut merged = false;

        match &patch {
            Patch::AppendLines { at, lines, .. } => {
                if let Some(idx) = find_last(&out, window_start, |p| matches!(p, Patch::AppendLines { at: a, .. } if path_key(a) == path_key(at))) {
                    let run = merge_run.entry(idx).or_insert(1);
                    if *run < MAX_APPEND_LINES_MERGE {
                        if let Patch::AppendLines { lines: existing, .. } = &mut out[idx] {
                            existing.extend(lines.clone());
                            *run += 1;
                            merged = true;
                        }
                    }
                }
            }
            Patch::SetProps { at, props } => {
                if let Some(idx) = find_last(&out, window_start, |p| matches!(p, Patch::SetProps { at: a, .. } if path_key(a) == path_key(at))) {
                    let run = merge_run.entry(idx).or_insert(1);
                    if *run < MAX_SET_PROPS_MERGE {
                        if let Patch::SetProps { props: existing, .. } = &mut out[idx] {
                            for (k, v) in props {
                                existing.insert(k.clone(), v.clone());
                            }
                            *run += 1;
                            merged = true;
                        }
                    }
                }
            }
            _ => {}
        }

        if !merged {
            out.push(patch);
        }
    }

    let out = dedup_set_props_right_to_left(out);
    let out = batch_set_props(out);

    let mut per_op_counts = BTreeMap::new();
    for p in &out {
        *per_op_counts.entry(op_name(p).to_string()).or_insert(0) += 1;
    }

    let metrics = CoalescingMetrics {
        input_count,
        output_count: out.len(),
        per_op_counts,
        elapsed_ms: 0.0,
    };
    (out, metrics)
}

fn find_last(out: &[Patch], window_start: usize, pred: impl Fn(&Patch) -> bool) -> Option<usize> {
    out.iter().enumerate().skip(window_start).rev().find(|(_, p)| pred(p)).map(|(i, _)| i)
}

/// Scans right to left dropping an earlier `SetProps` to a target that a
/// later `SetProps` to the same target in the window fully shadows, without
/// touching patches for any other target or reordering anything.
fn dedup_set_props_right_to_left(patches: Vec<Patch>) -> Vec<Patch> {
    let mut seen: std::collections::BTreeSet<String> = std::collections::BTreeSet::new();
    let mut keep = vec![true; patches.len()];
    for i in (0..patches.len()).rev() {
        if let Patch::SetProps { at, .. } = &patches[i] {
            let key = path_key(at);
            if seen.contains(&key) {
                keep[i] = false;
            } else {
                seen.insert(key);
            }
        }
    }
    patches.into_iter().zip(keep).filter(|(_, k)| *k).map(|(p, _)| p).collect()
}

/// Combines more than [`MAX_SET_PROPS_BATCH_ENTRIES`] worth of distinct
/// `SetProps` targets sitting consecutively into one `SetPropsBatch`.
fn batch_set_props(patches: Vec<Patch>) -> Vec<Patch> {
    let mut out = Vec::new();
    let mut run: Vec<(NodePath, BTreeMap<String, serde_json::Value>)> = Vec::new();

    let flush = |out: &mut Vec<Patch>, run: &mut Vec<(NodePath, BTreeMap<String, serde_json::Value>)>| {
        if run.len() > MAX_SET_PROPS_BATCH_ENTRIES {
            for chunk in run.chunks(MAX_SET_PROPS_BATCH_ENTRIES) {
                out.push(Patch::SetPropsBatch { entries: chunk.to_vec() });
            }
        } else {
            for (at, props) in run.drain(..) {
                out.push(Patch::SetProps { at, props });
            }
        }
        run.clear();
    };

    for patch in patches {
        match patch {
            Patch::SetProps { at, props } => run.push((at, props)),
            other => {
                flush(&mut out, &mut run);
                out.push(other);
            }
        }
    }
    flush(&mut out, &mut run);
    out
}
