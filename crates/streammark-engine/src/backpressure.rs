//! Backpressure controller (BP): smooths a raw credit signal derived from
//! queue depth, turns the smoothed credit into a heavy-patch budget for the
//! current transaction, and partitions a transaction's patches into an
//! immediate batch and a deferred tail once that budget (or a
//! paragraph-burst cap) is exhausted.

use crate::model::Patch;

#[derive(Debug, Clone, Copy)]
pub struct BackpressureConfig {
    pub target_queue_depth: usize,
    pub max_queue_depth: usize,
    pub smoothing_factor: f64,
    pub low_credit_cutoff: f64,
    pub min_heavy_patch_budget: usize,
    pub max_heavy_patch_budget: usize,
}

impl Default for BackpressureConfig {
    fn default() -> Self {
        Self {
            target_queue_depth: 10,
            max_queue_depth: 100,
            smoothing_factor: 0.3,
            low_credit_cutoff: 0.5,
            min_heavy_patch_budget: 1,
            max_heavy_patch_budget: 24,
        }
    }
}

const DEFER_BUFFER_CAP: usize = 400;
const BURST_CAP: usize = 64;
const BURST_CAP_WITH_FINALIZE: usize = 48;
const BURST_THRESHOLD: usize = 80;

const LIGHTWEIGHT_NODE_TYPES: &[&str] = &["text", "em", "strong", "code", "mention", "citation"];

pub fn raw_credit(queue_depth: usize, config: &BackpressureConfig) -> f64 {
    if queue_depth <= config.target_queue_depth {
        1.0
    } else if queue_depth >= config.max_queue_depth {
        0.0
    } else {
        let span = (config.max_queue_depth - config.target_queue_depth) as f64;
        1.0 - (queue_depth - config.target_queue_depth) as f64 / span
    }
}

pub fn smooth_credit(prev: f64, queue_depth: usize, config: &BackpressureConfig) -> f64 {
    let raw = raw_credit(queue_depth, config);
    (1.0 - config.smoothing_factor) * prev + config.smoothing_factor * raw
}

pub fn heavy_patch_budget(credit: f64, config: &BackpressureConfig) -> usize {
    if credit <= config.low_credit_cutoff {
        return 0;
    }
    let t = (credit - config.low_credit_cutoff) / (1.0 - config.low_credit_cutoff);
    let min = config.min_heavy_patch_budget as f64;
    let max = config.max_heavy_patch_budget as f64;
    (min + t * (max - min)).round() as usize
}

fn node_type_of(node: &crate::model::SerializedSnapshot) -> &str {
    &node.node_type
}

pub fn is_heavy(patch: &Patch) -> bool {
    match patch {
        Patch::SetHtml { .. } => true,
        Patch::AppendLines { lines, .. } => lines.len() > 4,
        Patch::InsertChild { node, .. } | Patch::ReplaceChild { node, .. } => {
            !LIGHTWEIGHT_NODE_TYPES.contains(&node_type_of(node))
        }
        Patch::SetProps { props, .. } => props.contains_key("html") || props.contains_key("embeddedCodeOrHtml"),
        Patch::SetPropsBatch { entries } => entries
            .iter()
            .any(|(_, props)| props.contains_key("html") || props.contains_key("embeddedCodeOrHtml")),
        Patch::DeleteChild { .. } | Patch::Finalize { .. } | Patch::Reorder { .. } => false,
    }
}

fn is_paragraph_boundary(patch: &Patch) -> bool {
    matches!(patch, Patch::InsertChild { node, .. } | Patch::ReplaceChild { node, .. } if node_type_of(node) == "paragraph")
}

/// Splits `patches` into an immediate batch and a deferred tail, per the
/// transaction's smoothed `credit` and whether the transaction includes a
/// `finalize` boundary (which tightens the paragraph-burst cap).
pub fn partition(patches: Vec<Patch>, credit: f64, config: &BackpressureConfig, has_finalize: bool) -> (Vec<Patch>, Vec<Patch>) {
    let budget = heavy_patch_budget(credit, config);
    let low_credit = credit <= config.low_credit_cutoff;
    let burst_cap = if has_finalize { BURST_CAP_WITH_FINALIZE } else { BURST_CAP };
    let burst_active = low_credit && patches.len() >= BURST_THRESHOLD;

    let mut immediate = Vec::new();
    let mut deferred = Vec::new();
    let mut heavy_used = 0usize;

    for patch in patches {
        let heavy = is_heavy(&patch);
        let over_defer_cap = deferred.len() >= DEFER_BUFFER_CAP;
        let over_burst_cap = burst_active && immediate.len() >= burst_cap && is_paragraph_boundary(&patch);

        if over_defer_cap {
            immediate.push(patch);
            continue;
        }
        if over_burst_cap || (heavy && heavy_used >= budget) {
            deferred.push(patch);
        } else {
            if heavy {
                heavy_used += 1;
            }
            immediate.push(patch);
        }
    }
    (immediate, deferred)
}

/// Bounds how many deferred patches may be flushed at once when fresh
/// credit arrives.
pub const FLUSH_ON_CREDIT_CAP: usize = 120;

pub fn flush_batch(deferred: &mut Vec<Patch>) -> Vec<Patch> {
    let take = deferred.len().min(FLUSH_ON_CREDIT_CAP);
    deferred.drain(..take).collect()
}
