//! Tree differ (TD): compares two `NodeSnapshot` forests (the block list, or
//! any node's children) and emits the smallest patch sequence that turns the
//! old tree into the new one.
//!
//! Top-level diffing (and every recursive children diff) starts by matching
//! a shared id prefix and a shared id suffix, leaving only the differing
//! middle run to actually diff; if the removed and added middle runs are
//! the same length, each position becomes a `replaceChild`, otherwise the
//! removed run is deleted back-to-front and the added run inserted
//! front-to-back (so index arithmetic never needs to account for patches
//! already applied). List-node children are a deliberate exception: per the
//! explicit design decision to never reorder list items (moving a list item
//! is indistinguishable, to a renderer, from deleting and re-inserting one,
//! and reorder correctness for nested lists is not worth the complexity),
//! list diffs only ever delete+insert, never emit `Reorder`. An HTML block
//! whose sanitized HTML changed gets a dedicated `SetHtml` patch rather than
//! a generic `SetProps`, since a renderer can apply it directly without
//! knowing which prop key carries rendered markup.

use std::collections::BTreeMap;

use crate::model::{AppendedLine, NodePath, NodeSnapshot, Patch, SerializedSnapshot};

/// Synthetic block id used only to address the top-level block list itself
/// (every real patch target further down the tree uses the actual block's
/// id once the shared-prefix/suffix walk descends into a matched pair).
pub const DOCUMENT_ROOT: &str = "__document__";

pub fn diff_document(old: &[NodeSnapshot], new: &[NodeSnapshot]) -> Vec<Patch> {
    let at = NodePath::root(crate::model::BlockId(DOCUMENT_ROOT.to_string()));
    diff_children(&at, old, new, false)
}

/// Diffs one node's subtree given the patch target path of the node itself.
pub fn diff_node(at: &NodePath, old: &NodeSnapshot, new: &NodeSnapshot) -> Vec<Patch> {
    let mut patches = Vec::new();

    let mut prop_diff = diff_props(&old.props, &new.props);
    // An HTML block's rendered content is its sanitized HTML, not a generic
    // prop; pull it out of the diff and address it with its own typed patch
    // instead of folding it into a setProps a renderer has to interpret.
    if old.node_type == "html" && new.node_type == "html" {
        if let Some(html) = prop_diff.remove("sanitizedHtml").and_then(|v| v.as_str().map(str::to_string)) {
            patches.push(Patch::SetHtml { at: at.clone(), html, sanitized: true });
        }
    }
    if !prop_diff.is_empty() {
        patches.push(Patch::SetProps { at: at.clone(), props: prop_diff });
    }

    if new.node_type == "code-line" || old.node_type != new.node_type {
        return patches;
    }

    let is_list_parent = old.node_type.ends_with("list") || new.node_type.ends_with("list");
    let is_code_lines = old.children.iter().all(|c| c.node_type == "code-line")
        && new.children.iter().all(|c| c.node_type == "code-line")
        && !old.children.is_empty();

    if is_code_lines {
        if let Some(append) = try_append_lines(at, &old.children, &new.children) {
            patches.push(append);
            return patches;
        }
    }

    patches.extend(diff_children(at, &old.children, &new.children, is_list_parent));
    patches
}

fn diff_props(
    old: &BTreeMap<String, serde_json::Value>,
    new: &BTreeMap<String, serde_json::Value>,
) -> BTreeMap<String, serde_json::Value> {
    let mut out = BTreeMap::new();
    for (k, v) in new {
        if old.get(k) != Some(v) {
            out.insert(k.clone(), v.clone());
        }
    }
    out
}

/// Fast path for code blocks: if the new lines are the old lines plus a
/// strict suffix of new lines, emit a single `appendLines` instead of a
/// full children diff.
fn try_append_lines(at: &NodePath, old: &[NodeSnapshot], new: &[NodeSnapshot]) -> Option<Patch> {
    if new.len() <= old.len() {
        return None;
    }
    for (o, n) in old.iter().zip(new.iter()) {
        if o.props.get("text") != n.props.get("text") {
            return None;
        }
    }
    let lines = new[old.len()..]
        .iter()
        .map(|n| AppendedLine {
            text: n.props.get("text").and_then(|v| v.as_str()).unwrap_or("").to_string(),
            highlight: n.props.get("highlight").and_then(|v| v.as_str()).map(str::to_string),
        })
        .collect();
    Some(Patch::AppendLines { at: at.clone(), start_index: old.len(), lines })
}

fn shared_prefix_len(old: &[NodeSnapshot], new: &[NodeSnapshot]) -> usize {
    old.iter().zip(new.iter()).take_while(|(o, n)| o.id == n.id).count()
}

fn shared_suffix_len(old: &[NodeSnapshot], new: &[NodeSnapshot], prefix: usize) -> usize {
    let mut count = 0;
    while count < (old.len() - prefix).min(new.len() - prefix)
        && old[old.len() - 1 - count].id == new[new.len() - 1 - count].id
    {
        count += 1;
    }
    count
}

pub fn diff_children(at: &NodePath, old: &[NodeSnapshot], new: &[NodeSnapshot], is_list: bool) -> Vec<Patch> {
    let prefix = shared_prefix_len(old, new);
    let suffix = shared_suffix_len(old, new, prefix);

    let old_mid = &old[prefix..old.len() - suffix];
    let new_mid = &new[prefix..new.len() - suffix];

    let mut patches = Vec::new();

    for (o, n) in old_mid.iter().zip(new_mid.iter()).take(old_mid.len().min(new_mid.len())) {
        if o.id == n.id {
            patches.extend(diff_node(&child_path(at, &o.id), o, n));
        }
    }
    for (o, n) in old
        .iter()
        .take(prefix)
        .zip(new.iter().take(prefix))
        .chain(old.iter().skip(old.len() - suffix).zip(new.iter().skip(new.len() - suffix)))
    {
        patches.extend(diff_node(&child_path(at, &o.id), o, n));
    }

    if old_mid.len() == new_mid.len() && old_mid.iter().zip(new_mid.iter()).all(|(o, n)| o.id == n.id) {
        return patches;
    }

    if !is_list && old_mid.len() == new_mid.len() {
        let old_ids: std::collections::BTreeSet<_> = old_mid.iter().map(|n| &n.id).collect();
        let new_ids: std::collections::BTreeSet<_> = new_mid.iter().map(|n| &n.id).collect();
        if old_ids == new_ids {
            // Same multiset of ids, different order: emit single-element moves.
            let mut working: Vec<_> = old_mid.iter().map(|n| n.id.clone()).collect();
            for (target_idx, n) in new_mid.iter().enumerate() {
                let cur_idx = working.iter().position(|id| id == &n.id).unwrap();
                if cur_idx != target_idx {
                    patches.push(Patch::Reorder {
                        at: at.clone(),
                        from: prefix + cur_idx,
                        to: prefix + target_idx,
                        count: 1,
                    });
                    let item = working.remove(cur_idx);
                    working.insert(target_idx, item);
                }
            }
            return patches;
        }
    }

    if old_mid.len() == new_mid.len() {
        for (i, (o, n)) in old_mid.iter().zip(new_mid.iter()).enumerate() {
            if o.id != n.id {
                patches.push(Patch::ReplaceChild {
                    at: at.clone(),
                    index: prefix + i,
                    node: Box::new(SerializedSnapshot::from(n)),
                });
            }
        }
        return patches;
    }

    for i in (0..old_mid.len()).rev() {
        patches.push(Patch::DeleteChild { at: at.clone(), index: prefix + i });
    }
    for (i, n) in new_mid.iter().enumerate() {
        patches.push(Patch::InsertChild {
            at: at.clone(),
            index: prefix + i,
            node: Box::new(SerializedSnapshot::from(n)),
        });
    }
    patches
}

fn child_path(parent: &NodePath, node_id: &str) -> NodePath {
    if parent.block_id.0 == DOCUMENT_ROOT {
        NodePath::root(crate::model::BlockId(node_id.to_string()))
    } else {
        NodePath::child(parent.block_id.clone(), node_id.to_string())
    }
}
