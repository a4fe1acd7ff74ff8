//! Exclusive selection: at most one node per root-to-leaf path is selected.

use crate::tree::model::{Forest, NodeId};

/// Flip `node`'s selection. Selecting it clears every selected ancestor and
/// descendant. Returns the full selection, recomputed from the forest.
pub fn toggle_select(forest: &mut Forest, node: NodeId) -> Vec<NodeId> {
    let now_selected = !forest.node(node).selected;
    forest.node_mut(node).selected = now_selected;

    if now_selected {
        let ancestors: Vec<NodeId> = forest.ancestors(node).collect();
        for a in ancestors {
            forest.node_mut(a).selected = false;
        }
        for d in forest.descendants(node) {
            forest.node_mut(d).selected = false;
        }
    }

    selected_nodes(forest)
}

/// Selected nodes in pre-order.
pub fn selected_nodes(forest: &Forest) -> Vec<NodeId> {
    forest
        .walk()
        .into_iter()
        .filter(|&n| forest.node(n).selected)
        .collect()
}

pub fn clear(forest: &mut Forest) {
    for n in forest.walk() {
        forest.node_mut(n).selected = false;
    }
}
