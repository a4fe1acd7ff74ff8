//! Which nodes end up on screen.
//!
//! Three inputs combine: the per-node `expanded` flag, the search annotation,
//! and the show-selected filter. Only the rendered view is pruned; the forest
//! itself keeps every node.

use regex::{Regex, RegexBuilder};

use crate::tree::model::{Forest, NodeId, SearchState};

/// Case-insensitive substring pattern with shell wildcards
/// (`*` any run, `?` one character).
#[derive(Debug, Clone)]
pub struct SearchPattern(Regex);

impl SearchPattern {
    /// `None` for empty text.
    pub fn new(text: &str) -> Option<Self> {
        if text.is_empty() {
            return None;
        }
        let mut source = String::with_capacity(text.len() * 2);
        for ch in text.chars() {
            match ch {
                '*' => source.push_str(".*"),
                '?' => source.push('.'),
                other => source.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
            }
        }
        // Every literal is escaped, so the pattern always compiles short of
        // the size limit.
        RegexBuilder::new(&source)
            .case_insensitive(true)
            .build()
            .ok()
            .map(Self)
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.0.is_match(name)
    }
}

/// Recompute every node's search state from scratch.
///
/// A node with a matching strict descendant is `AncestorOfMatch` even when its
/// own name matches, so the state is a pure function of the subtree.
pub fn apply_search(forest: &mut Forest, text: &str) {
    let order = forest.walk();
    let Some(pattern) = SearchPattern::new(text) else {
        for n in order {
            forest.node_mut(n).search = SearchState::None;
        }
        return;
    };

    // Reverse pre-order visits children before their parent.
    let mut subtree_match = vec![false; forest.len()];
    for &n in order.iter().rev() {
        let node = forest.node(n);
        let own = pattern.is_match(&node.name);
        let below = node.children().iter().any(|c| subtree_match[c.index()]);
        subtree_match[n.index()] = own || below;
        forest.node_mut(n).search = if below {
            SearchState::AncestorOfMatch
        } else if own {
            SearchState::Match
        } else {
            SearchState::NoMatch
        };
    }
}

pub fn toggle_expanded(forest: &mut Forest, node: NodeId) {
    let n = forest.node_mut(node);
    n.expanded = !n.expanded;
}

pub fn expand_all(forest: &mut Forest) {
    for n in forest.walk() {
        forest.node_mut(n).expanded = true;
    }
}

pub fn collapse_all(forest: &mut Forest) {
    for n in forest.walk() {
        forest.node_mut(n).expanded = false;
    }
}

/// Expand every ancestor so `node` is reachable.
pub fn reveal(forest: &mut Forest, node: NodeId) {
    let ancestors: Vec<NodeId> = forest.ancestors(node).collect();
    for a in ancestors {
        forest.node_mut(a).expanded = true;
    }
}

/// One rendered line of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewRow {
    pub node: NodeId,
    pub depth: usize,
    /// Whether any child survives the search and show-selected filters.
    pub has_children: bool,
    /// Whether its children are rendered below it.
    pub open: bool,
}

/// Flatten the forest into the rows that are rendered.
pub fn visible_rows(forest: &Forest, show_selected: bool) -> Vec<ViewRow> {
    let toward_selected = if show_selected {
        selected_below(forest)
    } else {
        Vec::new()
    };
    let kept = |n: NodeId| {
        let node = forest.node(n);
        !show_selected || node.selected || node.expanded || toward_selected[n.index()]
    };
    let shown = |n: NodeId| kept(n) && forest.node(n).search.is_shown();

    let mut rows = Vec::new();
    let mut stack: Vec<(NodeId, usize)> = forest
        .roots()
        .iter()
        .rev()
        .filter(|&&r| shown(r))
        .map(|&r| (r, 0))
        .collect();

    while let Some((n, depth)) = stack.pop() {
        let node = forest.node(n);
        let has_children = node.children().iter().any(|&c| shown(c));
        let open = has_children && (node.expanded || node.search == SearchState::AncestorOfMatch);
        rows.push(ViewRow {
            node: n,
            depth,
            has_children,
            open,
        });
        if open {
            stack.extend(
                node.children()
                    .iter()
                    .rev()
                    .filter(|&&c| shown(c))
                    .map(|&c| (c, depth + 1)),
            );
        }
    }
    rows
}

/// Per node, whether some strict descendant is selected.
fn selected_below(forest: &Forest) -> Vec<bool> {
    let mut below = vec![false; forest.len()];
    for n in forest.walk().into_iter().rev() {
        let any = forest
            .node(n)
            .children()
            .iter()
            .any(|&c| below[c.index()] || forest.node(c).selected);
        below[n.index()] = any;
    }
    below
}
