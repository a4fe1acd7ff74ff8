//! Panel state: the forest plus everything that must survive a rebuild.
//!
//! Selection and expansion live as flags on the nodes, but they are also
//! recorded by key after every event so a refreshed data source can be
//! rebuilt from scratch and have the same nodes re-selected and re-opened.

use std::collections::HashSet;

use tracing::debug;

use crate::error::TreeError;
use crate::parser::rows::parse_rows;
use crate::tree::builder::{self, BuildOptions};
use crate::tree::model::{Forest, NodeId, NodeKey};
use crate::tree::selection;
use crate::tree::visibility::{self, ViewRow};

#[derive(Debug, Clone, Default)]
pub struct PanelState {
    forest: Forest,
    options: BuildOptions,
    selected: Vec<NodeKey>,
    expanded: HashSet<NodeKey>,
    /// Every key present at the last record; later arrivals are new nodes.
    known: HashSet<NodeKey>,
    /// Set by collapse-all: new nodes start collapsed regardless of depth.
    collapsed_all: bool,
    search: String,
    show_selected: bool,
    version: u64,
}

impl PanelState {
    pub fn new(options: BuildOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    /// Bumped on every change that affects the rendered view.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn show_selected(&self) -> bool {
        self.show_selected
    }

    /// Rebuild the forest from raw rows and re-apply recorded state.
    ///
    /// On error the forest is left empty and the error is returned for the
    /// caller to surface.
    pub fn load_rows<S: AsRef<str>>(&mut self, rows: &[S]) -> Result<(), TreeError> {
        let table = parse_rows(rows);
        let result = builder::build(&table, &self.options);
        self.version += 1;
        match result {
            Ok(forest) => {
                debug!(rows = rows.len(), nodes = forest.len(), "rebuilt forest");
                self.forest = forest;
                self.reapply();
                Ok(())
            }
            Err(err) => {
                debug!(%err, "forest build failed");
                self.forest = Forest::new();
                Err(err)
            }
        }
    }

    pub fn rows(&self) -> Vec<ViewRow> {
        visibility::visible_rows(&self.forest, self.show_selected)
    }

    pub fn selected(&self) -> Vec<NodeId> {
        selection::selected_nodes(&self.forest)
    }

    pub fn toggle_node(&mut self, node: NodeId) {
        visibility::toggle_expanded(&mut self.forest, node);
        self.record();
    }

    pub fn toggle_select(&mut self, node: NodeId) -> Vec<NodeId> {
        let selected = selection::toggle_select(&mut self.forest, node);
        self.record();
        selected
    }

    pub fn expand_all(&mut self) {
        visibility::expand_all(&mut self.forest);
        self.collapsed_all = false;
        self.record();
    }

    /// Drops all expansion state; nodes added later start collapsed.
    pub fn collapse_all(&mut self) {
        visibility::collapse_all(&mut self.forest);
        self.collapsed_all = true;
        self.record();
    }

    pub fn set_search(&mut self, text: &str) {
        if self.search == text {
            return;
        }
        self.search = text.to_string();
        visibility::apply_search(&mut self.forest, &self.search);
        self.version += 1;
    }

    /// Turning the filter on opens the path to every selected node.
    pub fn set_show_selected(&mut self, show: bool) {
        self.show_selected = show;
        if show {
            for n in self.selected() {
                visibility::reveal(&mut self.forest, n);
            }
            self.record();
        } else {
            self.version += 1;
        }
    }

    /// Replace the selection with every node whose `(type, id)` is listed,
    /// revealing each one. Used to restore state from an external value.
    pub fn restore_selection(&mut self, groups: &[(String, Vec<String>)]) {
        selection::clear(&mut self.forest);
        for n in self.forest.walk() {
            let node = self.forest.node(n);
            let wanted = groups
                .iter()
                .any(|(kind, ids)| *kind == node.kind && ids.contains(&node.id));
            if wanted && !node.selected {
                selection::toggle_select(&mut self.forest, n);
                visibility::reveal(&mut self.forest, n);
            }
        }
        self.record();
    }

    /// Known nodes get their recorded expansion back. New nodes keep the
    /// builder's depth default unless collapse-all cleared it.
    fn reapply(&mut self) {
        let selected: HashSet<&NodeKey> = self.selected.iter().collect();
        let mut to_select = Vec::new();
        for n in self.forest.walk() {
            let key = self.forest.key(n);
            if self.known.contains(&key) {
                self.forest.node_mut(n).expanded = self.expanded.contains(&key);
            } else if self.collapsed_all {
                self.forest.node_mut(n).expanded = false;
            }
            if selected.contains(&key) {
                to_select.push(n);
            }
        }
        for n in to_select {
            self.forest.node_mut(n).selected = true;
            visibility::reveal(&mut self.forest, n);
        }
        visibility::apply_search(&mut self.forest, &self.search);
        self.record();
    }

    fn record(&mut self) {
        let forest = &self.forest;
        self.selected = selection::selected_nodes(forest)
            .into_iter()
            .map(|n| forest.key(n))
            .collect();
        let order = forest.walk();
        self.expanded = order
            .iter()
            .filter(|&&n| forest.node(n).expanded)
            .map(|&n| forest.key(n))
            .collect();
        self.known = order.iter().map(|&n| forest.key(n)).collect();
        self.version += 1;
    }
}
