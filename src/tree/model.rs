/// Handle into a [`Forest`]'s node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Identity of a node across rebuilds: the chain of ids from its root.
///
/// Ids are only unique among siblings, so the chain is what survives a
/// refresh of the underlying rows.
pub type NodeKey = Vec<String>;

/// Search annotation recomputed on every pass of the search text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchState {
    /// No active search.
    #[default]
    None,
    Match,
    NoMatch,
    /// At least one strict descendant matches.
    AncestorOfMatch,
}

impl SearchState {
    /// Whether a node in this state is rendered among its siblings.
    pub fn is_shown(self) -> bool {
        !matches!(self, Self::NoMatch)
    }
}

/// One entity of the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub id: String,
    pub name: String,
    /// Grouping key for query output.
    pub kind: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    pub expanded: bool,
    pub selected: bool,
    pub search: SearchState,
}

impl TreeNode {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Arena-owned forest. Ownership runs root to children; `parent` is only a
/// handle back into the arena.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Forest {
    nodes: Vec<TreeNode>,
    roots: Vec<NodeId>,
}

impl Forest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id.0]
    }

    /// Children of `parent`, or the roots when `parent` is `None`.
    pub fn children_of(&self, parent: Option<NodeId>) -> &[NodeId] {
        match parent {
            Some(p) => &self.nodes[p.0].children,
            None => &self.roots,
        }
    }

    /// Find the sibling with `id` under `parent` (roots when `None`).
    pub fn find_child(&self, parent: Option<NodeId>, id: &str) -> Option<NodeId> {
        self.children_of(parent)
            .iter()
            .copied()
            .find(|&c| self.nodes[c.0].id == id)
    }

    /// Append a node under `parent`. Sibling uniqueness is the builder's job.
    pub fn push(
        &mut self,
        parent: Option<NodeId>,
        id: impl Into<String>,
        name: impl Into<String>,
        kind: impl Into<String>,
    ) -> NodeId {
        let handle = NodeId(self.nodes.len());
        self.nodes.push(TreeNode {
            id: id.into(),
            name: name.into(),
            kind: kind.into(),
            parent,
            children: Vec::new(),
            expanded: false,
            selected: false,
            search: SearchState::None,
        });
        match parent {
            Some(p) => self.nodes[p.0].children.push(handle),
            None => self.roots.push(handle),
        }
        handle
    }

    /// Strict ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            forest: self,
            next: self.nodes[id.0].parent,
        }
    }

    /// Strict descendants of `id` in pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id.0].children.iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.nodes[n.0].children.iter().rev().copied());
        }
        out
    }

    /// Every node in pre-order, roots in insertion order.
    pub fn walk(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.nodes[n.0].children.iter().rev().copied());
        }
        out
    }

    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    pub fn key(&self, id: NodeId) -> NodeKey {
        let mut key: Vec<String> = self
            .ancestors(id)
            .map(|a| self.nodes[a.0].id.clone())
            .collect();
        key.reverse();
        key.push(self.nodes[id.0].id.clone());
        key
    }

    /// Resolve an id chain from a root.
    pub fn find_by_key<S: AsRef<str>>(&self, key: &[S]) -> Option<NodeId> {
        let mut current = None;
        for id in key {
            current = Some(self.find_child(current, id.as_ref())?);
        }
        current
    }
}

pub struct Ancestors<'a> {
    forest: &'a Forest,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.forest.nodes[current.0].parent;
        Some(current)
    }
}
