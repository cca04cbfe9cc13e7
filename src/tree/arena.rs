//! Arena storage for the materialized directory tree
//!
//! Nodes live in one `Vec`; identities are indices into it. Parents are
//! stored as indices too, so a node can be created before its final parent is
//! known (method rows arrive unparented and are attached to their class
//! later). Arena indices double as the monotonically increasing synthetic ids
//! the tree-building session hands out.

use std::sync::OnceLock;

/// Index of a node within a [`TreeArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Method-specific payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodData {
    /// Class the method is defined in; may differ from the structural parent
    /// class when the method is inherited or mixed in
    pub defined_class: String,
    pub method: String,
    pub block: bool,
    /// 1-based line as recorded (string; may be empty)
    pub line: String,
    /// How many times the method executed in this trace
    pub call_count: usize,
    /// True when a sibling method under the same class shares this name
    pub duplicate: bool,
}

/// Closed set of materialized node kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Root { category: String },
    Dir,
    File,
    Class,
    Method(MethodData),
}

/// One materialized tree node
#[derive(Debug)]
pub struct TreeNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub name: String,
    /// Absolute path of the backing file (for Root: the root path)
    pub file: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Lazily computed method count; populated on first read, reset by
    /// [`TreeArena::invalidate_counts`]
    cached_count: OnceLock<usize>,
}

/// Flat node storage with index-based parent/child links
#[derive(Debug, Default)]
pub struct TreeArena {
    nodes: Vec<TreeNode>,
}

impl TreeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a node. The returned id is the next synthetic id in the
    /// session's sequence.
    pub fn alloc(
        &mut self,
        kind: NodeKind,
        name: impl Into<String>,
        file: impl Into<String>,
        parent: Option<NodeId>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(TreeNode {
            id,
            kind,
            name: name.into(),
            file: file.into(),
            parent,
            children: Vec::new(),
            cached_count: OnceLock::new(),
        });
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id.0]
    }

    /// Attach `child` under `parent`, updating both links.
    pub fn push_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Child of `parent` with the given name, if any. Directory and file
    /// insertion is name-keyed through this lookup.
    pub fn child_by_name(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.nodes[parent.0]
            .children
            .iter()
            .copied()
            .find(|&child| self.nodes[child.0].name == name)
    }

    /// Method count of a node: its own execution count for methods, the sum
    /// of children's counts otherwise. Cached after the first read; callers
    /// that mutate children must invalidate before reading again.
    pub fn method_count(&self, id: NodeId) -> usize {
        let node = &self.nodes[id.0];
        if let NodeKind::Method(data) = &node.kind {
            return data.call_count;
        }
        *node.cached_count.get_or_init(|| {
            node.children
                .iter()
                .map(|&child| self.method_count(child))
                .sum()
        })
    }

    /// Drop every cached count. Not automatic: the builder calls this after
    /// the last structural mutation, before first read.
    pub fn invalidate_counts(&mut self) {
        for node in &mut self.nodes {
            node.cached_count = OnceLock::new();
        }
    }
}
