//! Call-tree view over the recorded trace
//!
//! Projects the flat parent/child call rows into host tree items on demand.
//! Depth is assigned while descending; children below the configured maximum
//! depth are not expanded and the node at the boundary is marked truncated.

use std::sync::Arc;

use crate::present::{Collapse, IconKind, NavCommand, TreeItem};
use crate::store::{CallNode, CallNodeStore};

pub struct CallTreeView {
    store: Arc<CallNodeStore>,
    max_depth: i64,
}

impl CallTreeView {
    pub fn new(store: Arc<CallNodeStore>, max_depth: i64) -> Self {
        Self { store, max_depth }
    }

    /// Root calls of the trace. A well-formed recording has exactly one.
    pub fn roots(&self) -> Vec<CallNode> {
        let mut roots = self.store.find_all_children(None);
        for root in &mut roots {
            root.depth = 0;
        }
        roots
    }

    /// Children of `parent`, with depth assigned and truncation applied.
    pub fn children(&self, parent: &mut CallNode) -> Vec<CallNode> {
        if parent.depth >= self.max_depth {
            parent.depth_truncated = true;
            return Vec::new();
        }
        let mut children = self.store.find_all_children(Some(&parent.id));
        for child in &mut children {
            child.depth = parent.depth + 1;
        }
        children
    }

    pub fn has_children(&self, node: &CallNode) -> bool {
        if node.depth >= self.max_depth {
            return false;
        }
        self.store.has_children(node)
    }

    /// Display record for one call row.
    pub fn tree_item(&self, node: &CallNode) -> TreeItem {
        let mut label = node.display_name().to_string();
        if node.depth_truncated {
            label = format!("{label} …");
        }
        let description = if !node.return_value.is_empty() {
            node.return_value.clone()
        } else if node.gem_entry {
            node.source_name.clone()
        } else {
            String::new()
        };
        TreeItem {
            label,
            description,
            tooltip: format!("{}:{}", node.file, node.line),
            icon: if node.block {
                IconKind::Block
            } else {
                IconKind::Method
            },
            collapse: if self.has_children(node) {
                Collapse::Collapsed
            } else {
                Collapse::None
            },
            command: Some(NavCommand::OpenCallNode {
                id: node.id.clone(),
            }),
        }
    }
}
