//! Tree presentation adapter
//!
//! Pure projection from materialized nodes to generic host tree items. All
//! display policy lives here: labels, call-count descriptions, icon choice,
//! navigation commands, and the synthetic defined-class grouping rows that
//! cluster inherited methods under a dashed pseudo-label.

use std::path::PathBuf;

use crate::tree::{AppTree, MethodData, NodeId, NodeKind, TreeArena, APP_SOURCE};

/// Icon selector understood by the host view layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconKind {
    Package,
    Folder,
    File,
    Class,
    Interface,
    Method,
    Block,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collapse {
    None,
    Collapsed,
    Expanded,
}

/// Navigation action bound to a tree row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavCommand {
    OpenFile { path: PathBuf },
    OpenFileAtLine { path: PathBuf, line: u32 },
    OpenCallNode { id: String },
    LoadRecording { path: PathBuf },
}

/// Generic display record handed to the host tree view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeItem {
    pub label: String,
    pub description: String,
    pub tooltip: String,
    pub icon: IconKind,
    pub collapse: Collapse,
    pub command: Option<NavCommand>,
}

/// A row in the rendered application tree. Grouping rows have no backing
/// arena node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEntry {
    Node(NodeId),
    DefinedClassGroup { name: String },
}

fn call_count_description(count: usize) -> String {
    if count >= 1 {
        format!("{count} calls")
    } else {
        String::new()
    }
}

fn method_label(data: &MethodData) -> String {
    let mut label = if data.block {
        "[block]".to_string()
    } else {
        data.method.clone()
    };
    if data.duplicate || data.block {
        label = format!("{label} (L. {})", data.line);
    }
    label
}

fn method_line(data: &MethodData) -> u32 {
    data.line.parse().unwrap_or(0)
}

/// Build the display record for one row. Exhaustive over the closed node
/// set; adding a kind without handling it here is a compile error.
pub fn tree_item(arena: &TreeArena, entry: &TreeEntry) -> TreeItem {
    let id = match entry {
        TreeEntry::DefinedClassGroup { name } => {
            return TreeItem {
                label: format!("-- {name} --"),
                description: String::new(),
                tooltip: String::new(),
                icon: IconKind::Interface,
                collapse: Collapse::None,
                command: None,
            };
        }
        TreeEntry::Node(id) => *id,
    };
    let node = arena.get(id);
    match &node.kind {
        NodeKind::Root { category } => TreeItem {
            label: node.name.clone(),
            description: call_count_description(arena.method_count(id)),
            tooltip: node.file.clone(),
            icon: IconKind::Package,
            collapse: if category == APP_SOURCE {
                Collapse::Expanded
            } else {
                Collapse::Collapsed
            },
            command: None,
        },
        NodeKind::Dir => TreeItem {
            label: node.name.clone(),
            description: call_count_description(arena.method_count(id)),
            tooltip: node.file.clone(),
            icon: IconKind::Folder,
            collapse: Collapse::Expanded,
            command: None,
        },
        NodeKind::File => TreeItem {
            label: node.name.clone(),
            description: call_count_description(arena.method_count(id)),
            tooltip: node.file.clone(),
            icon: IconKind::File,
            collapse: Collapse::Collapsed,
            command: Some(NavCommand::OpenFile {
                path: PathBuf::from(&node.file),
            }),
        },
        NodeKind::Class => TreeItem {
            label: node.name.clone(),
            description: call_count_description(arena.method_count(id)),
            tooltip: node.file.clone(),
            icon: IconKind::Class,
            collapse: Collapse::Expanded,
            // Line 0 never matches a recorded row, so clicking a class lands
            // on a file-only selection at the top of the file.
            command: Some(NavCommand::OpenFileAtLine {
                path: PathBuf::from(&node.file),
                line: 0,
            }),
        },
        NodeKind::Method(data) => TreeItem {
            label: method_label(data),
            description: if data.call_count > 1 {
                format!("executed {} times", data.call_count)
            } else {
                String::new()
            },
            tooltip: node.file.clone(),
            icon: if data.block {
                IconKind::Block
            } else {
                IconKind::Method
            },
            collapse: Collapse::None,
            command: Some(NavCommand::OpenFileAtLine {
                path: PathBuf::from(&node.file),
                line: method_line(data),
            }),
        },
    }
}

/// Rows at the very top of the view: the app root, or nothing before a
/// recording is loaded.
pub fn top_level(tree: &AppTree) -> Vec<TreeEntry> {
    tree.root().map(TreeEntry::Node).into_iter().collect()
}

/// Child rows of `entry`, ordered for display.
///
/// Directory and file children are sorted alphabetically at read time.
/// Class children are regrouped by defining class: methods defined in the
/// class itself come first (no grouping row), then blocks of inherited
/// methods each preceded by a `-- DefiningClass --` grouping row.
pub fn children(arena: &TreeArena, entry: &TreeEntry) -> Vec<TreeEntry> {
    let id = match entry {
        TreeEntry::DefinedClassGroup { .. } => return Vec::new(),
        TreeEntry::Node(id) => *id,
    };
    let node = arena.get(id);
    match &node.kind {
        NodeKind::Method(_) => Vec::new(),
        NodeKind::Class => class_children(arena, id),
        NodeKind::Root { .. } | NodeKind::Dir | NodeKind::File => {
            let mut children: Vec<NodeId> = node.children.clone();
            children.sort_by(|a, b| arena.get(*a).name.cmp(&arena.get(*b).name));
            children.into_iter().map(TreeEntry::Node).collect()
        }
    }
}

fn class_children(arena: &TreeArena, class: NodeId) -> Vec<TreeEntry> {
    let class_name = arena.get(class).name.clone();

    // Defining class equal to the structural parent is treated as "defined
    // here" and carries no grouping label.
    let mut methods: Vec<(String, NodeId)> = arena
        .get(class)
        .children
        .iter()
        .map(|&child| {
            let defined = match &arena.get(child).kind {
                NodeKind::Method(data) if data.defined_class != class_name => {
                    data.defined_class.clone()
                }
                _ => String::new(),
            };
            (defined, child)
        })
        .collect();
    methods.sort_by(|a, b| a.0.cmp(&b.0));

    let mut rows = Vec::with_capacity(methods.len());
    let mut current_group = String::new();
    for (defined, child) in methods {
        if defined != current_group {
            current_group = defined.clone();
            if current_group != class_name && !current_group.is_empty() {
                rows.push(TreeEntry::DefinedClassGroup {
                    name: current_group.clone(),
                });
            }
        }
        rows.push(TreeEntry::Node(child));
    }
    rows
}
