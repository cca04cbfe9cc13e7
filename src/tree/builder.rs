//! Directory-tree materializer
//!
//! Turns the flat grouped rows of one source root into the five-level
//! root → dirs → file → class → methods hierarchy. Directory and file
//! insertion is idempotent by (parent, name); class nodes are always
//! appended; method nodes are built from grouped rows and attached to their
//! class with a fresh id. `finalize` pins the root's children to the
//! accumulated top level and must be called exactly once, after the last
//! class is processed and before the first traversal.

use std::collections::HashMap;
use std::path::{Path, MAIN_SEPARATOR};

use crate::store::{CallNodeStore, MethodRow, ScopePredicate};
use crate::tree::arena::{MethodData, NodeId, NodeKind, TreeArena};

/// Builder for one source root's subtree
pub struct DirectoryTreeBuilder {
    root: NodeId,
    root_path: String,
    category: String,
    top_level: Vec<NodeId>,
    file_nodes: Vec<NodeId>,
    class_nodes: Vec<NodeId>,
    method_nodes: Vec<NodeId>,
    finalized: bool,
}

impl DirectoryTreeBuilder {
    /// Create a builder whose root represents `root_path`, labelled with the
    /// path's final component.
    pub fn new(arena: &mut TreeArena, category: &str, root_path: &str) -> Self {
        let name = Path::new(root_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root_path.to_string());
        let root = arena.alloc(
            NodeKind::Root {
                category: category.to_string(),
            },
            name,
            root_path,
            None,
        );
        Self {
            root,
            root_path: root_path.to_string(),
            category: category.to_string(),
            top_level: Vec::new(),
            file_nodes: Vec::new(),
            class_nodes: Vec::new(),
            method_nodes: Vec::new(),
            finalized: false,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn file_nodes(&self) -> &[NodeId] {
        &self.file_nodes
    }

    pub fn class_nodes(&self) -> &[NodeId] {
        &self.class_nodes
    }

    pub fn method_nodes(&self) -> &[NodeId] {
        &self.method_nodes
    }

    /// Path of `file` relative to the root path.
    pub fn relative_name(&self, file: &str) -> String {
        let prefix = format!("{}{}", self.root_path, MAIN_SEPARATOR);
        file.strip_prefix(&prefix).unwrap_or(file).to_string()
    }

    /// Scope predicate selecting every row under this root.
    pub fn scope_all(&self) -> ScopePredicate {
        ScopePredicate::FileUnderRoot(self.root_path.clone())
    }

    /// Insert (or find) a directory node named `name` under `parent`.
    pub fn add_dir(
        &mut self,
        arena: &mut TreeArena,
        parent: NodeId,
        file: &str,
        name: &str,
    ) -> NodeId {
        if let Some(existing) = arena.child_by_name(parent, name) {
            return existing;
        }
        let dir = arena.alloc(NodeKind::Dir, name, file, Some(parent));
        arena.get_mut(parent).children.push(dir);
        if parent == self.root {
            self.top_level.push(dir);
        }
        dir
    }

    /// Insert (or find) a file node named `name` under `parent`.
    pub fn add_file(
        &mut self,
        arena: &mut TreeArena,
        parent: NodeId,
        file: &str,
        name: &str,
    ) -> NodeId {
        if let Some(existing) = arena.child_by_name(parent, name) {
            return existing;
        }
        let node = arena.alloc(NodeKind::File, name, file, Some(parent));
        arena.get_mut(parent).children.push(node);
        self.file_nodes.push(node);
        if parent == self.root {
            self.top_level.push(node);
        }
        node
    }

    /// Append a class node under `parent`. Classes are not name-keyed: the
    /// caller de-duplicates per (file, class) pair.
    pub fn add_class(&mut self, arena: &mut TreeArena, parent: NodeId, file: &str, name: &str) -> NodeId {
        let node = arena.alloc(NodeKind::Class, name, file, Some(parent));
        arena.get_mut(parent).children.push(node);
        self.class_nodes.push(node);
        node
    }

    /// Walk/insert the directory chain for `file` (relative to the root),
    /// then insert its file node and a class node beneath it.
    pub fn add_class_path(&mut self, arena: &mut TreeArena, file: &str, class_name: &str) -> NodeId {
        let relative = self.relative_name(file);
        let segments: Vec<&str> = relative
            .split(MAIN_SEPARATOR)
            .filter(|s| !s.is_empty())
            .collect();

        let mut current = self.root;
        if let Some((file_name, dirs)) = segments.split_last() {
            for dir in dirs {
                current = self.add_dir(arena, current, file, dir);
            }
            current = self.add_file(arena, current, file, file_name);
        }
        self.add_class(arena, current, file, class_name)
    }

    /// Materialize this root's subtree from the store: one class node per
    /// distinct (file, class) pair, then the grouped method rows of each.
    pub fn populate(&mut self, arena: &mut TreeArena, store: &CallNodeStore) {
        let classes = store.find_all_method_count_by_class(&self.scope_all());

        let mut class_map: HashMap<String, NodeId> = HashMap::new();
        let mut ordered: Vec<NodeId> = Vec::new();
        for row in classes {
            let key = format!("{}:{}", self.relative_name(&row.file), row.class_name);
            if !class_map.contains_key(&key) {
                let class = self.add_class_path(arena, &row.file, &row.class_name);
                class_map.insert(key, class);
                ordered.push(class);
            }
        }

        for class in ordered {
            self.attach_methods(arena, store, class);
        }
    }

    /// Build and attach method nodes for one class. Filters the redundant
    /// block-with-method rows and flags duplicate method names. Methods of a
    /// class are scoped to its containing file; an inherited method called
    /// from another file shows up under that file's class node instead.
    fn attach_methods(&mut self, arena: &mut TreeArena, store: &CallNodeStore, class: NodeId) {
        let (file, class_name) = {
            let node = arena.get(class);
            (node.file.clone(), node.name.clone())
        };
        let rows = store
            .find_method_rows_by_class(&ScopePredicate::FileEquals(file), &class_name);
        let rows: Vec<MethodRow> = rows
            .into_iter()
            .filter(|row| !(row.block && !row.method.is_empty()))
            .collect();

        let mut name_counts: HashMap<&str, usize> = HashMap::new();
        for row in &rows {
            *name_counts.entry(row.method.as_str()).or_default() += 1;
        }

        for row in &rows {
            let duplicate = name_counts.get(row.method.as_str()).copied().unwrap_or(0) > 1;
            let name = if row.block { "block" } else { &row.method };
            let node = arena.alloc(
                NodeKind::Method(MethodData {
                    defined_class: row.defined_class.clone(),
                    method: row.method.clone(),
                    block: row.block,
                    line: row.line.clone(),
                    call_count: row.method_count,
                    duplicate,
                }),
                name,
                &row.file,
                None,
            );
            arena.push_child(class, node);
            self.method_nodes.push(node);
        }
    }

    /// Pin the root's children to the accumulated top level and reset cached
    /// counts. Idempotent; must run after the last class is processed.
    pub fn finalize(&mut self, arena: &mut TreeArena) {
        arena.get_mut(self.root).children = self.top_level.clone();
        arena.invalidate_counts();
        self.finalized = true;
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }
}
