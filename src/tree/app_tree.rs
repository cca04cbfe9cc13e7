//! Materialized application tree
//!
//! One immutable snapshot of the `app` source root's directory tree, built
//! from the grouped store queries and swapped in wholesale on (re)load. The
//! snapshot carries the connection generation it was built from so a slow
//! rebuild racing a reconnect can be discarded instead of installed.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::error::Result;
use crate::store::{CallNodeStore, SourceRoots};
use crate::tree::arena::{NodeId, NodeKind, TreeArena};
use crate::tree::builder::DirectoryTreeBuilder;

pub const APP_SOURCE: &str = "app";

/// A fully-built directory tree for the app source root.
pub struct AppTree {
    arena: TreeArena,
    root: Option<NodeId>,
    generation: u64,
}

impl AppTree {
    /// Tree with no content, shown before any recording is loaded.
    pub fn empty() -> Self {
        Self {
            arena: TreeArena::new(),
            root: None,
            generation: 0,
        }
    }

    /// Build a snapshot from the current connection. Loads the source roots
    /// first so classification reflects the database being read.
    pub fn populate(store: &CallNodeStore, sources: &SourceRoots) -> Result<Self> {
        let executor = store.db().executor()?;
        let generation = executor.generation();
        sources.load(&executor)?;

        let app_root = sources.get(APP_SOURCE)?;
        let mut arena = TreeArena::new();
        let mut builder = DirectoryTreeBuilder::new(&mut arena, APP_SOURCE, &app_root.root_path);
        builder.populate(&mut arena, store);
        builder.finalize(&mut arena);

        info!(
            root = %app_root.root_path,
            nodes = arena.len(),
            "materialized app tree"
        );

        Ok(Self {
            arena,
            root: Some(builder.root()),
            generation,
        })
    }

    pub fn arena(&self) -> &TreeArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut TreeArena {
        &mut self.arena
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// File node for `path`, if the tree contains that file.
    pub fn node_by_file(&self, path: &Path) -> Option<NodeId> {
        let wanted = path.to_string_lossy();
        (0..self.arena.len()).map(NodeId).find(|&id| {
            let node = self.arena.get(id);
            matches!(node.kind, NodeKind::File) && node.file == wanted
        })
    }

    /// Method node matching `path` and 0-based `line`, falling back to the
    /// file node when no method starts on that line.
    pub fn node_by_file_and_line(&self, path: &Path, line: u32) -> Option<NodeId> {
        let wanted = path.to_string_lossy();
        let method = (0..self.arena.len()).map(NodeId).find(|&id| {
            let node = self.arena.get(id);
            if node.file != wanted {
                return false;
            }
            match &node.kind {
                NodeKind::Method(data) => data
                    .line
                    .parse::<u32>()
                    .map(|l| l.saturating_sub(1) == line)
                    .unwrap_or(false),
                _ => false,
            }
        });
        method.or_else(|| self.node_by_file(path))
    }
}

/// Shared, swappable handle to the current snapshot.
pub type SharedAppTree = Arc<parking_lot::RwLock<AppTree>>;

pub fn shared_empty() -> SharedAppTree {
    Arc::new(parking_lot::RwLock::new(AppTree::empty()))
}
