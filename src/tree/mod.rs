//! Directory-tree materialization for the application view

pub mod app_tree;
pub mod arena;
pub mod builder;

pub use app_tree::{shared_empty, AppTree, SharedAppTree, APP_SOURCE};
pub use arena::{MethodData, NodeId, NodeKind, TreeArena, TreeNode};
pub use builder::DirectoryTreeBuilder;
