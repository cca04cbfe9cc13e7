//! TraceScope: method-call trace visualization core
//!
//! This library turns recordings captured by an external tracing agent
//! (SQLite databases of flat call rows) into two synchronized navigable
//! trees: a call tree of one recorded run, and an app directory tree of
//! file/class/method groupings. It also coordinates the editor side of
//! navigation (opening files, revealing lines, and highlighting the
//! enclosing method) while guarding against the feedback loops that editor
//! events cause when the navigation was triggered by this code itself.
//!
//! The editor is abstracted behind [`host::EditorHost`]; an integration
//! implements that trait once and builds a [`session::Session`] as the
//! composition root. The bundled CLI uses the same pipeline headlessly.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tracescope::{config::Config, host::NullHost, session::Session};
//!
//! let config = Config::load(std::path::Path::new("."))?;
//! let session = Session::new(config, Arc::new(NullHost));
//! session.load_default().await?;
//! let tree = session.app_tree().read();
//! ```

pub mod bus;
pub mod calltree;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod editor;
pub mod error;
pub mod host;
pub mod present;
pub mod recordings;
pub mod session;
pub mod store;
pub mod tree;

// Re-export commonly used types
pub use bus::{EventBus, Subscription, TraceEvent};
pub use calltree::CallTreeView;
pub use config::Config;
pub use coordinator::{Coordinator, SelectionState};
pub use error::{Result, TraceScopeError};
pub use host::{EditorHost, EditorView, NullHost};
pub use recordings::{RecordingItem, RecordingsView};
pub use session::Session;
pub use store::{CallNode, CallNodeStore, DbHandle, SourceRoots, TraceMetadata};
pub use tree::{AppTree, NodeId, NodeKind, TreeArena};
