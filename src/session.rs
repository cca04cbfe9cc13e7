//! Session composition root
//!
//! Builds the whole object graph for one activation: database handle, row
//! repositories, materialized tree, selection state, editor plumbing, and the
//! event bus wiring them together. There is exactly one [`Session`] per
//! running extension host; dropping it tears everything down.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::bus::{EventBus, TraceEvent};
use crate::calltree::CallTreeView;
use crate::config::Config;
use crate::coordinator::{Coordinator, SelectionState};
use crate::editor::{ActionRegistration, DocumentManager};
use crate::error::Result;
use crate::host::EditorHost;
use crate::recordings::RecordingsView;
use crate::store::{CallNodeStore, DbHandle, DbWatcher, SourceRoots};
use crate::tree::{shared_empty, AppTree, SharedAppTree};

pub struct Session {
    config: Config,
    bus: Arc<EventBus>,
    db: Arc<DbHandle>,
    sources: Arc<SourceRoots>,
    store: Arc<CallNodeStore>,
    app_tree: SharedAppTree,
    selection: Arc<SelectionState>,
    documents: Arc<DocumentManager>,
    coordinator: Arc<Coordinator>,
    recordings: RecordingsView,
    calltree: CallTreeView,
    watcher: parking_lot::Mutex<DbWatcher>,
}

impl Session {
    pub fn new<H: EditorHost + 'static>(config: Config, host: Arc<H>) -> Self {
        let notifier: Arc<dyn crate::host::Notifier> = host.clone();
        let host: Arc<dyn EditorHost> = host;

        let bus = Arc::new(EventBus::new());
        let db = Arc::new(DbHandle::new());
        let sources = Arc::new(SourceRoots::new());
        let store = Arc::new(CallNodeStore::new(db.clone(), sources.clone(), notifier));

        let selection = Arc::new(SelectionState::new());
        let registration = Arc::new(ActionRegistration::new());
        let documents = Arc::new(DocumentManager::new(
            host.clone(),
            registration.clone(),
            selection.clone(),
        ));
        let coordinator = Arc::new(Coordinator::new(
            store.clone(),
            selection.clone(),
            documents.clone(),
            registration,
            bus.clone(),
        ));

        let recordings = RecordingsView::new(&config);
        let calltree = CallTreeView::new(store.clone(), config.max_call_depth as i64);
        let watcher = parking_lot::Mutex::new(DbWatcher::new(config.refresh_path(), bus.clone()));

        Self {
            config,
            bus,
            db,
            sources,
            store,
            app_tree: shared_empty(),
            selection,
            documents,
            coordinator,
            recordings,
            calltree,
            watcher,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn store(&self) -> &Arc<CallNodeStore> {
        &self.store
    }

    pub fn app_tree(&self) -> &SharedAppTree {
        &self.app_tree
    }

    pub fn selection(&self) -> &Arc<SelectionState> {
        &self.selection
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    pub fn recordings(&self) -> &RecordingsView {
        &self.recordings
    }

    pub fn calltree(&self) -> &CallTreeView {
        &self.calltree
    }

    /// Begin watching for new trace data and bring decorations up to date.
    pub async fn activate(&self) -> Result<()> {
        self.watcher.lock().start()?;
        self.documents.redecorate_visible().await;
        Ok(())
    }

    pub fn deactivate(&self) {
        self.watcher.lock().stop();
        self.selection.set_current_node(None);
        self.selection.set_db_path(None);
    }

    /// Load (or reload) a recording: reconnect, drop every cache, rebuild the
    /// app tree, reset the selection, and broadcast one reload so every view
    /// refreshes from the same signal.
    pub async fn load_recording(&self, path: &Path) -> Result<()> {
        self.db.connect(path)?;
        self.store.invalidate_caches();

        let tree = AppTree::populate(&self.store, &self.sources)?;
        // A reconnect that raced this build supersedes it; the stale tree is
        // discarded rather than installed.
        if tree.generation() == self.db.generation() {
            *self.app_tree.write() = tree;
        } else {
            debug!(
                built = tree.generation(),
                current = self.db.generation(),
                "discarding superseded tree build"
            );
        }

        self.selection.set_current_node(None);
        self.selection.set_db_path(Some(path.to_path_buf()));

        self.bus.publish(&TraceEvent::DbLoaded {
            path: path.to_path_buf(),
        });
        self.bus.publish(&TraceEvent::Reload);
        self.documents.redecorate_visible().await;

        info!(db = %path.display(), "recording loaded");
        Ok(())
    }

    /// Load the agent's default database path.
    pub async fn load_default(&self) -> Result<()> {
        let path = self.config.db_path();
        self.load_recording(&path).await
    }

    /// Delete a recording file. Confirmation is the host's business; by the
    /// time this runs the user has already agreed. Deleting the currently
    /// loaded recording first clears the selection and drops the connection
    /// so the file is not held open while it is removed.
    pub async fn delete_recording(&self, path: &Path) -> Result<()> {
        let active = self.selection.db_path().as_deref() == Some(path);
        if active {
            self.selection.set_current_node(None);
            self.selection.set_db_path(None);
            self.db.disconnect();
            self.store.invalidate_caches();
            *self.app_tree.write() = AppTree::empty();
        }

        std::fs::remove_file(path)?;

        self.bus.publish(&TraceEvent::RecordingDeleted {
            path: path.to_path_buf(),
        });
        self.bus.publish(&TraceEvent::Reload);
        if active {
            self.documents.redecorate_visible().await;
        }

        info!(db = %path.display(), "recording deleted");
        Ok(())
    }
}
