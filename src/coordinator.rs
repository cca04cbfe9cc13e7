//! Selection coordination
//!
//! [`SelectionState`] is the single source of truth for "what is selected and
//! which recording is loaded". [`Coordinator`] translates user actions (tree
//! clicks, pointer-driven cursor moves, visibility changes) into selection
//! transitions and the matching open/decorate side effects, consulting the
//! pending-action registration so the system's own navigation is never
//! re-interpreted as user input.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::bus::{EventBus, TraceEvent};
use crate::editor::{ActionRegistration, DocumentManager};
use crate::host::EditorView;
use crate::store::{CallNode, CallNodeStore};

/// Current selection and active recording. One instance per session,
/// constructed at activation and dropped at deactivation.
#[derive(Default)]
pub struct SelectionState {
    current_node: Mutex<Option<CallNode>>,
    current_db: Mutex<Option<PathBuf>>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_node(&self) -> Option<CallNode> {
        self.current_node.lock().clone()
    }

    pub fn set_current_node(&self, node: Option<CallNode>) {
        *self.current_node.lock() = node;
    }

    pub fn db_path(&self) -> Option<PathBuf> {
        self.current_db.lock().clone()
    }

    pub fn set_db_path(&self, path: Option<PathBuf>) {
        *self.current_db.lock() = path;
    }

    pub fn is_db_loaded(&self) -> bool {
        self.current_db.lock().is_some()
    }

    /// Whether the current selection already sits at `path`:`line`.
    pub fn matches(&self, path: &Path, line: Option<u32>) -> bool {
        self.current_node
            .lock()
            .as_ref()
            .is_some_and(|node| node.matches_location(path, line))
    }
}

pub struct Coordinator {
    store: Arc<CallNodeStore>,
    selection: Arc<SelectionState>,
    documents: Arc<DocumentManager>,
    registration: Arc<ActionRegistration>,
    bus: Arc<EventBus>,
}

impl Coordinator {
    pub fn new(
        store: Arc<CallNodeStore>,
        selection: Arc<SelectionState>,
        documents: Arc<DocumentManager>,
        registration: Arc<ActionRegistration>,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            store,
            selection,
            documents,
            registration,
            bus,
        }
    }

    /// A call-tree row was clicked.
    pub async fn open_call_node(&self, id: &str) {
        if !self.selection.is_db_loaded() {
            return;
        }
        let Some(node) = self.store.find_by_id(id) else {
            debug!(id, "clicked call node not found");
            return;
        };
        self.select_node(node).await;
    }

    /// A directory-tree file row was clicked: file-only selection.
    pub async fn open_file(&self, path: &Path) {
        if !self.selection.is_db_loaded() {
            return;
        }
        self.select_file_only(path).await;
    }

    /// A directory-tree method row was clicked.
    pub async fn open_file_at_line(&self, path: &Path, line: u32) {
        if !self.selection.is_db_loaded() {
            return;
        }
        self.select_node_by_location(path, line).await;
    }

    /// The editor caret moved. Only pointer-induced moves count; programmatic
    /// and keyboard-driven changes are ignored here.
    pub async fn editor_cursor_moved(&self, path: &Path, line_index: u32, pointer: bool) {
        if !pointer || !self.selection.is_db_loaded() {
            return;
        }
        self.select_node_by_location(path, line_index + 1).await;
    }

    /// The set of visible editors changed. Visibility events caused by our
    /// own pending opens consume their registration instead of being treated
    /// as user-driven; the rest get their decorations refreshed, serialized
    /// per document so the near-duplicate events hosts deliver for one
    /// logical change do not run the reaction twice.
    pub async fn visible_editors_changed(&self, editors: &[EditorView]) {
        if !self.selection.is_db_loaded() {
            return;
        }
        let mut user_driven = Vec::new();
        for editor in editors {
            if self.registration.has_pending_reveal_for_file(&editor.path)
                || self.registration.pending_open_includes(&editor.path)
            {
                self.registration.deregister_pending_open(&editor.path);
            } else {
                user_driven.push(editor.clone());
            }
        }
        for editor in user_driven {
            let views = [editor.clone()];
            self.registration
                .run_serialized(&editor.path, || self.documents.decorate(&views))
                .await;
        }
    }

    /// Resolve a (file, 1-based line) location to a selection: a matching
    /// call node if one exists, otherwise a file-only selection.
    pub async fn select_node_by_location(&self, path: &Path, line: u32) {
        if self.selection.matches(path, Some(line)) {
            return;
        }
        if self.registration.has_pending_reveal_for_file(path) {
            debug!(file = %path.display(), "reveal pending, ignoring location event");
            return;
        }
        match self.store.find_by_file_and_line(path, line) {
            Some(node) => self.select_node(node).await,
            None => self.select_file_only(path).await,
        }
    }

    async fn select_node(&self, node: CallNode) {
        let prev = self.selection.current_node();
        self.selection.set_current_node(Some(node.clone()));
        self.documents.undecorate_node(prev.as_ref()).await;

        self.registration
            .register_pending_reveal(&node.id, Path::new(&node.file));
        let editors = self.documents.open_by_node(&node);
        self.documents.decorate(&editors).await;
        self.registration.deregister_pending_reveal(&node.id);

        self.bus.publish(&TraceEvent::NodeSelected {
            id: node.id.clone(),
        });
    }

    async fn select_file_only(&self, path: &Path) {
        let prev = self.selection.current_node();
        self.selection.set_current_node(None);
        self.documents.undecorate_node(prev.as_ref()).await;
        self.documents.reveal_file(path);
        self.bus.publish(&TraceEvent::FileSelected {
            path: path.to_path_buf(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mock::{HostCall, MockHost};
    use crate::host::{LineSpan, NullHost};
    use crate::store::{DbHandle, SourceRoots};
    use rusqlite::Connection;

    fn fixture_db(dir: &Path) -> PathBuf {
        let path = dir.join("trace.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE treenodes (
                id TEXT, parent_id TEXT, file TEXT, line TEXT, method TEXT,
                depth INTEGER, gemEntry INTEGER, isDepthTruncated INTEGER,
                block INTEGER, caller TEXT, return_value TEXT, script INTEGER,
                tp_class_name TEXT, tp_defined_class TEXT
             );
             CREATE TABLE node_sources (id INTEGER, name TEXT, root_path TEXT);
             INSERT INTO node_sources VALUES (1, 'app', '/work/app');
             INSERT INTO treenodes VALUES
                ('1', NULL, '/work/app/foo.rb', '5', 'bar', 0, 0, 0, 0, '', '', 0, 'Foo', 'Foo');",
        )
        .unwrap();
        path
    }

    struct Fixture {
        host: Arc<MockHost>,
        coordinator: Coordinator,
        selection: Arc<SelectionState>,
        registration: Arc<ActionRegistration>,
    }

    fn fixture(dir: &Path) -> Fixture {
        let db = Arc::new(DbHandle::new());
        db.connect(&fixture_db(dir)).unwrap();
        let sources = Arc::new(SourceRoots::new());
        sources.load(&db.executor().unwrap()).unwrap();
        let store = Arc::new(CallNodeStore::new(
            db.clone(),
            sources,
            Arc::new(NullHost),
        ));

        let host = Arc::new(MockHost::default());
        let selection = Arc::new(SelectionState::new());
        selection.set_db_path(db.path());
        let registration = Arc::new(ActionRegistration::new());
        let documents = Arc::new(DocumentManager::new(
            host.clone(),
            registration.clone(),
            selection.clone(),
        ));
        let coordinator = Coordinator::new(
            store,
            selection.clone(),
            documents,
            registration.clone(),
            Arc::new(EventBus::new()),
        );
        Fixture {
            host,
            coordinator,
            selection,
            registration,
        }
    }

    #[tokio::test]
    async fn test_open_call_node_selects_and_navigates() {
        let dir = tempfile::tempdir().unwrap();
        let f = fixture(dir.path());
        *f.host.opened_view.lock() = Some(EditorView {
            path: PathBuf::from("/work/app/foo.rb"),
            visible: LineSpan { start: 50, end: 90 },
            line_count: 200,
        });

        f.coordinator.open_call_node("1").await;

        let node = f.selection.current_node().unwrap();
        assert_eq!(node.id, "1");
        assert_eq!(f.host.open_count(), 1);
        // Line 5 is outside the 50..90 visible span, so exactly one reveal.
        assert_eq!(f.host.reveal_count(), 1);
        // Registration was consumed once the flow finished.
        assert!(!f
            .registration
            .has_pending_reveal_for_file(Path::new("/work/app/foo.rb")));
    }

    #[tokio::test]
    async fn test_cursor_move_ignored_while_reveal_pending() {
        let dir = tempfile::tempdir().unwrap();
        let f = fixture(dir.path());
        let path = Path::new("/work/app/foo.rb");
        f.registration.register_pending_reveal("1", path);

        f.coordinator.editor_cursor_moved(path, 4, true).await;
        assert!(f.selection.current_node().is_none());
        assert_eq!(f.host.open_count(), 0);
    }

    #[tokio::test]
    async fn test_non_pointer_cursor_move_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let f = fixture(dir.path());
        f.coordinator
            .editor_cursor_moved(Path::new("/work/app/foo.rb"), 4, false)
            .await;
        assert!(f.selection.current_node().is_none());
    }

    #[tokio::test]
    async fn test_cursor_move_with_no_matching_row_selects_file_only() {
        let dir = tempfile::tempdir().unwrap();
        let f = fixture(dir.path());
        f.coordinator
            .editor_cursor_moved(Path::new("/work/app/foo.rb"), 98, true)
            .await;
        assert!(f.selection.current_node().is_none());
        // File-only selection still navigates to the file.
        assert_eq!(f.host.open_count(), 1);
    }

    #[tokio::test]
    async fn test_reselecting_same_location_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let f = fixture(dir.path());
        f.coordinator.open_call_node("1").await;
        let opens = f.host.open_count();

        f.coordinator
            .editor_cursor_moved(Path::new("/work/app/foo.rb"), 4, true)
            .await;
        assert_eq!(f.host.open_count(), opens);
    }

    #[tokio::test]
    async fn test_visibility_event_consumes_pending_open() {
        let dir = tempfile::tempdir().unwrap();
        let f = fixture(dir.path());
        let path = PathBuf::from("/work/app/foo.rb");
        f.registration.register_pending_open(&path);
        f.registration.register_pending_reveal("1", &path);

        let editors = vec![EditorView {
            path: path.clone(),
            visible: LineSpan { start: 0, end: 40 },
            line_count: 200,
        }];
        f.coordinator.visible_editors_changed(&editors).await;

        assert!(!f.registration.pending_open_includes(&path));
        // The pending editor was not treated as user-driven: no decoration
        // calls were made for it.
        assert!(!f
            .host
            .calls()
            .iter()
            .any(|c| matches!(c, HostCall::SetHighlights(_, _) | HostCall::ClearHighlights(_))));
    }

    #[tokio::test]
    async fn test_user_driven_visibility_change_redecorates() {
        let dir = tempfile::tempdir().unwrap();
        let f = fixture(dir.path());

        let editors = vec![EditorView {
            path: PathBuf::from("/work/app/foo.rb"),
            visible: LineSpan { start: 0, end: 40 },
            line_count: 200,
        }];
        f.coordinator.visible_editors_changed(&editors).await;

        // No node is selected, so the reaction clears the file's highlights.
        assert!(f
            .host
            .calls()
            .contains(&HostCall::ClearHighlights(PathBuf::from(
                "/work/app/foo.rb"
            ))));
    }

    #[tokio::test]
    async fn test_nothing_happens_without_a_loaded_db() {
        let dir = tempfile::tempdir().unwrap();
        let f = fixture(dir.path());
        f.selection.set_db_path(None);
        f.coordinator.open_call_node("1").await;
        assert!(f.selection.current_node().is_none());
        assert_eq!(f.host.open_count(), 0);
    }
}
