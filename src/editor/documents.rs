//! Document opening and decoration orchestration
//!
//! Owns the open/reuse/reveal flow for navigating to a trace location and
//! keeps editor decorations in line with the current selection. Decoration
//! mutation is globally serialized (one in flight across all files) so two
//! visible editors never interleave partial highlight updates.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

use crate::coordinator::SelectionState;
use crate::editor::decorations::DecorationManager;
use crate::editor::registration::ActionRegistration;
use crate::host::{editors_for, EditorHost, EditorView};
use crate::store::CallNode;

pub struct DocumentManager {
    host: Arc<dyn EditorHost>,
    registration: Arc<ActionRegistration>,
    decorations: DecorationManager,
    selection: Arc<SelectionState>,
    highlight_mutex: AsyncMutex<()>,
}

impl DocumentManager {
    pub fn new(
        host: Arc<dyn EditorHost>,
        registration: Arc<ActionRegistration>,
        selection: Arc<SelectionState>,
    ) -> Self {
        Self {
            decorations: DecorationManager::new(host.clone()),
            host,
            registration,
            selection,
            highlight_mutex: AsyncMutex::new(()),
        }
    }

    pub fn registration(&self) -> &Arc<ActionRegistration> {
        &self.registration
    }

    /// Open (or reuse) an editor for `path`, then scroll to the 1-based
    /// `line` if it is outside the visible range. The active editor wins over
    /// other visible panes; a fresh open is registered as pending so the
    /// resulting visibility event is not treated as a user action.
    pub fn open_resource(&self, path: &Path, line: Option<u32>) -> Vec<EditorView> {
        let view = if let Some(active) = self.host.active_editor().filter(|v| v.path == path) {
            active
        } else if let Some(visible) = self
            .host
            .visible_editors()
            .into_iter()
            .find(|v| v.path == path)
        {
            visible
        } else {
            self.registration.register_pending_open(path);
            match self.host.open_document(path) {
                Ok(view) => view,
                Err(err) => {
                    self.host
                        .notify_error(&format!("Could not open file: {}. {err}", path.display()));
                    return Vec::new();
                }
            }
        };

        if let Some(line) = line.filter(|l| *l > 0 && *l <= view.line_count) {
            if !view.visible.contains(line - 1) {
                self.host.reveal_line(path, line);
            }
        }

        let visible = self.host.visible_editors();
        let editors: Vec<EditorView> = editors_for(&visible, path).into_iter().cloned().collect();
        if editors.is_empty() {
            vec![view]
        } else {
            editors
        }
    }

    /// Navigate to a call node's recorded location.
    pub fn open_by_node(&self, node: &CallNode) -> Vec<EditorView> {
        if node.file.is_empty() {
            return Vec::new();
        }
        let line = node.line_number().unwrap_or(1);
        self.open_resource(Path::new(&node.file), Some(line))
    }

    /// Navigate to the top of a file with no node selected.
    pub fn reveal_file(&self, path: &Path) -> Vec<EditorView> {
        self.open_resource(path, Some(1))
    }

    /// Bring the given editors' decorations in line with the selection.
    pub async fn decorate(&self, editors: &[EditorView]) {
        let paths: BTreeSet<PathBuf> = editors.iter().map(|e| e.path.clone()).collect();
        for path in paths {
            let node = self
                .selection
                .current_node()
                .filter(|n| Path::new(&n.file) == path);
            let _guard = self.highlight_mutex.lock().await;
            self.decorate_file(&path, node.as_ref());
        }
    }

    fn decorate_file(&self, path: &Path, node: Option<&CallNode>) {
        match node {
            Some(node) if Path::new(&node.file) == path => {
                // Script/top-level rows get scroll only, no method highlight.
                if node.script {
                    debug!(file = %path.display(), "script node, skipping highlight");
                    return;
                }
                if let Some(line) = node.line_number() {
                    self.decorations.highlight_method_at(path, line);
                }
            }
            _ => self.decorations.clear(path),
        }
    }

    /// Clear decorations left behind by a previously-selected node.
    pub async fn undecorate_node(&self, node: Option<&CallNode>) {
        let Some(node) = node else { return };
        let path = PathBuf::from(&node.file);
        let visible = self.host.visible_editors();
        let showing: Vec<EditorView> = editors_for(&visible, &path).into_iter().cloned().collect();
        if showing.is_empty() {
            return;
        }
        {
            let _guard = self.highlight_mutex.lock().await;
            self.decorations.clear(&path);
        }
        self.decorate(&showing).await;
    }

    pub async fn redecorate_visible(&self) {
        let editors = self.host.visible_editors();
        self.decorate(&editors).await;
    }
}
