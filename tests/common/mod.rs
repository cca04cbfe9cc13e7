//! Common test utilities for tracescope integration tests
//!
//! Provides `TraceDb`, a builder that writes a real trace database into a
//! temporary workspace laid out the way the tracing agent does it
//! (`tmp/tracescope/db/call_trace.db`), so tests run the full load pipeline.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};

pub const SCHEMA: &str = "
CREATE TABLE treenodes (
    id TEXT, parent_id TEXT, file TEXT, line TEXT, method TEXT,
    depth INTEGER, gemEntry INTEGER, isDepthTruncated INTEGER,
    block INTEGER, caller TEXT, return_value TEXT, script INTEGER,
    tp_class_name TEXT, tp_defined_class TEXT
);
CREATE TABLE node_sources (id INTEGER, name TEXT, root_path TEXT);
CREATE TABLE metadata (
    id INTEGER, name TEXT, description TEXT, caller_file TEXT,
    caller_method TEXT, caller_line TEXT, caller_class TEXT,
    start_time TEXT, end_time TEXT, duration_ms TEXT, trigger_type TEXT
);
";

/// One call row about to be written into the fixture database.
pub struct RowSpec {
    pub id: &'static str,
    pub parent_id: Option<&'static str>,
    pub file: String,
    pub line: &'static str,
    pub method: &'static str,
    pub block: bool,
    pub script: bool,
    pub class_name: &'static str,
    pub defined_class: &'static str,
}

impl RowSpec {
    pub fn call(id: &'static str, parent: Option<&'static str>, file: String) -> Self {
        Self {
            id,
            parent_id: parent,
            file,
            line: "5",
            method: "call",
            block: false,
            script: false,
            class_name: "Main",
            defined_class: "Main",
        }
    }
}

/// A workspace with an agent-conventional trace database inside it.
pub struct TraceDb {
    pub workspace: tempfile::TempDir,
    pub db_path: PathBuf,
    pub app_root: PathBuf,
}

impl TraceDb {
    pub fn new() -> Self {
        let workspace = tempfile::tempdir().unwrap();
        let db_dir = workspace.path().join("tmp/tracescope/db");
        std::fs::create_dir_all(&db_dir).unwrap();
        let db_path = db_dir.join("call_trace.db");
        let app_root = workspace.path().join("app");

        let conn = Connection::open(&db_path).unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute(
            "INSERT INTO node_sources VALUES (1, 'app', ?1)",
            [app_root.to_string_lossy()],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO metadata VALUES (1, 'test run', '{\"trigger\":\"test\"}',
             'runner.rb', 'run', '1', 'Runner', '', '', '3', 'manual')",
            [],
        )
        .unwrap();
        drop(conn);

        Self {
            workspace,
            db_path,
            app_root,
        }
    }

    pub fn root(&self) -> &Path {
        self.workspace.path()
    }

    /// Path of a file under the registered app root.
    pub fn app_file(&self, relative: &str) -> String {
        self.app_root.join(relative).to_string_lossy().into_owned()
    }

    pub fn insert_source(&self, id: i64, name: &str, root_path: &str) {
        let conn = Connection::open(&self.db_path).unwrap();
        conn.execute(
            "INSERT INTO node_sources VALUES (?1, ?2, ?3)",
            params![id, name, root_path],
        )
        .unwrap();
    }

    pub fn delete_rows(&self) {
        let conn = Connection::open(&self.db_path).unwrap();
        conn.execute("DELETE FROM treenodes", []).unwrap();
    }

    pub fn insert(&self, row: &RowSpec) {
        let conn = Connection::open(&self.db_path).unwrap();
        conn.execute(
            "INSERT INTO treenodes VALUES (?1, ?2, ?3, ?4, ?5, 0, 0, 0, ?6, '', '', ?7, ?8, ?9)",
            params![
                row.id,
                row.parent_id,
                row.file,
                row.line,
                row.method,
                row.block as i64,
                row.script as i64,
                row.class_name,
                row.defined_class,
            ],
        )
        .unwrap();
    }
}

/// Editor host that records every call it receives, for asserting on the
/// open/reveal/decorate side effects of a selection.
pub mod recording_host {
    use std::path::{Path, PathBuf};

    use parking_lot::Mutex;
    use tracescope::error::Result;
    use tracescope::host::{
        DocumentSymbol, EditorHost, EditorView, LineSpan, Notifier,
    };

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Open(PathBuf),
        Reveal(PathBuf, u32),
        Highlight(PathBuf, Vec<u32>),
        Clear(PathBuf),
    }

    pub struct RecordingHost {
        pub calls: Mutex<Vec<Call>>,
        pub visible: Mutex<Vec<EditorView>>,
        /// Visible span editors get when opened
        pub opened_span: Mutex<LineSpan>,
    }

    impl RecordingHost {
        pub fn new(opened_span: LineSpan) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                visible: Mutex::new(Vec::new()),
                opened_span: Mutex::new(opened_span),
            }
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().clone()
        }

        pub fn opens(&self) -> usize {
            self.calls
                .lock()
                .iter()
                .filter(|c| matches!(c, Call::Open(_)))
                .count()
        }

        pub fn reveals(&self) -> usize {
            self.calls
                .lock()
                .iter()
                .filter(|c| matches!(c, Call::Reveal(_, _)))
                .count()
        }
    }

    impl Notifier for RecordingHost {
        fn notify_error(&self, _message: &str) {}
        fn notify_info(&self, _message: &str) {}
    }

    impl EditorHost for RecordingHost {
        fn active_editor(&self) -> Option<EditorView> {
            None
        }

        fn visible_editors(&self) -> Vec<EditorView> {
            self.visible.lock().clone()
        }

        fn open_document(&self, path: &Path) -> Result<EditorView> {
            self.calls.lock().push(Call::Open(path.to_path_buf()));
            let view = EditorView {
                path: path.to_path_buf(),
                visible: *self.opened_span.lock(),
                line_count: 500,
            };
            self.visible.lock().push(view.clone());
            Ok(view)
        }

        fn reveal_line(&self, path: &Path, line: u32) {
            self.calls.lock().push(Call::Reveal(path.to_path_buf(), line));
        }

        fn set_highlights(&self, path: &Path, lines: &[u32]) {
            self.calls
                .lock()
                .push(Call::Highlight(path.to_path_buf(), lines.to_vec()));
        }

        fn clear_highlights(&self, path: &Path) {
            self.calls.lock().push(Call::Clear(path.to_path_buf()));
        }

        fn document_symbols(&self, _path: &Path) -> Result<Vec<DocumentSymbol>> {
            Ok(Vec::new())
        }
    }
}
