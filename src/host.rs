//! Host editor boundary
//!
//! The core never talks to an editor directly; everything it needs from the
//! host (opening documents, revealing lines, decorations, document symbols,
//! user notifications) goes through the [`EditorHost`] trait. An editor
//! integration implements it once; the rest of the crate is host-agnostic.
//!
//! Lines at this boundary are 1-based (matching the trace rows); visible
//! ranges use 0-based line indices (matching typical editor APIs).

use std::path::{Path, PathBuf};

use crate::error::Result;

/// User-facing notifications, split out so data-access layers can report
/// failures without a full editor handle.
pub trait Notifier: Send + Sync {
    fn notify_error(&self, message: &str);
    fn notify_info(&self, message: &str);
}

/// Symbol kinds the decoration layer cares about. Anything that is not a
/// method or function boundary maps to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostSymbolKind {
    Method,
    Function,
    Class,
    Module,
    Other,
}

/// An inclusive 0-based line span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    pub start: u32,
    pub end: u32,
}

impl LineSpan {
    pub fn contains(&self, line: u32) -> bool {
        self.start <= line && line <= self.end
    }
}

/// One entry of a document outline, as produced by the host's symbol provider
#[derive(Debug, Clone)]
pub struct DocumentSymbol {
    pub name: String,
    pub kind: HostSymbolKind,
    pub range: LineSpan,
    pub children: Vec<DocumentSymbol>,
}

/// A visible editor pane showing a document
#[derive(Debug, Clone)]
pub struct EditorView {
    pub path: PathBuf,
    /// Currently visible line span (0-based)
    pub visible: LineSpan,
    pub line_count: u32,
}

/// Capability surface the core consumes from the host editor
pub trait EditorHost: Notifier {
    /// The editor holding focus, if any
    fn active_editor(&self) -> Option<EditorView>;

    /// All editors currently visible, in any pane
    fn visible_editors(&self) -> Vec<EditorView>;

    /// Open a document and show it in an editor
    fn open_document(&self, path: &Path) -> Result<EditorView>;

    /// Scroll editors showing `path` so the 1-based `line` is centered
    fn reveal_line(&self, path: &Path, line: u32);

    /// Apply whole-line highlight decorations to the given 1-based lines,
    /// replacing any previous highlight for `path`
    fn set_highlights(&self, path: &Path, lines: &[u32]);

    /// Remove all highlight decorations for `path`
    fn clear_highlights(&self, path: &Path);

    /// Document outline from the host's symbol provider
    fn document_symbols(&self, path: &Path) -> Result<Vec<DocumentSymbol>>;
}

/// Editors from `views` that show `path`
pub fn editors_for<'a>(views: &'a [EditorView], path: &Path) -> Vec<&'a EditorView> {
    views.iter().filter(|v| v.path == path).collect()
}

/// Host with no editor surface. Used by the CLI, where navigation side
/// effects have nowhere to land; notifications go to the log.
#[derive(Debug, Default)]
pub struct NullHost;

impl Notifier for NullHost {
    fn notify_error(&self, message: &str) {
        tracing::error!("{message}");
    }

    fn notify_info(&self, message: &str) {
        tracing::info!("{message}");
    }
}

impl EditorHost for NullHost {
    fn active_editor(&self) -> Option<EditorView> {
        None
    }

    fn visible_editors(&self) -> Vec<EditorView> {
        Vec::new()
    }

    fn open_document(&self, path: &Path) -> Result<EditorView> {
        Ok(EditorView {
            path: path.to_path_buf(),
            visible: LineSpan { start: 0, end: 0 },
            line_count: 0,
        })
    }

    fn reveal_line(&self, _path: &Path, _line: u32) {}

    fn set_highlights(&self, _path: &Path, _lines: &[u32]) {}

    fn clear_highlights(&self, _path: &Path) {}

    fn document_symbols(&self, _path: &Path) -> Result<Vec<DocumentSymbol>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! Recording host for coordinator and decoration tests

    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Debug, Clone, PartialEq)]
    pub enum HostCall {
        OpenDocument(PathBuf),
        RevealLine(PathBuf, u32),
        SetHighlights(PathBuf, Vec<u32>),
        ClearHighlights(PathBuf),
        Error(String),
    }

    #[derive(Default)]
    pub struct MockHost {
        pub calls: Mutex<Vec<HostCall>>,
        pub active: Mutex<Option<EditorView>>,
        pub visible: Mutex<Vec<EditorView>>,
        pub symbols: Mutex<HashMap<PathBuf, Vec<DocumentSymbol>>>,
        /// Editor state returned by `open_document`
        pub opened_view: Mutex<Option<EditorView>>,
    }

    impl MockHost {
        pub fn calls(&self) -> Vec<HostCall> {
            self.calls.lock().clone()
        }

        pub fn open_count(&self) -> usize {
            self.calls
                .lock()
                .iter()
                .filter(|c| matches!(c, HostCall::OpenDocument(_)))
                .count()
        }

        pub fn reveal_count(&self) -> usize {
            self.calls
                .lock()
                .iter()
                .filter(|c| matches!(c, HostCall::RevealLine(_, _)))
                .count()
        }
    }

    impl Notifier for MockHost {
        fn notify_error(&self, message: &str) {
            self.calls.lock().push(HostCall::Error(message.to_string()));
        }

        fn notify_info(&self, _message: &str) {}
    }

    impl EditorHost for MockHost {
        fn active_editor(&self) -> Option<EditorView> {
            self.active.lock().clone()
        }

        fn visible_editors(&self) -> Vec<EditorView> {
            self.visible.lock().clone()
        }

        fn open_document(&self, path: &Path) -> Result<EditorView> {
            self.calls
                .lock()
                .push(HostCall::OpenDocument(path.to_path_buf()));
            let view = self.opened_view.lock().clone().unwrap_or(EditorView {
                path: path.to_path_buf(),
                visible: LineSpan { start: 0, end: 40 },
                line_count: 200,
            });
            let view = EditorView {
                path: path.to_path_buf(),
                ..view
            };
            // Opening makes the editor visible, like a real host would.
            self.visible.lock().push(view.clone());
            Ok(view)
        }

        fn reveal_line(&self, path: &Path, line: u32) {
            self.calls
                .lock()
                .push(HostCall::RevealLine(path.to_path_buf(), line));
        }

        fn set_highlights(&self, path: &Path, lines: &[u32]) {
            self.calls
                .lock()
                .push(HostCall::SetHighlights(path.to_path_buf(), lines.to_vec()));
        }

        fn clear_highlights(&self, path: &Path) {
            self.calls
                .lock()
                .push(HostCall::ClearHighlights(path.to_path_buf()));
        }

        fn document_symbols(&self, path: &Path) -> Result<Vec<DocumentSymbol>> {
            Ok(self.symbols.lock().get(path).cloned().unwrap_or_default())
        }
    }
}
