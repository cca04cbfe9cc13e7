//! Method highlighting
//!
//! Resolves the method enclosing a trace line via the host's symbol provider
//! and applies a whole-line background highlight over its full range.
//! Applying is idempotent: previous highlights for the file are cleared
//! before new ones land. When no enclosing symbol can be found the single
//! target line is highlighted instead; a failing symbol lookup is never
//! fatal.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::host::{DocumentSymbol, EditorHost, HostSymbolKind};

pub struct DecorationManager {
    host: Arc<dyn EditorHost>,
}

impl DecorationManager {
    pub fn new(host: Arc<dyn EditorHost>) -> Self {
        Self { host }
    }

    /// Highlight the method containing the 1-based `line` in `path`.
    pub fn highlight_method_at(&self, path: &Path, line: u32) {
        if line == 0 {
            return;
        }
        let line_index = line - 1;

        let span = match self.host.document_symbols(path) {
            Ok(symbols) => find_method_symbol(&symbols, line_index).map(|s| s.range),
            Err(err) => {
                debug!(file = %path.display(), %err, "symbol lookup failed");
                None
            }
        };

        let lines: Vec<u32> = match span {
            Some(range) => (range.start + 1..=range.end + 1).collect(),
            None => vec![line],
        };
        self.host.clear_highlights(path);
        self.host.set_highlights(path, &lines);
    }

    /// Highlight an explicit 1-based line range.
    pub fn highlight_range(&self, path: &Path, start: u32, end: u32) {
        if start == 0 || end == 0 || end < start {
            return;
        }
        let lines: Vec<u32> = (start..=end).collect();
        self.host.clear_highlights(path);
        self.host.set_highlights(path, &lines);
    }

    pub fn clear(&self, path: &Path) {
        self.host.clear_highlights(path);
    }
}

/// Innermost Method/Function symbol whose range contains the 0-based
/// `line_index`. Children are searched before the symbol itself, so a nested
/// function wins over its enclosing method.
pub fn find_method_symbol(symbols: &[DocumentSymbol], line_index: u32) -> Option<&DocumentSymbol> {
    for symbol in symbols {
        if !symbol.range.contains(line_index) {
            continue;
        }
        if let Some(child) = find_method_symbol(&symbol.children, line_index) {
            return Some(child);
        }
        if matches!(
            symbol.kind,
            HostSymbolKind::Method | HostSymbolKind::Function
        ) {
            return Some(symbol);
        }
    }
    None
}
