//! Recordings list
//!
//! Enumerates the trace database files the agent has written into the data
//! directory, newest first, and labels each from its own metadata row. A
//! database that exists but cannot be read still gets a row, rendered as a
//! distinct error item instead of aborting the listing.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::warn;

use crate::config::Config;
use crate::present::{Collapse, IconKind, NavCommand, TreeItem};
use crate::store::TraceMetadata;

/// One row in the recordings view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingItem {
    Recording(TraceMetadata),
    Error { basename: String, path: PathBuf },
}

impl RecordingItem {
    pub fn path(&self) -> &Path {
        match self {
            RecordingItem::Recording(meta) => &meta.db_path,
            RecordingItem::Error { path, .. } => path,
        }
    }
}

pub struct RecordingsView {
    db_dir: PathBuf,
}

impl RecordingsView {
    pub fn new(config: &Config) -> Self {
        Self {
            db_dir: config.db_dir(),
        }
    }

    /// All `.db` files in the data directory, most recently modified first.
    pub fn list(&self) -> Vec<RecordingItem> {
        let entries = match std::fs::read_dir(&self.db_dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(dir = %self.db_dir.display(), %err, "cannot read recordings directory");
                return Vec::new();
            }
        };

        let mut files: Vec<(PathBuf, SystemTime)> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry.file_type().map(|t| t.is_file()).unwrap_or(false)
                    && entry.path().extension().is_some_and(|ext| ext == "db")
            })
            .map(|entry| {
                let modified = entry
                    .metadata()
                    .and_then(|m| m.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                (entry.path(), modified)
            })
            .collect();
        files.sort_by(|a, b| b.1.cmp(&a.1));

        files
            .into_iter()
            .map(|(path, _)| match TraceMetadata::load(&path) {
                Ok(meta) => RecordingItem::Recording(meta),
                Err(err) => {
                    warn!(db = %path.display(), %err, "unreadable recording");
                    let basename = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    RecordingItem::Error { basename, path }
                }
            })
            .collect()
    }

    /// Display record for one recording row.
    pub fn tree_item(&self, item: &RecordingItem) -> TreeItem {
        match item {
            RecordingItem::Recording(meta) => TreeItem {
                label: meta.name.clone(),
                description: meta.description.clone(),
                tooltip: description_tooltip(&meta.description),
                icon: IconKind::Package,
                collapse: Collapse::None,
                command: Some(NavCommand::LoadRecording {
                    path: meta.db_path.clone(),
                }),
            },
            RecordingItem::Error { basename, path } => TreeItem {
                label: "Error loading database".to_string(),
                description: basename.clone(),
                tooltip: format!(
                    "Database file exists but could not be loaded: {}",
                    path.display()
                ),
                icon: IconKind::Error,
                collapse: Collapse::None,
                command: None,
            },
        }
    }
}

/// Recording descriptions written by the agent are usually a JSON object;
/// pretty-print it for the tooltip, falling back to the raw text.
fn description_tooltip(description: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(description) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| description.to_string()),
        Err(_) => description.to_string(),
    }
}
