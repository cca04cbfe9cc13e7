//! Per-recording metadata
//!
//! Every trace database carries a one-row `metadata` table describing the
//! recorded run. It is read directly from the recording file (not through the
//! active connection) so the recordings list can label databases that are not
//! currently loaded.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, OptionalExtension};

use crate::error::{Result, TraceScopeError};
use crate::store::column_to_string;

/// The `metadata` row of one trace database, plus where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceMetadata {
    pub id: String,
    pub name: String,
    pub description: String,
    pub caller_file: String,
    pub caller_method: String,
    pub caller_line: String,
    pub caller_class: String,
    pub start_time: String,
    pub end_time: String,
    pub duration_ms: String,
    pub trigger_type: String,
    pub db_path: PathBuf,
    pub db_basename: String,
}

impl TraceMetadata {
    /// Read the metadata row from a trace database file.
    pub fn load(db_path: &Path) -> Result<TraceMetadata> {
        if !db_path.exists() {
            return Err(TraceScopeError::MissingDb {
                path: db_path.display().to_string(),
            });
        }
        let conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        let basename = db_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let row = conn
            .query_row(
                "SELECT id, name, description, caller_file, caller_method, caller_line, \
                        caller_class, start_time, end_time, duration_ms, trigger_type \
                 FROM metadata WHERE id = ?1",
                [1],
                |row| {
                    Ok(TraceMetadata {
                        id: column_to_string(row, 0)?.unwrap_or_default(),
                        name: column_to_string(row, 1)?.unwrap_or_default(),
                        description: column_to_string(row, 2)?.unwrap_or_default(),
                        caller_file: column_to_string(row, 3)?.unwrap_or_default(),
                        caller_method: column_to_string(row, 4)?.unwrap_or_default(),
                        caller_line: column_to_string(row, 5)?.unwrap_or_default(),
                        caller_class: column_to_string(row, 6)?.unwrap_or_default(),
                        start_time: column_to_string(row, 7)?.unwrap_or_default(),
                        end_time: column_to_string(row, 8)?.unwrap_or_default(),
                        duration_ms: column_to_string(row, 9)?.unwrap_or_default(),
                        trigger_type: column_to_string(row, 10)?.unwrap_or_default(),
                        db_path: db_path.to_path_buf(),
                        db_basename: basename.clone(),
                    })
                },
            )
            .optional()?;

        row.ok_or_else(|| TraceScopeError::Query {
            message: format!("no metadata row in {}", db_path.display()),
        })
    }
}
