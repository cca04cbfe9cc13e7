//! Trace database access: executor, row repositories, metadata, watcher

pub mod call_nodes;
pub mod executor;
pub mod metadata;
pub mod source_roots;
pub mod watcher;

pub use call_nodes::{CallNode, CallNodeStore, ClassRow, FileCountRow, MethodRow, ScopePredicate};
pub use executor::{DbHandle, SqliteExecutor};
pub use metadata::TraceMetadata;
pub use source_roots::{SourceRoot, SourceRoots, UNKNOWN_SOURCE};
pub use watcher::DbWatcher;

use rusqlite::types::ValueRef;
use rusqlite::Row;

/// Read a column as text regardless of its declared type. Trace databases in
/// the wild store ids and lines as either INTEGER or TEXT (and occasionally
/// BLOB); normalize all of them.
pub(crate) fn column_to_string(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    let value = match row.get_ref(idx)? {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(t) => Some(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
    };
    Ok(value)
}

/// Read a 0/1 flag column, treating NULL (and anything unparsable) as false.
pub(crate) fn column_to_bool(row: &Row<'_>, idx: usize) -> rusqlite::Result<bool> {
    let truthy = match row.get_ref(idx)? {
        ValueRef::Integer(i) => i != 0,
        ValueRef::Text(t) => String::from_utf8_lossy(t).trim() == "1",
        _ => false,
    };
    Ok(truthy)
}
