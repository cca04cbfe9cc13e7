//! SQLite access for trace databases
//!
//! A trace database is produced by the external tracing agent; this side only
//! reads it. [`SqliteExecutor`] wraps one open connection with `get`/`all`/
//! `run`/`exec` helpers over parameterized SQL. [`DbHandle`] owns the
//! currently-loaded database and a generation counter that is bumped on every
//! reconnect, so caches built against an older connection can detect they are
//! stale and invalidate wholesale.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rusqlite::{Connection, OpenFlags, OptionalExtension, Params, Row};

use crate::error::{Result, TraceScopeError};

/// One open, validated trace database connection
#[derive(Debug)]
pub struct SqliteExecutor {
    conn: Mutex<Connection>,
    path: PathBuf,
    generation: u64,
}

impl SqliteExecutor {
    /// Open a trace database read-only and probe for the `treenodes` table.
    pub fn open(path: &Path, generation: u64) -> Result<Self> {
        if !path.exists() {
            return Err(TraceScopeError::MissingDb {
                path: path.display().to_string(),
            });
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        let executor = Self {
            conn: Mutex::new(conn),
            path: path.to_path_buf(),
            generation,
        };
        executor.check_table_exists()?;
        Ok(executor)
    }

    fn check_table_exists(&self) -> Result<()> {
        let probe: Option<String> = self.get(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'treenodes'",
            [],
            |row| row.get(0),
        )?;
        if probe.is_none() {
            return Err(TraceScopeError::InvalidDb {
                path: self.path.display().to_string(),
            });
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Run a query expected to produce at most one row.
    pub fn get<T, P, F>(&self, sql: &str, params: P, map: F) -> Result<Option<T>>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        let conn = self.conn.lock();
        let row = conn.query_row(sql, params, map).optional()?;
        Ok(row)
    }

    /// Run a query and collect every row.
    pub fn all<T, P, F>(&self, sql: &str, params: P, map: F) -> Result<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(sql)?;
        let rows = stmt.query_map(params, map)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Execute a single statement, returning the affected row count.
    pub fn run<P: Params>(&self, sql: &str, params: P) -> Result<usize> {
        let conn = self.conn.lock();
        Ok(conn.execute(sql, params)?)
    }

    /// Execute a batch of statements.
    pub fn exec(&self, sql: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute_batch(sql)?;
        Ok(())
    }
}

/// The currently-loaded trace database, swapped wholesale when a new
/// recording is selected.
pub struct DbHandle {
    executor: RwLock<Option<Arc<SqliteExecutor>>>,
    generation: AtomicU64,
}

impl Default for DbHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl DbHandle {
    pub fn new() -> Self {
        Self {
            executor: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Connect to a trace database, replacing any previous connection.
    /// The generation is bumped only after the new database validates.
    pub fn connect(&self, path: &Path) -> Result<()> {
        let generation = self.generation.load(Ordering::SeqCst) + 1;
        let executor = Arc::new(SqliteExecutor::open(path, generation)?);
        *self.executor.write() = Some(executor);
        self.generation.store(generation, Ordering::SeqCst);
        tracing::info!(db = %path.display(), generation, "connected to trace database");
        Ok(())
    }

    /// Drop the current connection without loading a replacement. The file
    /// is released so it can be removed from disk.
    pub fn disconnect(&self) {
        if self.executor.write().take().is_some() {
            tracing::info!("disconnected from trace database");
        }
    }

    /// Current executor, or `MissingDb` when no recording is loaded.
    pub fn executor(&self) -> Result<Arc<SqliteExecutor>> {
        self.executor.read().clone().ok_or(TraceScopeError::MissingDb {
            path: "(no trace database loaded)".to_string(),
        })
    }

    pub fn is_connected(&self) -> bool {
        self.executor.read().is_some()
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.executor.read().as_ref().map(|e| e.path.clone())
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}
