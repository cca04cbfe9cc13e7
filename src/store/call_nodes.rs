//! Call-node repository
//!
//! Typed accessors over the `treenodes` table: one row per captured method,
//! block, or script execution. Every lookup is parameterized; a failed query
//! degrades to an empty result plus a host notification so tree population
//! keeps going for unaffected branches. `find_by_id` and `find_all_children`
//! results are cached per database generation and dropped wholesale when the
//! connection is swapped.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::Row;

use crate::error::Result;
use crate::host::Notifier;
use crate::store::executor::DbHandle;
use crate::store::source_roots::SourceRoots;
use crate::store::{column_to_bool, column_to_string};

const NODE_COLUMNS: &str = "id, parent_id, file, line, method, depth, gemEntry, \
     isDepthTruncated, block, caller, return_value, script";

/// One recorded call/block/script execution
#[derive(Debug, Clone, PartialEq)]
pub struct CallNode {
    pub id: String,
    pub parent_id: Option<String>,
    pub file: String,
    /// 1-based line as recorded; may be empty or non-numeric
    pub line: String,
    pub method: String,
    /// Mutated during call-tree traversal, not persisted back
    pub depth: i64,
    pub gem_entry: bool,
    /// Set during traversal when the configured depth cap is exceeded
    pub depth_truncated: bool,
    pub block: bool,
    /// Caller location as `file:line`
    pub caller: String,
    pub return_value: String,
    pub script: bool,
    /// Which registered source root owns `file` (`"other"` if none)
    pub source_name: String,
}

impl CallNode {
    pub fn display_name(&self) -> &str {
        if self.block {
            "block"
        } else {
            &self.method
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Parsed 1-based line, when the recorded value is numeric and positive
    pub fn line_number(&self) -> Option<u32> {
        self.line.trim().parse::<u32>().ok().filter(|n| *n > 0)
    }

    /// All 1-based lines this node is associated with
    pub fn line_ranges(&self) -> Vec<u32> {
        self.line_number().into_iter().collect()
    }

    /// 0-based line of the call site, parsed from `caller`
    pub fn caller_line(&self) -> Option<u32> {
        let line: u32 = self.caller.rsplit(':').next()?.parse().ok()?;
        line.checked_sub(1)
    }

    /// Whether this node is located at `file` (and `line`, when given)
    pub fn matches_location(&self, file: &Path, line: Option<u32>) -> bool {
        if Path::new(&self.file) != file {
            return false;
        }
        match line {
            None => true,
            Some(line) => self.line_ranges().contains(&line),
        }
    }
}

/// A distinct (file, class) pairing from the trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRow {
    pub file: String,
    pub class_name: String,
}

/// One grouped method row: first id, identity columns, execution count
#[derive(Debug, Clone, PartialEq)]
pub struct MethodRow {
    pub id: String,
    pub file: String,
    pub defined_class: String,
    pub method: String,
    pub block: bool,
    pub line: String,
    pub method_count: usize,
}

/// Per-file method execution count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCountRow {
    pub file: String,
    pub method_count: usize,
}

/// Closed set of row-scoping predicates. Rendered to parameterized SQL so
/// caller-provided paths never reach the query text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopePredicate {
    /// Rows whose file lives under a source root
    FileUnderRoot(String),
    /// Rows for one exact file
    FileEquals(String),
}

impl ScopePredicate {
    fn sql(&self) -> &'static str {
        match self {
            Self::FileUnderRoot(_) => "file LIKE ?1",
            Self::FileEquals(_) => "file = ?1",
        }
    }

    fn param(&self) -> String {
        match self {
            Self::FileUnderRoot(root) => format!("{root}%"),
            Self::FileEquals(file) => file.clone(),
        }
    }
}

/// Excludes block rows that already carry a method name, so a block is not
/// counted both as itself and as its enclosing method.
const BLOCK_METHOD_EXCLUSION: &str =
    "(block = 0 OR (block = 1 AND (method IS NULL OR method = '')))";

type ChildrenCache = HashMap<Option<String>, Vec<CallNode>>;

/// Repository over the `treenodes` table
pub struct CallNodeStore {
    db: Arc<DbHandle>,
    sources: Arc<SourceRoots>,
    notifier: Arc<dyn Notifier>,
    children_cache: Mutex<(u64, ChildrenCache)>,
    by_id_cache: Mutex<(u64, HashMap<String, CallNode>)>,
}

impl CallNodeStore {
    pub fn new(db: Arc<DbHandle>, sources: Arc<SourceRoots>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            db,
            sources,
            notifier,
            children_cache: Mutex::new((0, HashMap::new())),
            by_id_cache: Mutex::new((0, HashMap::new())),
        }
    }

    pub fn db(&self) -> &Arc<DbHandle> {
        &self.db
    }

    /// Drop all cached rows. Called when the underlying database is swapped.
    pub fn invalidate_caches(&self) {
        self.children_cache.lock().1.clear();
        self.by_id_cache.lock().1.clear();
    }

    fn map_node(&self, row: &Row<'_>) -> rusqlite::Result<CallNode> {
        let file = column_to_string(row, 2)?.unwrap_or_default();
        let source_name = self.sources.classify(Path::new(&file));
        Ok(CallNode {
            id: column_to_string(row, 0)?.unwrap_or_default(),
            parent_id: column_to_string(row, 1)?,
            file,
            line: column_to_string(row, 3)?.unwrap_or_default(),
            method: column_to_string(row, 4)?.unwrap_or_default(),
            depth: row.get::<_, Option<i64>>(5)?.unwrap_or(0),
            gem_entry: column_to_bool(row, 6)?,
            depth_truncated: column_to_bool(row, 7)?,
            block: column_to_bool(row, 8)?,
            caller: column_to_string(row, 9)?.unwrap_or_default(),
            return_value: column_to_string(row, 10)?.unwrap_or_default(),
            script: column_to_bool(row, 11)?,
            source_name,
        })
    }

    /// Report a query failure and degrade to the given fallback.
    fn degrade<T>(&self, context: &str, err: crate::error::TraceScopeError, fallback: T) -> T {
        tracing::warn!(%err, context, "trace query failed");
        self.notifier
            .notify_error(&format!("Error fetching {context} from the trace database: {err}"));
        fallback
    }

    pub fn find_by_id(&self, id: &str) -> Option<CallNode> {
        {
            let cache = self.by_id_cache.lock();
            if cache.0 == self.db.generation() {
                if let Some(node) = cache.1.get(id) {
                    return Some(node.clone());
                }
            }
        }

        let executor = match self.db.executor() {
            Ok(executor) => executor,
            Err(err) => return self.degrade("node", err, None),
        };
        let sql = format!("SELECT {NODE_COLUMNS} FROM treenodes WHERE id = ?1");
        let node = match executor.get(&sql, [id], |row| self.map_node(row)) {
            Ok(node) => node,
            Err(err) => return self.degrade("node", err, None),
        };

        if let Some(node) = &node {
            let mut cache = self.by_id_cache.lock();
            if cache.0 != executor.generation() {
                cache.0 = executor.generation();
                cache.1.clear();
            }
            cache.1.insert(id.to_string(), node.clone());
        }
        node
    }

    pub fn find_by_file_and_line(&self, file: &Path, line: u32) -> Option<CallNode> {
        let executor = match self.db.executor() {
            Ok(executor) => executor,
            Err(err) => return self.degrade("node", err, None),
        };
        let sql =
            format!("SELECT {NODE_COLUMNS} FROM treenodes WHERE file = ?1 AND line = ?2 LIMIT 1");
        let file = file.to_string_lossy().into_owned();
        match executor.get(&sql, (file, line.to_string()), |row| self.map_node(row)) {
            Ok(node) => node,
            Err(err) => self.degrade("node", err, None),
        }
    }

    /// Children of `parent_id`, or the trace roots when `None`.
    pub fn find_all_children(&self, parent_id: Option<&str>) -> Vec<CallNode> {
        let key = parent_id.map(str::to_string);
        {
            let cache = self.children_cache.lock();
            if cache.0 == self.db.generation() {
                if let Some(children) = cache.1.get(&key) {
                    return children.clone();
                }
            }
        }

        let executor = match self.db.executor() {
            Ok(executor) => executor,
            Err(err) => return self.degrade("child nodes", err, Vec::new()),
        };
        let result = match parent_id {
            Some(parent) => executor.all(
                &format!("SELECT {NODE_COLUMNS} FROM treenodes WHERE parent_id = ?1"),
                [parent],
                |row| self.map_node(row),
            ),
            None => executor.all(
                &format!("SELECT {NODE_COLUMNS} FROM treenodes WHERE parent_id IS NULL"),
                [],
                |row| self.map_node(row),
            ),
        };
        let children = match result {
            Ok(children) => children,
            Err(err) => return self.degrade("child nodes", err, Vec::new()),
        };

        let mut cache = self.children_cache.lock();
        if cache.0 != executor.generation() {
            cache.0 = executor.generation();
            cache.1.clear();
        }
        cache.1.insert(key, children.clone());
        children
    }

    pub fn has_children(&self, node: &CallNode) -> bool {
        let executor = match self.db.executor() {
            Ok(executor) => executor,
            Err(err) => return self.degrade("child count", err, false),
        };
        let count: Result<Option<i64>> = executor.get(
            "SELECT COUNT(*) FROM treenodes WHERE parent_id = ?1",
            [&node.id],
            |row| row.get(0),
        );
        match count {
            Ok(count) => count.unwrap_or(0) > 0,
            Err(err) => self.degrade("child count", err, false),
        }
    }

    pub fn find_all_nodes_by_file(&self, file: &Path) -> Vec<CallNode> {
        let executor = match self.db.executor() {
            Ok(executor) => executor,
            Err(err) => return self.degrade("file nodes", err, Vec::new()),
        };
        let sql = format!("SELECT {NODE_COLUMNS} FROM treenodes WHERE file = ?1");
        let file = file.to_string_lossy().into_owned();
        match executor.all(&sql, [file], |row| self.map_node(row)) {
            Ok(nodes) => nodes,
            Err(err) => self.degrade("file nodes", err, Vec::new()),
        }
    }

    /// Calls made from any node located in `file`.
    pub fn find_all_calls_from_file(&self, file: &Path) -> Vec<CallNode> {
        let executor = match self.db.executor() {
            Ok(executor) => executor,
            Err(err) => return self.degrade("outgoing calls", err, Vec::new()),
        };
        let sql = format!(
            "SELECT {NODE_COLUMNS} FROM treenodes \
             WHERE parent_id IN (SELECT id FROM treenodes WHERE file = ?1)"
        );
        let file = file.to_string_lossy().into_owned();
        match executor.all(&sql, [file], |row| self.map_node(row)) {
            Ok(nodes) => nodes,
            Err(err) => self.degrade("outgoing calls", err, Vec::new()),
        }
    }

    pub fn find_all_files(&self) -> Vec<String> {
        let executor = match self.db.executor() {
            Ok(executor) => executor,
            Err(err) => return self.degrade("files", err, Vec::new()),
        };
        match executor.all("SELECT DISTINCT file FROM treenodes", [], |row| {
            Ok(column_to_string(row, 0)?.unwrap_or_default())
        }) {
            Ok(files) => files,
            Err(err) => self.degrade("files", err, Vec::new()),
        }
    }

    pub fn find_all_lines_executed_by_file(&self, file: &Path) -> Vec<u32> {
        let executor = match self.db.executor() {
            Ok(executor) => executor,
            Err(err) => return self.degrade("executed lines", err, Vec::new()),
        };
        let file = file.to_string_lossy().into_owned();
        match executor.all(
            "SELECT DISTINCT line FROM treenodes WHERE file = ?1",
            [file],
            |row| Ok(column_to_string(row, 0)?.unwrap_or_default()),
        ) {
            Ok(lines) => lines.iter().filter_map(|l| l.trim().parse().ok()).collect(),
            Err(err) => self.degrade("executed lines", err, Vec::new()),
        }
    }

    /// Distinct (file, class) pairs in scope, excluding the redundant
    /// block-with-method rows.
    pub fn find_all_method_count_by_class(&self, predicate: &ScopePredicate) -> Vec<ClassRow> {
        let executor = match self.db.executor() {
            Ok(executor) => executor,
            Err(err) => return self.degrade("classes", err, Vec::new()),
        };
        let sql = format!(
            "SELECT file, tp_class_name AS class_name FROM treenodes \
             WHERE {} AND {BLOCK_METHOD_EXCLUSION} \
             GROUP BY class_name, file ORDER BY class_name, file",
            predicate.sql()
        );
        match executor.all(&sql, [predicate.param()], |row| {
            Ok(ClassRow {
                file: column_to_string(row, 0)?.unwrap_or_default(),
                class_name: column_to_string(row, 1)?.unwrap_or_default(),
            })
        }) {
            Ok(rows) => rows,
            Err(err) => self.degrade("classes", err, Vec::new()),
        }
    }

    /// Per-file method counts in scope.
    pub fn find_all_method_count_by_file(&self, predicate: &ScopePredicate) -> Vec<FileCountRow> {
        let executor = match self.db.executor() {
            Ok(executor) => executor,
            Err(err) => return self.degrade("file counts", err, Vec::new()),
        };
        let sql = format!(
            "SELECT file, COUNT(*) AS method_count FROM treenodes \
             WHERE {} AND {BLOCK_METHOD_EXCLUSION} \
             GROUP BY file ORDER BY file",
            predicate.sql()
        );
        match executor.all(&sql, [predicate.param()], |row| {
            Ok(FileCountRow {
                file: column_to_string(row, 0)?.unwrap_or_default(),
                method_count: row.get::<_, i64>(1)?.max(0) as usize,
            })
        }) {
            Ok(rows) => rows,
            Err(err) => self.degrade("file counts", err, Vec::new()),
        }
    }

    /// Grouped method rows for one class, scoped by `predicate`. Rows are
    /// grouped by (file, method, block, line) with the first id and the
    /// execution count; insertion order follows the minimum id.
    pub fn find_method_rows_by_class(
        &self,
        predicate: &ScopePredicate,
        class_name: &str,
    ) -> Vec<MethodRow> {
        let executor = match self.db.executor() {
            Ok(executor) => executor,
            Err(err) => return self.degrade("methods", err, Vec::new()),
        };
        let sql = format!(
            "SELECT MIN(id) AS id, file, tp_defined_class, method, block, line, \
                    COUNT(*) AS method_count \
             FROM treenodes WHERE {} AND tp_class_name = ?2 \
             GROUP BY file, method, block, line ORDER BY id ASC",
            predicate.sql()
        );
        match executor.all(&sql, (predicate.param(), class_name), |row| {
            Ok(MethodRow {
                id: column_to_string(row, 0)?.unwrap_or_default(),
                file: column_to_string(row, 1)?.unwrap_or_default(),
                defined_class: column_to_string(row, 2)?.unwrap_or_default(),
                method: column_to_string(row, 3)?.unwrap_or_default(),
                block: column_to_bool(row, 4)?,
                line: column_to_string(row, 5)?.unwrap_or_default(),
                method_count: row.get::<_, i64>(6)?.max(0) as usize,
            })
        }) {
            Ok(rows) => rows,
            Err(err) => self.degrade("methods", err, Vec::new()),
        }
    }
}
