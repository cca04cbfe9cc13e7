//! Registered source roots
//!
//! The tracing agent records every project/library root it instrumented in
//! the `node_sources` table. File paths are classified against these roots by
//! longest-prefix match; anything outside every root is `"other"`. The whole
//! registry is replaced when a new trace database is loaded.

use std::path::Path;

use parking_lot::RwLock;

use crate::error::{Result, TraceScopeError};
use crate::store::executor::SqliteExecutor;

/// Classification for files matching no registered root
pub const UNKNOWN_SOURCE: &str = "other";

/// One registered project or library root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRoot {
    pub id: String,
    pub name: String,
    pub root_path: String,
}

/// Name-keyed registry of source roots, loaded once per trace database
#[derive(Default)]
pub struct SourceRoots {
    roots: RwLock<Vec<SourceRoot>>,
}

impl SourceRoots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the registry with the `node_sources` rows of `executor`.
    pub fn load(&self, executor: &SqliteExecutor) -> Result<()> {
        let rows = executor.all(
            "SELECT id, name, root_path FROM node_sources ORDER BY id",
            [],
            |row| {
                Ok(SourceRoot {
                    id: super::column_to_string(row, 0)?.unwrap_or_default(),
                    name: super::column_to_string(row, 1)?.unwrap_or_default(),
                    root_path: super::column_to_string(row, 2)?.unwrap_or_default(),
                })
            },
        )?;
        tracing::debug!(count = rows.len(), "loaded source roots");
        *self.roots.write() = rows;
        Ok(())
    }

    pub fn clear(&self) {
        self.roots.write().clear();
    }

    pub fn all(&self) -> Vec<SourceRoot> {
        self.roots.read().clone()
    }

    /// Root registered under `name`.
    pub fn get(&self, name: &str) -> Result<SourceRoot> {
        self.roots
            .read()
            .iter()
            .find(|root| root.name == name)
            .cloned()
            .ok_or_else(|| TraceScopeError::SourceRootNotFound {
                name: name.to_string(),
            })
    }

    /// Root owning `path`, by longest-prefix match over root paths.
    pub fn find_by_path(&self, path: &Path) -> Option<SourceRoot> {
        let path = path.to_string_lossy();
        self.roots
            .read()
            .iter()
            .filter(|root| path.starts_with(&root.root_path))
            .max_by_key(|root| root.root_path.len())
            .cloned()
    }

    /// Source name for `path`, falling back to [`UNKNOWN_SOURCE`].
    pub fn classify(&self, path: &Path) -> String {
        self.find_by_path(path)
            .map(|root| root.name)
            .unwrap_or_else(|| UNKNOWN_SOURCE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn registry(entries: &[(&str, &str)]) -> SourceRoots {
        let roots = SourceRoots::new();
        *roots.roots.write() = entries
            .iter()
            .enumerate()
            .map(|(i, (name, path))| SourceRoot {
                id: i.to_string(),
                name: name.to_string(),
                root_path: path.to_string(),
            })
            .collect();
        roots
    }

    #[test]
    fn test_classify_by_prefix() {
        let roots = registry(&[("app", "/work/app"), ("gems", "/usr/gems")]);
        assert_eq!(roots.classify(Path::new("/work/app/models/user.rb")), "app");
        assert_eq!(roots.classify(Path::new("/usr/gems/rails/base.rb")), "gems");
    }

    #[test]
    fn test_classify_prefers_longest_prefix() {
        let roots = registry(&[("app", "/work/app"), ("engine", "/work/app/engines/billing")]);
        assert_eq!(
            roots.classify(Path::new("/work/app/engines/billing/charge.rb")),
            "engine"
        );
        assert_eq!(roots.classify(Path::new("/work/app/models/user.rb")), "app");
    }

    #[test]
    fn test_classify_unmatched_is_other() {
        let roots = registry(&[("app", "/work/app")]);
        assert_eq!(roots.classify(Path::new("/elsewhere/foo.rb")), UNKNOWN_SOURCE);
    }

    #[test]
    fn test_get_by_name() {
        let roots = registry(&[("app", "/work/app")]);
        assert_eq!(roots.get("app").unwrap().root_path, "/work/app");
        assert!(matches!(
            roots.get("missing"),
            Err(TraceScopeError::SourceRootNotFound { .. })
        ));
    }

    #[test]
    fn test_clear_replaces_wholesale() {
        let roots = registry(&[("app", "/work/app")]);
        roots.clear();
        assert_eq!(roots.classify(&PathBuf::from("/work/app/x.rb")), UNKNOWN_SOURCE);
    }
}
