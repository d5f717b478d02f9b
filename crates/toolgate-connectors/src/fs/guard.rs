//! Path confinement for the filesystem adapter.
//!
//! Every path argument is resolved and canonicalized, then checked to be a
//! descendant of the allowed base. The check runs before any filesystem
//! operation on the target; textual rejections (absolute paths, `..`)
//! short-circuit without touching the filesystem at all.

use crate::error::{ConnectorError, ConnectorResult};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::warn;

/// Log target for confinement violations, kept distinct from ordinary
/// failures so they can be audited separately.
pub const VIOLATION_TARGET: &str = "toolgate::fs::denied";

#[derive(Debug)]
pub struct PathGuard {
    base: PathBuf,
}

impl PathGuard {
    /// The base itself must exist and canonicalize at startup.
    pub fn new(base: impl AsRef<Path>) -> ConnectorResult<Self> {
        let base = fs::canonicalize(base.as_ref()).map_err(|e| {
            ConnectorError::InvalidConfig(format!(
                "allowed base path '{}' is not usable: {e}",
                base.as_ref().display()
            ))
        })?;
        Ok(Self { base })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn deny(&self, path: &str, reason: &str) -> ConnectorError {
        warn!(target: VIOLATION_TARGET, path, reason, "rejected path outside allowed base");
        ConnectorError::PathNotAllowed(path.to_string())
    }

    fn screen(&self, path: &str) -> ConnectorResult<PathBuf> {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            return Err(self.deny(path, "absolute path"));
        }
        if candidate.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(self.deny(path, "parent-directory traversal"));
        }
        Ok(self.base.join(candidate))
    }

    /// Resolve a path that must already exist inside the base.
    ///
    /// Canonicalization resolves symlinks, so a link pointing outside the
    /// base is caught here as well.
    pub fn resolve_existing(&self, path: &str) -> ConnectorResult<PathBuf> {
        let joined = self.screen(path)?;
        let canonical = fs::canonicalize(&joined).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConnectorError::ExecutionFailed(format!("path not found: {path}"))
            } else {
                ConnectorError::Io(e)
            }
        })?;
        if !canonical.starts_with(&self.base) {
            return Err(self.deny(path, "resolves outside allowed base"));
        }
        Ok(canonical)
    }

    /// Resolve a destination that may not exist yet (writes).
    ///
    /// The nearest existing ancestor is canonicalized and must stay inside
    /// the base, so symlinked directories cannot smuggle a write out.
    pub fn resolve_for_write(&self, path: &str) -> ConnectorResult<PathBuf> {
        let joined = self.screen(path)?;

        let mut ancestor = joined.as_path();
        while let Some(parent) = ancestor.parent() {
            if parent.exists() {
                let canonical_parent = fs::canonicalize(parent).map_err(ConnectorError::Io)?;
                if !canonical_parent.starts_with(&self.base) {
                    return Err(self.deny(path, "parent resolves outside allowed base"));
                }
                break;
            }
            ancestor = parent;
        }

        if joined.exists() {
            let canonical = fs::canonicalize(&joined).map_err(ConnectorError::Io)?;
            if !canonical.starts_with(&self.base) {
                return Err(self.deny(path, "resolves outside allowed base"));
            }
            return Ok(canonical);
        }

        Ok(joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn guard() -> (TempDir, PathGuard) {
        let dir = TempDir::new().unwrap();
        let guard = PathGuard::new(dir.path()).unwrap();
        (dir, guard)
    }

    #[test]
    fn traversal_is_rejected_before_any_lookup() {
        let (_dir, guard) = guard();
        let err = guard.resolve_existing("../../etc/passwd").unwrap_err();
        assert!(matches!(err, ConnectorError::PathNotAllowed(_)));

        let err = guard.resolve_for_write("../escape.txt").unwrap_err();
        assert!(matches!(err, ConnectorError::PathNotAllowed(_)));
    }

    #[test]
    fn absolute_paths_are_rejected() {
        let (_dir, guard) = guard();
        let err = guard.resolve_existing("/etc/passwd").unwrap_err();
        assert!(matches!(err, ConnectorError::PathNotAllowed(_)));
    }

    #[test]
    fn paths_inside_the_base_resolve() {
        let (dir, guard) = guard();
        std::fs::write(dir.path().join("a.txt"), "hi").unwrap();
        let resolved = guard.resolve_existing("a.txt").unwrap();
        assert!(resolved.starts_with(guard.base()));

        let dest = guard.resolve_for_write("sub/new.txt").unwrap();
        assert!(dest.starts_with(guard.base()));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_escape_is_rejected() {
        let (dir, guard) = guard();
        let outside = TempDir::new().unwrap();
        std::fs::write(outside.path().join("secret.txt"), "s").unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();

        let err = guard.resolve_existing("link/secret.txt").unwrap_err();
        assert!(matches!(err, ConnectorError::PathNotAllowed(_)));

        let err = guard.resolve_for_write("link/new.txt").unwrap_err();
        assert!(matches!(err, ConnectorError::PathNotAllowed(_)));
    }

    #[test]
    fn missing_base_fails_construction() {
        let err = PathGuard::new("/definitely/not/here").unwrap_err();
        assert!(matches!(err, ConnectorError::InvalidConfig(_)));
    }
}
