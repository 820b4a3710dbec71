//! Source path resolution
//!
//! Maps a relative image reference onto the configured source root and
//! recognizes the placeholder token.

use crate::{Error, Result};
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone)]
pub struct PathResolver {
    source_root: PathBuf,
    placeholder: String,
}

impl PathResolver {
    pub fn new(source_root: impl Into<PathBuf>, placeholder: impl Into<String>) -> Self {
        Self {
            source_root: source_root.into(),
            placeholder: placeholder.into(),
        }
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn is_placeholder(&self, reference: &str) -> bool {
        reference == self.placeholder
    }

    /// Resolve `reference` to an existing file under the source root.
    ///
    /// The placeholder token resolves to itself without an existence check.
    /// References that would climb out of the source root (`..`, absolute
    /// paths) are rejected before touching the filesystem.
    pub fn resolve(&self, reference: &str) -> Result<PathBuf> {
        if self.is_placeholder(reference) {
            return Ok(PathBuf::from(&self.placeholder));
        }

        let relative = reference.trim_start_matches('/');
        if relative.is_empty() {
            return Err(Error::SourceNotFound(reference.to_string()));
        }
        if !Path::new(relative)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(Error::PathTraversal(reference.to_string()));
        }

        let full_path = self.source_root.join(relative);
        if full_path.is_file() {
            Ok(full_path)
        } else {
            Err(Error::SourceNotFound(reference.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathResolver) {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("albums")).unwrap();
        std::fs::write(dir.path().join("albums/cat.png"), b"png").unwrap();
        let resolver = PathResolver::new(dir.path(), "/static/no-image.png");
        (dir, resolver)
    }

    #[test]
    fn test_resolve_existing_file() {
        let (dir, resolver) = setup();
        let path = resolver.resolve("albums/cat.png").unwrap();
        assert_eq!(path, dir.path().join("albums/cat.png"));
    }

    #[test]
    fn test_resolve_leading_slash_stays_under_root() {
        let (dir, resolver) = setup();
        let path = resolver.resolve("/albums/cat.png").unwrap();
        assert_eq!(path, dir.path().join("albums/cat.png"));
    }

    #[test]
    fn test_resolve_missing_file() {
        let (_dir, resolver) = setup();
        let err = resolver.resolve("albums/dog.png").unwrap_err();
        assert!(matches!(err, Error::SourceNotFound(_)));
    }

    #[test]
    fn test_resolve_directory_is_not_a_source() {
        let (_dir, resolver) = setup();
        assert!(matches!(
            resolver.resolve("albums").unwrap_err(),
            Error::SourceNotFound(_)
        ));
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let (_dir, resolver) = setup();
        assert!(matches!(
            resolver.resolve("../etc/passwd").unwrap_err(),
            Error::PathTraversal(_)
        ));
        assert!(matches!(
            resolver.resolve("albums/../../secret.png").unwrap_err(),
            Error::PathTraversal(_)
        ));
    }

    #[test]
    fn test_resolve_placeholder_without_existence_check() {
        let (_dir, resolver) = setup();
        let path = resolver.resolve("/static/no-image.png").unwrap();
        assert_eq!(path, PathBuf::from("/static/no-image.png"));
        assert!(resolver.is_placeholder("/static/no-image.png"));
    }
}
