//! Lookup of the installed resource directory (fonts, default settings,
//! palettes).
//!
//! Search order:
//!
//! 1. `$CECOG_RESOURCES`
//! 2. `<exe dir>/resources`
//! 3. `<exe dir>/../share/cecog/resources` (Unix-style prefix install)
//! 4. `<exe dir>/../Resources` (macOS application bundle)

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable overriding the resource directory
pub const RESOURCE_ENV: &str = "CECOG_RESOURCES";

/// Errors that can occur while locating resources
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// No candidate directory exists
    #[error("Resource directory not found (searched: {})", format_paths(.0))]
    DirectoryNotFound(Vec<PathBuf>),

    /// The directory exists but the requested file does not
    #[error("Resource not found: {}", .0.display())]
    NotFound(PathBuf),
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolves resource files relative to the installation
#[derive(Debug, Clone, Default)]
pub struct ResourceLocator {
    candidates: Vec<PathBuf>,
}

impl ResourceLocator {
    /// Locator using the environment and the running executable
    pub fn from_env() -> Self {
        let override_dir = env::var_os(RESOURCE_ENV).map(PathBuf::from);
        let exe_dir = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        Self::with_roots(override_dir, exe_dir.as_deref())
    }

    /// Locator for an explicit override and executable directory
    pub fn with_roots(override_dir: Option<PathBuf>, exe_dir: Option<&Path>) -> Self {
        let mut candidates = Vec::new();
        if let Some(dir) = override_dir {
            candidates.push(dir);
        }
        if let Some(exe_dir) = exe_dir {
            candidates.push(exe_dir.join("resources"));
            candidates.push(exe_dir.join("..").join("share").join("cecog").join("resources"));
            candidates.push(exe_dir.join("..").join("Resources"));
        }
        Self { candidates }
    }

    /// Directories searched, in order
    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// First existing candidate directory
    pub fn resource_dir(&self) -> Result<PathBuf, ResourceError> {
        self.candidates
            .iter()
            .find(|dir| dir.is_dir())
            .cloned()
            .ok_or_else(|| ResourceError::DirectoryNotFound(self.candidates.clone()))
    }

    /// Path of a file inside the resource directory; the file must exist
    pub fn resource_path(&self, name: impl AsRef<Path>) -> Result<PathBuf, ResourceError> {
        let path = self.resource_dir()?.join(name);
        if path.exists() {
            Ok(path)
        } else {
            Err(ResourceError::NotFound(path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins() {
        let override_dir = tempfile::tempdir().unwrap();
        let exe_dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(exe_dir.path().join("resources")).unwrap();

        let locator = ResourceLocator::with_roots(
            Some(override_dir.path().to_path_buf()),
            Some(exe_dir.path()),
        );
        assert_eq!(locator.resource_dir().unwrap(), override_dir.path());
    }

    #[test]
    fn test_falls_back_to_exe_dir() {
        let exe_dir = tempfile::tempdir().unwrap();
        let resources = exe_dir.path().join("resources");
        std::fs::create_dir(&resources).unwrap();
        std::fs::write(resources.join("palette.txt"), "").unwrap();

        let locator = ResourceLocator::with_roots(Some("/nonexistent/res".into()), Some(exe_dir.path()));
        assert_eq!(locator.resource_dir().unwrap(), resources);
        assert_eq!(
            locator.resource_path("palette.txt").unwrap(),
            resources.join("palette.txt")
        );
        assert!(matches!(
            locator.resource_path("font.ttf"),
            Err(ResourceError::NotFound(_))
        ));
    }

    #[test]
    fn test_nothing_found() {
        let locator = ResourceLocator::with_roots(None, Some(Path::new("/nonexistent/bin")));
        assert_eq!(locator.candidates().len(), 3);
        assert!(matches!(
            locator.resource_dir(),
            Err(ResourceError::DirectoryNotFound(paths)) if paths.len() == 3
        ));
    }
}
