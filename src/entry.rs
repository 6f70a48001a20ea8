use std::fs;
use std::path::{Path, PathBuf};

mod error;

pub use error::{EntryError, EntryErrorCode, EntryResult};

/// Handle to a file or directory shown in the quick view.
///
/// Two entries are the same selection when they point at the same path with
/// the same directory flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry {
    path: PathBuf,
    name: String,
    is_directory: bool,
}

impl Entry {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(path.into(), false)
    }

    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self::new(path.into(), true)
    }

    /// Builds an entry from what is on disk. Symlinks are followed.
    pub fn from_path(path: impl AsRef<Path>) -> EntryResult<Self> {
        let path = path.as_ref();
        let meta = fs::metadata(path).map_err(|error| {
            EntryError::from_io_error(
                &format!("Failed to read metadata for {}", path.display()),
                error,
            )
        })?;
        Ok(Self::new(path.to_path_buf(), meta.is_dir()))
    }

    fn new(path: PathBuf, is_directory: bool) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path,
            name,
            is_directory,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_directory(&self) -> bool {
        self.is_directory
    }

    /// Lowercased extension without the dot, empty when there is none.
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::time::{Duration, SystemTime};

    fn uniq_path(label: &str) -> PathBuf {
        let ts = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or(Duration::from_secs(0))
            .as_nanos();
        env::temp_dir().join(format!("metabox-entry-{label}-{ts}"))
    }

    #[test]
    fn name_and_extension_come_from_path() {
        let entry = Entry::file("/photos/Holiday.JPG");
        assert_eq!(entry.name(), "Holiday.JPG");
        assert_eq!(entry.extension(), "jpg");
        assert!(!entry.is_directory());
    }

    #[test]
    fn equality_includes_directory_flag() {
        assert_eq!(Entry::file("/a/b"), Entry::file("/a/b"));
        assert_ne!(Entry::file("/a/b"), Entry::directory("/a/b"));
    }

    #[test]
    fn from_path_detects_directories() {
        let dir = uniq_path("dir");
        fs::create_dir_all(&dir).unwrap();
        let entry = Entry::from_path(&dir).unwrap();
        assert!(entry.is_directory());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn from_path_reports_missing_entries() {
        let err = Entry::from_path(uniq_path("missing")).unwrap_err();
        assert_eq!(err.code(), EntryErrorCode::NotFound);
    }
}
