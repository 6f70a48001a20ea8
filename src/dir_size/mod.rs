//! Aggregate directory sizes for the metadata box.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

use tracing::debug;

use crate::entry::Entry;
use crate::metadata::FetchFuture;

mod error;

pub use error::{DirSizeError, DirSizeErrorCode, DirSizeResult};

const PSEUDO_ROOTS: &[&str] = &["/proc", "/sys", "/dev", "/run"];

pub trait DirectorySizeProvider: Send + Sync {
    /// Total bytes below `entry`, or an error when the directory itself
    /// cannot be read.
    fn directory_size(&self, entry: Arc<Entry>) -> FetchFuture<DirSizeResult<u64>>;
}

/// Walks the tree on the blocking pool without crossing filesystems.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalDirectorySize;

impl DirectorySizeProvider for LocalDirectorySize {
    fn directory_size(&self, entry: Arc<Entry>) -> FetchFuture<DirSizeResult<u64>> {
        Box::pin(async move {
            tokio::task::spawn_blocking(move || measure(entry.path()))
                .await
                .map_err(|error| {
                    DirSizeError::new(
                        DirSizeErrorCode::TaskFailed,
                        format!("Directory size task failed: {error}"),
                    )
                })?
        })
    }
}

pub fn measure(root: &Path) -> DirSizeResult<u64> {
    let root_meta = fs::metadata(root).map_err(|error| {
        DirSizeError::from_io_error(&format!("Failed to read {}", root.display()), error)
    })?;
    if !root_meta.is_dir() {
        return Err(DirSizeError::new(
            DirSizeErrorCode::NotADirectory,
            format!("{} is not a directory", root.display()),
        ));
    }
    fs::read_dir(root).map_err(|error| {
        DirSizeError::from_io_error(&format!("Failed to list {}", root.display()), error)
    })?;

    #[cfg(unix)]
    let root_dev = Some(root_meta.dev());
    #[cfg(not(unix))]
    let root_dev: Option<u64> = None;

    let pseudo_roots: HashSet<&str> = PSEUDO_ROOTS.iter().copied().collect();
    let (total, items) = dir_size_recursive(root, root_dev, &pseudo_roots);
    debug!(root = %root.display(), total, items, "directory measured");
    Ok(total)
}

fn should_skip(path: &Path, root: &Path, pseudo_roots: &HashSet<&str>) -> bool {
    // Asking for /proc itself is allowed; wandering into it from / is not.
    if path == root {
        return false;
    }
    pseudo_roots.iter().any(|pseudo| path.starts_with(pseudo))
}

fn dir_size_recursive(
    root: &Path,
    #[cfg_attr(not(unix), allow(unused_variables))] root_dev: Option<u64>,
    pseudo_roots: &HashSet<&str>,
) -> (u64, u64) {
    let mut total: u64 = 0;
    let mut items: u64 = 0;
    let mut stack = vec![root.to_path_buf()];

    while let Some(path) = stack.pop() {
        if should_skip(&path, root, pseudo_roots) {
            continue;
        }
        // The root itself may be a link to a directory; links below it are
        // counted, not followed.
        let meta = if path == root {
            fs::metadata(&path)
        } else {
            fs::symlink_metadata(&path)
        };
        let meta = match meta {
            Ok(m) => m,
            Err(_) => continue,
        };

        #[cfg(unix)]
        if let Some(dev) = root_dev {
            if meta.dev() != dev {
                continue;
            }
        }

        if path != root {
            items = items.saturating_add(1);
        }

        if meta.is_dir() {
            if let Ok(iter) = fs::read_dir(&path) {
                stack.extend(iter.flatten().map(|entry| entry.path()));
            }
            continue;
        }
        // Files and symlinks count their own length; links are not followed.
        total = total.saturating_add(meta.len());
    }

    (total, items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::path::PathBuf;
    use std::time::{Duration, SystemTime};

    fn uniq_dir(label: &str) -> PathBuf {
        let ts = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or(Duration::from_secs(0))
            .as_nanos();
        env::temp_dir().join(format!("metabox-dirsize-{label}-{ts}"))
    }

    #[test]
    fn sums_nested_files() {
        let root = uniq_dir("nested");
        fs::create_dir_all(root.join("a").join("b")).unwrap();
        fs::write(root.join("top.bin"), vec![0u8; 1000]).unwrap();
        fs::write(root.join("a").join("mid.bin"), vec![0u8; 2000]).unwrap();
        fs::write(root.join("a").join("b").join("deep.bin"), vec![0u8; 1096]).unwrap();

        assert_eq!(measure(&root).unwrap(), 4096);

        let _ = fs::remove_dir_all(&root);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_root_is_followed() {
        let base = uniq_dir("linked");
        let real = base.join("real");
        fs::create_dir_all(&real).unwrap();
        fs::write(real.join("data.bin"), vec![0u8; 4096]).unwrap();
        let link = base.join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        assert!(Entry::from_path(&link).unwrap().is_directory());
        assert_eq!(measure(&link).unwrap(), 4096);

        let _ = fs::remove_dir_all(&base);
    }

    #[cfg(unix)]
    #[test]
    fn nested_links_are_not_followed() {
        let base = uniq_dir("nested-link");
        let outside = base.join("outside");
        let root = base.join("root");
        fs::create_dir_all(&outside).unwrap();
        fs::create_dir_all(&root).unwrap();
        fs::write(outside.join("big.bin"), vec![0u8; 8192]).unwrap();
        let link = root.join("shortcut");
        std::os::unix::fs::symlink(&outside, &link).unwrap();

        let link_len = fs::symlink_metadata(&link).unwrap().len();
        assert_eq!(measure(&root).unwrap(), link_len);

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn empty_directory_is_zero() {
        let root = uniq_dir("empty");
        fs::create_dir_all(&root).unwrap();
        assert_eq!(measure(&root).unwrap(), 0);
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let err = measure(&uniq_dir("missing")).unwrap_err();
        assert_eq!(err.code(), DirSizeErrorCode::NotFound);
    }

    #[test]
    fn files_are_rejected() {
        let root = uniq_dir("file");
        fs::create_dir_all(&root).unwrap();
        let file = root.join("plain.txt");
        fs::write(&file, b"hi").unwrap();
        let err = measure(&file).unwrap_err();
        assert_eq!(err.code(), DirSizeErrorCode::NotADirectory);
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn pseudo_roots_are_skipped_below_root() {
        let pseudo: HashSet<&str> = PSEUDO_ROOTS.iter().copied().collect();
        assert!(should_skip(Path::new("/proc/1"), Path::new("/"), &pseudo));
        assert!(!should_skip(Path::new("/proc"), Path::new("/proc"), &pseudo));
        assert!(!should_skip(Path::new("/home/u"), Path::new("/"), &pseudo));
    }

    #[tokio::test]
    async fn provider_runs_off_thread() {
        let root = uniq_dir("provider");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("f"), vec![1u8; 10]).unwrap();
        let size = LocalDirectorySize
            .directory_size(Arc::new(Entry::directory(&root)))
            .await
            .unwrap();
        assert_eq!(size, 10);
        let _ = fs::remove_dir_all(&root);
    }
}
