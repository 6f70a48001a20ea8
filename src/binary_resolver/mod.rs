//! Locates helper binaries such as `ffprobe`.

use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

#[cfg(target_os = "linux")]
const WELL_KNOWN_BIN_DIRS: &[&str] = &["/usr/bin", "/bin", "/usr/local/bin", "/snap/bin"];

#[cfg(target_os = "macos")]
const WELL_KNOWN_BIN_DIRS: &[&str] = &["/usr/bin", "/bin", "/usr/local/bin", "/opt/homebrew/bin"];

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
const WELL_KNOWN_BIN_DIRS: &[&str] = &[];

/// Explicit override paths win, then well-known dirs, then `PATH`.
///
/// Overrides must be real paths; a bare command name is ignored so a setting
/// cannot redirect lookup through `PATH` to some other tool.
pub fn resolve_binary_with_overrides<I>(name: &str, overrides: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = PathBuf>,
{
    let name = name.trim();
    if name.is_empty() || Path::new(name).components().count() != 1 {
        return None;
    }

    let from_override = overrides
        .into_iter()
        .filter(|candidate| candidate.is_absolute() || candidate.components().count() > 1)
        .find_map(|candidate| executable(&candidate));
    if from_override.is_some() {
        return from_override;
    }

    WELL_KNOWN_BIN_DIRS
        .iter()
        .map(|dir| Path::new(dir).join(name))
        .find_map(|candidate| executable(&candidate))
        .or_else(|| which::which(name).ok().and_then(|found| executable(&found)))
}

fn executable(candidate: &Path) -> Option<PathBuf> {
    let canonical = candidate.canonicalize().ok()?;
    if !canonical.is_file() {
        return None;
    }

    #[cfg(unix)]
    {
        let mode = canonical.metadata().ok()?.permissions().mode();
        if mode & 0o111 == 0 {
            return None;
        }
    }

    Some(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_names_with_separators() {
        assert_eq!(resolve_binary_with_overrides("bin/ffprobe", Vec::new()), None);
        assert_eq!(resolve_binary_with_overrides("  ", Vec::new()), None);
    }

    #[test]
    fn bare_override_names_are_ignored() {
        let found = resolve_binary_with_overrides(
            "metabox-definitely-missing-tool",
            vec![PathBuf::from("sh")],
        );
        assert_eq!(found, None);
    }

    #[cfg(unix)]
    #[test]
    fn explicit_override_is_used() {
        let found = resolve_binary_with_overrides("ffprobe", vec![PathBuf::from("/bin/sh")]);
        assert!(found.is_some());
    }
}
