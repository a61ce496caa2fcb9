//! Source walker
//!
//! Enumerates test sources beneath the scan root in lexical order.

use std::path::{Path, PathBuf};
use tcsync_common::{Error, Result};
use tracing::{debug, trace};
use walkdir::WalkDir;

/// A test source discovered beneath the scan root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path on disk
    pub path: PathBuf,

    /// Path relative to the scan root with `/` separators, used as `testFile`
    pub relative: String,
}

/// Collect every file under `root` whose name ends with one of `suffixes`
///
/// Directories are entered unconditionally and siblings are visited in file
/// name order, so the result is stable across platforms. Symlinks are not
/// followed.
pub fn collect_sources(root: &Path, suffixes: &[String]) -> Result<Vec<SourceFile>> {
    if !root.is_dir() {
        return Err(Error::InvalidScanRoot(root.to_path_buf()));
    }

    let mut sources = Vec::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| match e.into_io_error() {
            Some(io) => Error::Io(io),
            None => Error::InvalidScanRoot(root.to_path_buf()),
        })?;

        if entry.file_type().is_dir() {
            trace!("Entering directory: {}", entry.path().display());
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if !suffixes.iter().any(|ext| name.ends_with(ext.as_str())) {
            trace!("Skipped (not a test file): {}", entry.path().display());
            continue;
        }

        let relative = relative_posix(root, entry.path());
        debug!("Test file matched: {}", relative);
        sources.push(SourceFile {
            path: entry.into_path(),
            relative,
        });
    }

    Ok(sources)
}

fn relative_posix(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn suffixes() -> Vec<String> {
        vec![".spec.ts".to_string(), ".test.js".to_string()]
    }

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_collects_nested_sources_in_lexical_order() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "workspace/notes/b.spec.ts");
        touch(dir.path(), "workspace/a.spec.ts");
        touch(dir.path(), "Admin/login.spec.ts");
        touch(dir.path(), "cart.test.js");

        let sources = collect_sources(dir.path(), &suffixes()).unwrap();
        let relative: Vec<&str> = sources.iter().map(|s| s.relative.as_str()).collect();

        assert_eq!(
            relative,
            vec![
                "Admin/login.spec.ts",
                "cart.test.js",
                "workspace/a.spec.ts",
                "workspace/notes/b.spec.ts",
            ]
        );
    }

    #[test]
    fn test_skips_non_matching_files() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "pages/LoginPage.ts");
        touch(dir.path(), "data/test-data.ts");
        touch(dir.path(), "login.spec.ts");

        let sources = collect_sources(dir.path(), &suffixes()).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].relative, "login.spec.ts");
        assert!(sources[0].path.ends_with("login.spec.ts"));
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = collect_sources(&dir.path().join("nope"), &suffixes()).unwrap_err();
        assert!(matches!(err, Error::InvalidScanRoot(_)));
    }
}
