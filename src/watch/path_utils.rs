// src/watch/path_utils.rs

//! Path normalisation shared by the watcher and source expansion.

use std::path::Path;

/// Join path components with `/`, whatever the platform separator.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// `path` relative to `root`, with forward slashes.
///
/// Falls back to comparing canonicalized paths when the plain prefix check
/// fails (symlinked temp dirs on macOS report `/private/var/...`).
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_slash(rel));
    }

    let root_canon = root.canonicalize().ok()?;
    if let Ok(rel) = path.strip_prefix(&root_canon) {
        return Some(to_slash(rel));
    }

    // Removed files cannot be canonicalized; try their parent instead.
    let parent = path.parent()?.canonicalize().ok()?;
    let rel_parent = parent.strip_prefix(&root_canon).ok()?;
    Some(to_slash(&rel_parent.join(path.file_name()?)))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn strips_root_and_normalises_separators() {
        let root = PathBuf::from("/project");
        let path = PathBuf::from("/project/src/js/app.js");
        assert_eq!(relative_str(&root, &path).as_deref(), Some("src/js/app.js"));
    }

    #[test]
    fn unrelated_paths_are_rejected() {
        let root = PathBuf::from("/definitely/not/here");
        assert_eq!(relative_str(&root, Path::new("/elsewhere/file.txt")), None);
    }

    #[test]
    fn removed_file_under_canonical_root() {
        let dir = tempfile::tempdir().unwrap();
        let canon = dir.path().canonicalize().unwrap();
        let gone = canon.join("deleted.css");
        assert_eq!(relative_str(dir.path(), &gone).as_deref(), Some("deleted.css"));
    }
}
