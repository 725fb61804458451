// src/pipeline/incremental.rs

use std::fs;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use tracing::trace;

use crate::pipeline::sources::SourceFile;

/// Skips inputs whose output counterpart is at least as new as the input.
///
/// The output is `dest / relative`, with the extension replaced by
/// `incremental_ext` when the task renames its outputs (e.g. `.scss` that
/// ends up as `.css`). Ties count as up to date. Any metadata error means
/// "process it".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncrementalFilter {
    dest: PathBuf,
    ext: Option<String>,
}

impl IncrementalFilter {
    pub fn new(dest: impl Into<PathBuf>, ext: Option<&str>) -> Self {
        Self {
            dest: dest.into(),
            ext: ext.map(|e| e.trim_start_matches('.').to_string()),
        }
    }

    /// Where the output for `source` is expected to live.
    pub fn output_for(&self, source: &SourceFile) -> PathBuf {
        let mut out = self.dest.join(&source.relative);
        if let Some(ext) = &self.ext {
            out.set_extension(ext);
        }
        out
    }

    pub fn is_up_to_date(&self, source: &SourceFile) -> bool {
        let output = self.output_for(source);
        let fresh = match (mtime(&source.path), mtime(&output)) {
            (Some(input), Some(out)) => out >= input,
            _ => false,
        };
        trace!(input = ?source.path, ?output, fresh, "incremental check");
        fresh
    }
}

fn mtime(path: &Path) -> Option<FileTime> {
    let meta = fs::metadata(path).ok()?;
    Some(FileTime::from_last_modification_time(&meta))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, SourceFile) {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("src/a.png");
        fs::create_dir_all(input.parent().unwrap()).unwrap();
        fs::write(&input, b"in").unwrap();
        fs::create_dir_all(dir.path().join("build")).unwrap();
        let source = SourceFile {
            path: input,
            relative: PathBuf::from("a.png"),
        };
        (dir, source)
    }

    #[test]
    fn missing_output_is_processed() {
        let (dir, source) = setup();
        let filter = IncrementalFilter::new(dir.path().join("build"), None);
        assert!(!filter.is_up_to_date(&source));
    }

    #[test]
    fn newer_and_equal_outputs_are_skipped_older_are_not() {
        let (dir, source) = setup();
        let filter = IncrementalFilter::new(dir.path().join("build"), None);
        let output = filter.output_for(&source);
        fs::write(&output, b"out").unwrap();

        filetime::set_file_mtime(&source.path, FileTime::from_unix_time(1_000, 0)).unwrap();

        filetime::set_file_mtime(&output, FileTime::from_unix_time(2_000, 0)).unwrap();
        assert!(filter.is_up_to_date(&source));

        filetime::set_file_mtime(&output, FileTime::from_unix_time(1_000, 0)).unwrap();
        assert!(filter.is_up_to_date(&source));

        filetime::set_file_mtime(&output, FileTime::from_unix_time(500, 0)).unwrap();
        assert!(!filter.is_up_to_date(&source));
    }

    #[test]
    fn extension_substitution() {
        let (dir, source) = setup();
        let filter = IncrementalFilter::new(dir.path().join("build"), Some(".webp"));
        assert_eq!(filter.output_for(&source), dir.path().join("build/a.webp"));
    }
}
