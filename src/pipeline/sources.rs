// src/pipeline/sources.rs

//! Expansion of a task's `src` globs into concrete input files.
//!
//! Every include pattern has a *base*: its leading components up to the first
//! one containing a glob meta character. Output paths are computed relative
//! to that base, so `src/img/**/*.png` turns `src/img/icons/a.png` into
//! `icons/a.png` under the task's `dest`. A pattern without meta characters
//! names one file, whose base is its parent directory.

use std::collections::HashSet;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use tracing::{trace, warn};
use walkdir::WalkDir;

use crate::errors::{AssetdagError, Result};
use crate::watch::path_utils::{relative_str, to_slash};

/// One input file selected by a task's globs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute (root-joined) path of the input.
    pub path: PathBuf,
    /// Path relative to the base of the glob that matched it.
    pub relative: PathBuf,
}

struct Include {
    pattern: String,
    base: PathBuf,
    /// `None` for literal file patterns.
    matcher: Option<GlobMatcher>,
}

/// Compiled `src` list: includes plus `!`-prefixed excludes.
pub struct SourceSet {
    includes: Vec<Include>,
    exclude: GlobSet,
}

impl fmt::Debug for SourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceSet")
            .field(
                "includes",
                &self.includes.iter().map(|i| &i.pattern).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

fn has_meta(component: &str) -> bool {
    component.contains(['*', '?', '[', '{'])
}

/// Leading non-glob components of `pattern`.
pub fn glob_base(pattern: &str) -> PathBuf {
    let mut base = PathBuf::new();
    for component in pattern.split('/') {
        if has_meta(component) {
            return base;
        }
        if component.is_empty() && base.as_os_str().is_empty() {
            // Leading `/` of an absolute pattern.
            base.push("/");
            continue;
        }
        base.push(component);
    }
    // Literal pattern: the base is the directory holding the file.
    base.parent().map(Path::to_path_buf).unwrap_or_default()
}

pub fn is_literal(pattern: &str) -> bool {
    !pattern.split('/').any(has_meta)
}

/// Compile a single glob; `*` never crosses a `/`.
pub fn compile_glob(pattern: &str) -> Result<GlobMatcher> {
    Ok(build_glob(pattern)?.compile_matcher())
}

fn build_glob(pattern: &str) -> Result<globset::Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| AssetdagError::ConfigError(format!("invalid glob pattern `{pattern}`: {e}")))
}

/// Build a `GlobSet` from patterns.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(build_glob(pattern)?);
    }
    builder
        .build()
        .map_err(|e| AssetdagError::ConfigError(format!("building glob set: {e}")))
}

impl SourceSet {
    pub fn compile(patterns: &[String]) -> Result<Self> {
        let mut includes = Vec::new();
        let mut excludes = Vec::new();

        for pattern in patterns {
            if let Some(negated) = pattern.strip_prefix('!') {
                excludes.push(negated.to_string());
                continue;
            }
            let matcher = if is_literal(pattern) {
                None
            } else {
                Some(compile_glob(pattern)?)
            };
            includes.push(Include {
                pattern: pattern.clone(),
                base: glob_base(pattern),
                matcher,
            });
        }

        Ok(Self {
            includes,
            exclude: build_globset(&excludes)?,
        })
    }

    /// Files matched under `root`, in include order then path order, each
    /// file at most once.
    ///
    /// A literal pattern naming a missing file is an error; a glob whose base
    /// directory does not exist matches nothing.
    pub fn expand(&self, root: &Path) -> Result<Vec<SourceFile>> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();

        for include in &self.includes {
            let base_dir = root.join(&include.base);

            let Some(matcher) = &include.matcher else {
                let path = root.join(&include.pattern);
                if !path.is_file() {
                    return Err(AssetdagError::PathIo {
                        path,
                        source: io::Error::new(io::ErrorKind::NotFound, "source file not found"),
                    });
                }
                if !self.excluded(root, &path) && seen.insert(path.clone()) {
                    let relative = PathBuf::from(path.file_name().unwrap_or_default());
                    files.push(SourceFile { path, relative });
                }
                continue;
            };

            if !base_dir.is_dir() {
                warn!(pattern = %include.pattern, base = ?base_dir, "glob base does not exist; no files matched");
                continue;
            }

            for entry in WalkDir::new(&base_dir).sort_by_file_name() {
                let entry = entry.map_err(|e| {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| base_dir.clone());
                    AssetdagError::PathIo {
                        path,
                        source: e.into(),
                    }
                })?;
                if !entry.file_type().is_file() {
                    continue;
                }

                let path = entry.path().to_path_buf();
                let candidate = match_key(root, &include.pattern, &path);
                if !matcher.is_match(&candidate) || self.excluded(root, &path) {
                    continue;
                }
                if !seen.insert(path.clone()) {
                    continue;
                }

                let relative = path
                    .strip_prefix(&base_dir)
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|_| PathBuf::from(path.file_name().unwrap_or_default()));
                trace!(file = ?path, ?relative, "source matched");
                files.push(SourceFile { path, relative });
            }
        }

        Ok(files)
    }

    fn excluded(&self, root: &Path, path: &Path) -> bool {
        if self.exclude.is_empty() {
            return false;
        }
        let rel = relative_str(root, path).unwrap_or_else(|| to_slash(path));
        self.exclude.is_match(&rel) || self.exclude.is_match(to_slash(path))
    }
}

/// The string a pattern is matched against: root-relative for relative
/// patterns, the full path for absolute ones.
fn match_key(root: &Path, pattern: &str, path: &Path) -> String {
    if Path::new(pattern).is_absolute() {
        return to_slash(path);
    }
    relative_str(root, path).unwrap_or_else(|| to_slash(path))
}
