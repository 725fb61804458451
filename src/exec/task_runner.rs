// src/exec/task_runner.rs

//! Running one task (or the built-in `clean`) to completion.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinError;
use tracing::{debug, error, info};

use crate::context::BuildContext;
use crate::dag::CLEAN_TASK;
use crate::engine::TaskOutcome;
use crate::errors::{AssetdagError, Result};
use crate::pipeline::{Asset, SourceFile, Task};

/// Per-task file counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskReport {
    pub matched: usize,
    /// Left alone by the incremental filter.
    pub skipped: usize,
    /// Output files written (a `write` snapshot counts separately).
    pub written: usize,
    pub failed: usize,
}

fn join_error(err: JoinError) -> AssetdagError {
    AssetdagError::Other(anyhow::Error::new(err).context("blocking task did not complete"))
}

/// Execute the task behind a dispatched plan step.
///
/// Every problem is logged here and folded into a [`TaskOutcome`]; nothing
/// escapes to stop sibling steps.
pub async fn run_step(ctx: &BuildContext, task_name: &str) -> TaskOutcome {
    if task_name == CLEAN_TASK {
        return match clean_build_dir(ctx.root(), ctx.build_dir()).await {
            Ok(()) => TaskOutcome::Success,
            Err(err) => {
                error!(task = CLEAN_TASK, error = %err, "clean failed");
                TaskOutcome::Failed(err.to_string())
            }
        };
    }

    let Some(task) = ctx.tasks.get(task_name) else {
        error!(task = %task_name, "dispatched step names an unknown task");
        return TaskOutcome::Failed(AssetdagError::TaskNotFound(task_name.to_string()).to_string());
    };

    match run_task(ctx, Arc::clone(task)).await {
        Ok(report) if report.failed == 0 => TaskOutcome::Success,
        Ok(report) => TaskOutcome::Failed(format!(
            "{} of {} files failed",
            report.failed, report.matched
        )),
        Err(err) => {
            error!(task = %task_name, error = %err, "task could not run");
            TaskOutcome::Failed(err.to_string())
        }
    }
}

/// Expand sources, filter, transform and write every file of `task`.
///
/// A file that fails is logged with its path and cause and counted in
/// `failed`; the remaining files still run. Only failing to list the
/// sources aborts the whole task.
pub async fn run_task(ctx: &BuildContext, task: Arc<Task>) -> Result<TaskReport> {
    let started = Instant::now();
    let root = ctx.root().to_path_buf();
    let force = ctx.force;

    let listing = Arc::clone(&task);
    let (pending, skipped, matched) = tokio::task::spawn_blocking(move || {
        let sources = listing.sources.expand(&root)?;
        let matched = sources.len();
        let pending: Vec<SourceFile> = match (&listing.incremental, force) {
            (Some(filter), false) => sources
                .into_iter()
                .filter(|s| !filter.is_up_to_date(s))
                .collect(),
            _ => sources,
        };
        let skipped = matched - pending.len();
        Ok::<_, AssetdagError>((pending, skipped, matched))
    })
    .await
    .map_err(join_error)??;

    info!(task = %task.name, matched, skipped, "running task");

    let mut report = TaskReport {
        matched,
        skipped,
        ..TaskReport::default()
    };

    for source in pending {
        let source_path = source.path.clone();
        match process_file(ctx, &task, source).await {
            Ok(written) => report.written += written,
            Err(err) => {
                report.failed += 1;
                match &err {
                    AssetdagError::Transform(t) => error!(
                        task = %task.name,
                        path = ?t.path,
                        step = %t.step,
                        error = %t.message,
                        "file failed"
                    ),
                    other => error!(task = %task.name, path = ?source_path, error = %other, "file failed"),
                }
            }
        }
    }

    info!(
        task = %task.name,
        written = report.written,
        failed = report.failed,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "task finished"
    );
    Ok(report)
}

async fn process_file(ctx: &BuildContext, task: &Arc<Task>, source: SourceFile) -> Result<usize> {
    let contents = tokio::fs::read(&source.path)
        .await
        .map_err(|e| AssetdagError::path_io(&source.path, e))?;
    let asset = Asset::new(source.path, source.relative, contents);

    let registry = Arc::clone(&ctx.registry);
    let chain = Arc::clone(task);
    let outputs = tokio::task::spawn_blocking(move || registry.apply(&chain.steps, asset))
        .await
        .map_err(join_error)??;

    for output in &outputs {
        write_output(&task.dest, output).await?;
    }
    Ok(outputs.len())
}

async fn write_output(dest: &Path, asset: &Asset) -> Result<()> {
    let target = dest.join(&asset.path);
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| AssetdagError::path_io(parent, e))?;
    }
    tokio::fs::write(&target, &asset.contents)
        .await
        .map_err(|e| AssetdagError::path_io(&target, e))?;
    debug!(source = ?asset.source, output = ?target, bytes = asset.contents.len(), "wrote output");
    Ok(())
}

/// Remove the build directory. A missing directory is success.
///
/// Only a directory strictly inside the project root is removed. `..`
/// segments are resolved first, and symlinks too when the directory exists.
pub async fn clean_build_dir(root: &Path, build_dir: &Path) -> Result<()> {
    let (root_resolved, build_resolved) = match tokio::fs::canonicalize(build_dir).await {
        Ok(build) => {
            let root = tokio::fs::canonicalize(root)
                .await
                .map_err(|e| AssetdagError::path_io(root, e))?;
            (root, build)
        }
        Err(_) => (normalize_lexically(root), normalize_lexically(build_dir)),
    };

    if build_resolved == root_resolved || !build_resolved.starts_with(&root_resolved) {
        return Err(AssetdagError::ConfigError(format!(
            "refusing to clean {build_dir:?}: only a directory inside the project root {root:?} can be cleaned"
        )));
    }

    match tokio::fs::remove_dir_all(&build_resolved).await {
        Ok(()) => {
            info!(dir = ?build_dir, "cleaned build directory");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(dir = ?build_dir, "build directory already absent");
            Ok(())
        }
        Err(e) => Err(AssetdagError::path_io(build_dir, e)),
    }
}

/// Drop `.` and fold `..` into its parent without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[tokio::test]
    async fn clean_twice_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let build = dir.path().join("build");
        fs::create_dir_all(build.join("css")).unwrap();
        fs::write(build.join("css/a.css"), "a").unwrap();

        clean_build_dir(dir.path(), &build).await.unwrap();
        assert!(!build.exists());
        clean_build_dir(dir.path(), &build).await.unwrap();
    }

    #[tokio::test]
    async fn clean_refuses_the_project_root() {
        let dir = tempfile::tempdir().unwrap();
        let err = clean_build_dir(dir.path(), dir.path()).await.unwrap_err();
        assert!(matches!(err, AssetdagError::ConfigError(_)));
        assert!(dir.path().exists());
    }

    #[tokio::test]
    async fn clean_refuses_parents_and_outside_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("site");
        let sibling = dir.path().join("other");
        fs::create_dir_all(root.join("build")).unwrap();
        fs::create_dir_all(&sibling).unwrap();
        fs::write(sibling.join("keep.txt"), "keep").unwrap();

        for target in [
            root.join(".."),
            root.join("build/../.."),
            root.join("./build/.."),
            sibling.clone(),
            root.join("../other"),
        ] {
            let err = clean_build_dir(&root, &target).await.unwrap_err();
            assert!(matches!(err, AssetdagError::ConfigError(_)), "{target:?}");
        }

        assert!(sibling.join("keep.txt").exists());
        assert!(root.join("build").exists());
    }

    #[tokio::test]
    async fn clean_resolves_dot_segments_inside_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let build = dir.path().join("build");
        fs::create_dir_all(build.join("css")).unwrap();

        clean_build_dir(dir.path(), &dir.path().join("src/../build"))
            .await
            .unwrap();
        assert!(!build.exists());
    }

    #[test]
    fn lexical_normalization_folds_parent_segments() {
        assert_eq!(
            normalize_lexically(Path::new("/a/b/./c/../../d")),
            PathBuf::from("/a/d")
        );
        assert_eq!(normalize_lexically(Path::new("/a/b/..")), PathBuf::from("/a"));
    }
}
