use std::fs;
use std::path::Path;
use std::sync::Arc;

use assetdag::context::BuildContext;
use assetdag::exec::run_task;
use assetdag_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};
use assetdag_test_utils::{init_tracing, write_file};
use filetime::{set_file_mtime, FileTime};

fn context(root: &Path, force: bool) -> BuildContext {
    let cfg = ConfigFileBuilder::new()
        .with_task(
            "fonts",
            TaskConfigBuilder::new("src/fonts/*.woff", "build/fonts")
                .incremental(None)
                .build(),
        )
        .with_task(
            "style",
            TaskConfigBuilder::new("src/sass/*.scss", "build/css")
                .step("sass")
                .incremental(Some(".css"))
                .build(),
        )
        .build();
    BuildContext::from_config(&cfg, root, force).unwrap()
}

fn set_mtime(path: &Path, secs: i64) {
    set_file_mtime(path, FileTime::from_unix_time(secs, 0)).unwrap();
}

#[tokio::test]
async fn newer_output_is_skipped_until_input_is_touched() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "src/fonts/a.woff", b"font-v1");

    let ctx = context(dir.path(), false);
    let task = Arc::clone(ctx.tasks.get("fonts").unwrap());

    let first = run_task(&ctx, Arc::clone(&task)).await.unwrap();
    assert_eq!((first.matched, first.skipped, first.written), (1, 0, 1));

    let output = dir.path().join("build/fonts/a.woff");
    set_mtime(&input, 1_000);
    set_mtime(&output, 2_000);
    fs::write(&input, b"font-v2").unwrap();
    set_mtime(&input, 1_500);

    let second = run_task(&ctx, Arc::clone(&task)).await.unwrap();
    assert_eq!((second.skipped, second.written), (1, 0));
    assert_eq!(fs::read(&output).unwrap(), b"font-v1");

    set_mtime(&input, 3_000);
    let third = run_task(&ctx, task).await.unwrap();
    assert_eq!((third.skipped, third.written), (0, 1));
    assert_eq!(fs::read(&output).unwrap(), b"font-v2");
}

#[tokio::test]
async fn equal_mtimes_count_as_up_to_date() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "src/fonts/a.woff", b"x");
    let output = write_file(dir.path(), "build/fonts/a.woff", b"old");
    set_mtime(&input, 5_000);
    set_mtime(&output, 5_000);

    let ctx = context(dir.path(), false);
    let report = run_task(&ctx, Arc::clone(ctx.tasks.get("fonts").unwrap()))
        .await
        .unwrap();
    assert_eq!(report.skipped, 1);
    assert_eq!(fs::read(&output).unwrap(), b"old");
}

#[tokio::test]
async fn force_reprocesses_everything() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "src/fonts/a.woff", b"new");
    let output = write_file(dir.path(), "build/fonts/a.woff", b"old");
    set_mtime(&input, 1_000);
    set_mtime(&output, 2_000);

    let ctx = context(dir.path(), true);
    let report = run_task(&ctx, Arc::clone(ctx.tasks.get("fonts").unwrap()))
        .await
        .unwrap();
    assert_eq!((report.skipped, report.written), (0, 1));
    assert_eq!(fs::read(&output).unwrap(), b"new");
}

#[tokio::test]
async fn output_extension_substitution_finds_compiled_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "src/sass/main.scss", "a { b: c; }");
    let output = write_file(dir.path(), "build/css/main.css", "stale");
    set_mtime(&input, 1_000);
    set_mtime(&output, 2_000);

    let ctx = context(dir.path(), false);
    let task = Arc::clone(ctx.tasks.get("style").unwrap());
    let report = run_task(&ctx, Arc::clone(&task)).await.unwrap();
    assert_eq!(report.skipped, 1);

    fs::remove_file(&output).unwrap();
    let report = run_task(&ctx, task).await.unwrap();
    assert_eq!(report.written, 1);
    assert!(fs::read_to_string(&output).unwrap().contains("b: c"));
}
