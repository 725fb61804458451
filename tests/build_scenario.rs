use std::fs;
use std::path::{Path, PathBuf};

use assetdag::cli::CliArgs;
use assetdag::errors::AssetdagError;
use assetdag::run;
use assetdag_test_utils::{init_tracing, snapshot_tree, write_file};
use clap::Parser;
use image::{Rgb, RgbImage};

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <!-- shared head -->
    <link rel="stylesheet" href="css/style.min.css">
  </head>
  <body>
    <p>Hello   world</p>
  </body>
</html>
"#;

const STYLE_SCSS: &str = r#"@import "vars";

.box {
  color: $brand;
  display: flex;
  user-select: none;
}
"#;

async fn assetdag(config: &Path, args: &[&str]) -> anyhow::Result<bool> {
    let mut argv = vec!["assetdag", "--config", config.to_str().unwrap()];
    argv.extend_from_slice(args);
    run(CliArgs::try_parse_from(argv).unwrap()).await
}

/// A project created by `assetdag init` with markup, styles and one photo.
fn project() -> (tempfile::TempDir, PathBuf) {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write_file(root, "src/index.html", INDEX_HTML);
    write_file(root, "src/sass/style.scss", STYLE_SCSS);
    write_file(root, "src/sass/_vars.scss", "$brand: #336699;\n");

    let photo = RgbImage::from_fn(24, 16, |x, y| Rgb([(x * 10) as u8, (y * 15) as u8, 90]));
    fs::create_dir_all(root.join("src/img")).unwrap();
    photo.save(root.join("src/img/photo.jpg")).unwrap();

    let config = root.join("Assetdag.toml");
    (dir, config)
}

#[tokio::test]
async fn production_build_of_a_small_site() {
    let (dir, config) = project();
    assert!(assetdag(&config, &["init"]).await.unwrap());
    assert!(assetdag(&config, &["build"]).await.unwrap());

    let build = dir.path().join("build");

    let html = fs::read_to_string(build.join("index.html")).unwrap();
    assert!(!html.contains("<!--"));
    assert!(!html.contains('\n'));
    assert!(html.contains("<p>Hello world</p>"));

    let css = fs::read_to_string(build.join("css/style.min.css")).unwrap();
    assert!(css.contains(".box{"));
    assert!(css.contains("-webkit-user-select:none"), "{css}");
    assert!(!css.contains("$brand"));
    assert!(!css.trim_end().contains('\n'));

    let jpg = fs::read(build.join("img/photo.jpg")).unwrap();
    assert_eq!(image::guess_format(&jpg).unwrap(), image::ImageFormat::Jpeg);
    let webp = fs::read(build.join("img/photo.webp")).unwrap();
    assert_eq!(image::guess_format(&webp).unwrap(), image::ImageFormat::WebP);
}

#[tokio::test]
async fn building_twice_gives_identical_output() {
    let (dir, config) = project();
    assert!(assetdag(&config, &["init"]).await.unwrap());
    let build = dir.path().join("build");

    assert!(assetdag(&config, &["build"]).await.unwrap());
    let first = snapshot_tree(&build);
    assert!(!first.is_empty());

    assert!(assetdag(&config, &["build"]).await.unwrap());
    let second = snapshot_tree(&build);
    assert_eq!(first, second);
}

#[tokio::test]
async fn build_removes_stale_outputs() {
    let (dir, config) = project();
    assert!(assetdag(&config, &["init"]).await.unwrap());
    let stale = write_file(dir.path(), "build/old.txt", "left over");

    assert!(assetdag(&config, &["build"]).await.unwrap());
    assert!(!stale.exists());
}

#[tokio::test]
async fn clean_succeeds_twice() {
    let (dir, config) = project();
    assert!(assetdag(&config, &["init"]).await.unwrap());
    assert!(assetdag(&config, &["build"]).await.unwrap());
    assert!(dir.path().join("build").exists());

    assert!(assetdag(&config, &["clean"]).await.unwrap());
    assert!(!dir.path().join("build").exists());
    assert!(assetdag(&config, &["clean"]).await.unwrap());
}

#[tokio::test]
async fn run_executes_only_the_named_task_without_cleaning() {
    let (dir, config) = project();
    assert!(assetdag(&config, &["init"]).await.unwrap());
    let keep = write_file(dir.path(), "build/keep.txt", "kept");

    assert!(assetdag(&config, &["run", "html"]).await.unwrap());
    assert!(keep.exists());
    assert!(dir.path().join("build/index.html").exists());
    assert!(!dir.path().join("build/css").exists());
}

#[tokio::test]
async fn dry_run_touches_nothing() {
    let (dir, config) = project();
    assert!(assetdag(&config, &["init"]).await.unwrap());
    assert!(assetdag(&config, &["--dry-run", "build"]).await.unwrap());
    assert!(!dir.path().join("build").exists());
}

#[tokio::test]
async fn build_dir_above_the_project_is_never_removed() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let site = dir.path().join("site");
    let sibling = write_file(dir.path(), "other/keep.txt", "keep");
    write_file(&site, "src/fonts/f.woff", "font");
    let config = write_file(
        &site,
        "Assetdag.toml",
        r#"
[paths]
build = ".."

[task.fonts]
src = ["src/fonts/*.woff"]
dest = "out/fonts"
"#,
    );

    let err = assetdag(&config, &["clean"]).await.unwrap_err();
    assert!(
        matches!(err.downcast_ref::<AssetdagError>(), Some(AssetdagError::ConfigError(_))),
        "{err:#}"
    );

    // `build` starts with `clean`, which fails; nothing after it runs.
    assert!(!assetdag(&config, &["build"]).await.unwrap());
    assert!(sibling.exists());
    assert!(config.exists());
    assert!(!site.join("out").exists());
}
