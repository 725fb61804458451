// src/config/defaults.rs

/// Starter configuration written by `assetdag init`.
///
/// Layout: markup in `src/*.html`, styles in `src/sass/`, scripts in
/// `src/js/`, images in `src/img/`, fonts in `src/fonts/`, everything
/// mirrored under `build/`.
pub const DEFAULT_CONFIG: &str = r#"# assetdag configuration

[config]
debounce_ms = 100

[paths]
build = "build"

[server]
host = "127.0.0.1"
port = 3000

# Markup

[task.html]
src = ["src/*.html"]
dest = "build"
reload = true
incremental = true
steps = [
  { use = "htmlmin", options = { remove_comments = true, collapse_whitespace = true } },
]

# Styles

[task.style]
src = ["src/sass/style.scss"]
dest = "build/css"
reload = true
steps = [
  { use = "sass", options = { style = "expanded" } },
  { use = "autoprefix" },
  { use = "rename", options = { suffix = ".min" } },
]

[task.style_build]
src = ["src/sass/style.scss"]
dest = "build/css"
steps = [
  { use = "sass" },
  { use = "autoprefix" },
  { use = "cssmin" },
  { use = "rename", options = { suffix = ".min" } },
]

# Scripts

[task.js]
src = ["src/js/**/*.js"]
dest = "build/js"
reload = true
steps = [{ use = "jsmin" }]

# Images

[task.image]
src = ["src/img/**/*.{png,jpg}"]
dest = "build/img"
reload = true
incremental = true

[task.image_build]
src = ["src/img/**/*.{png,jpg}"]
dest = "build/img"
incremental = true
steps = [
  { use = "imagemin", options = { optimization_level = 3, quality = 85 } },
  { use = "write" },
  { use = "webp", options = { quality = 80 } },
]

[task.svg]
src = ["src/img/**/*.svg"]
dest = "build/img"
reload = true
incremental = true

[task.svg_build]
src = ["src/img/**/*.svg"]
dest = "build/img"
incremental = true
steps = [{ use = "svgmin" }]

# Fonts

[task.fonts]
src = ["src/fonts/**/*.{woff,woff2}"]
dest = "build/fonts"
incremental = true

# Plans

[plan]
develop = { series = ["clean", { parallel = ["html", "style", "js", "image", "svg", "fonts"] }] }
build = { series = ["clean", { parallel = ["html", "style_build", "js", "image_build", "svg_build", "fonts"] }] }

# Watch bindings (develop only)

[[watch]]
glob = ["src/*.html"]
task = "html"

[[watch]]
glob = ["src/sass/**/*.scss"]
task = "style"

[[watch]]
glob = ["src/js/**/*.js"]
task = "js"

[[watch]]
glob = ["src/img/**/*.{png,jpg}"]
task = "image"

[[watch]]
glob = ["src/img/**/*.svg"]
task = "svg"

[[watch]]
glob = ["src/fonts/**/*.{woff,woff2}"]
task = "fonts"
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{parse_str, validate_config};
    use crate::pipeline::TransformRegistry;

    #[test]
    fn default_config_is_valid() {
        let cfg = parse_str(DEFAULT_CONFIG).unwrap();
        validate_config(&cfg, &TransformRegistry::builtin()).unwrap();
        assert_eq!(cfg.task.len(), 9);
        assert_eq!(cfg.watch.len(), 6);
        assert!(cfg.plan.contains_key("build"));
        assert!(cfg.plan.contains_key("develop"));
    }
}
