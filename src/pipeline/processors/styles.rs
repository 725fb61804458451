// src/pipeline/processors/styles.rs

//! Stylesheet processors: `sass` (grass), `autoprefix` and `cssmin`
//! (lightningcss).

use std::path::PathBuf;

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};

use crate::errors::TransformError;
use crate::pipeline::asset::{Asset, StepOptions};
use crate::pipeline::registry::Processor;

const DEFAULT_BROWSERS: &[&str] = &["defaults"];

/// `sass`: SCSS to CSS.
///
/// Options: `style` (`"expanded"` or `"compressed"`, default expanded) and
/// `load_paths`. The directory of the source file is always searched first,
/// so partials next to the entry point resolve without configuration.
pub struct Sass;

impl Processor for Sass {
    fn name(&self) -> &'static str {
        "sass"
    }

    fn process(&self, mut asset: Asset, options: &StepOptions) -> Result<Asset, TransformError> {
        let style = match options
            .get_str("style")
            .map_err(|e| asset.fail(self.name(), e))?
        {
            None | Some("expanded") => grass::OutputStyle::Expanded,
            Some("compressed") => grass::OutputStyle::Compressed,
            Some(other) => {
                return Err(asset.fail(
                    self.name(),
                    format!("unknown style `{other}` (expected `expanded` or `compressed`)"),
                ));
            }
        };
        let extra_paths = options
            .get_str_list("load_paths")
            .map_err(|e| asset.fail(self.name(), e))?
            .unwrap_or_default();

        let mut load_paths: Vec<PathBuf> = Vec::new();
        if let Some(parent) = asset.source.parent() {
            load_paths.push(parent.to_path_buf());
        }
        load_paths.extend(extra_paths.into_iter().map(PathBuf::from));

        let grass_options = grass::Options::default()
            .style(style)
            .load_paths(&load_paths);

        let text = asset.text(self.name())?;
        let css = grass::from_string(text, &grass_options)
            .map_err(|e| asset.fail(self.name(), e))?;

        asset.contents = css.into_bytes();
        asset.path.set_extension("css");
        Ok(asset)
    }
}

fn targets_from(asset: &Asset, step: &str, options: &StepOptions) -> Result<Targets, TransformError> {
    let queries = options
        .get_str_list("browsers")
        .map_err(|e| asset.fail(step, e))?
        .unwrap_or_else(|| DEFAULT_BROWSERS.iter().map(|q| q.to_string()).collect());

    let browsers = Browsers::from_browserslist(queries)
        .map_err(|e| asset.fail(step, format!("invalid browsers query: {e}")))?;

    Ok(Targets {
        browsers,
        ..Targets::default()
    })
}

/// Parse, lower for `targets`, and print.
fn rewrite_css(
    asset: &Asset,
    step: &str,
    targets: Targets,
    minify: bool,
) -> Result<String, TransformError> {
    let text = asset.text(step)?;
    let filename = asset.source.display().to_string();

    let mut sheet = StyleSheet::parse(
        &text,
        ParserOptions {
            filename,
            ..ParserOptions::default()
        },
    )
    .map_err(|e| asset.fail(step, e))?;

    sheet
        .minify(MinifyOptions {
            targets,
            ..MinifyOptions::default()
        })
        .map_err(|e| asset.fail(step, e))?;

    let printed = sheet
        .to_css(PrinterOptions {
            minify,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| asset.fail(step, e))?;

    Ok(printed.code)
}

/// `autoprefix`: add vendor prefixes for `browsers`, pretty printed.
pub struct Autoprefix;

impl Processor for Autoprefix {
    fn name(&self) -> &'static str {
        "autoprefix"
    }

    fn process(&self, mut asset: Asset, options: &StepOptions) -> Result<Asset, TransformError> {
        let targets = targets_from(&asset, self.name(), options)?;
        asset.contents = rewrite_css(&asset, self.name(), targets, false)?.into_bytes();
        Ok(asset)
    }
}

/// `cssmin`: minified output for `browsers`.
pub struct CssMin;

impl Processor for CssMin {
    fn name(&self) -> &'static str {
        "cssmin"
    }

    fn process(&self, mut asset: Asset, options: &StepOptions) -> Result<Asset, TransformError> {
        let targets = targets_from(&asset, self.name(), options)?;
        asset.contents = rewrite_css(&asset, self.name(), targets, true)?.into_bytes();
        Ok(asset)
    }
}
