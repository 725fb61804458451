// src/pipeline/processors/files.rs

//! Path-level processors: `copy`, `rename` and the `write` snapshot marker.

use std::path::PathBuf;

use crate::errors::TransformError;
use crate::pipeline::asset::{Asset, StepOptions};
use crate::pipeline::registry::Processor;

/// Identity step. A task with no steps behaves the same way.
pub struct Copy;

impl Processor for Copy {
    fn name(&self) -> &'static str {
        "copy"
    }

    fn process(&self, asset: Asset, _options: &StepOptions) -> Result<Asset, TransformError> {
        Ok(asset)
    }
}

/// Writes the asset as it is at this point of the chain, then continues.
pub struct Write;

impl Processor for Write {
    fn name(&self) -> &'static str {
        "write"
    }

    fn process(&self, asset: Asset, _options: &StepOptions) -> Result<Asset, TransformError> {
        Ok(asset)
    }

    fn is_snapshot(&self) -> bool {
        true
    }
}

/// Rewrites the output path.
///
/// Options (all optional): `dirname`, `prefix`, `basename`, `suffix`,
/// `extname`. The new file name is `prefix + basename + suffix + extname`,
/// where `basename` and `extname` default to the current stem and extension.
pub struct Rename;

impl Processor for Rename {
    fn name(&self) -> &'static str {
        "rename"
    }

    fn process(&self, mut asset: Asset, options: &StepOptions) -> Result<Asset, TransformError> {
        let get = |key: &str| {
            options
                .get_str(key)
                .map(|v| v.map(str::to_string))
                .map_err(|e| asset.fail(self.name(), e))
        };

        let prefix = get("prefix")?.unwrap_or_default();
        let suffix = get("suffix")?.unwrap_or_default();
        let basename = match get("basename")? {
            Some(b) => b,
            None => asset
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        let extname = match get("extname")? {
            Some(e) if e.is_empty() || e.starts_with('.') => e,
            Some(e) => format!(".{e}"),
            None => asset
                .path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_default(),
        };
        let dirname = match get("dirname")? {
            Some(d) => PathBuf::from(d),
            None => asset
                .path
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_default(),
        };

        let file_name = format!("{prefix}{basename}{suffix}{extname}");
        if file_name.is_empty() {
            return Err(asset.fail(self.name(), "rename produced an empty file name"));
        }

        asset.path = dirname.join(file_name);
        Ok(asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rename(path: &str, opts: &str) -> PathBuf {
        let asset = Asset::new(PathBuf::from("/src/x"), PathBuf::from(path), Vec::new());
        Rename
            .process(asset, &StepOptions::from_toml(opts).unwrap())
            .unwrap()
            .path
    }

    #[test]
    fn suffix_goes_before_extension() {
        assert_eq!(rename("style.css", "suffix = \".min\""), PathBuf::from("style.min.css"));
    }

    #[test]
    fn extname_accepts_bare_extension() {
        assert_eq!(rename("img/photo.jpg", "extname = \"webp\""), PathBuf::from("img/photo.webp"));
        assert_eq!(rename("img/photo.jpg", "extname = \".webp\""), PathBuf::from("img/photo.webp"));
    }

    #[test]
    fn dirname_and_basename_replace_parts() {
        assert_eq!(
            rename("a/b/file.txt", "dirname = \"c\"\nbasename = \"other\"\nprefix = \"x-\""),
            PathBuf::from("c/x-other.txt")
        );
    }

    #[test]
    fn wrong_option_type_is_a_transform_error() {
        let asset = Asset::new(PathBuf::from("/src/x"), PathBuf::from("a.txt"), Vec::new());
        let err = Rename
            .process(asset, &StepOptions::from_toml("suffix = 1").unwrap())
            .unwrap_err();
        assert_eq!(err.step, "rename");
    }
}
