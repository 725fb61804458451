// src/pipeline/processors/script.rs

use crate::errors::TransformError;
use crate::pipeline::asset::{Asset, StepOptions};
use crate::pipeline::registry::Processor;

/// `jsmin`: strips comments and insignificant whitespace.
pub struct JsMin;

impl Processor for JsMin {
    fn name(&self) -> &'static str {
        "jsmin"
    }

    fn process(&self, mut asset: Asset, _options: &StepOptions) -> Result<Asset, TransformError> {
        let text = asset.text(self.name())?;
        asset.contents = minifier::js::minify(&text).to_string().into_bytes();
        Ok(asset)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn comments_and_indentation_go_away() {
        let src = "// greeting\nfunction greet(name) {\n    /* say hi */\n    return 'hi ' + name;\n}\n";
        let asset = Asset::new(
            PathBuf::from("/src/js/app.js"),
            PathBuf::from("app.js"),
            src.as_bytes().to_vec(),
        );

        let out = JsMin.process(asset, &StepOptions::default()).unwrap();
        let js = String::from_utf8(out.contents).unwrap();

        assert!(js.len() < src.len());
        assert!(!js.contains("greeting"));
        assert!(!js.contains("say hi"));
        assert!(js.contains("'hi '"));
        assert_eq!(out.path, PathBuf::from("app.js"));
    }
}
