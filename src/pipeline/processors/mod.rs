// src/pipeline/processors/mod.rs

//! Built-in processors.
//!
//! Each processor is a thin adapter between the uniform [`Processor`]
//! contract and the library (or external command) that does the real work.

use std::sync::Arc;

use crate::pipeline::registry::Processor;

pub mod command;
pub mod files;
pub mod images;
pub mod markup;
pub mod script;
pub mod styles;

pub use command::CommandStep;
pub use files::{Copy, Rename, Write};
pub use images::{ImageMin, WebP};
pub use markup::{HtmlMin, SvgMin};
pub use script::JsMin;
pub use styles::{Autoprefix, CssMin, Sass};

/// Every processor registered by `TransformRegistry::builtin()`.
pub fn builtin() -> Vec<Arc<dyn Processor>> {
    vec![
        Arc::new(Copy),
        Arc::new(Rename),
        Arc::new(Write),
        Arc::new(HtmlMin),
        Arc::new(SvgMin),
        Arc::new(Sass),
        Arc::new(Autoprefix),
        Arc::new(CssMin),
        Arc::new(JsMin),
        Arc::new(ImageMin),
        Arc::new(WebP),
        Arc::new(CommandStep),
    ]
}
