// src/pipeline/processors/images.rs

//! Raster image processors: `imagemin` (oxipng / jpeg re-encode) and `webp`.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, ImageFormat};
use tracing::debug;

use crate::errors::TransformError;
use crate::pipeline::asset::{Asset, StepOptions};
use crate::pipeline::registry::Processor;

const DEFAULT_PNG_LEVEL: i64 = 3;
const DEFAULT_JPEG_QUALITY: i64 = 85;

fn decode(asset: &Asset, step: &str) -> Result<DynamicImage, TransformError> {
    image::load_from_memory(&asset.contents).map_err(|e| asset.fail(step, e))
}

/// `imagemin`: lossless PNG optimisation and JPEG re-encoding.
///
/// Options: `optimization_level` (0-6, PNG) and `quality` (1-100, JPEG).
/// The smaller of original and re-encoded bytes is kept. Formats other than
/// PNG and JPEG pass through unchanged.
pub struct ImageMin;

impl ImageMin {
    fn optimize_png(&self, asset: &Asset, level: u8) -> Result<Vec<u8>, TransformError> {
        let options = oxipng::Options::from_preset(level);
        oxipng::optimize_from_memory(&asset.contents, &options)
            .map_err(|e| asset.fail(self.name(), e))
    }

    fn reencode_jpeg(&self, asset: &Asset, quality: u8) -> Result<Vec<u8>, TransformError> {
        let rgb = decode(asset, self.name())?.to_rgb8();
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, quality)
            .encode_image(&rgb)
            .map_err(|e| asset.fail(self.name(), e))?;
        Ok(out)
    }
}

impl Processor for ImageMin {
    fn name(&self) -> &'static str {
        "imagemin"
    }

    fn process(&self, mut asset: Asset, options: &StepOptions) -> Result<Asset, TransformError> {
        let level = options
            .get_int("optimization_level")
            .map_err(|e| asset.fail(self.name(), e))?
            .unwrap_or(DEFAULT_PNG_LEVEL)
            .clamp(0, 6) as u8;
        let quality = options
            .get_int("quality")
            .map_err(|e| asset.fail(self.name(), e))?
            .unwrap_or(DEFAULT_JPEG_QUALITY)
            .clamp(1, 100) as u8;

        let optimized = match image::guess_format(&asset.contents) {
            Ok(ImageFormat::Png) => self.optimize_png(&asset, level)?,
            Ok(ImageFormat::Jpeg) => self.reencode_jpeg(&asset, quality)?,
            _ => {
                debug!(path = ?asset.source, "imagemin: unsupported format, passing through");
                return Ok(asset);
            }
        };

        if optimized.len() < asset.contents.len() {
            debug!(
                path = ?asset.source,
                before = asset.contents.len(),
                after = optimized.len(),
                "imagemin: shrunk image"
            );
            asset.contents = optimized;
        }
        Ok(asset)
    }
}

/// `webp`: re-encode any decodable raster as lossless WebP.
///
/// A `quality` option is accepted for compatibility and ignored, since the
/// only encoder available is lossless.
pub struct WebP;

impl Processor for WebP {
    fn name(&self) -> &'static str {
        "webp"
    }

    fn process(&self, mut asset: Asset, options: &StepOptions) -> Result<Asset, TransformError> {
        if options.get_int("quality").ok().flatten().is_some() {
            debug!(path = ?asset.source, "webp: quality ignored by lossless encoder");
        }

        let img = decode(&asset, self.name())?;
        let (width, height) = (img.width(), img.height());
        let (pixels, color) = if img.color().has_alpha() {
            (img.to_rgba8().into_raw(), ExtendedColorType::Rgba8)
        } else {
            (img.to_rgb8().into_raw(), ExtendedColorType::Rgb8)
        };

        let mut out = Cursor::new(Vec::new());
        WebPEncoder::new_lossless(&mut out)
            .encode(&pixels, width, height, color)
            .map_err(|e| asset.fail(self.name(), e))?;

        asset.contents = out.into_inner();
        asset.path.set_extension("webp");
        Ok(asset)
    }
}
