use image::imageops;
use image::{DynamicImage, RgbaImage};

use crate::config::RenderConfig;
use crate::error::ProcessingError;

/// Size of the surface for a `source_width × source_height` image. With both
/// bounds the image is fitted inside them keeping its aspect ratio; with one
/// bound the other side follows the aspect ratio.
pub fn target_dimensions(
    source_width: u32,
    source_height: u32,
    width: Option<u32>,
    height: Option<u32>,
) -> Result<(u32, u32), ProcessingError> {
    if source_width == 0 || source_height == 0 {
        return Err(ProcessingError::InvalidDimensions {
            width: source_width,
            height: source_height,
        });
    }
    if width == Some(0) || height == Some(0) {
        return Err(ProcessingError::InvalidDimensions {
            width: width.unwrap_or(source_width),
            height: height.unwrap_or(source_height),
        });
    }

    let (sw, sh) = (source_width as f64, source_height as f64);
    let scaled = |ratio: f64| {
        (
            ((sw * ratio).round() as u32).max(1),
            ((sh * ratio).round() as u32).max(1),
        )
    };

    Ok(match (width, height) {
        (None, None) => (source_width, source_height),
        (Some(w), None) => (w, scaled(w as f64 / sw).1),
        (None, Some(h)) => (scaled(h as f64 / sh).0, h),
        (Some(w), Some(h)) => {
            let ratio = (w as f64 / sw).min(h as f64 / sh);
            let (fw, fh) = scaled(ratio);
            (fw.min(w), fh.min(h))
        }
    })
}

/// Produce the mutable surface a processor draws on.
pub fn resize_surface(
    source: &DynamicImage,
    config: &RenderConfig,
) -> Result<RgbaImage, ProcessingError> {
    let (width, height) =
        target_dimensions(source.width(), source.height(), config.width, config.height)?;

    let rgba = source.to_rgba8();
    if rgba.dimensions() == (width, height) {
        return Ok(rgba);
    }

    log::debug!(
        "Resizing {}x{} -> {}x{} ({})",
        source.width(),
        source.height(),
        width,
        height,
        config.filter
    );
    Ok(imageops::resize(&rgba, width, height, config.filter.filter_type()))
}
