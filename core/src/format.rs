use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};

use crate::config::RenderConfig;
use crate::error::ProcessingError;

/// Encodings the host can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Png,
    Jpeg,
    Webp,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        Self::from_extension(&ext)
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(OutputFormat::Png),
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            "webp" => Some(OutputFormat::Webp),
            _ => None,
        }
    }

    pub fn from_image_format(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Png => Some(OutputFormat::Png),
            image::ImageFormat::Jpeg => Some(OutputFormat::Jpeg),
            image::ImageFormat::WebP => Some(OutputFormat::Webp),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Webp => "webp",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Webp => "image/webp",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Png => "PNG",
            OutputFormat::Jpeg => "JPEG",
            OutputFormat::Webp => "WebP",
        }
    }

    /// Pick the served format. Processors that rely on alpha force PNG,
    /// otherwise the original format is kept.
    pub fn select(
        original: Option<OutputFormat>,
        requires_transparency: bool,
        config: &RenderConfig,
    ) -> OutputFormat {
        if requires_transparency {
            return OutputFormat::Png;
        }
        original.unwrap_or(config.default_format)
    }
}

/// Encode a rendered surface.
pub fn encode(
    surface: &RgbaImage,
    format: OutputFormat,
    config: &RenderConfig,
) -> Result<Vec<u8>, ProcessingError> {
    if surface.width() == 0 || surface.height() == 0 {
        return Err(ProcessingError::InvalidDimensions {
            width: surface.width(),
            height: surface.height(),
        });
    }

    let output = match format {
        OutputFormat::Png => encode_png(surface)?,
        OutputFormat::Jpeg => encode_jpeg(surface, config)?,
        OutputFormat::Webp => encode_webp(surface, config),
    };

    log::debug!(
        "Encoded {}x{} surface: {} bytes ({})",
        surface.width(),
        surface.height(),
        output.len(),
        format.as_str()
    );

    Ok(output)
}

fn encode_png(surface: &RgbaImage) -> Result<Vec<u8>, ProcessingError> {
    let mut output = Vec::new();
    let mut cursor = Cursor::new(&mut output);
    surface
        .write_to(&mut cursor, image::ImageFormat::Png)
        .map_err(|e| ProcessingError::Encode(format!("Failed to encode PNG: {}", e)))?;
    Ok(output)
}

fn encode_jpeg(surface: &RgbaImage, config: &RenderConfig) -> Result<Vec<u8>, ProcessingError> {
    let mut output = Vec::new();
    let mut cursor = Cursor::new(&mut output);

    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgba8(surface.clone()).to_rgb8();

    let mut encoder = JpegEncoder::new_with_quality(&mut cursor, config.quality.clamp(1, 100));
    encoder
        .encode(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| ProcessingError::Encode(format!("Failed to encode JPEG: {}", e)))?;

    Ok(output)
}

fn encode_webp(surface: &RgbaImage, config: &RenderConfig) -> Vec<u8> {
    let encoder = webp::Encoder::from_rgba(surface.as_raw(), surface.width(), surface.height());
    encoder.encode(config.quality.clamp(1, 100) as f32).to_vec()
}
