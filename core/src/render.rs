use crate::cache_key::CacheKey;
use crate::config::RenderConfig;
use crate::entity::{ImageKind, MediaEntity};
use crate::error::ProcessingError;
use crate::format::{encode, OutputFormat};
use crate::pipeline::{Pipeline, RenderOutcome};
use crate::resize::resize_surface;

/// The image a host is rendering.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderRequest<'a> {
    pub entity: Option<&'a MediaEntity>,
    pub kind: ImageKind,
    pub index: u32,
}

#[derive(Debug)]
pub struct Rendered {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    pub outcome: RenderOutcome,
    pub cache_key: CacheKey,
}

/// Decode, resize, post-process and encode one image.
pub fn render_encoded(
    pipeline: &Pipeline,
    data: &[u8],
    config: &RenderConfig,
    request: RenderRequest<'_>,
) -> Result<Rendered, ProcessingError> {
    let RenderRequest {
        entity,
        kind,
        index,
    } = request;

    let original = image::guess_format(data)
        .ok()
        .and_then(OutputFormat::from_image_format);
    let source = image::load_from_memory(data)
        .map_err(|e| ProcessingError::Decode(e.to_string()))?;

    let mut surface = resize_surface(&source, config)?;
    let outcome = pipeline.render(&source, &mut surface, entity, kind, index);

    // A recovered render is the plain resized image, so it keeps its format.
    let needs_alpha = matches!(outcome, RenderOutcome::Processed { .. })
        && pipeline.requires_transparency(entity, kind, index);
    let format = OutputFormat::select(original, needs_alpha, config);
    let bytes = encode(&surface, format, config)?;

    let cache_key = pipeline
        .cache_key(entity, kind, index)
        .with_size(surface.width(), surface.height());

    Ok(Rendered {
        bytes,
        format,
        width: surface.width(),
        height: surface.height(),
        outcome,
        cache_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::{RoundedCornerProcessor, ScopedProcessor};
    use image::{Rgba, RgbaImage};
    use std::io::Cursor;

    fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let rgb = image::DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([200, 40, 40, 255]),
        ))
        .to_rgb8();
        let mut out = Vec::new();
        rgb.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Jpeg)
            .unwrap();
        out
    }

    fn pipeline() -> Pipeline {
        let mut pipeline = Pipeline::new();
        pipeline.register(Box::new(ScopedProcessor::new(
            Box::new(RoundedCornerProcessor::new()),
            [ImageKind::Primary],
        )));
        pipeline
    }

    #[test]
    fn processed_jpeg_is_served_as_png() {
        let config = RenderConfig {
            width: Some(60),
            ..RenderConfig::default()
        };
        let rendered = render_encoded(&pipeline(), &jpeg_bytes(120, 80), &config, RenderRequest::default())
            .unwrap();

        assert_eq!(rendered.format, OutputFormat::Png);
        assert_eq!((rendered.width, rendered.height), (60, 40));
        assert_eq!(rendered.outcome.processor(), Some("rounded-corners"));
        assert_eq!(rendered.cache_key.size, Some((60, 40)));

        let decoded = image::load_from_memory(&rendered.bytes).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn unclaimed_image_keeps_original_format() {
        let request = RenderRequest {
            kind: ImageKind::Backdrop,
            ..RenderRequest::default()
        };
        let rendered =
            render_encoded(&pipeline(), &jpeg_bytes(40, 40), &RenderConfig::default(), request)
                .unwrap();

        assert_eq!(rendered.format, OutputFormat::Jpeg);
        assert_eq!(rendered.outcome, RenderOutcome::Unprocessed);
        assert!(rendered.cache_key.processor.is_none());
    }

    #[test]
    fn garbage_input_is_a_decode_error() {
        let err = render_encoded(
            &pipeline(),
            b"not an image",
            &RenderConfig::default(),
            RenderRequest::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ProcessingError::Decode(_)));
    }
}
