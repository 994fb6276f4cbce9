use chrono::{DateTime, Utc};
use image::DynamicImage;

use crate::canvas::{Canvas, TRANSPARENT};
use crate::clip::ClipPath;
use crate::entity::{ImageKind, MediaEntity};
use crate::error::DrawError;
use crate::processor::ImageProcessor;

/// Corner radius in surface pixels.
pub const CORNER_RADIUS: f32 = 20.0;

/// Clips every image to a rounded rectangle, leaving the corners
/// transparent. Applies to all entities and image kinds.
#[derive(Debug, Clone)]
pub struct RoundedCornerProcessor {
    configured_at: DateTime<Utc>,
}

impl RoundedCornerProcessor {
    /// Stamp the configuration epoch with the current time.
    pub fn new() -> Self {
        Self::with_epoch(Utc::now())
    }

    /// Use an epoch supplied by the host, e.g. the modification time of the
    /// plugin configuration that owns this processor.
    pub fn with_epoch(configured_at: DateTime<Utc>) -> Self {
        Self { configured_at }
    }

    /// Radius actually drawn for a `width × height` surface.
    pub fn effective_radius(width: u32, height: u32) -> f32 {
        CORNER_RADIUS
            .min(width as f32 / 2.0)
            .min(height as f32 / 2.0)
    }

    fn round_corners(canvas: &mut Canvas<'_>, resized: &image::RgbaImage) -> Result<(), DrawError> {
        let (width, height) = (canvas.width(), canvas.height());
        let radius = Self::effective_radius(width, height);
        let outline = ClipPath::rounded_rect(width as f32, height as f32, radius);

        canvas.clear(TRANSPARENT);
        canvas.set_clip(&outline)?;
        canvas.draw_image(resized, 0, 0, width, height)?;
        canvas.reset_clip();
        Ok(())
    }
}

impl Default for RoundedCornerProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageProcessor for RoundedCornerProcessor {
    fn name(&self) -> &str {
        "rounded-corners"
    }

    fn process_image(
        &self,
        _source: &DynamicImage,
        canvas: &mut Canvas<'_>,
        entity: Option<&MediaEntity>,
        kind: ImageKind,
        index: u32,
    ) {
        if canvas.width() == 0 || canvas.height() == 0 {
            return;
        }

        let resized = canvas.snapshot();
        if let Err(err) = Self::round_corners(canvas, &resized) {
            log::warn!(
                "{}: leaving {} image {} of {:?} unprocessed: {}",
                self.name(),
                kind,
                index,
                entity.map(|e| e.id),
                err
            );
            canvas.reset_clip();
            canvas.restore(&resized);
        }
    }

    fn requires_transparency(&self) -> bool {
        true
    }

    fn is_configured_to_process(
        &self,
        _entity: Option<&MediaEntity>,
        _kind: ImageKind,
        _index: u32,
    ) -> bool {
        true
    }

    fn configuration_last_modified(&self) -> DateTime<Utc> {
        self.configured_at
    }
}
