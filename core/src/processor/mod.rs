//! The post-processing extension point.
//!
//! A host resizes an image, binds a [`Canvas`] to the result and hands both
//! to the first registered [`ImageProcessor`] that claims the image. The
//! processor draws the final pixels in place.

pub mod rounded;
pub mod scoped;

use chrono::{DateTime, Utc};
use image::DynamicImage;

use crate::canvas::Canvas;
use crate::entity::{ImageKind, MediaEntity};

pub use rounded::RoundedCornerProcessor;
pub use scoped::ScopedProcessor;

pub trait ImageProcessor: Send + Sync {
    /// Stable identifier, used in logs and cache keys.
    fn name(&self) -> &str;

    /// Produce the final image on `canvas`.
    ///
    /// `source` is the decoded image before resizing; the canvas surface
    /// already holds it at the target size. Implementations must not fail:
    /// when they cannot process the input they leave the surface untouched.
    fn process_image(
        &self,
        source: &DynamicImage,
        canvas: &mut Canvas<'_>,
        entity: Option<&MediaEntity>,
        kind: ImageKind,
        index: u32,
    );

    /// When true the host must encode with an alpha-capable format.
    fn requires_transparency(&self) -> bool {
        false
    }

    /// Whether [`process_image`](Self::process_image) would change this
    /// image. Must be side-effect free; hosts call it to build cache keys
    /// without rendering.
    fn is_configured_to_process(
        &self,
        entity: Option<&MediaEntity>,
        kind: ImageKind,
        index: u32,
    ) -> bool;

    /// Version stamp of this processor's settings.
    fn configuration_last_modified(&self) -> DateTime<Utc>;
}
