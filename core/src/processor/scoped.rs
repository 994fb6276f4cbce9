use chrono::{DateTime, Utc};
use image::DynamicImage;

use crate::canvas::Canvas;
use crate::entity::{ImageKind, MediaEntity};
use crate::processor::ImageProcessor;

/// Restricts another processor to a fixed set of image kinds.
pub struct ScopedProcessor {
    inner: Box<dyn ImageProcessor>,
    kinds: Vec<ImageKind>,
}

impl ScopedProcessor {
    pub fn new(inner: Box<dyn ImageProcessor>, kinds: impl IntoIterator<Item = ImageKind>) -> Self {
        let mut kinds: Vec<ImageKind> = kinds.into_iter().collect();
        kinds.sort_by_key(|k| k.as_str());
        kinds.dedup();
        Self { inner, kinds }
    }

    pub fn kinds(&self) -> &[ImageKind] {
        &self.kinds
    }
}

impl ImageProcessor for ScopedProcessor {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn process_image(
        &self,
        source: &DynamicImage,
        canvas: &mut Canvas<'_>,
        entity: Option<&MediaEntity>,
        kind: ImageKind,
        index: u32,
    ) {
        if !self.kinds.contains(&kind) {
            return;
        }
        self.inner.process_image(source, canvas, entity, kind, index);
    }

    fn requires_transparency(&self) -> bool {
        self.inner.requires_transparency()
    }

    fn is_configured_to_process(
        &self,
        entity: Option<&MediaEntity>,
        kind: ImageKind,
        index: u32,
    ) -> bool {
        self.kinds.contains(&kind) && self.inner.is_configured_to_process(entity, kind, index)
    }

    fn configuration_last_modified(&self) -> DateTime<Utc> {
        self.inner.configuration_last_modified()
    }
}
