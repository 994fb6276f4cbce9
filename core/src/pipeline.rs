use std::panic::{self, AssertUnwindSafe};

use image::{DynamicImage, RgbaImage};

use crate::cache_key::{CacheKey, ProcessorVersion};
use crate::canvas::Canvas;
use crate::config::RenderConfig;
use crate::entity::{ImageKind, MediaEntity};
use crate::format::OutputFormat;
use crate::processor::ImageProcessor;

/// What happened to a surface during [`Pipeline::render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// No registered processor claimed the image.
    Unprocessed,
    Processed { processor: String },
    /// The processor panicked; the surface was put back as it was.
    Recovered { processor: String },
}

impl RenderOutcome {
    pub fn processor(&self) -> Option<&str> {
        match self {
            RenderOutcome::Unprocessed => None,
            RenderOutcome::Processed { processor } | RenderOutcome::Recovered { processor } => {
                Some(processor)
            }
        }
    }
}

/// Explicit processor registry. Registration order is priority order; the
/// first processor configured for an image handles it.
pub struct Pipeline {
    processors: Vec<Box<dyn ImageProcessor>>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            processors: Vec::new(),
        }
    }

    pub fn register(&mut self, processor: Box<dyn ImageProcessor>) {
        log::debug!("Registered image processor {}", processor.name());
        self.processors.push(processor);
    }

    pub fn processors(&self) -> impl Iterator<Item = &dyn ImageProcessor> {
        self.processors.iter().map(|p| p.as_ref())
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Find the processor that applies to the given image.
    pub fn select(
        &self,
        entity: Option<&MediaEntity>,
        kind: ImageKind,
        index: u32,
    ) -> Option<&dyn ImageProcessor> {
        self.processors
            .iter()
            .find(|p| p.is_configured_to_process(entity, kind, index))
            .map(|p| p.as_ref())
    }

    pub fn cache_key(&self, entity: Option<&MediaEntity>, kind: ImageKind, index: u32) -> CacheKey {
        CacheKey {
            entity: entity.map(|e| e.id),
            kind,
            index,
            size: None,
            processor: self.select(entity, kind, index).map(|p| ProcessorVersion {
                name: p.name().to_string(),
                modified: p.configuration_last_modified(),
            }),
        }
    }

    pub fn requires_transparency(
        &self,
        entity: Option<&MediaEntity>,
        kind: ImageKind,
        index: u32,
    ) -> bool {
        self.select(entity, kind, index)
            .is_some_and(|p| p.requires_transparency())
    }

    pub fn output_format(
        &self,
        original: Option<OutputFormat>,
        entity: Option<&MediaEntity>,
        kind: ImageKind,
        index: u32,
        config: &RenderConfig,
    ) -> OutputFormat {
        OutputFormat::select(
            original,
            self.requires_transparency(entity, kind, index),
            config,
        )
    }

    /// Run the selected processor over `surface`. A panicking processor never
    /// takes the response down with it: the surface is restored and the
    /// image is served unprocessed.
    pub fn render(
        &self,
        source: &DynamicImage,
        surface: &mut RgbaImage,
        entity: Option<&MediaEntity>,
        kind: ImageKind,
        index: u32,
    ) -> RenderOutcome {
        let Some(processor) = self.select(entity, kind, index) else {
            log::debug!("No processor configured for {} image {}", kind, index);
            return RenderOutcome::Unprocessed;
        };

        let snapshot = surface.clone();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut canvas = Canvas::new(&mut *surface);
            processor.process_image(source, &mut canvas, entity, kind, index);
        }));

        let name = processor.name().to_string();
        match result {
            Ok(()) => {
                log::debug!("{} processed {} image {}", name, kind, index);
                RenderOutcome::Processed { processor: name }
            }
            Err(_) => {
                log::error!(
                    "{} panicked on {} image {}; serving unprocessed image",
                    name,
                    kind,
                    index
                );
                *surface = snapshot;
                RenderOutcome::Recovered { processor: name }
            }
        }
    }
}
