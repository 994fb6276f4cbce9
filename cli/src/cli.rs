use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use imagepost_core::config::{RenderConfig, ResizeFilter};
use imagepost_core::{ImageKind, Pipeline, RoundedCornerProcessor, ScopedProcessor};

/// Resize images and run them through post-processors before serving
#[derive(Debug, Parser)]
#[command(name = "imagepost", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resize images and apply the registered processors
    Render {
        /// Input file or directory
        input: PathBuf,

        /// Output file or directory (default: <name>.processed.<ext> next to the input)
        output: Option<PathBuf>,

        /// Target width in pixels
        #[arg(long)]
        width: Option<u32>,

        /// Target height in pixels
        #[arg(long)]
        height: Option<u32>,

        /// Role of the images (primary, backdrop, banner, ...)
        #[arg(short, long, default_value_t = ImageKind::Primary)]
        kind: ImageKind,

        /// Index among images of the same kind
        #[arg(long, default_value_t = 0)]
        index: u32,

        /// Id of the owning media entity
        #[arg(long)]
        entity: Option<Uuid>,

        /// Restrict rounded corners to these kinds (repeatable)
        #[arg(long = "only-kind", value_name = "KIND")]
        only_kind: Vec<ImageKind>,

        /// Resampling filter
        #[arg(long, default_value_t = ResizeFilter::Lanczos3)]
        filter: ResizeFilter,

        /// Quality for lossy formats (1-100)
        #[arg(short, long, default_value_t = 85, value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: u8,

        /// Process directories recursively
        #[arg(short, long)]
        recursive: bool,

        /// Show what would be done without writing files
        #[arg(long)]
        dry_run: bool,
    },

    /// List the registered processors
    Processors {
        /// Restrict rounded corners to these kinds (repeatable)
        #[arg(long = "only-kind", value_name = "KIND")]
        only_kind: Vec<ImageKind>,
    },

    /// Print the cache key and ETag for an image without rendering it
    CacheKey {
        /// Id of the owning media entity
        #[arg(long)]
        entity: Option<Uuid>,

        /// Role of the image
        #[arg(short, long, default_value_t = ImageKind::Primary)]
        kind: ImageKind,

        /// Index among images of the same kind
        #[arg(long, default_value_t = 0)]
        index: u32,

        /// Restrict rounded corners to these kinds (repeatable)
        #[arg(long = "only-kind", value_name = "KIND")]
        only_kind: Vec<ImageKind>,
    },
}

impl Cli {
    pub fn to_config(
        &self,
        cmd_width: Option<u32>,
        cmd_height: Option<u32>,
        cmd_filter: ResizeFilter,
        cmd_quality: u8,
    ) -> RenderConfig {
        RenderConfig {
            width: cmd_width,
            height: cmd_height,
            filter: cmd_filter,
            quality: cmd_quality,
            ..RenderConfig::default()
        }
    }
}

/// Processors in priority order. Rounded corners apply everywhere unless
/// `only_kind` narrows them.
pub fn build_pipeline(only_kind: &[ImageKind]) -> Pipeline {
    let mut pipeline = Pipeline::new();
    let rounded = Box::new(RoundedCornerProcessor::new());
    if only_kind.is_empty() {
        pipeline.register(rounded);
    } else {
        pipeline.register(Box::new(ScopedProcessor::new(
            rounded,
            only_kind.iter().copied(),
        )));
    }
    pipeline
}
