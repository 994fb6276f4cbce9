use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write file {path}: {source}")]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("encoding failed: {0}")]
    Encode(String),

    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Faults raised by canvas and clip primitives. Processors absorb these
/// and fall back to the unmodified surface.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DrawError {
    #[error("surface has no pixels")]
    EmptySurface,

    #[error("clip path collapses to {points} distinct pixel(s)")]
    DegeneratePath { points: usize },

    #[error("clip mask is {mask_width}x{mask_height}, surface is {width}x{height}")]
    ClipSizeMismatch {
        mask_width: u32,
        mask_height: u32,
        width: u32,
        height: u32,
    },
}
