//! Post-processing hooks for a media server's image responses.
//!
//! The host decodes and resizes an image, then lets a registered
//! [`ImageProcessor`] draw the final pixels before encoding. Processors also
//! tell the host whether the result needs an alpha-capable format and when
//! their configuration last changed, so cached responses can be invalidated.
//!
//! | Module | Role |
//! |--------|------|
//! | [`processor`] | The [`ImageProcessor`] contract and the bundled variants |
//! | [`pipeline`] | Host-owned registry: selection, cache keys, fault isolation |
//! | [`canvas`] / [`clip`] | Drawing context and clip outlines |
//! | [`resize`] / [`format`] / [`render`] | Host-side resize, encoding and the end-to-end render helper |

pub mod cache_key;
pub mod canvas;
pub mod clip;
pub mod config;
pub mod entity;
pub mod error;
pub mod format;
pub mod pipeline;
pub mod processor;
pub mod render;
pub mod resize;

pub use cache_key::CacheKey;
pub use canvas::Canvas;
pub use entity::{ImageKind, MediaEntity};
pub use error::{DrawError, ProcessingError};
pub use pipeline::{Pipeline, RenderOutcome};
pub use processor::{ImageProcessor, RoundedCornerProcessor, ScopedProcessor};
pub use render::{render_encoded, RenderRequest, Rendered};
