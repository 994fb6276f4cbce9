use std::fmt;
use std::str::FromStr;

use image::imageops::FilterType;

use crate::format::OutputFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl ResizeFilter {
    pub fn filter_type(self) -> FilterType {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Triangle => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Gaussian => FilterType::Gaussian,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl fmt::Display for ResizeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nearest => write!(f, "nearest"),
            Self::Triangle => write!(f, "triangle"),
            Self::CatmullRom => write!(f, "catmull-rom"),
            Self::Gaussian => write!(f, "gaussian"),
            Self::Lanczos3 => write!(f, "lanczos3"),
        }
    }
}

impl FromStr for ResizeFilter {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "triangle" => Ok(Self::Triangle),
            "catmull-rom" | "catmullrom" => Ok(Self::CatmullRom),
            "gaussian" => Ok(Self::Gaussian),
            "lanczos3" | "lanczos" => Ok(Self::Lanczos3),
            _ => Err(format!("unknown resize filter: {s}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Target width in pixels (None = derive from height / keep source)
    pub width: Option<u32>,
    /// Target height in pixels (None = derive from width / keep source)
    pub height: Option<u32>,
    /// Resampling filter used by the host resize step
    pub filter: ResizeFilter,
    /// Lossy encoding quality 1-100 (JPEG, WebP)
    pub quality: u8,
    /// Format used when the source format cannot be re-encoded
    pub default_format: OutputFormat,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            filter: ResizeFilter::Lanczos3,
            quality: 85,
            default_format: OutputFormat::Jpeg,
        }
    }
}
