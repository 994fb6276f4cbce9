use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The media item that owns an image. Processors only pass it through or
/// inspect it for selection; they never mutate it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaEntity {
    pub id: Uuid,
    pub name: Option<String>,
}

impl MediaEntity {
    pub fn new(id: Uuid) -> Self {
        Self { id, name: None }
    }

    pub fn named(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
        }
    }
}

/// Role of an image relative to its entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    #[default]
    Primary,
    Art,
    Backdrop,
    Banner,
    Logo,
    Thumb,
    Disc,
    Box,
    Screenshot,
    Menu,
    Chapter,
}

impl ImageKind {
    pub const ALL: [ImageKind; 11] = [
        ImageKind::Primary,
        ImageKind::Art,
        ImageKind::Backdrop,
        ImageKind::Banner,
        ImageKind::Logo,
        ImageKind::Thumb,
        ImageKind::Disc,
        ImageKind::Box,
        ImageKind::Screenshot,
        ImageKind::Menu,
        ImageKind::Chapter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Art => "art",
            Self::Backdrop => "backdrop",
            Self::Banner => "banner",
            Self::Logo => "logo",
            Self::Thumb => "thumb",
            Self::Disc => "disc",
            Self::Box => "box",
            Self::Screenshot => "screenshot",
            Self::Menu => "menu",
            Self::Chapter => "chapter",
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == lower)
            .ok_or_else(|| format!("unknown image kind: {s}"))
    }
}
