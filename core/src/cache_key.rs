use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::entity::ImageKind;

/// Identity and configuration epoch of the processor that shapes an image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ProcessorVersion {
    pub name: String,
    pub modified: DateTime<Utc>,
}

/// Everything a response cache must key on for a processed image. Changing
/// a processor's configuration epoch changes the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CacheKey {
    pub entity: Option<Uuid>,
    pub kind: ImageKind,
    pub index: u32,
    pub size: Option<(u32, u32)>,
    pub processor: Option<ProcessorVersion>,
}

impl CacheKey {
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Some((width, height));
        self
    }

    pub fn canonical(&self) -> String {
        let entity = self
            .entity
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".into());
        let size = self
            .size
            .map(|(w, h)| format!("{w}x{h}"))
            .unwrap_or_else(|| "source".into());
        let processor = self
            .processor
            .as_ref()
            .map(|p| {
                format!(
                    "{}@{}",
                    p.name,
                    p.modified.to_rfc3339_opts(SecondsFormat::Nanos, true)
                )
            })
            .unwrap_or_else(|| "none".into());
        format!("{entity}|{}|{}|{size}|{processor}", self.kind, self.index)
    }

    /// Strong ETag derived from the canonical key.
    pub fn etag(&self) -> String {
        let digest = Sha256::digest(self.canonical().as_bytes());
        let hex = format!("{:x}", digest);
        format!("\"{}\"", &hex[..32])
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.processor.as_ref().map(|p| p.modified)
    }
}

/// IMF-fixdate as used by `Last-Modified`.
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn key(modified: Option<DateTime<Utc>>) -> CacheKey {
        CacheKey {
            entity: Some(Uuid::nil()),
            kind: ImageKind::Backdrop,
            index: 2,
            size: None,
            processor: modified.map(|modified| ProcessorVersion {
                name: "rounded-corners".into(),
                modified,
            }),
        }
    }

    #[test]
    fn canonical_lists_every_component() {
        let at = Utc.with_ymd_and_hms(2013, 2, 21, 8, 30, 0).unwrap();
        assert_eq!(
            key(Some(at)).with_size(320, 180).canonical(),
            "00000000-0000-0000-0000-000000000000|backdrop|2|320x180|rounded-corners@2013-02-21T08:30:00.000000000Z"
        );
    }

    #[test]
    fn etag_changes_with_epoch() {
        let a = Utc.with_ymd_and_hms(2013, 2, 21, 8, 30, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2013, 2, 22, 8, 30, 0).unwrap();
        assert_ne!(key(Some(a)).etag(), key(Some(b)).etag());
        assert_eq!(key(Some(a)).etag(), key(Some(a)).etag());
    }

    #[test]
    fn etag_is_quoted_hex() {
        let etag = key(None).etag();
        assert_eq!(etag.len(), 34);
        assert!(etag.starts_with('"') && etag.ends_with('"'));
        assert!(etag[1..33].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn unprocessed_key_has_no_last_modified() {
        assert!(key(None).last_modified().is_none());
        assert!(key(None).canonical().ends_with("|none"));
    }

    #[test]
    fn http_date_uses_gmt() {
        let at = Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap();
        assert_eq!(http_date(at), "Sun, 06 Nov 1994 08:49:37 GMT");
    }
}
