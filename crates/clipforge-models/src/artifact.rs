//! Artifact identifiers and container formats.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a stored artifact file.
///
/// Always freshly generated; never derived from user input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(String);

impl ArtifactId {
    /// Generate a new random artifact ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name for this artifact in the given format.
    pub fn file_name(&self, format: VideoFormat) -> String {
        format!("{}.{}", self.0, format.extension())
    }
}

impl Default for ArtifactId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Container formats the pipeline knows how to label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VideoFormat {
    #[default]
    Mp4,
    Webm,
    Gif,
}

impl VideoFormat {
    pub const ALL: [VideoFormat; 3] = [VideoFormat::Mp4, VideoFormat::Webm, VideoFormat::Gif];

    pub fn extension(&self) -> &'static str {
        match self {
            VideoFormat::Mp4 => "mp4",
            VideoFormat::Webm => "webm",
            VideoFormat::Gif => "gif",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            VideoFormat::Mp4 => "video/mp4",
            VideoFormat::Webm => "video/webm",
            VideoFormat::Gif => "image/gif",
        }
    }

    /// Parse a file extension (without the dot, case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(ext))
    }

    /// Guess the format from a download URL, defaulting to MP4.
    pub fn guess_from_url(url: &str) -> Self {
        let lower = url.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| lower.contains(&format!(".{}", f.extension())))
            .unwrap_or_default()
    }

    /// Detect the format from leading magic bytes, if any match.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(VideoFormat::Gif)
        } else if bytes.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
            Some(VideoFormat::Webm)
        } else if bytes.get(4..8) == Some(b"ftyp".as_slice()) {
            Some(VideoFormat::Mp4)
        } else {
            None
        }
    }

    /// Like [`VideoFormat::from_magic`], defaulting to MP4.
    pub fn sniff(bytes: &[u8]) -> Self {
        Self::from_magic(bytes).unwrap_or(VideoFormat::Mp4)
    }
}

impl fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_ids_are_unique_and_safe() {
        let a = ArtifactId::new();
        let b = ArtifactId::new();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert!(a.file_name(VideoFormat::Webm).ends_with(".webm"));
    }

    #[test]
    fn test_guess_from_url() {
        assert_eq!(VideoFormat::guess_from_url("https://cdn.example.com/out.webm"), VideoFormat::Webm);
        assert_eq!(VideoFormat::guess_from_url("https://cdn.example.com/a.GIF?x=1"), VideoFormat::Gif);
        assert_eq!(VideoFormat::guess_from_url("https://cdn.example.com/a.mp4"), VideoFormat::Mp4);
        assert_eq!(VideoFormat::guess_from_url("https://cdn.example.com/blob"), VideoFormat::Mp4);
    }

    #[test]
    fn test_sniff() {
        assert_eq!(VideoFormat::sniff(b"GIF89a...."), VideoFormat::Gif);
        assert_eq!(VideoFormat::sniff(&[0x1A, 0x45, 0xDF, 0xA3, 0x01]), VideoFormat::Webm);
        assert_eq!(VideoFormat::sniff(b"\x00\x00\x00\x18ftypmp42"), VideoFormat::Mp4);
        assert_eq!(VideoFormat::sniff(b"raw"), VideoFormat::Mp4);

        assert_eq!(
            VideoFormat::from_magic(b"\x00\x00\x00\x18ftypisom"),
            Some(VideoFormat::Mp4)
        );
        assert_eq!(VideoFormat::from_magic(b"ftyp"), None);
        assert_eq!(VideoFormat::from_magic(b"unknown bytes"), None);
    }

    #[test]
    fn test_from_extension() {
        assert_eq!(VideoFormat::from_extension("MP4"), Some(VideoFormat::Mp4));
        assert_eq!(VideoFormat::from_extension("mov"), None);
    }
}
