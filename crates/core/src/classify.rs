//! URL eligibility and classification.
//!
//! Decides from the URL alone whether a resource may ever be cached.
//! The block-list is consulted first (video and animated images are large
//! and usually viewed once), then the allow-list. Anything else is
//! ineligible. No store or network access happens here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Extensions that are never cached.
pub const BLOCKED_EXTENSIONS: &[&str] = &[
    "gif", "apng", "mp4", "webm", "mov", "avi", "mkv", "m4v", "ogv", "flv", "wmv", "mpeg", "mpg",
];

/// Still-image extensions.
pub const RASTER_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "ico", "avif", "tif", "tiff"];

/// Vector-image extensions.
pub const VECTOR_EXTENSIONS: &[&str] = &["svg"];

/// Documents, fonts, stylesheets, scripts and structured text.
pub const OTHER_EXTENSIONS: &[&str] = &[
    "pdf", "woff", "woff2", "ttf", "otf", "eot", "css", "js", "json", "xml", "txt",
];

/// Kind of cached resource, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    RasterImage,
    VectorImage,
    Other,
}

impl Classification {
    pub const ALL: [Classification; 3] =
        [Classification::RasterImage, Classification::VectorImage, Classification::Other];

    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::RasterImage => "raster_image",
            Classification::VectorImage => "vector_image",
            Classification::Other => "other",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raster_image" => Ok(Classification::RasterImage),
            "vector_image" => Ok(Classification::VectorImage),
            "other" => Ok(Classification::Other),
            other => Err(format!("unknown classification: {other}")),
        }
    }
}

/// Extract the lowercased extension of the URL's final path segment.
///
/// Query string and fragment are ignored. Returns None when the last
/// segment has no `.` or ends with one.
pub fn extension_of(url: &str) -> Option<String> {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    let path = &url[..end];
    let path = path.split_once("://").map_or(path, |(_, rest)| rest.split_once('/').map_or("", |(_, p)| p));
    let segment = path.rsplit('/').next()?;
    let (_, ext) = segment.rsplit_once('.')?;

    if ext.is_empty() { None } else { Some(ext.to_ascii_lowercase()) }
}

/// Classify a URL, returning None if it must never be cached.
pub fn classify(url: &str) -> Option<Classification> {
    let ext = extension_of(url)?;
    let ext = ext.as_str();

    if BLOCKED_EXTENSIONS.contains(&ext) {
        return None;
    }

    if RASTER_EXTENSIONS.contains(&ext) {
        Some(Classification::RasterImage)
    } else if VECTOR_EXTENSIONS.contains(&ext) {
        Some(Classification::VectorImage)
    } else if OTHER_EXTENSIONS.contains(&ext) {
        Some(Classification::Other)
    } else {
        None
    }
}

/// Whether a URL may be cached at all.
pub fn is_eligible(url: &str) -> bool {
    classify(url).is_some()
}

/// MIME type used when handing a payload back as a data URL.
pub fn mime_type_for(url: &str) -> &'static str {
    match extension_of(url).as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("ico") => "image/x-icon",
        Some("avif") => "image/avif",
        Some("tif" | "tiff") => "image/tiff",
        Some("svg") => "image/svg+xml",
        Some("pdf") => "application/pdf",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",
        Some("eot") => "application/vnd.ms-fontobject",
        Some("css") => "text/css",
        Some("js") => "text/javascript",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gif_is_blocked() {
        assert_eq!(classify("https://cdn.example.com/a.gif"), None);
    }

    #[test]
    fn test_png_is_raster() {
        assert_eq!(classify("https://cdn.example.com/a.png"), Some(Classification::RasterImage));
    }

    #[test]
    fn test_unlisted_extension_is_ineligible() {
        assert_eq!(classify("https://cdn.example.com/a.mp3"), None);
        assert!(!is_eligible("https://cdn.example.com/a.mp3"));
    }

    #[test]
    fn test_svg_is_vector() {
        assert_eq!(classify("https://cdn.example.com/icons/logo.svg"), Some(Classification::VectorImage));
    }

    #[test]
    fn test_fonts_and_scripts_are_other() {
        for url in ["https://x.io/f.woff2", "https://x.io/s.css", "https://x.io/app.js", "https://x.io/d.json"] {
            assert_eq!(classify(url), Some(Classification::Other), "{url}");
        }
    }

    #[test]
    fn test_video_blocked() {
        assert_eq!(classify("https://x.io/clip.mp4"), None);
        assert_eq!(classify("https://x.io/clip.WEBM"), None);
    }

    #[test]
    fn test_query_and_fragment_ignored() {
        assert_eq!(classify("https://x.io/a.png?v=3"), Some(Classification::RasterImage));
        assert_eq!(classify("https://x.io/a.svg#icon"), Some(Classification::VectorImage));
        assert_eq!(classify("https://x.io/image?format=png"), None);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(classify("https://x.io/PHOTO.JPG"), Some(Classification::RasterImage));
    }

    #[test]
    fn test_extension_only_from_last_segment() {
        assert_eq!(extension_of("https://cdn.v1.example.com/asset"), None);
        assert_eq!(extension_of("https://x.io/dir.png/file"), None);
        assert_eq!(extension_of("https://x.io/file."), None);
        assert_eq!(extension_of("/relative/pic.webp").as_deref(), Some("webp"));
    }

    #[test]
    fn test_host_without_path() {
        assert_eq!(classify("https://example.png"), None);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let url = "https://x.io/a.jpeg";
        assert_eq!(classify(url), classify(url));
    }

    #[test]
    fn test_classification_round_trips_through_storage_form() {
        for c in Classification::ALL {
            assert_eq!(c.as_str().parse::<Classification>().unwrap(), c);
        }
        assert!("image".parse::<Classification>().is_err());
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(mime_type_for("https://x.io/a.svg"), "image/svg+xml");
        assert_eq!(mime_type_for("https://x.io/a.woff2"), "font/woff2");
        assert_eq!(mime_type_for("https://x.io/a.bin"), "application/octet-stream");
    }
}
