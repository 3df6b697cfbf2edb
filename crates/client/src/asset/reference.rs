//! Caller-usable handle to a cached payload.

use assetcache_core::Classification;
use assetcache_core::classify::mime_type_for;
use base64::{Engine, engine::general_purpose::STANDARD};
use bytes::Bytes;

/// A resolved resource, served from the store or freshly retrieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedAsset {
    url: String,
    classification: Classification,
    bytes: Bytes,
}

impl CachedAsset {
    pub fn new(url: impl Into<String>, classification: Classification, bytes: Bytes) -> Self {
        Self { url: url.into(), classification, bytes }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn classification(&self) -> Classification {
        self.classification
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn mime_type(&self) -> &'static str {
        mime_type_for(&self.url)
    }

    /// Encode the payload as a `data:` URL that resolves without network access.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), STANDARD.encode(&self.bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url_decodes_to_payload() {
        let payload = Bytes::from_static(b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>");
        let asset = CachedAsset::new("https://x.io/logo.svg", Classification::VectorImage, payload.clone());

        let data_url = asset.to_data_url();
        let encoded = data_url.strip_prefix("data:image/svg+xml;base64,").unwrap();
        assert_eq!(STANDARD.decode(encoded).unwrap(), payload.to_vec());
    }

    #[test]
    fn test_accessors() {
        let asset = CachedAsset::new("https://x.io/a.png", Classification::RasterImage, Bytes::from_static(&[1, 2, 3]));
        assert_eq!(asset.url(), "https://x.io/a.png");
        assert_eq!(asset.size_bytes(), 3);
        assert_eq!(asset.mime_type(), "image/png");
        assert_eq!(asset.into_bytes(), Bytes::from_static(&[1, 2, 3]));
    }
}
