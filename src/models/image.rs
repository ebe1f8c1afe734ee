use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{Result, StudioError};

pub const PNG_MIME_TYPE: &str = "image/png";
pub const SQUARE_ASPECT_RATIO: &str = "1:1";

pub const REMOVAL_INSTRUCTION: &str = "Remove the background from this image. The main subject should be preserved. The background must be transparent. Output a PNG image.";

/// Base64 image bytes (no data URL header) and their MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    pub data: String,
    pub mime_type: String,
}

impl ImagePayload {
    pub fn new(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn to_data_url(&self) -> String {
        format_data_url(&self.mime_type, &self.data)
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(&self.data)
            .map_err(|e| StudioError::Read(format!("Invalid base64 payload: {}", e)))
    }
}

/// A finished image as a `data:<mime>;base64,<data>` URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResultImage(String);

impl ResultImage {
    pub fn new(mime_type: &str, data: &str) -> Self {
        ResultImage(format_data_url(mime_type, data))
    }

    /// Wraps an existing data URL, rejecting anything that is not base64-encoded.
    pub fn from_data_url(url: impl Into<String>) -> Option<Self> {
        let url = url.into();
        parse_data_url(&url)?;
        Some(ResultImage(url))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn mime_type(&self) -> &str {
        parse_data_url(&self.0).map(|(mime, _)| mime).unwrap_or("")
    }

    /// The base64 segment of the URL.
    pub fn data(&self) -> &str {
        parse_data_url(&self.0).map(|(_, data)| data).unwrap_or("")
    }

    pub fn bytes(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(self.data())
            .map_err(|e| StudioError::Read(format!("Invalid base64 image data: {}", e)))
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.bytes()?;
        tokio::fs::write(path.as_ref(), bytes).await?;
        log::info!("💾 Image saved to: {}", path.as_ref().display());
        Ok(())
    }
}

impl fmt::Display for ResultImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ResultImage {
    type Error = String;

    fn try_from(url: String) -> std::result::Result<Self, Self::Error> {
        ResultImage::from_data_url(url).ok_or_else(|| "expected a base64 data URL".to_string())
    }
}

impl From<ResultImage> for String {
    fn from(image: ResultImage) -> Self {
        image.0
    }
}

impl AsRef<str> for ResultImage {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Text-to-image request. Only the prompt varies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub output_count: u32,
    pub output_mime_type: String,
    pub aspect_ratio: String,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            output_count: 1,
            output_mime_type: PNG_MIME_TYPE.to_string(),
            aspect_ratio: SQUARE_ASPECT_RATIO.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalRequest {
    pub source_image: ImagePayload,
    pub instruction: String,
}

impl RemovalRequest {
    pub fn new(source_image: ImagePayload) -> Self {
        Self {
            source_image,
            instruction: REMOVAL_INSTRUCTION.to_string(),
        }
    }
}

pub fn format_data_url(mime_type: &str, data: &str) -> String {
    format!("data:{};base64,{}", mime_type, data)
}

/// Splits `data:<mime>;base64,<data>` into its MIME type and base64 segment.
pub fn parse_data_url(url: &str) -> Option<(&str, &str)> {
    let rest = url.strip_prefix("data:")?;
    let (header, data) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    Some((mime, data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_data_url() {
        assert_eq!(
            parse_data_url("data:image/png;base64,iVBORw0KGgo="),
            Some(("image/png", "iVBORw0KGgo="))
        );
        assert_eq!(parse_data_url("data:image/png;base64,"), Some(("image/png", "")));
    }

    #[test]
    fn rejects_non_base64_or_malformed_urls() {
        assert_eq!(parse_data_url("data:text/plain,hello"), None);
        assert_eq!(parse_data_url("https://example.com/cat.png"), None);
        assert_eq!(parse_data_url("data:image/png;base64"), None);
        assert!(ResultImage::from_data_url("blob:abc").is_none());
    }

    #[test]
    fn result_image_exposes_segments() {
        let image = ResultImage::new("image/webp", "AAEC");
        assert_eq!(image.as_str(), "data:image/webp;base64,AAEC");
        assert_eq!(image.mime_type(), "image/webp");
        assert_eq!(image.data(), "AAEC");
        assert_eq!(image.bytes().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn payload_serializes_with_camel_case_mime() {
        let payload = ImagePayload::new("AAEC", "image/png");
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["mimeType"], "image/png");
        assert_eq!(json["data"], "AAEC");
        assert_eq!(payload.to_data_url(), "data:image/png;base64,AAEC");
    }

    #[test]
    fn requests_carry_fixed_configuration() {
        let generation = GenerationRequest::new("a red bicycle");
        assert_eq!(generation.output_count, 1);
        assert_eq!(generation.output_mime_type, "image/png");
        assert_eq!(generation.aspect_ratio, "1:1");

        let removal = RemovalRequest::new(ImagePayload::new("AAEC", "image/jpeg"));
        assert!(removal.instruction.contains("transparent"));
        assert_eq!(removal.source_image.mime_type, "image/jpeg");
    }

    #[tokio::test]
    async fn save_writes_decoded_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        ResultImage::new("image/png", "iVBORw0KGgo=")
            .save(&path)
            .await
            .unwrap();
        let written = std::fs::read(&path).unwrap();
        assert_eq!(written, vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }

    #[test]
    fn result_image_deserializes_only_from_data_urls() {
        let image: ResultImage =
            serde_json::from_str(r#""data:image/png;base64,iVBORw0KGgo=""#).unwrap();
        assert_eq!(image.mime_type(), "image/png");
        assert_eq!(
            serde_json::to_string(&image).unwrap(),
            r#""data:image/png;base64,iVBORw0KGgo=""#
        );

        assert!(serde_json::from_str::<ResultImage>(r#""not a data url""#).is_err());
        assert!(serde_json::from_str::<ResultImage>(r#""data:image/png,raw""#).is_err());
    }
}
