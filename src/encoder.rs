//! Turns user-supplied image files into [`ImagePayload`]s ready for the wire.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ImageFormat;
use std::path::Path;

use crate::{
    error::{Result, StudioError},
    models::{format_data_url, parse_data_url, ImagePayload},
};

pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

const READ_FAILED: &str = "Failed to read file as base64.";

/// Reads a whole file and encodes it. The MIME type is the one the file
/// declares through its extension, or sniffed from its header when the
/// extension is unknown.
pub async fn encode_file(path: impl AsRef<Path>) -> Result<ImagePayload> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        log::warn!("Could not read {}: {}", path.display(), e);
        StudioError::Read(format!("{} ({})", READ_FAILED, e))
    })?;

    let mime_type = declared_mime_type(path, &bytes);
    log::debug!(
        "Encoding {} ({} bytes, {})",
        path.display(),
        bytes.len(),
        mime_type
    );
    encode_bytes(&bytes, &mime_type)
}

/// Encodes in-memory bytes by building the data URL and keeping only its
/// base64 segment.
pub fn encode_bytes(bytes: &[u8], mime_type: &str) -> Result<ImagePayload> {
    let data_url = format_data_url(mime_type, &STANDARD.encode(bytes));

    match parse_data_url(&data_url) {
        Some((_, data)) if !data.is_empty() => Ok(ImagePayload::new(data, mime_type)),
        _ => Err(StudioError::Read(READ_FAILED.to_string())),
    }
}

/// Re-materializes an image held as a data URL: decodes it to raw bytes and
/// encodes those again as a fresh payload.
pub fn payload_from_data_url(url: &str) -> Result<ImagePayload> {
    let (mime_type, data) = parse_data_url(url)
        .ok_or_else(|| StudioError::Read("Not a base64 data URL.".to_string()))?;
    let bytes = STANDARD
        .decode(data)
        .map_err(|e| StudioError::Read(format!("{} ({})", READ_FAILED, e)))?;
    encode_bytes(&bytes, mime_type)
}

pub fn declared_mime_type(path: &Path, bytes: &[u8]) -> String {
    ImageFormat::from_path(path)
        .or_else(|_| image::guess_format(bytes))
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| FALLBACK_MIME_TYPE.to_string())
}
