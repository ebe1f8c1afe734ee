use std::path::{Path, PathBuf};

use super::ScreenState;
use crate::{
    encoder,
    error::{Result, StudioError},
    gemini::ImageClient,
    models::{ImagePayload, ResultImage},
};

pub const DOWNLOAD_NAME: &str = "background-removed.png";
pub const GENERATED_IMAGE_NAME: &str = "generated_image.png";

const READ_FAILED: &str = "Failed to read file. Please try another image.";
const HANDOFF_FAILED: &str = "Failed to load generated image.";
const NO_IMAGE: &str = "Please upload an image first.";
const BUSY: &str = "A request is already in progress.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalImage {
    pub name: String,
    pub payload: ImagePayload,
}

impl OriginalImage {
    pub fn data_url(&self) -> String {
        self.payload.to_data_url()
    }
}

/// Ties a response to the request that produced it.
#[derive(Debug, Clone)]
pub struct RemovalTicket {
    generation: u64,
    payload: ImagePayload,
}

impl RemovalTicket {
    pub fn payload(&self) -> &ImagePayload {
        &self.payload
    }
}

/// Background-removal screen.
#[derive(Debug, Default)]
pub struct BackgroundRemover {
    original: Option<OriginalImage>,
    result: Option<ResultImage>,
    loading: bool,
    error: Option<String>,
    generation: u64,
}

impl BackgroundRemover {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn original(&self) -> Option<&OriginalImage> {
        self.original.as_ref()
    }

    pub fn result(&self) -> Option<&ResultImage> {
        self.result.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn can_act(&self) -> bool {
        self.original.is_some() && !self.loading
    }

    pub fn state(&self) -> ScreenState {
        if self.loading {
            ScreenState::Pending
        } else if self.result.is_some() {
            ScreenState::Succeeded
        } else if self.error.is_some() {
            ScreenState::Failed
        } else if self.original.is_some() {
            ScreenState::ReadyToAct
        } else {
            ScreenState::Idle
        }
    }

    /// Encodes a file from disk and makes it the original image. A failed
    /// read keeps whatever image was loaded before.
    pub async fn upload(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.error = None;
        self.result = None;

        match encoder::encode_file(path).await {
            Ok(payload) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                self.load_payload(name, payload);
                Ok(())
            }
            Err(e) => {
                log::warn!("Upload of {} failed: {}", path.display(), e);
                self.error = Some(READ_FAILED.to_string());
                Err(e)
            }
        }
    }

    /// Replaces the original image. A request still in flight for the
    /// previous image is abandoned and its response will be dropped.
    pub fn load_payload(&mut self, name: impl Into<String>, payload: ImagePayload) {
        self.original = Some(OriginalImage {
            name: name.into(),
            payload,
        });
        self.result = None;
        self.error = None;
        self.loading = false;
        self.generation += 1;
    }

    /// Takes over an image produced by the generator screen. The data URL
    /// is decoded and re-encoded rather than shared.
    pub fn accept_generated(&mut self, image: &ResultImage) -> Result<()> {
        match encoder::payload_from_data_url(image.as_str()) {
            Ok(payload) => {
                self.load_payload(GENERATED_IMAGE_NAME, payload);
                Ok(())
            }
            Err(e) => {
                log::warn!("Could not re-encode generated image: {}", e);
                self.error = Some(HANDOFF_FAILED.to_string());
                Err(e)
            }
        }
    }

    /// Moves to Pending. Without an image, or while a request is already in
    /// flight, this records a validation error and hands out no ticket.
    pub fn begin_removal(&mut self) -> Result<RemovalTicket> {
        let payload = match (&self.original, self.loading) {
            (_, true) => return Err(StudioError::Validation(BUSY.to_string())),
            (None, false) => {
                self.error = Some(NO_IMAGE.to_string());
                return Err(StudioError::Validation(NO_IMAGE.to_string()));
            }
            (Some(original), false) => original.payload.clone(),
        };

        self.generation += 1;
        self.loading = true;
        self.error = None;
        self.result = None;

        Ok(RemovalTicket {
            generation: self.generation,
            payload,
        })
    }

    /// Applies a finished request. A stale ticket (the screen was cleared or
    /// re-armed since) is dropped and yields `Ok(false)`; a current failure
    /// is stored as the screen error and handed back.
    pub fn complete_removal(
        &mut self,
        ticket: RemovalTicket,
        outcome: Result<ResultImage>,
    ) -> Result<bool> {
        if ticket.generation != self.generation {
            log::debug!(
                "Discarding stale background-removal response (request {}, current {})",
                ticket.generation,
                self.generation
            );
            return Ok(false);
        }

        self.loading = false;
        match outcome {
            Ok(image) => {
                self.result = Some(image);
                self.error = None;
                Ok(true)
            }
            Err(e) => {
                self.result = None;
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn remove_background(&mut self, client: &ImageClient) -> Result<()> {
        let ticket = self.begin_removal()?;
        let outcome = client.remove_background(ticket.payload()).await;
        self.complete_removal(ticket, outcome).map(|_| ())
    }

    /// Drops the image, result and error. Any request still in flight will
    /// be ignored when it lands.
    pub fn clear(&mut self) {
        self.original = None;
        self.result = None;
        self.error = None;
        self.loading = false;
        self.generation += 1;
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Writes the result as `background-removed.png` inside `dir`.
    pub async fn download(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let image = self
            .result
            .as_ref()
            .ok_or_else(|| StudioError::Validation("No processed image to download.".into()))?;
        let path = dir.as_ref().join(DOWNLOAD_NAME);
        image.save(&path).await?;
        Ok(path)
    }
}
