use std::path::{Path, PathBuf};
use tokio::sync::mpsc::UnboundedSender;

use super::{ScreenState, StudioEvent};
use crate::{
    error::{Result, StudioError},
    gemini::ImageClient,
    models::ResultImage,
};

pub const DOWNLOAD_NAME: &str = "generated-image.png";

const EMPTY_PROMPT: &str = "Please enter a prompt.";
const BUSY: &str = "A request is already in progress.";

#[derive(Debug, Clone)]
pub struct GenerationTicket {
    generation: u64,
    prompt: String,
}

impl GenerationTicket {
    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

/// Text-to-image screen. Finished images can be handed to the
/// background-removal screen through the studio event channel.
#[derive(Debug)]
pub struct ImageGenerator {
    prompt: String,
    image: Option<ResultImage>,
    loading: bool,
    error: Option<String>,
    edited: bool,
    generation: u64,
    events: UnboundedSender<StudioEvent>,
}

impl ImageGenerator {
    pub fn new(events: UnboundedSender<StudioEvent>) -> Self {
        Self {
            prompt: String::new(),
            image: None,
            loading: false,
            error: None,
            edited: false,
            generation: 0,
            events,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn image(&self) -> Option<&ResultImage> {
        self.image.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn state(&self) -> ScreenState {
        if self.loading {
            ScreenState::Pending
        } else if self.edited {
            if self.prompt.trim().is_empty() {
                ScreenState::Idle
            } else {
                ScreenState::ReadyToAct
            }
        } else if self.image.is_some() {
            ScreenState::Succeeded
        } else if self.error.is_some() {
            ScreenState::Failed
        } else if !self.prompt.trim().is_empty() {
            ScreenState::ReadyToAct
        } else {
            ScreenState::Idle
        }
    }

    /// Editing the prompt after a result or failure makes the screen ready
    /// again. The last image stays available for download and handoff.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
        if !self.loading {
            self.edited = true;
            self.error = None;
        }
    }

    /// The prompt is sent as typed; only its emptiness is judged trimmed.
    pub fn begin_generation(&mut self) -> Result<GenerationTicket> {
        if self.loading {
            return Err(StudioError::Validation(BUSY.to_string()));
        }
        self.edited = false;
        if self.prompt.trim().is_empty() {
            self.error = Some(EMPTY_PROMPT.to_string());
            return Err(StudioError::Validation(EMPTY_PROMPT.to_string()));
        }

        self.generation += 1;
        self.loading = true;
        self.error = None;
        self.image = None;

        Ok(GenerationTicket {
            generation: self.generation,
            prompt: self.prompt.clone(),
        })
    }

    pub fn complete_generation(
        &mut self,
        ticket: GenerationTicket,
        outcome: Result<ResultImage>,
    ) -> Result<bool> {
        if ticket.generation != self.generation {
            log::debug!(
                "Discarding stale generation response (request {}, current {})",
                ticket.generation,
                self.generation
            );
            return Ok(false);
        }

        self.loading = false;
        match outcome {
            Ok(image) => {
                self.image = Some(image);
                self.error = None;
                Ok(true)
            }
            Err(e) => {
                self.image = None;
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn generate(&mut self, client: &ImageClient) -> Result<()> {
        let ticket = self.begin_generation()?;
        let outcome = client.generate_image(ticket.prompt()).await;
        self.complete_generation(ticket, outcome).map(|_| ())
    }

    /// Emits the current image to the studio, which switches to the
    /// background-removal screen. No-op without an image.
    pub fn use_for_background_removal(&self) -> Result<bool> {
        let Some(image) = self.image.clone() else {
            return Ok(false);
        };
        self.events
            .send(StudioEvent::ImageGenerated(image))
            .map_err(|_| StudioError::Validation("The studio is no longer listening.".into()))?;
        Ok(true)
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub async fn download(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let image = self
            .image
            .as_ref()
            .ok_or_else(|| StudioError::Validation("No generated image to download.".into()))?;
        let path = dir.as_ref().join(DOWNLOAD_NAME);
        image.save(&path).await?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GENERATION_FAILED_MESSAGE;
    use crate::gemini::mock::{self, MockTransport};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    const PIXEL: &str = "iVBORw0KGgo=";

    fn screen() -> (ImageGenerator, mpsc::UnboundedReceiver<StudioEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ImageGenerator::new(tx), rx)
    }

    fn client(mock: MockTransport) -> (ImageClient, Arc<MockTransport>) {
        let mock = Arc::new(mock);
        (ImageClient::new(mock.clone(), "edit", "image"), mock)
    }

    #[tokio::test]
    async fn blank_prompts_never_reach_the_service() {
        let (client, mock) = client(MockTransport::new());
        let (mut screen, _rx) = screen();

        for prompt in ["", "   ", "\n\t "] {
            screen.set_prompt(prompt);
            let err = screen.generate(&client).await.unwrap_err();
            assert!(matches!(err, StudioError::Validation(_)));
            assert_eq!(screen.error(), Some("Please enter a prompt."));
            assert!(!screen.is_loading());
        }
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn generates_and_offers_download() {
        let dir = tempfile::tempdir().unwrap();
        let (client, _) = client(MockTransport::new().push_prediction(Ok(mock::prediction(PIXEL))));
        let (mut screen, _rx) = screen();

        screen.set_prompt("a red bicycle");
        assert_eq!(screen.state(), ScreenState::ReadyToAct);
        screen.generate(&client).await.unwrap();

        assert_eq!(screen.state(), ScreenState::Succeeded);
        assert_eq!(screen.image().unwrap().mime_type(), "image/png");

        let saved = screen.download(dir.path()).await.unwrap();
        assert_eq!(saved.file_name().unwrap(), "generated-image.png");
    }

    #[tokio::test]
    async fn empty_response_shows_generic_failure() {
        let (client, _) = client(MockTransport::new().push_prediction(Ok(Default::default())));
        let (mut screen, _rx) = screen();

        screen.set_prompt("a red bicycle");
        let err = screen.generate(&client).await.unwrap_err();

        assert!(err.is_empty_result());
        assert_eq!(
            std::error::Error::source(&err).unwrap().to_string(),
            "No image data returned from API."
        );
        assert_eq!(screen.error(), Some(GENERATION_FAILED_MESSAGE));
        assert!(!screen.is_loading());
        assert!(screen.image().is_none());
        assert_eq!(screen.state(), ScreenState::Failed);
    }

    #[test]
    fn editing_the_prompt_makes_the_screen_ready_again() {
        let (mut screen, _rx) = screen();
        screen.set_prompt("a cat");
        let ticket = screen.begin_generation().unwrap();
        screen
            .complete_generation(ticket, Ok(ResultImage::new("image/png", PIXEL)))
            .unwrap();
        assert_eq!(screen.state(), ScreenState::Succeeded);

        screen.set_prompt("a cat wearing a hat");
        assert_eq!(screen.state(), ScreenState::ReadyToAct);
        assert!(screen.image().is_some());

        let ticket = screen.begin_generation().unwrap();
        let err = StudioError::service(
            crate::error::Operation::GenerateImage,
            crate::error::ServiceFailure::EmptyResult,
        );
        assert!(screen.complete_generation(ticket, Err(err)).is_err());
        assert_eq!(screen.state(), ScreenState::Failed);

        screen.set_prompt("a dog");
        assert_eq!(screen.state(), ScreenState::ReadyToAct);
        assert!(screen.error().is_none());

        screen.set_prompt("  ");
        assert_eq!(screen.state(), ScreenState::Idle);
    }

    #[test]
    fn pending_screen_rejects_another_request() {
        let (mut screen, _rx) = screen();
        screen.set_prompt("a cat");
        let ticket = screen.begin_generation().unwrap();
        assert_eq!(ticket.prompt(), "a cat");
        assert!(matches!(
            screen.begin_generation(),
            Err(StudioError::Validation(_))
        ));
    }

    #[test]
    fn handoff_emits_a_copy_of_the_image() {
        let (mut screen, mut rx) = screen();
        assert!(!screen.use_for_background_removal().unwrap());

        screen.set_prompt("a cat");
        let ticket = screen.begin_generation().unwrap();
        screen
            .complete_generation(ticket, Ok(ResultImage::new("image/png", PIXEL)))
            .unwrap();

        assert!(screen.use_for_background_removal().unwrap());
        match rx.try_recv().unwrap() {
            StudioEvent::ImageGenerated(image) => {
                assert_eq!(Some(&image), screen.image());
            }
        }
    }

    #[test]
    fn handoff_fails_when_nobody_listens() {
        let (mut screen, rx) = screen();
        drop(rx);
        screen.set_prompt("a cat");
        let ticket = screen.begin_generation().unwrap();
        screen
            .complete_generation(ticket, Ok(ResultImage::new("image/png", PIXEL)))
            .unwrap();
        assert!(screen.use_for_background_removal().is_err());
    }
}
