//! Headless screen state for the two studio flows and the shell that
//! switches between them.

pub mod generator;
pub mod remover;

use tokio::sync::mpsc::{self, UnboundedReceiver};

pub use generator::ImageGenerator;
pub use remover::BackgroundRemover;

use crate::{gemini::GeminiClient, models::ResultImage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenState {
    Idle,
    ReadyToAct,
    Pending,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Remover,
    Generator,
}

impl Tab {
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Remover => "Background Remover",
            Tab::Generator => "Image Generator",
        }
    }
}

#[derive(Debug, Clone)]
pub enum StudioEvent {
    /// A generated image the user wants to cut out.
    ImageGenerated(ResultImage),
}

pub struct Studio {
    client: GeminiClient,
    active_tab: Tab,
    remover: BackgroundRemover,
    generator: ImageGenerator,
    events: UnboundedReceiver<StudioEvent>,
}

impl Studio {
    pub fn new(client: GeminiClient) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            client,
            active_tab: Tab::Remover,
            remover: BackgroundRemover::new(),
            generator: ImageGenerator::new(tx),
            events: rx,
        }
    }

    pub fn client(&self) -> &GeminiClient {
        &self.client
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab
    }

    pub fn select_tab(&mut self, tab: Tab) {
        self.active_tab = tab;
    }

    pub fn remover(&self) -> &BackgroundRemover {
        &self.remover
    }

    pub fn remover_mut(&mut self) -> &mut BackgroundRemover {
        &mut self.remover
    }

    pub fn generator(&self) -> &ImageGenerator {
        &self.generator
    }

    pub fn generator_mut(&mut self) -> &mut ImageGenerator {
        &mut self.generator
    }

    pub async fn remove_background(&mut self) -> crate::Result<()> {
        self.remover.remove_background(self.client.image()).await
    }

    pub async fn generate(&mut self) -> crate::Result<()> {
        self.generator.generate(self.client.image()).await
    }

    /// Drains pending events. A generated image is re-encoded into the
    /// remover and brings that screen to the front. Returns how many events
    /// were handled.
    pub fn process_events(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events.try_recv() {
            match event {
                StudioEvent::ImageGenerated(image) => {
                    log::info!("🔁 Handing generated image to the background remover");
                    // Failures are shown on the remover screen.
                    let _ = self.remover.accept_generated(&image);
                    self.active_tab = Tab::Remover;
                }
            }
            handled += 1;
        }
        handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeminiConfig;
    use crate::error::GENERATION_FAILED_MESSAGE;
    use crate::gemini::mock::{self, MockTransport};
    use std::sync::Arc;

    const PIXEL: &str = "iVBORw0KGgo=";

    fn studio(mock: MockTransport) -> Studio {
        Studio::new(GeminiClient::with_transport(
            GeminiConfig::new(),
            Arc::new(mock),
        ))
    }

    #[tokio::test]
    async fn cat_upload_is_cut_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat.png");
        let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.resize(10 * 1024, 42);
        std::fs::write(&path, &bytes).unwrap();

        let mut studio =
            studio(MockTransport::new().push_content(Ok(mock::image_content("image/png", PIXEL))));
        assert_eq!(studio.active_tab(), Tab::Remover);

        studio.remover_mut().upload(&path).await.unwrap();
        studio.remove_background().await.unwrap();

        let remover = studio.remover();
        assert!(!remover.is_loading());
        assert_eq!(
            remover.result().unwrap().as_str(),
            format!("data:image/png;base64,{}", PIXEL)
        );
        let saved = remover.download(dir.path()).await.unwrap();
        assert!(saved.ends_with("background-removed.png"));
    }

    #[tokio::test]
    async fn empty_generation_reports_generic_error() {
        let mut studio = studio(MockTransport::new().push_prediction(Ok(Default::default())));
        studio.select_tab(Tab::Generator);
        studio.generator_mut().set_prompt("a red bicycle");

        let err = studio.generate().await.unwrap_err();
        assert!(err.is_empty_result());
        assert_eq!(studio.generator().error(), Some(GENERATION_FAILED_MESSAGE));
        assert!(!studio.generator().is_loading());
        assert_eq!(studio.active_tab(), Tab::Generator);
    }

    #[tokio::test]
    async fn generated_image_moves_to_remover() {
        let mut studio = studio(MockTransport::new().push_prediction(Ok(mock::prediction(PIXEL))));
        studio.select_tab(Tab::Generator);
        studio.generator_mut().set_prompt("a red bicycle");
        studio.generate().await.unwrap();

        assert!(studio.generator().use_for_background_removal().unwrap());
        assert_eq!(studio.process_events(), 1);

        assert_eq!(studio.active_tab(), Tab::Remover);
        let remover = studio.remover();
        let original = remover.original().unwrap();
        assert_eq!(
            original.data_url(),
            studio.generator().image().unwrap().as_str()
        );
        assert!(remover.result().is_none());
        assert!(remover.error().is_none());
        assert_eq!(remover.state(), ScreenState::ReadyToAct);
    }

    #[tokio::test]
    async fn handoff_replaces_previous_removal() {
        let mut studio = studio(
            MockTransport::new()
                .push_content(Ok(mock::image_content("image/png", PIXEL)))
                .push_prediction(Ok(mock::prediction("AAEC"))),
        );
        studio
            .remover_mut()
            .load_payload("cat.png", crate::models::ImagePayload::new(PIXEL, "image/png"));
        studio.remove_background().await.unwrap();
        assert!(studio.remover().result().is_some());

        studio.generator_mut().set_prompt("a dog");
        studio.generate().await.unwrap();
        studio.generator().use_for_background_removal().unwrap();
        studio.process_events();

        assert_eq!(studio.remover().original().unwrap().name, "generated_image.png");
        assert!(studio.remover().result().is_none());
    }

    #[test]
    fn no_events_is_a_no_op() {
        let mut studio = studio(MockTransport::new());
        studio.select_tab(Tab::Generator);
        assert_eq!(studio.process_events(), 0);
        assert_eq!(studio.active_tab(), Tab::Generator);
        assert_eq!(Tab::Generator.title(), "Image Generator");
    }
}
