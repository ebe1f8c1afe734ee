pub mod image_client;
pub mod mock;
pub mod transport;

use crate::{config::GeminiConfig, error::Result};
use std::sync::Arc;

pub use image_client::ImageClient;
pub use transport::{GeminiTransport, HttpTransport};

/// Client handle for the Generative Language API. Holds no per-request
/// state, so building one per call is as good as sharing one.
#[derive(Clone)]
pub struct GeminiClient {
    image_client: ImageClient,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: GeminiConfig, transport: Arc<dyn GeminiTransport>) -> Self {
        Self {
            image_client: ImageClient::new(transport, config.edit_model(), config.image_model()),
        }
    }

    pub fn image(&self) -> &ImageClient {
        &self.image_client
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StudioError;
    use super::mock::MockTransport;

    #[test]
    fn refuses_to_build_without_credentials() {
        let err = GeminiClient::new(GeminiConfig::new()).err().unwrap();
        assert!(matches!(err, StudioError::Config(_)));
    }

    #[test]
    fn builds_with_key_and_model_overrides() {
        let config = GeminiConfig::new()
            .with_api_key("key")
            .with_models("my-edit", "my-image");
        let client = GeminiClient::new(config).unwrap();
        assert_eq!(client.image().edit_model(), "my-edit");
        assert_eq!(client.image().image_model(), "my-image");
    }

    #[test]
    fn injected_transport_uses_default_models() {
        let client = GeminiClient::with_transport(GeminiConfig::new(), Arc::new(MockTransport::new()));
        assert_eq!(client.image().edit_model(), crate::config::DEFAULT_EDIT_MODEL);
        assert_eq!(client.image().image_model(), crate::config::DEFAULT_IMAGE_MODEL);
    }
}
