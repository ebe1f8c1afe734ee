use crate::{
    error::{Operation, Result, ServiceFailure, StudioError},
    logger,
    models::{
        Content, GenerateContentRequest, GenerationConfig, GenerationRequest, ImagePayload,
        InlineData, OutputOptions, Part, PredictInstance, PredictParameters, PredictRequest,
        RemovalRequest, ResultImage, PNG_MIME_TYPE,
    },
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;

use super::transport::GeminiTransport;

#[derive(Clone)]
pub struct ImageClient {
    transport: Arc<dyn GeminiTransport>,
    edit_model: String,
    image_model: String,
}

impl ImageClient {
    pub fn new(
        transport: Arc<dyn GeminiTransport>,
        edit_model: impl Into<String>,
        image_model: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            edit_model: edit_model.into(),
            image_model: image_model.into(),
        }
    }

    pub fn edit_model(&self) -> &str {
        &self.edit_model
    }

    pub fn image_model(&self) -> &str {
        &self.image_model
    }

    /// Asks the edit model to cut the subject out onto a transparent
    /// background. Every failure comes back as the same user-safe
    /// [`StudioError::Service`]; details are only logged.
    pub async fn remove_background(&self, image: &ImagePayload) -> Result<ResultImage> {
        let request = RemovalRequest::new(image.clone());
        let _timer = logger::timer("remove_background");

        log::info!(
            "Removing background with model: {} ({})",
            self.edit_model,
            image.mime_type
        );

        self.send_removal(&request)
            .await
            .map_err(|failure| normalize(Operation::RemoveBackground, failure))
    }

    pub async fn generate_image(&self, prompt: &str) -> Result<ResultImage> {
        let request = GenerationRequest::new(prompt);
        let _timer = logger::timer("generate_image");

        log::info!("Generating image with model: {}", self.image_model);
        log::debug!("Prompt: {}", request.prompt);

        self.send_generation(&request)
            .await
            .map_err(|failure| normalize(Operation::GenerateImage, failure))
    }

    async fn send_removal(
        &self,
        request: &RemovalRequest,
    ) -> std::result::Result<ResultImage, ServiceFailure> {
        let payload = GenerateContentRequest {
            contents: vec![Content {
                role: None,
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: request.source_image.mime_type.clone(),
                            data: request.source_image.data.clone(),
                        },
                    },
                    Part::Text {
                        text: request.instruction.clone(),
                    },
                ],
            }],
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["IMAGE".to_string()],
            }),
        };

        let response = self
            .transport
            .generate_content(&self.edit_model, &payload)
            .await?;

        let image = response
            .first_inline_image()
            .ok_or(ServiceFailure::EmptyResult)?;
        ensure_base64(&image.data)?;

        Ok(ResultImage::new(&image.mime_type, &image.data))
    }

    async fn send_generation(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<ResultImage, ServiceFailure> {
        let payload = PredictRequest {
            instances: vec![PredictInstance {
                prompt: request.prompt.clone(),
            }],
            parameters: PredictParameters {
                sample_count: request.output_count,
                output_options: OutputOptions {
                    mime_type: request.output_mime_type.clone(),
                },
                aspect_ratio: request.aspect_ratio.clone(),
            },
        };

        let response = self.transport.predict(&self.image_model, &payload).await?;

        let bytes = response
            .first_image_bytes()
            .ok_or(ServiceFailure::EmptyResult)?;
        ensure_base64(bytes)?;

        Ok(ResultImage::new(PNG_MIME_TYPE, bytes))
    }
}

fn ensure_base64(data: &str) -> std::result::Result<(), ServiceFailure> {
    STANDARD
        .decode(data)
        .map(|_| ())
        .map_err(|e| ServiceFailure::Decode(format!("image data is not valid base64: {}", e)))
}

fn normalize(operation: Operation, failure: ServiceFailure) -> StudioError {
    log::error!("Gemini API error in {}: {}", operation, failure);
    StudioError::service(operation, failure)
}
