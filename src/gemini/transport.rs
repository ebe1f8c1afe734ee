use crate::{
    config::GeminiConfig,
    error::{Result, ServiceFailure, StudioError},
    models::{
        ApiErrorEnvelope, GenerateContentRequest, GenerateContentResponse, PredictRequest,
        PredictResponse,
    },
};
use async_trait::async_trait;
use reqwest::{header::HeaderMap, Client};
use serde::{de::DeserializeOwned, Serialize};

pub type TransportResult<T> = std::result::Result<T, ServiceFailure>;

/// One round trip per call; implementations never retry.
#[async_trait]
pub trait GeminiTransport: Send + Sync {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> TransportResult<GenerateContentResponse>;

    async fn predict(&self, model: &str, request: &PredictRequest)
        -> TransportResult<PredictResponse>;
}

pub struct HttpTransport {
    client: Client,
    api_key: String,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| StudioError::Config("Gemini API key is required (set API_KEY)".into()))?;

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| StudioError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url().to_string(),
        })
    }

    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let key = self
            .api_key
            .parse()
            .map_err(|_| StudioError::Config("API key is not a valid header value".into()))?;
        headers.insert("x-goog-api-key", key);
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        Ok(headers)
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    async fn post<B, R>(&self, url: String, body: &B) -> TransportResult<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let headers = self
            .build_headers()
            .map_err(|e| ServiceFailure::Transport(e.to_string()))?;

        log::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| ServiceFailure::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ServiceFailure::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(api_failure(status.as_u16(), &text));
        }

        serde_json::from_str(&text).map_err(|e| ServiceFailure::Decode(e.to_string()))
    }
}

#[async_trait]
impl GeminiTransport for HttpTransport {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> TransportResult<GenerateContentResponse> {
        self.post(self.endpoint(model, "generateContent"), request)
            .await
    }

    async fn predict(
        &self,
        model: &str,
        request: &PredictRequest,
    ) -> TransportResult<PredictResponse> {
        self.post(self.endpoint(model, "predict"), request).await
    }
}

fn api_failure(status: u16, body: &str) -> ServiceFailure {
    let message = serde_json::from_str::<ApiErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| {
            let status_name = envelope.error.status.unwrap_or_default();
            envelope.error.message.map(|m| {
                if status_name.is_empty() {
                    m
                } else {
                    format!("{}: {}", status_name, m)
                }
            })
        })
        .unwrap_or_else(|| body.chars().take(200).collect());

    ServiceFailure::Api { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_api_key() {
        let err = HttpTransport::new(&GeminiConfig::new()).err().unwrap();
        assert!(matches!(err, StudioError::Config(_)));
    }

    #[test]
    fn builds_model_endpoints() {
        let config = GeminiConfig::new()
            .with_api_key("k")
            .with_base_url("http://localhost:9999/v1beta/");
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(
            transport.endpoint("imagen-4.0-generate-001", "predict"),
            "http://localhost:9999/v1beta/models/imagen-4.0-generate-001:predict"
        );
    }

    #[test]
    fn api_failure_prefers_error_envelope() {
        let body = r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#;
        match api_failure(400, body) {
            ServiceFailure::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "INVALID_ARGUMENT: API key not valid.");
            }
            other => panic!("unexpected failure: {:?}", other),
        }

        match api_failure(502, "Bad Gateway") {
            ServiceFailure::Api { message, .. } => assert_eq!(message, "Bad Gateway"),
            other => panic!("unexpected failure: {:?}", other),
        }
    }
}
