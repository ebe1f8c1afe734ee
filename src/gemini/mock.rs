//! Scripted stand-in for the remote service, for tests and offline demos.

use super::transport::{GeminiTransport, TransportResult};
use crate::{
    error::ServiceFailure,
    models::{
        Candidate, Content, GenerateContentRequest, GenerateContentResponse, InlineData, Part,
        PredictRequest, PredictResponse, Prediction,
    },
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub enum RecordedCall {
    GenerateContent {
        model: String,
        request: GenerateContentRequest,
    },
    Predict {
        model: String,
        request: PredictRequest,
    },
}

/// Replies are consumed in order; an exhausted script answers with a
/// transport failure.
#[derive(Default)]
pub struct MockTransport {
    content_replies: Mutex<VecDeque<TransportResult<GenerateContentResponse>>>,
    predict_replies: Mutex<VecDeque<TransportResult<PredictResponse>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_content(self, reply: TransportResult<GenerateContentResponse>) -> Self {
        if let Ok(mut replies) = self.content_replies.lock() {
            replies.push_back(reply);
        }
        self
    }

    pub fn push_prediction(self, reply: TransportResult<PredictResponse>) -> Self {
        if let Ok(mut replies) = self.predict_replies.lock() {
            replies.push_back(reply);
        }
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    fn record(&self, call: RecordedCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl GeminiTransport for MockTransport {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> TransportResult<GenerateContentResponse> {
        self.record(RecordedCall::GenerateContent {
            model: model.to_string(),
            request: request.clone(),
        });
        self.content_replies
            .lock()
            .ok()
            .and_then(|mut r| r.pop_front())
            .unwrap_or_else(|| Err(ServiceFailure::Transport("no scripted reply".into())))
    }

    async fn predict(
        &self,
        model: &str,
        request: &PredictRequest,
    ) -> TransportResult<PredictResponse> {
        self.record(RecordedCall::Predict {
            model: model.to_string(),
            request: request.clone(),
        });
        self.predict_replies
            .lock()
            .ok()
            .and_then(|mut r| r.pop_front())
            .unwrap_or_else(|| Err(ServiceFailure::Transport("no scripted reply".into())))
    }
}

/// A `generateContent` reply holding one inline image.
pub fn image_content(mime_type: &str, data: &str) -> GenerateContentResponse {
    GenerateContentResponse {
        candidates: Some(vec![Candidate {
            content: Some(Content {
                role: Some("model".into()),
                parts: vec![Part::InlineData {
                    inline_data: InlineData {
                        mime_type: mime_type.into(),
                        data: data.into(),
                    },
                }],
            }),
            finish_reason: Some("STOP".into()),
        }]),
    }
}

/// A `generateContent` reply that only talks back.
pub fn text_content(text: &str) -> GenerateContentResponse {
    GenerateContentResponse {
        candidates: Some(vec![Candidate {
            content: Some(Content {
                role: Some("model".into()),
                parts: vec![Part::Text { text: text.into() }],
            }),
            finish_reason: Some("STOP".into()),
        }]),
    }
}

pub fn prediction(data: &str) -> PredictResponse {
    PredictResponse {
        predictions: Some(vec![Prediction {
            bytes_base64_encoded: Some(data.into()),
            mime_type: Some("image/png".into()),
        }]),
    }
}
