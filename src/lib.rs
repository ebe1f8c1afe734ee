//! Background removal and text-to-image generation over Google's Gemini
//! and Imagen models.
//!
//! ```no_run
//! use rgenai_studio::{GeminiClient, GeminiConfig, encoder};
//!
//! # async fn run() -> rgenai_studio::Result<()> {
//! let client = GeminiClient::new(GeminiConfig::from_env())?;
//! let payload = encoder::encode_file("cat.png").await?;
//! let cut_out = client.image().remove_background(&payload).await?;
//! cut_out.save("background-removed.png").await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod encoder;
pub mod error;
pub mod gemini;
pub mod logger;
pub mod models;
pub mod studio;

pub use config::GeminiConfig;
pub use error::{Operation, Result, ServiceFailure, StudioError};
pub use gemini::{GeminiClient, GeminiTransport, HttpTransport, ImageClient};
pub use models::{GenerationRequest, ImagePayload, RemovalRequest, ResultImage};
pub use studio::{BackgroundRemover, ImageGenerator, ScreenState, Studio, StudioEvent, Tab};
