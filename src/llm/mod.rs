//! Text-generation boundary.
//!
//! `Generator` is an enum over concrete backends; enum dispatch keeps the
//! call sites free of trait objects. `Disabled` stands in when no API key is
//! configured and always errors, so callers degrade to their fallback path.

pub mod gemini;

use thiserror::Error;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation disabled: no API key configured")]
    Disabled,

    #[error("generation request failed: {0}")]
    Request(String),

    #[error("generation returned no text")]
    Empty,
}

/// Optional per-call generation knobs; `None` leaves the backend default.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerationOptions {
    pub max_output_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Clone)]
pub enum Generator {
    Gemini(gemini::GeminiClient),
    Disabled,
}

impl Generator {
    pub fn from_config(config: &Config) -> Self {
        match &config.gemini_api_key {
            Some(key) => {
                match gemini::GeminiClient::new(
                    key.clone(),
                    config.gemini_model.clone(),
                    config.generation_timeout_secs,
                ) {
                    Ok(client) => Generator::Gemini(client),
                    Err(e) => {
                        tracing::warn!("Failed to build generation client: {}", e);
                        Generator::Disabled
                    }
                }
            }
            None => Generator::Disabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, Generator::Disabled)
    }

    /// Send `prompt` to the backend and return its text completion.
    pub async fn generate(
        &self,
        prompt: &str,
        options: GenerationOptions,
    ) -> Result<String, GenerationError> {
        match self {
            Generator::Gemini(client) => client.generate(prompt, options).await,
            Generator::Disabled => Err(GenerationError::Disabled),
        }
    }
}
