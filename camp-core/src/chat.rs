//! One chat turn: validate the message, look up the forecast, build the
//! prompt and ask the generator.

use chrono::Local;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::{
    Config,
    generator::{GeminiClient, GenerateError, TextGenerator},
    model::{ChatRequest, GeneratedReply},
    prompt,
    provider::{WeatherProvider, provider_from_config},
};

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Message must not be empty")]
    EmptyMessage,

    #[error("Weather data unavailable: {0}")]
    Weather(anyhow::Error),

    #[error(transparent)]
    Generation(#[from] GenerateError),
}

impl ChatError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::EmptyMessage => 400,
            Self::Weather(_) => 500,
            Self::Generation(_) => 502,
        }
    }

    /// Message safe to show to the person who asked.
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyMessage => "Please enter a question.".to_string(),
            Self::Weather(_) => "Weather data is unavailable right now. Please try again later.".to_string(),
            Self::Generation(_) => {
                "Sorry, the advisor could not answer right now. Please try again later.".to_string()
            }
        }
    }
}

/// Answers camping questions from forecast data.
///
/// Holds no per-request state; one instance serves every request.
#[derive(Debug)]
pub struct CampAdvisor {
    weather: Box<dyn WeatherProvider>,
    generator: Box<dyn TextGenerator>,
}

impl CampAdvisor {
    pub fn new(weather: Box<dyn WeatherProvider>, generator: Box<dyn TextGenerator>) -> Self {
        Self { weather, generator }
    }

    /// Wire the simulated weather provider and the Gemini client from config.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let api_key = config.gemini_api_key()?;
        let generator = GeminiClient::new(api_key.to_owned(), &config.gemini);

        Ok(Self::new(provider_from_config(config), Box::new(generator)))
    }

    pub async fn answer(&self, request: &ChatRequest) -> Result<GeneratedReply, ChatError> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let snapshot = self.weather.snapshot().await.map_err(|e| {
            error!("Error getting weather data: {e:#}");
            ChatError::Weather(e)
        })?;

        let context = prompt::weather_context(&snapshot, message);
        let prompt = prompt::build_prompt(
            message,
            context.as_deref(),
            Local::now().date_naive(),
            snapshot.last_updated,
        );
        debug!(has_context = context.is_some(), prompt_chars = prompt.chars().count(), "prompt built");

        let reply = self.generator.generate(&prompt).await.map_err(|e| {
            error!("Error querying generation service: {e}");
            e
        })?;

        info!(reply_chars = reply.chars().count(), "reply generated");
        Ok(GeneratedReply { reply })
    }
}
