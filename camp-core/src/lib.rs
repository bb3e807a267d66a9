//! Core library for the camping weather advisor.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The (simulated) forecast provider and camping suitability rules
//! - Prompt assembly and the generation client
//! - The chat service tying them together
//!
//! It is used by `camp-server`, but can also be reused by other binaries or services.

pub mod camping;
pub mod chat;
pub mod config;
pub mod generator;
pub mod model;
pub mod prompt;
pub mod provider;

pub use chat::{CampAdvisor, ChatError};
pub use config::Config;
pub use generator::{GeminiClient, GenerateError, TextGenerator};
pub use model::{ChatRequest, CityForecast, ForecastPeriod, ForecastRecord, GeneratedReply, Sky, WeatherSnapshot};
pub use provider::WeatherProvider;
