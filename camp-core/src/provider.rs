use crate::{Config, WeatherSnapshot, provider::simulated::SimulatedProvider};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod simulated;

/// Source of forecast data for the prompt context.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn snapshot(&self) -> anyhow::Result<WeatherSnapshot>;
}

/// Construct the weather provider described by the config.
pub fn provider_from_config(config: &Config) -> Box<dyn WeatherProvider> {
    Box::new(SimulatedProvider::new(config.weather.days))
}
