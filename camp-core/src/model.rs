use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A single chat message from the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Text produced by the generation service, passed through unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedReply {
    pub reply: String,
}

/// Sky condition for a forecast period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sky {
    Sunny,
    PartlyCloudy,
    Cloudy,
    Showers,
    Thunderstorms,
    HeavyRain,
    StrongWind,
}

impl Sky {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Sunny => "Sunny",
            Self::PartlyCloudy => "Partly cloudy",
            Self::Cloudy => "Cloudy",
            Self::Showers => "Showers",
            Self::Thunderstorms => "Thunderstorms",
            Self::HeavyRain => "Heavy rain",
            Self::StrongWind => "Strong wind",
        }
    }

    /// Conditions that rule out camping regardless of the other readings.
    pub fn is_severe(&self) -> bool {
        matches!(self, Self::Thunderstorms | Self::HeavyRain | Self::StrongWind)
    }
}

impl std::fmt::Display for Sky {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// One 12-hour slice of a forecast day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastPeriod {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub sky: Sky,
    pub min_temp_c: f64,
    pub max_temp_c: f64,
    pub precipitation_pct: u8,
    pub wind_speed_mps: f64,
}

impl ForecastPeriod {
    /// e.g. `06/14 06:00 - 18:00`
    pub fn label(&self) -> String {
        format!("{} - {}", self.start.format("%m/%d %H:%M"), self.end.format("%H:%M"))
    }
}

/// Forecast for one day, with the camping verdict already computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub date: NaiveDate,
    pub periods: Vec<ForecastPeriod>,
    pub suitable: bool,
    pub reasons: String,
}

impl ForecastRecord {
    /// e.g. `06/14 (Sat)`
    pub fn display_date(&self) -> String {
        self.date.format("%m/%d (%a)").to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityForecast {
    /// Official name, e.g. `臺北市`.
    pub name: String,
    /// English name, e.g. `Taipei City`.
    pub english_name: String,
    pub days: Vec<ForecastRecord>,
}

/// Every city the provider knows about, as of `last_updated`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub last_updated: NaiveDateTime,
    pub cities: Vec<CityForecast>,
}

impl WeatherSnapshot {
    pub fn city(&self, name: &str) -> Option<&CityForecast> {
        self.cities.iter().find(|c| c.name == name)
    }
}
