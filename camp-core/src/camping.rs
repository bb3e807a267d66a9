//! Camping suitability rules applied to a forecast day.

use crate::model::ForecastPeriod;

pub const MAX_PRECIPITATION_PCT: u8 = 40;
pub const MIN_TEMP_C: f64 = 15.0;
pub const MAX_TEMP_C: f64 = 32.0;
pub const MAX_WIND_MPS: f64 = 8.0;

const SUITABLE_REASON: &str =
    "Good conditions for camping: comfortable temperatures, low chance of rain, no severe weather.";

/// Whether a day made of `periods` is fit for camping.
pub fn judge(periods: &[ForecastPeriod]) -> bool {
    !periods.iter().any(|p| {
        p.precipitation_pct > MAX_PRECIPITATION_PCT
            || p.min_temp_c < MIN_TEMP_C
            || p.max_temp_c > MAX_TEMP_C
            || p.sky.is_severe()
            || p.wind_speed_mps > MAX_WIND_MPS
    })
}

/// Human-readable explanation of a verdict, listing the worst reading for each
/// failing criterion.
pub fn reasons(periods: &[ForecastPeriod], suitable: bool) -> String {
    if suitable {
        return SUITABLE_REASON.to_string();
    }

    let mut reasons = Vec::new();

    if let Some(rain) = periods.iter().map(|p| p.precipitation_pct).max() {
        if rain > MAX_PRECIPITATION_PCT {
            reasons.push(format!("high chance of rain ({rain}%)"));
        }
    }

    if let Some(low) = periods.iter().map(|p| p.min_temp_c).reduce(f64::min) {
        if low < MIN_TEMP_C {
            reasons.push(format!("too cold (low {low}°C)"));
        }
    }

    if let Some(high) = periods.iter().map(|p| p.max_temp_c).reduce(f64::max) {
        if high > MAX_TEMP_C {
            reasons.push(format!("too hot (high {high}°C)"));
        }
    }

    for period in periods.iter().filter(|p| p.sky.is_severe()) {
        reasons.push(format!("{} expected", period.sky.description().to_lowercase()));
    }

    if let Some(wind) = periods.iter().map(|p| p.wind_speed_mps).reduce(f64::max) {
        if wind > MAX_WIND_MPS {
            reasons.push(format!("strong winds ({wind} m/s)"));
        }
    }

    if reasons.is_empty() {
        "Not suitable for camping: overall conditions are poor".to_string()
    } else {
        format!("Not suitable for camping: {}", reasons.join(", "))
    }
}
