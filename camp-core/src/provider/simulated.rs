use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Days, Local, NaiveDate, NaiveDateTime};

use crate::{
    camping,
    model::{CityForecast, ForecastPeriod, ForecastRecord, Sky, WeatherSnapshot},
};

use super::WeatherProvider;

/// Counties and cities covered by the forecast, as (official name, English name).
pub const CITIES: &[(&str, &str)] = &[
    ("臺北市", "Taipei City"),
    ("新北市", "New Taipei City"),
    ("桃園市", "Taoyuan City"),
    ("臺中市", "Taichung City"),
    ("臺南市", "Tainan City"),
    ("高雄市", "Kaohsiung City"),
    ("基隆市", "Keelung City"),
    ("新竹市", "Hsinchu City"),
    ("新竹縣", "Hsinchu County"),
    ("苗栗縣", "Miaoli County"),
    ("彰化縣", "Changhua County"),
    ("南投縣", "Nantou County"),
    ("雲林縣", "Yunlin County"),
    ("嘉義市", "Chiayi City"),
    ("嘉義縣", "Chiayi County"),
    ("屏東縣", "Pingtung County"),
    ("宜蘭縣", "Yilan County"),
    ("花蓮縣", "Hualien County"),
    ("臺東縣", "Taitung County"),
    ("澎湖縣", "Penghu County"),
    ("金門縣", "Kinmen County"),
    ("連江縣", "Lienchiang County"),
];

pub const MAX_DAYS: u32 = 7;

/// In-process forecast source.
///
/// Readings are a pure function of the city's position in [`CITIES`], the day
/// offset and the period, so a fixed base date always yields the same
/// snapshot.
#[derive(Debug, Clone)]
pub struct SimulatedProvider {
    base_date: Option<NaiveDate>,
    days: u32,
}

impl SimulatedProvider {
    /// Forecast starting today (local time), `days` days long (1..=7).
    pub fn new(days: u32) -> Self {
        Self { base_date: None, days: days.clamp(1, MAX_DAYS) }
    }

    /// Forecast starting at a fixed date.
    pub fn with_base_date(base_date: NaiveDate, days: u32) -> Self {
        Self { base_date: Some(base_date), days: days.clamp(1, MAX_DAYS) }
    }

    fn build(&self, base_date: NaiveDate) -> Result<WeatherSnapshot> {
        let last_updated = at(base_date, 5)?;

        let cities = CITIES
            .iter()
            .enumerate()
            .map(|(index, (name, english_name))| -> Result<CityForecast> {
                let days = (0..self.days)
                    .map(|offset| simulate_day(base_date, index as u32, offset))
                    .collect::<Result<Vec<_>>>()?;

                Ok(CityForecast {
                    name: (*name).to_string(),
                    english_name: (*english_name).to_string(),
                    days,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(WeatherSnapshot { last_updated, cities })
    }
}

#[async_trait]
impl WeatherProvider for SimulatedProvider {
    async fn snapshot(&self) -> Result<WeatherSnapshot> {
        let base_date = self.base_date.unwrap_or_else(|| Local::now().date_naive());
        self.build(base_date)
    }
}

fn simulate_day(base_date: NaiveDate, city: u32, offset: u32) -> Result<ForecastRecord> {
    let date = base_date
        .checked_add_days(Days::new(u64::from(offset)))
        .with_context(|| format!("Forecast date out of range: {base_date} + {offset} days"))?;
    let next = date
        .checked_add_days(Days::new(1))
        .with_context(|| format!("Forecast date out of range: {date} + 1 day"))?;

    // Typical temperature for the day, 18..=31 °C.
    let typical = 18.0 + f64::from((city * 3 + offset * 5) % 14);

    let periods = vec![
        simulate_period(at(date, 6)?, at(date, 18)?, typical - 1.0, typical + 4.0, city, offset, 0),
        simulate_period(at(date, 18)?, at(next, 6)?, typical - 5.0, typical, city, offset, 1),
    ];

    let suitable = camping::judge(&periods);
    let reasons = camping::reasons(&periods, suitable);

    Ok(ForecastRecord { date, periods, suitable, reasons })
}

fn simulate_period(
    start: NaiveDateTime,
    end: NaiveDateTime,
    min_temp_c: f64,
    max_temp_c: f64,
    city: u32,
    offset: u32,
    slot: u32,
) -> ForecastPeriod {
    let precipitation_pct = ((city * 17 + offset * 29 + slot * 11) % 10 * 10) as u8;
    let wind_speed_mps = f64::from((city * 5 + offset * 3 + slot) % 10);

    let sky = if wind_speed_mps > camping::MAX_WIND_MPS {
        Sky::StrongWind
    } else {
        match precipitation_pct {
            0..=10 => Sky::Sunny,
            11..=30 => Sky::PartlyCloudy,
            31..=40 => Sky::Cloudy,
            41..=60 => Sky::Showers,
            61..=80 => Sky::Thunderstorms,
            _ => Sky::HeavyRain,
        }
    };

    ForecastPeriod {
        start,
        end,
        sky,
        min_temp_c,
        max_temp_c,
        precipitation_pct,
        wind_speed_mps,
    }
}

fn at(date: NaiveDate, hour: u32) -> Result<NaiveDateTime> {
    date.and_hms_opt(hour, 0, 0)
        .with_context(|| format!("Invalid forecast hour {hour} on {date}"))
}
