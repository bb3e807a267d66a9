//! Prompt assembly: picks the forecast data relevant to a question and wraps
//! it, together with the question itself, in the advisor's instructions.

use std::fmt::Write;

use chrono::{NaiveDate, NaiveDateTime};

use crate::model::{CityForecast, WeatherSnapshot};

/// Terms that make a question about weather even when no city is named.
/// Matched anywhere in the message.
const WEATHER_KEYWORDS_CJK: &[&str] =
    &["天氣", "氣象", "溫度", "下雨", "降雨", "露營", "適合", "哪裡", "何處", "推薦"];

/// English counterparts, matched as whole words so "train" or "campus" do not count.
const WEATHER_KEYWORDS_EN: &[&str] = &[
    "weather", "forecast", "forecasts", "temperature", "temperatures", "rain", "rainy",
    "raining", "camp", "camping", "campsite", "suitable", "where", "recommend",
    "recommendation",
];

/// City used as the detailed sample in the overview context.
const SAMPLE_CITY: &str = "臺北市";

/// Days considered when listing cities that are good for camping soon.
const OVERVIEW_DAYS: usize = 3;

const SYSTEM_PROMPT: &str = "\
You are \"Camp Weather Expert\", a camping advisor bot. You give camping advice based on \
the weather forecasts for the counties and cities of Taiwan.

Answer only from the weather data below. Do not guess, invent or add information that is \
not provided. If the data has nothing for the place or time the user asks about, say that \
no data is available.

Rules:
1. Be friendly and professional, and keep the answer to 2-4 sentences.
2. Use the weather data to say whether camping is a good idea and give the main reason \
(rain, thunderstorms, clear skies and so on).
3. No lengthy greetings or sign-offs.
4. If camping is not a good idea, briefly suggest another date or remind the user to stay safe.
5. Do not speculate about weather or dates beyond the data provided.";

/// Finds the city a message is about.
///
/// Official names match with `台` read as `臺`, English names match
/// case-insensitively, and both also match without their `市`/`縣` or
/// `City`/`County` suffix. The longest match wins, so "New Taipei" is not
/// mistaken for Taipei; ties go to the earlier city.
pub fn find_city<'a>(snapshot: &'a WeatherSnapshot, message: &str) -> Option<&'a CityForecast> {
    let normalized = message.replace('台', "臺");
    let lower = message.to_lowercase();

    let mut best: Option<(usize, &CityForecast)> = None;
    for city in &snapshot.cities {
        let english = city.english_name.to_lowercase();
        let candidates = [
            (normalized.as_str(), city.name.as_str()),
            (normalized.as_str(), strip_suffix(&city.name, &["市", "縣"])),
            (lower.as_str(), english.as_str()),
            (lower.as_str(), strip_suffix(&english, &[" city", " county"])),
        ];

        let score = candidates
            .iter()
            .filter(|(haystack, needle)| !needle.is_empty() && haystack.contains(needle))
            .map(|(_, needle)| needle.chars().count())
            .max();

        if let Some(score) = score {
            if best.is_none_or(|(top, _)| score > top) {
                best = Some((score, city));
            }
        }
    }

    best.map(|(_, city)| city)
}

fn strip_suffix<'a>(name: &'a str, suffixes: &[&str]) -> &'a str {
    suffixes.iter().find_map(|s| name.strip_suffix(s)).unwrap_or(name)
}

/// Whether a message asks about weather or camping in general.
pub fn mentions_weather(message: &str) -> bool {
    if WEATHER_KEYWORDS_CJK.iter().any(|k| message.contains(k)) {
        return true;
    }

    let lower = message.to_lowercase();
    lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| WEATHER_KEYWORDS_EN.contains(&word))
}

/// Forecast text relevant to `message`, if any.
///
/// A named city gets its full forecast; a general weather question gets an
/// overview of the cities suitable for camping in the next few days plus one
/// sample forecast; anything else gets no context.
pub fn weather_context(snapshot: &WeatherSnapshot, message: &str) -> Option<String> {
    if let Some(city) = find_city(snapshot, message) {
        return Some(format_city(city));
    }

    if mentions_weather(message) {
        return overview(snapshot);
    }

    None
}

fn overview(snapshot: &WeatherSnapshot) -> Option<String> {
    let sample = snapshot.city(SAMPLE_CITY).or_else(|| snapshot.cities.first())?;

    let suitable: Vec<&str> = snapshot
        .cities
        .iter()
        .filter(|c| c.days.iter().take(OVERVIEW_DAYS).any(|d| d.suitable))
        .map(|c| c.name.as_str())
        .collect();

    let mut out = String::from("Weather data is available for the following cities and counties.\n");
    if suitable.is_empty() {
        out.push_str("\nNo city or county looks suitable for camping in the next three days.\n");
    } else {
        let _ = writeln!(out, "\nSuitable for camping in the next three days: {}", suitable.join(", "));
    }

    let _ = writeln!(out, "\nSample forecast for {}:", sample.name);
    out.push_str(&format_city(sample));
    Some(out)
}

/// Human-readable multi-day forecast for one city.
pub fn format_city(city: &CityForecast) -> String {
    let mut out = format!("{} ({}) forecast:\n\n", city.name, city.english_name);

    for day in &city.days {
        let verdict = if day.suitable { "suitable" } else { "not suitable" };
        let _ = writeln!(out, "{}: {} for camping", day.display_date(), verdict);
        let _ = writeln!(out, "{}", day.reasons);

        for period in &day.periods {
            let _ = writeln!(
                out,
                "{}: {}, {}°C - {}°C, rain {}%, wind {} m/s",
                period.label(),
                period.sky,
                period.min_temp_c,
                period.max_temp_c,
                period.precipitation_pct,
                period.wind_speed_mps,
            );
        }

        out.push('\n');
    }

    out
}

/// Full prompt sent to the model. Always contains `message` verbatim.
pub fn build_prompt(
    message: &str,
    context: Option<&str>,
    today: NaiveDate,
    last_updated: NaiveDateTime,
) -> String {
    let mut prompt = format!(
        "{SYSTEM_PROMPT}\n\nToday's date: {}\nWeather data last updated: {}\n",
        today.format("%Y-%m-%d"),
        last_updated.format("%Y-%m-%d %H:%M:%S"),
    );

    if let Some(context) = context {
        let _ = write!(
            prompt,
            "\nRelevant weather data, answer the user from it:\n\n{context}\n"
        );
    }

    let _ = writeln!(prompt, "\nUser question: {message}");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{WeatherProvider, simulated::SimulatedProvider};

    async fn snapshot() -> WeatherSnapshot {
        SimulatedProvider::with_base_date(NaiveDate::from_ymd_opt(2025, 6, 14).unwrap(), 7)
            .snapshot()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn finds_city_by_official_name_and_variant() {
        let snapshot = snapshot().await;

        assert_eq!(find_city(&snapshot, "臺北市這週末適合露營嗎？").unwrap().name, "臺北市");
        assert_eq!(find_city(&snapshot, "台北市這週末適合露營嗎？").unwrap().name, "臺北市");
        assert_eq!(find_city(&snapshot, "台東天氣如何").unwrap().name, "臺東縣");
    }

    #[tokio::test]
    async fn finds_city_by_english_name() {
        let snapshot = snapshot().await;

        assert_eq!(find_city(&snapshot, "Can I camp in hualien?").unwrap().name, "花蓮縣");
        assert_eq!(find_city(&snapshot, "Weekend in Hsinchu County").unwrap().name, "新竹縣");
    }

    #[tokio::test]
    async fn longest_match_wins() {
        let snapshot = snapshot().await;

        assert_eq!(find_city(&snapshot, "Is New Taipei City dry?").unwrap().name, "新北市");
        assert_eq!(find_city(&snapshot, "Taipei this weekend?").unwrap().name, "臺北市");
    }

    #[tokio::test]
    async fn no_city_in_unrelated_message() {
        let snapshot = snapshot().await;
        assert!(find_city(&snapshot, "Tell me a joke").is_none());
    }

    #[test]
    fn weather_keywords_are_detected() {
        assert!(mentions_weather("哪裡適合露營？"));
        assert!(mentions_weather("Any good CAMPING spots?"));
        assert!(!mentions_weather("Tell me a joke"));
    }

    #[test]
    fn english_keywords_match_whole_words_only() {
        assert!(!mentions_weather("Which train goes to the campus?"));
        assert!(!mentions_weather("Brainstorm some names"));
        assert!(mentions_weather("Will it rain on Saturday?"));
        assert!(mentions_weather("forecast: camp, hike"));
    }

    #[tokio::test]
    async fn words_containing_keywords_get_no_context() {
        let snapshot = snapshot().await;
        assert!(weather_context(&snapshot, "Which train goes to the campus?").is_none());
    }

    #[tokio::test]
    async fn city_context_lists_every_day() {
        let snapshot = snapshot().await;
        let context = weather_context(&snapshot, "Hualien County this week?").unwrap();

        assert!(context.starts_with("花蓮縣 (Hualien County) forecast:"));
        assert_eq!(context.matches("for camping\n").count(), 7);
        assert!(context.contains("06/14 (Sat)"));
    }

    #[tokio::test]
    async fn overview_context_samples_taipei() {
        let snapshot = snapshot().await;
        let context = weather_context(&snapshot, "Where should I go camping?").unwrap();

        assert!(context.contains("Suitable for camping in the next three days"));
        assert!(context.contains("Sample forecast for 臺北市"));
    }

    #[tokio::test]
    async fn overview_reports_when_nothing_is_suitable() {
        let mut snapshot = snapshot().await;
        for day in snapshot.cities.iter_mut().flat_map(|c| c.days.iter_mut()) {
            day.suitable = false;
        }

        let context = weather_context(&snapshot, "哪裡適合露營？").unwrap();
        assert!(context.contains("No city or county looks suitable"));
    }

    #[tokio::test]
    async fn unrelated_message_has_no_context() {
        let snapshot = snapshot().await;
        assert!(weather_context(&snapshot, "Tell me a joke").is_none());
    }

    #[test]
    fn prompt_contains_literal_question_and_dates() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 14).unwrap();
        let updated = today.and_hms_opt(5, 0, 0).unwrap();
        let message = "Is <Kenting> OK for camping? 100% honest!";

        let prompt = build_prompt(message, Some("CONTEXT BLOCK"), today, updated);

        assert!(prompt.contains(message));
        assert!(prompt.contains("Today's date: 2025-06-14"));
        assert!(prompt.contains("Weather data last updated: 2025-06-14 05:00:00"));
        assert!(prompt.contains("CONTEXT BLOCK"));
        assert!(prompt.find("CONTEXT BLOCK") < prompt.find("User question:"));
    }

    #[test]
    fn prompt_without_context_omits_data_block() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 14).unwrap();
        let prompt = build_prompt("hello", None, today, today.and_hms_opt(5, 0, 0).unwrap());

        assert!(!prompt.contains("Relevant weather data"));
        assert!(prompt.ends_with("User question: hello\n"));
    }
}
