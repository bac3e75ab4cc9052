use reqwest;
use serde::Deserialize;

use crate::config::PlannerConfig;
use crate::services::retry::RetryPolicy;

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    #[serde(default)]
    weather: Vec<WeatherCondition>,
}

#[derive(Debug, Deserialize)]
struct WeatherCondition {
    main: String,
}

/// Current-conditions lookup against OpenWeather, collapsed to a coarse
/// category. Anything that fails the retry budget resolves to "unknown";
/// a failed lookup never aborts enrichment.
pub struct WeatherService {
    http_client: reqwest::Client,
    api_key: String,
    retry: RetryPolicy,
}

impl WeatherService {
    pub fn new(config: &PlannerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http_client,
            api_key: config.weather_api_key.clone(),
            retry: RetryPolicy::new(config.max_retries, config.retry_base_delay),
        })
    }

    pub async fn current_condition(&self, lat: f64, lng: f64) -> String {
        self.retry
            .run(|| self.fetch_condition(lat, lng))
            .await
            .unwrap_or_else(|| "unknown".to_string())
    }

    async fn fetch_condition(&self, lat: f64, lng: f64) -> Option<String> {
        let response = self
            .http_client
            .get("https://api.openweathermap.org/data/2.5/weather")
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lng.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .ok()?;

        let body: WeatherResponse = response.json().await.ok()?;
        body.weather
            .first()
            .map(|condition| categorize_condition(&condition.main))
    }
}

/// Coarse weather category: rainy, cloudy, clear, or the raw lowercase
/// condition when it fits none of those.
pub fn categorize_condition(main: &str) -> String {
    let condition = main.to_lowercase();
    if condition.contains("rain") {
        "rainy".to_string()
    } else if condition.contains("cloud") {
        "cloudy".to_string()
    } else if condition.contains("clear") {
        "clear".to_string()
    } else {
        condition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_conditions_collapse_to_categories() {
        assert_eq!(categorize_condition("Rain"), "rainy");
        assert_eq!(categorize_condition("Drizzle and rain"), "rainy");
        assert_eq!(categorize_condition("Clouds"), "cloudy");
        assert_eq!(categorize_condition("Clear"), "clear");
    }

    #[test]
    fn unknown_conditions_pass_through_lowercased() {
        assert_eq!(categorize_condition("Haze"), "haze");
        assert_eq!(categorize_condition("Thunderstorm"), "thunderstorm");
    }
}
