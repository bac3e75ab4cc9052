use std::{env, time::Duration};

// Tunable pipeline constants. Defaults mirror a shared-cab trip profile:
// 15/km cab rate, spots within 150 km of the hub, 8 travel-hours per day.
const PER_KM_COST: f64 = 15.0;
const MAX_HUB_DISTANCE_KM: f64 = 150.0;
const MAX_DAILY_TRAVEL_MIN: f64 = 480.0;
const MIN_SPOT_RATING: f64 = 3.5;
const REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-lite";

/// Everything the planning pipeline is allowed to read. Built once at
/// startup and passed into the service constructors; services never touch
/// the process environment themselves.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub maps_api_key: String,
    pub weather_api_key: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub per_km_cost: f64,
    pub max_hub_distance_km: f64,
    pub max_daily_travel_min: f64,
    pub min_spot_rating: f64,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub snapshot_path: Option<String>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            maps_api_key: String::new(),
            weather_api_key: String::new(),
            gemini_api_key: String::new(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            per_km_cost: PER_KM_COST,
            max_hub_distance_km: MAX_HUB_DISTANCE_KM,
            max_daily_travel_min: MAX_DAILY_TRAVEL_MIN,
            min_spot_rating: MIN_SPOT_RATING,
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            max_retries: 2,
            retry_base_delay: Duration::from_secs(1),
            snapshot_path: None,
        }
    }
}

impl PlannerConfig {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let maps_api_key = env::var("GOOGLE_MAPS_API_KEY")
            .map_err(|_| "GOOGLE_MAPS_API_KEY environment variable not set")?;
        let weather_api_key = env::var("OPENWEATHER_API_KEY")
            .map_err(|_| "OPENWEATHER_API_KEY environment variable not set")?;
        let gemini_api_key = env::var("GEMINI_API_KEY")
            .map_err(|_| "GEMINI_API_KEY environment variable not set")?;
        let gemini_model =
            env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string());
        let snapshot_path = env::var("SNAPSHOT_PATH").ok();

        Ok(Self {
            maps_api_key,
            weather_api_key,
            gemini_api_key,
            gemini_model,
            snapshot_path,
            ..Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn set_required_vars() {
        env::set_var("GOOGLE_MAPS_API_KEY", "maps-key");
        env::set_var("OPENWEATHER_API_KEY", "weather-key");
        env::set_var("GEMINI_API_KEY", "gemini-key");
    }

    fn clear_vars() {
        for var in [
            "GOOGLE_MAPS_API_KEY",
            "OPENWEATHER_API_KEY",
            "GEMINI_API_KEY",
            "GEMINI_MODEL",
            "SNAPSHOT_PATH",
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn from_env_reads_required_keys() {
        clear_vars();
        set_required_vars();

        let config = PlannerConfig::from_env().unwrap();
        assert_eq!(config.maps_api_key, "maps-key");
        assert_eq!(config.weather_api_key, "weather-key");
        assert_eq!(config.gemini_api_key, "gemini-key");
        assert_eq!(config.gemini_model, DEFAULT_GEMINI_MODEL);
        assert!(config.snapshot_path.is_none());

        clear_vars();
    }

    #[test]
    #[serial]
    fn from_env_fails_without_maps_key() {
        clear_vars();
        env::set_var("OPENWEATHER_API_KEY", "weather-key");
        env::set_var("GEMINI_API_KEY", "gemini-key");

        assert!(PlannerConfig::from_env().is_err());

        clear_vars();
    }

    #[test]
    #[serial]
    fn from_env_honors_optional_overrides() {
        clear_vars();
        set_required_vars();
        env::set_var("GEMINI_MODEL", "gemini-2.5-flash");
        env::set_var("SNAPSHOT_PATH", "/tmp/itinerary.json");

        let config = PlannerConfig::from_env().unwrap();
        assert_eq!(config.gemini_model, "gemini-2.5-flash");
        assert_eq!(config.snapshot_path.as_deref(), Some("/tmp/itinerary.json"));

        clear_vars();
    }

    #[test]
    fn defaults_match_trip_profile() {
        let config = PlannerConfig::default();
        assert_eq!(config.per_km_cost, 15.0);
        assert_eq!(config.max_hub_distance_km, 150.0);
        assert_eq!(config.max_daily_travel_min, 480.0);
        assert_eq!(config.min_spot_rating, 3.5);
        assert_eq!(config.max_retries, 2);
    }
}
