use reqwest;
use serde::Deserialize;

use crate::config::PlannerConfig;

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: GeocodeGeometry,
}

#[derive(Debug, Deserialize)]
struct GeocodeGeometry {
    location: GeocodeLocation,
}

#[derive(Debug, Deserialize)]
struct GeocodeLocation {
    lat: f64,
    lng: f64,
}

/// Resolves free-text locations to coordinates via the Google Geocoding
/// API. An unresolvable address is `Ok(None)`, not an error; downstream
/// stages degrade to unbiased searches.
pub struct GeocodingService {
    http_client: reqwest::Client,
    api_key: String,
}

impl GeocodingService {
    pub fn new(config: &PlannerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http_client,
            api_key: config.maps_api_key.clone(),
        })
    }

    pub async fn geocode(
        &self,
        address: &str,
    ) -> Result<Option<(f64, f64)>, Box<dyn std::error::Error>> {
        let response = self
            .http_client
            .get("https://maps.googleapis.com/maps/api/geocode/json")
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .send()
            .await?;

        let geocoded: GeocodeResponse = response.json().await?;

        if geocoded.status != "OK" {
            return Ok(None);
        }

        Ok(geocoded
            .results
            .first()
            .map(|r| (r.geometry.location.lat, r.geometry.location.lng)))
    }
}
