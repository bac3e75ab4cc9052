use reqwest;
use serde::Deserialize;

use crate::config::PlannerConfig;
use crate::models::poi::Poi;

const DETAIL_FIELDS: &str = "place_id,name,geometry,rating,opening_hours,types";

#[derive(Debug, Deserialize)]
struct TextSearchResponse {
    #[serde(default)]
    results: Vec<PlaceSummary>,
}

/// Slim text-search hit; only the fields the rating filter needs before
/// the full detail fetch.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceSummary {
    pub place_id: String,
    pub rating: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    result: Option<PlaceDetails>,
}

#[derive(Debug, Deserialize)]
pub struct PlaceDetails {
    pub place_id: String,
    pub name: String,
    pub geometry: Option<PlaceGeometry>,
    pub rating: Option<f64>,
    #[serde(default)]
    pub types: Vec<String>,
    pub opening_hours: Option<OpeningHours>,
}

#[derive(Debug, Deserialize)]
pub struct PlaceGeometry {
    pub location: Option<PlaceLocation>,
}

#[derive(Debug, Deserialize)]
pub struct PlaceLocation {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
pub struct OpeningHours {
    pub open_now: Option<bool>,
}

impl PlaceDetails {
    /// A detail record without resolvable coordinates is discarded.
    pub fn into_poi(self) -> Option<Poi> {
        let location = self.geometry.and_then(|g| g.location)?;
        Some(Poi {
            id: self.place_id,
            name: self.name,
            lat: location.lat,
            lng: location.lng,
            rating: self.rating,
            types: self.types,
            open_now: self.opening_hours.and_then(|h| h.open_now),
        })
    }
}

/// Google Places adapter for keyword text search and place detail fetches.
/// Individual call failures yield empty/absent results so a batch of
/// concurrent searches never aborts as a whole.
pub struct PlacesService {
    http_client: reqwest::Client,
    api_key: String,
}

impl PlacesService {
    pub fn new(config: &PlannerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http_client,
            api_key: config.maps_api_key.clone(),
        })
    }

    /// Text search for `query` in `destination`, optionally biased around
    /// the geocoded destination with `radius_km`.
    pub async fn text_search(
        &self,
        query: &str,
        destination: &str,
        bias: Option<(f64, f64)>,
        radius_km: u32,
    ) -> Vec<PlaceSummary> {
        let mut params = vec![
            ("query".to_string(), format!("{} in {}", query, destination)),
            ("key".to_string(), self.api_key.clone()),
        ];
        if let Some((lat, lng)) = bias {
            params.push(("location".to_string(), format!("{},{}", lat, lng)));
            params.push(("radius".to_string(), (radius_km as u64 * 1000).to_string()));
        }

        let request = self
            .http_client
            .get("https://maps.googleapis.com/maps/api/place/textsearch/json")
            .query(&params);

        match request.send().await {
            Ok(response) => match response.json::<TextSearchResponse>().await {
                Ok(body) => body.results,
                Err(e) => {
                    eprintln!("Failed to parse text search response for '{}': {}", query, e);
                    Vec::new()
                }
            },
            Err(e) => {
                eprintln!("Text search failed for '{}': {}", query, e);
                Vec::new()
            }
        }
    }

    pub async fn place_details(&self, place_id: &str) -> Option<PlaceDetails> {
        let request = self
            .http_client
            .get("https://maps.googleapis.com/maps/api/place/details/json")
            .query(&[
                ("place_id", place_id),
                ("fields", DETAIL_FIELDS),
                ("key", self.api_key.as_str()),
            ]);

        match request.send().await {
            Ok(response) => match response.json::<DetailsResponse>().await {
                Ok(body) => body.result,
                Err(e) => {
                    eprintln!("Failed to parse place details for {}: {}", place_id, e);
                    None
                }
            },
            Err(e) => {
                eprintln!("Place details fetch failed for {}: {}", place_id, e);
                None
            }
        }
    }
}
