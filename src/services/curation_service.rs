use std::collections::HashMap;

use futures::future::join_all;
use rand::seq::SliceRandom;

use crate::config::PlannerConfig;
use crate::models::poi::{CuratedSpots, Poi};
use crate::models::trip_request::TripRequest;
use crate::services::geocoding_service::GeocodingService;
use crate::services::places_service::PlacesService;

const QUERY_SUFFIXES: [&str; 3] = ["tourist places", "attractions", "activities"];

/// Discovers and deduplicates candidate spots for a destination from the
/// request's keyword groups, then picks the trip hub from the survivors.
pub struct CurationService {
    geocoder: GeocodingService,
    places: PlacesService,
    min_rating: f64,
}

impl CurationService {
    pub fn new(config: &PlannerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            geocoder: GeocodingService::new(config)?,
            places: PlacesService::new(config)?,
            min_rating: config.min_spot_rating,
        })
    }

    pub async fn curate(&self, request: &TripRequest) -> CuratedSpots {
        let queries = build_search_queries(&request.search_keywords);
        println!(
            "Curating spots for '{}' from {} search queries",
            request.destination,
            queries.len()
        );

        let bias = match self.geocoder.geocode(&request.destination).await {
            Ok(bias) => bias,
            Err(e) => {
                eprintln!("Geocoding failed for '{}': {}", request.destination, e);
                None
            }
        };

        let searches = queries.iter().map(|query| {
            self.places
                .text_search(query, &request.destination, bias, request.search_radius_km)
        });
        let summaries: Vec<_> = join_all(searches).await.into_iter().flatten().collect();

        let detail_fetches = summaries
            .iter()
            .filter(|summary| summary.rating.unwrap_or(0.0) >= self.min_rating)
            .map(|summary| self.places.place_details(&summary.place_id));
        let details = join_all(detail_fetches).await;

        let spots: Vec<Poi> = details
            .into_iter()
            .flatten()
            .filter_map(|d| d.into_poi())
            .collect();

        let mut spots = dedup_spots(spots);
        spots.truncate(request.max_spots + 3);

        // Hub policy is "pick one", not "pick the geometric center".
        let hub = spots.choose(&mut rand::thread_rng()).cloned();

        println!(
            "Curated {} unique spots for '{}'",
            spots.len(),
            request.destination
        );
        CuratedSpots { spots, hub }
    }
}

/// Three query variants per non-empty keyword group value.
pub fn build_search_queries(keywords: &HashMap<String, String>) -> Vec<String> {
    QUERY_SUFFIXES
        .iter()
        .flat_map(|suffix| {
            keywords
                .values()
                .filter(|kw| !kw.trim().is_empty())
                .map(move |kw| format!("{} {}", kw, suffix))
        })
        .collect()
}

/// Deduplicates by place identifier, keeping first-seen order. Records for
/// the same identifier are expected identical, so last-write-wins on the
/// payload.
pub fn dedup_spots(spots: Vec<Poi>) -> Vec<Poi> {
    let mut order: Vec<String> = Vec::new();
    let mut by_id: HashMap<String, Poi> = HashMap::new();

    for spot in spots {
        if by_id.insert(spot.id.clone(), spot.clone()).is_none() {
            order.push(spot.id);
        }
    }

    order
        .into_iter()
        .filter_map(|id| by_id.remove(&id))
        .collect()
}
