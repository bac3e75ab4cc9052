//! Distance Service with Google Maps API Integration
//!
//! Computes pairwise travel distance and duration between coordinate sets
//! using the Google Distance Matrix API, and derives the hub-relative
//! travel features the scheduler consumes.
//!
//! ## Call patterns
//! - Hub ➜ spots: one call with the hub as sole origin
//! - Spot ↔ spot: one call per spot, that spot as sole origin and every
//!   other spot as destination; a failed origin yields an empty lookup map
//!
//! Cells whose status is not `OK` are dropped, never treated as zero
//! distance. Spots farther from the hub than the configured cutoff are
//! excluded from scheduling entirely.

use futures::future::join_all;
use reqwest;
use serde::Deserialize;

use crate::config::PlannerConfig;
use crate::models::distance::{PairDistance, PairMatrix, SpotFeature};
use crate::models::poi::Poi;

// Google Maps API limits: 25 origins, 25 destinations per request.
const MAX_ORIGINS: usize = 25;
const MAX_DESTINATIONS: usize = 25;

#[derive(Debug, Deserialize)]
struct GoogleMapsResponse {
    status: String,
    rows: Vec<GoogleMapsRow>,
}

#[derive(Debug, Deserialize)]
struct GoogleMapsRow {
    elements: Vec<GoogleMapsElement>,
}

#[derive(Debug, Deserialize)]
struct GoogleMapsElement {
    status: String,
    distance: Option<GoogleMapsDistance>,
    duration: Option<GoogleMapsDuration>,
}

#[derive(Debug, Deserialize)]
struct GoogleMapsDistance {
    value: u32, // meters
}

#[derive(Debug, Deserialize)]
struct GoogleMapsDuration {
    value: u32, // seconds
}

/// One resolved matrix cell in the units the rest of the pipeline uses.
#[derive(Debug, Clone, Copy)]
pub struct MatrixCell {
    pub distance_km: f64,
    pub duration_min: f64,
}

pub struct DistanceService {
    http_client: reqwest::Client,
    api_key: String,
    per_km_cost: f64,
    max_hub_distance_km: f64,
}

impl DistanceService {
    pub fn new(config: &PlannerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http_client,
            api_key: config.maps_api_key.clone(),
            per_km_cost: config.per_km_cost,
            max_hub_distance_km: config.max_hub_distance_km,
        })
    }

    /// One Distance Matrix call. Unresolved cells come back as `None`.
    pub async fn compute_matrix(
        &self,
        origins: &[(f64, f64)],
        destinations: &[(f64, f64)],
    ) -> Result<Vec<Vec<Option<MatrixCell>>>, Box<dyn std::error::Error>> {
        if origins.len() > MAX_ORIGINS || destinations.len() > MAX_DESTINATIONS {
            return Err("Too many origins or destinations for single API call".into());
        }
        if origins.is_empty() || destinations.is_empty() {
            return Ok(Vec::new());
        }

        let origins_str = origins
            .iter()
            .map(|(lat, lng)| format!("{},{}", lat, lng))
            .collect::<Vec<_>>()
            .join("|");
        let destinations_str = destinations
            .iter()
            .map(|(lat, lng)| format!("{},{}", lat, lng))
            .collect::<Vec<_>>()
            .join("|");

        let response = self
            .http_client
            .get("https://maps.googleapis.com/maps/api/distancematrix/json")
            .query(&[
                ("origins", origins_str.as_str()),
                ("destinations", destinations_str.as_str()),
                ("units", "metric"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;
        let response_text = response.text().await?;

        let google_response: GoogleMapsResponse = serde_json::from_str(&response_text)
            .map_err(|e| {
                format!(
                    "Failed to parse Google Maps response: {}. Response: {}",
                    e, response_text
                )
            })?;

        if google_response.status != "OK" {
            return Err(format!("Google Maps API error: {}", google_response.status).into());
        }

        let matrix = google_response
            .rows
            .into_iter()
            .map(|row| row.elements.into_iter().map(resolve_element).collect())
            .collect();

        Ok(matrix)
    }

    /// Hub ➜ spots annotation pass: one matrix call, then per-spot travel
    /// features with the estimated cab cost, dropping unreachable spots
    /// and spots beyond the hub-distance cutoff. Also returns the summed
    /// cab budget for the surviving spots.
    pub async fn annotate_spots(
        &self,
        hub: &Poi,
        spots: &[Poi],
    ) -> Result<(Vec<SpotFeature>, u64), Box<dyn std::error::Error>> {
        let origins = [(hub.lat, hub.lng)];
        let destinations: Vec<(f64, f64)> = spots.iter().map(|s| (s.lat, s.lng)).collect();

        let matrix = self.compute_matrix(&origins, &destinations).await?;
        let cells = matrix.into_iter().next().unwrap_or_default();

        Ok(self.build_spot_features(spots, &cells))
    }

    /// Pure half of the annotation pass, split out so the filtering rules
    /// are testable without the network.
    pub fn build_spot_features(
        &self,
        spots: &[Poi],
        cells: &[Option<MatrixCell>],
    ) -> (Vec<SpotFeature>, u64) {
        let mut features = Vec::new();
        let mut budget_used: u64 = 0;

        for (spot, cell) in spots.iter().zip(cells.iter()) {
            let cell = match cell {
                Some(cell) => cell,
                None => continue,
            };

            let distance_km = (cell.distance_km * 100.0).round() / 100.0;
            let travel_time_min = (cell.duration_min * 10.0).round() / 10.0;

            if distance_km > self.max_hub_distance_km {
                continue;
            }

            let travel_cost = self.estimate_travel_cost(distance_km);
            budget_used += travel_cost;

            features.push(SpotFeature {
                id: spot.id.clone(),
                name: spot.name.clone(),
                lat: spot.lat,
                lng: spot.lng,
                distance_from_hub_km: distance_km,
                travel_time_min,
                travel_cost,
            });
        }

        (features, budget_used)
    }

    /// Spot ↔ spot lookups, one matrix call per origin spot, all issued
    /// concurrently. A failed origin contributes an empty map rather than
    /// aborting the batch.
    pub async fn pair_matrix(&self, spots: &[Poi]) -> PairMatrix {
        let lookups = spots.iter().map(|origin| async move {
            let others: Vec<&Poi> = spots.iter().filter(|s| s.id != origin.id).collect();
            let destinations: Vec<(f64, f64)> = others.iter().map(|s| (s.lat, s.lng)).collect();
            if destinations.is_empty() {
                return (origin.id.clone(), std::collections::HashMap::new());
            }

            match self
                .compute_matrix(&[(origin.lat, origin.lng)], &destinations)
                .await
            {
                Ok(matrix) => {
                    let cells = matrix.into_iter().next().unwrap_or_default();
                    let edges = others
                        .iter()
                        .zip(cells.iter())
                        .filter_map(|(dest, cell)| {
                            cell.map(|c| {
                                (
                                    dest.id.clone(),
                                    PairDistance {
                                        distance_km: (c.distance_km * 10.0).round() / 10.0,
                                        time_min: (c.duration_min * 10.0).round() / 10.0,
                                    },
                                )
                            })
                        })
                        .collect();
                    (origin.id.clone(), edges)
                }
                Err(e) => {
                    eprintln!("Spot matrix lookup failed for '{}': {}", origin.name, e);
                    (origin.id.clone(), std::collections::HashMap::new())
                }
            }
        });

        join_all(lookups).await.into_iter().collect()
    }

    /// Travel cost in the trip's currency at the fixed per-kilometer rate.
    pub fn estimate_travel_cost(&self, distance_km: f64) -> u64 {
        (distance_km * self.per_km_cost) as u64
    }
}

fn resolve_element(element: GoogleMapsElement) -> Option<MatrixCell> {
    if element.status != "OK" {
        return None;
    }
    let distance = element.distance?;
    let duration = element.duration?;
    Some(MatrixCell {
        distance_km: distance.value as f64 / 1000.0,
        duration_min: duration.value as f64 / 60.0,
    })
}
