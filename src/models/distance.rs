use std::collections::HashMap;

use serde::Serialize;

/// A curated spot annotated with hub-relative travel features and the
/// estimated cab cost for reaching it.
#[derive(Debug, Clone, Serialize)]
pub struct SpotFeature {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub distance_from_hub_km: f64,
    pub travel_time_min: f64,
    pub travel_cost: u64,
}

/// One directed spot→spot edge. Edges are computed independently per
/// direction, so the matrix is not guaranteed symmetric; failed lookups
/// are simply absent.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PairDistance {
    pub distance_km: f64,
    pub time_min: f64,
}

/// origin spot id → (destination spot id → edge).
pub type PairMatrix = HashMap<String, HashMap<String, PairDistance>>;
