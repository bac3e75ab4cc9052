use serde::{Deserialize, Serialize};

/// A candidate place to visit. The place identifier doubles as the dedup
/// key across keyword-search result sets; records are never mutated after
/// curation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poi {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub rating: Option<f64>,
    #[serde(default)]
    pub types: Vec<String>,
    pub open_now: Option<bool>,
}

/// Curation output: the deduplicated candidate list plus the hub picked
/// from it. `hub` is `None` only when no candidate survived curation.
#[derive(Debug, Clone, Serialize)]
pub struct CuratedSpots {
    pub spots: Vec<Poi>,
    pub hub: Option<Poi>,
}
