use std::collections::HashMap;

use serde::{Deserialize, Serialize};

fn default_travelers() -> u32 {
    1
}

fn default_search_radius_km() -> u32 {
    75
}

fn default_max_spots() -> usize {
    21
}

/// A structured multi-day trip request, produced once per planning session
/// by the upstream intent-extraction step and immutable afterwards.
///
/// `search_keywords` is a ranked set of named keyword groups ("primary",
/// "secondary", "extra1", ...); each non-empty value seeds the candidate
/// search for the destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripRequest {
    pub destination: String,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub duration_days: Option<u32>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default = "default_travelers")]
    pub travelers: u32,
    #[serde(default)]
    pub budget: Option<u64>,
    #[serde(default)]
    pub place_category: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub search_keywords: HashMap<String, String>,
    #[serde(default = "default_search_radius_km")]
    pub search_radius_km: u32,
    #[serde(default = "default_max_spots")]
    pub max_spots: usize,
    #[serde(default)]
    pub raw_query: Option<String>,
}

impl TripRequest {
    /// The free-text request fed to the narrative formatter. Falls back to
    /// a synthesized summary when the intent extractor didn't forward the
    /// original query.
    pub fn user_query(&self) -> String {
        if let Some(raw) = &self.raw_query {
            if !raw.trim().is_empty() {
                return raw.clone();
            }
        }

        let mut query = format!("Trip to {}", self.destination);
        if let Some(days) = self.duration_days {
            query.push_str(&format!(" for {} days", days));
        }
        if self.travelers > 1 {
            query.push_str(&format!(" with {} travelers", self.travelers));
        }
        if let Some(budget) = self.budget {
            query.push_str(&format!(" on a budget of {}", budget));
        }
        if !self.interests.is_empty() {
            query.push_str(&format!(", interested in {}", self.interests.join(", ")));
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_with_defaults() {
        let request: TripRequest = serde_json::from_str(r#"{"destination": "Goa"}"#).unwrap();
        assert_eq!(request.destination, "Goa");
        assert_eq!(request.travelers, 1);
        assert_eq!(request.search_radius_km, 75);
        assert_eq!(request.max_spots, 21);
        assert!(request.search_keywords.is_empty());
    }

    #[test]
    fn user_query_prefers_raw_text() {
        let request: TripRequest = serde_json::from_str(
            r#"{"destination": "Goa", "raw_query": "beach trip to goa for 3 days"}"#,
        )
        .unwrap();
        assert_eq!(request.user_query(), "beach trip to goa for 3 days");
    }

    #[test]
    fn user_query_synthesized_from_fields() {
        let request: TripRequest = serde_json::from_str(
            r#"{"destination": "Goa", "duration_days": 3, "travelers": 4, "interests": ["beaches"]}"#,
        )
        .unwrap();
        let query = request.user_query();
        assert!(query.contains("Goa"));
        assert!(query.contains("3 days"));
        assert!(query.contains("4 travelers"));
        assert!(query.contains("beaches"));
    }
}
