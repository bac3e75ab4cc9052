use std::error::Error;
use std::fmt;

use chrono::Utc;

use crate::config::PlannerConfig;
use crate::models::itinerary::{EnrichedItinerary, ItineraryPlan};
use crate::models::schedule::DaySchedule;
use crate::models::trip_request::TripRequest;
use crate::services::curation_service::CurationService;
use crate::services::distance_service::DistanceService;
use crate::services::enrichment_service::EnrichmentService;
use crate::services::narrative_service::{GeminiClient, NarrativeError, NarrativeService};
use crate::services::scheduler_service;

#[derive(Debug)]
pub enum PlannerError {
    HubNotFound,
    Distance(String),
    Narrative(NarrativeError),
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannerError::HubNotFound => {
                write!(f, "No hub location could be selected for the destination")
            }
            PlannerError::Distance(msg) => write!(f, "Distance computation failed: {}", msg),
            PlannerError::Narrative(err) => write!(f, "{}", err),
        }
    }
}

impl Error for PlannerError {}

impl From<NarrativeError> for PlannerError {
    fn from(err: NarrativeError) -> Self {
        PlannerError::Narrative(err)
    }
}

/// Sequences the planning stages with strict barriers between them:
/// curation, distance annotation, day bucketing, narrative formatting,
/// enrichment. Each invocation is independent end to end; the only state
/// the planner holds is its configuration and HTTP clients.
pub struct TripPlanner {
    config: PlannerConfig,
    curation: CurationService,
    distance: DistanceService,
    narrative: NarrativeService<GeminiClient>,
    enrichment: EnrichmentService,
}

impl TripPlanner {
    pub fn new(config: PlannerConfig) -> Result<Self, Box<dyn Error>> {
        let curation = CurationService::new(&config)?;
        let distance = DistanceService::new(&config)?;
        let narrative = NarrativeService::new(GeminiClient::new(&config)?);
        let enrichment = EnrichmentService::new(&config)?;

        Ok(Self {
            config,
            curation,
            distance,
            narrative,
            enrichment,
        })
    }

    /// Builds one or more enriched itineraries for the request. With an
    /// existing plan attached this becomes a replan: a single plan with
    /// only the requested portion modified.
    pub async fn build_itinerary(
        &self,
        request: &TripRequest,
        existing: Option<&ItineraryPlan>,
    ) -> Result<Vec<EnrichedItinerary>, PlannerError> {
        println!("🧭 Planning trip to {}", request.destination);

        let curated = self.curation.curate(request).await;
        let hub = curated.hub.clone().ok_or(PlannerError::HubNotFound)?;
        println!("Hub selected: {}", hub.name);

        let (features, cab_budget) = self
            .distance
            .annotate_spots(&hub, &curated.spots)
            .await
            .map_err(|e| PlannerError::Distance(e.to_string()))?;
        println!(
            "{} spots within range, estimated cab budget {}",
            features.len(),
            cab_budget
        );

        let pair_matrix = self.distance.pair_matrix(&curated.spots).await;

        let buckets = scheduler_service::build_day_buckets(
            features,
            &pair_matrix,
            self.config.max_daily_travel_min,
        );
        println!("Scheduled {} day(s) of visits", buckets.len());
        let schedule = DaySchedule { hub, days: buckets };

        let user_query = request.user_query();
        let plans = match existing {
            Some(plan) => {
                self.narrative
                    .replan(&schedule, &user_query, plan, Utc::now().date_naive())
                    .await?
            }
            None => self.narrative.format_plans(&schedule, &user_query).await?,
        };
        println!("Formatter returned {} plan(s)", plans.len());

        let mut enriched = Vec::with_capacity(plans.len());
        for plan in plans {
            enriched.push(self.enrichment.enrich_plan(plan).await);
        }

        if let Some(path) = &self.config.snapshot_path {
            if let Err(e) = write_snapshot(path, &enriched) {
                eprintln!("Failed to write output snapshot to {}: {}", path, e);
            }
        }

        Ok(enriched)
    }
}

fn write_snapshot(path: &str, output: &[EnrichedItinerary]) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(output)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrative_errors_convert_into_planner_errors() {
        let err: PlannerError = NarrativeError::InvalidAfterRepair {
            raw: "{broken".to_string(),
        }
        .into();
        assert!(matches!(
            err,
            PlannerError::Narrative(NarrativeError::InvalidAfterRepair { .. })
        ));
    }

    #[test]
    fn display_messages_are_stable() {
        assert_eq!(
            PlannerError::HubNotFound.to_string(),
            "No hub location could be selected for the destination"
        );
        assert!(PlannerError::Distance("timeout".to_string())
            .to_string()
            .contains("timeout"));
    }
}
