//! Day Enricher
//!
//! For one formatted plan, fans out a route-optimization request per day
//! and a weather request per activity, all as concurrent tasks, then joins
//! on the full set before assembling output. Weather tags are attached
//! back onto activities sequentially after the join, indexed by stable
//! task order, so no activity record is touched by more than one task.

use chrono::{NaiveDate, Utc};
use futures::future::join_all;

use crate::config::PlannerConfig;
use crate::models::itinerary::{DayPlan, EnrichedItinerary, ItineraryPlan, TripSummary};
use crate::services::directions_service::DirectionsService;
use crate::services::weather_service::WeatherService;

pub struct EnrichmentService {
    directions: DirectionsService,
    weather: WeatherService,
}

impl EnrichmentService {
    pub fn new(config: &PlannerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            directions: DirectionsService::new(config)?,
            weather: WeatherService::new(config)?,
        })
    }

    pub async fn enrich_plan(&self, plan: ItineraryPlan) -> EnrichedItinerary {
        let hotel = plan.hotel.clone();

        let route_tasks = plan
            .itinerary
            .iter()
            .map(|day| self.directions.optimize_day(day.day, &hotel, &day.activities));
        let weather_tasks = plan
            .itinerary
            .iter()
            .flat_map(|day| day.activities.iter())
            .map(|activity| self.weather.current_condition(activity.lat, activity.lng));

        let (routes, conditions) =
            futures::join!(join_all(route_tasks), join_all(weather_tasks));

        let mut days = plan.itinerary;
        attach_weather(&mut days, &conditions);

        let start_date = plan
            .date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .unwrap_or_else(|| Utc::now().date_naive());
        let duration_days = days.len() as u32;

        let destination = if hotel.name.is_empty() {
            "Unknown".to_string()
        } else {
            hotel.name.clone()
        };
        let trip_name = if hotel.name.is_empty() {
            "Trip to Destination".to_string()
        } else {
            format!("Trip to {}", hotel.name)
        };

        EnrichedItinerary {
            trip_details: TripSummary {
                trip_name,
                itinerary_name: plan.itinerary_name,
                start_date,
                end_date: start_date
                    + chrono::Duration::days(duration_days.saturating_sub(1) as i64),
                duration_days,
                destination,
            },
            hotel,
            optimized_routes: routes,
            itinerary: days,
        }
    }
}

/// Sequential write-back after the concurrent join: the Nth weather result
/// belongs to the Nth activity in day-then-activity order.
pub fn attach_weather(days: &mut [DayPlan], conditions: &[String]) {
    let mut index = 0;
    for day in days {
        for activity in &mut day.activities {
            activity.weather = conditions.get(index).cloned();
            index += 1;
        }
    }
}
