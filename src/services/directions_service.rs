use reqwest;
use serde::Deserialize;

use crate::config::PlannerConfig;
use crate::models::itinerary::{Activity, DayRoute, HotelInfo};
use crate::services::retry::RetryPolicy;

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    #[serde(default)]
    waypoint_order: Vec<usize>,
    overview_polyline: Option<Polyline>,
}

#[derive(Debug, Deserialize)]
struct Polyline {
    points: String,
}

/// Per-day route optimization through the Google Directions API: the day's
/// activities become waypoints on a hub-to-hub loop with `optimize:true`.
/// A call that still fails after the retry budget resolves to the original
/// activity order with an explicit fallback marker, never an error.
pub struct DirectionsService {
    http_client: reqwest::Client,
    api_key: String,
    retry: RetryPolicy,
}

impl DirectionsService {
    pub fn new(config: &PlannerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http_client,
            api_key: config.maps_api_key.clone(),
            retry: RetryPolicy::new(config.max_retries, config.retry_base_delay),
        })
    }

    pub async fn optimize_day(&self, day: u32, hub: &HotelInfo, activities: &[Activity]) -> DayRoute {
        if activities.is_empty() {
            return DayRoute {
                day,
                optimized_order: Vec::new(),
                polyline: None,
                fallback: false,
            };
        }

        let origin = format!("{},{}", hub.lat, hub.lng);
        let waypoints = format!(
            "optimize:true|{}",
            activities
                .iter()
                .map(|a| format!("{},{}", a.lat, a.lng))
                .collect::<Vec<_>>()
                .join("|")
        );

        let route = self
            .retry
            .run(|| self.fetch_route(&origin, &waypoints))
            .await;

        match route {
            Some(route) => DayRoute {
                day,
                optimized_order: reorder_activities(activities, &route.waypoint_order),
                polyline: route.overview_polyline.map(|p| p.points),
                fallback: false,
            },
            None => {
                eprintln!("Route optimization failed for day {}, keeping input order", day);
                fallback_route(day, activities)
            }
        }
    }

    async fn fetch_route(&self, origin: &str, waypoints: &str) -> Option<DirectionsRoute> {
        let response = self
            .http_client
            .get("https://maps.googleapis.com/maps/api/directions/json")
            .query(&[
                ("origin", origin),
                ("destination", origin),
                ("waypoints", waypoints),
                ("mode", "driving"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .ok()?;

        let body: DirectionsResponse = response.json().await.ok()?;
        if body.status != "OK" {
            return None;
        }
        body.routes.into_iter().next()
    }
}

/// Applies the optimized waypoint order; indices the service did not cover
/// keep their activities out of the reordering rather than panicking.
fn reorder_activities(activities: &[Activity], order: &[usize]) -> Vec<Activity> {
    if order.len() != activities.len() {
        return activities.to_vec();
    }
    order
        .iter()
        .filter_map(|&i| activities.get(i).cloned())
        .collect()
}

fn fallback_route(day: u32, activities: &[Activity]) -> DayRoute {
    DayRoute {
        day,
        optimized_order: activities.to_vec(),
        polyline: None,
        fallback: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(name: &str) -> Activity {
        serde_json::from_str(&format!(
            r#"{{"spot_name": "{}", "lat": 15.5, "long": 73.7}}"#,
            name
        ))
        .unwrap()
    }

    #[test]
    fn waypoint_order_is_applied() {
        let activities = vec![activity("a"), activity("b"), activity("c")];
        let ordered = reorder_activities(&activities, &[2, 0, 1]);
        let names: Vec<_> = ordered.iter().map(|a| a.spot_name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn incomplete_order_keeps_input_order() {
        let activities = vec![activity("a"), activity("b")];
        let ordered = reorder_activities(&activities, &[0]);
        let names: Vec<_> = ordered.iter().map(|a| a.spot_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn fallback_preserves_order_and_is_marked() {
        let activities = vec![activity("a"), activity("b")];
        let route = fallback_route(2, &activities);
        assert!(route.fallback);
        assert!(route.polyline.is_none());
        assert_eq!(route.optimized_order[0].spot_name, "a");
        assert_eq!(route.optimized_order[1].spot_name, "b");
    }
}
