use serde::Serialize;

use super::poi::Poi;

/// One committed stop inside a day bucket, in visiting order.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduledStop {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

/// An ordered day of visits plus the travel time the greedy scheduler
/// accumulated while filling it.
#[derive(Debug, Clone, Serialize)]
pub struct DayBucket {
    pub day: u32,
    pub stops: Vec<ScheduledStop>,
    pub travel_time_min: f64,
}

/// The full bucketed schedule handed to the narrative formatter.
#[derive(Debug, Clone, Serialize)]
pub struct DaySchedule {
    pub hub: Poi,
    pub days: Vec<DayBucket>,
}
