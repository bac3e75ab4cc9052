use chrono::NaiveDate;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

// The generative service is asked for numeric coordinates but routinely
// echoes placeholder strings or quoted numbers instead. Tolerant decoding
// keeps one malformed activity from sinking a whole plan.
fn flexible_f64(value: &serde_json::Value) -> f64 {
    match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn deserialize_flexible_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(flexible_f64(&value))
}

// "estimated_time_spent" comes back as "2 hours", "4-5 hours" or a bare
// number depending on the model's mood.
fn deserialize_flexible_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// One visit inside a generated plan. `weather` is attached in place by
/// the day enricher after the weather fan-in; everything else is immutable
/// once the narrative formatter emits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub spot_name: String,
    #[serde(deserialize_with = "deserialize_flexible_f64", default)]
    pub lat: f64,
    #[serde(
        rename = "long",
        deserialize_with = "deserialize_flexible_f64",
        default
    )]
    pub lng: f64,
    #[serde(default)]
    pub description: String,
    #[serde(deserialize_with = "deserialize_flexible_string", default)]
    pub estimated_time_spent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<String>,
}

/// Hub/hotel descriptor as echoed back by the generative service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HotelInfo {
    #[serde(default)]
    pub name: String,
    #[serde(deserialize_with = "deserialize_flexible_f64", default)]
    pub lat: f64,
    #[serde(deserialize_with = "deserialize_flexible_f64", default)]
    pub lng: f64,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub open_now: Option<bool>,
}

/// An ordered day of activities. Internally days are a plain sequence
/// indexed by day number; the `"Day N"`-labeled mapping only exists at the
/// generative wire boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayPlan {
    pub day: u32,
    pub activities: Vec<Activity>,
}

/// Converts the wire-format `"Day N"` map into ordered day records. Labels
/// without a trailing day number are appended after the numbered ones, in
/// label order, continuing the numbering.
pub fn day_plans_from_labels(labeled: HashMap<String, Vec<Activity>>) -> Vec<DayPlan> {
    let mut numbered = Vec::new();
    let mut unnumbered = Vec::new();

    for (label, activities) in labeled {
        match label
            .rsplit(' ')
            .next()
            .and_then(|tail| tail.parse::<u32>().ok())
        {
            Some(day) => numbered.push((day, activities)),
            None => unnumbered.push((label, activities)),
        }
    }

    numbered.sort_by_key(|(day, _)| *day);
    unnumbered.sort_by(|(a, _), (b, _)| a.cmp(b));

    let mut days: Vec<DayPlan> = numbered
        .into_iter()
        .map(|(day, activities)| DayPlan { day, activities })
        .collect();
    let mut next = days.last().map(|d| d.day + 1).unwrap_or(1);
    for (_, activities) in unnumbered {
        days.push(DayPlan {
            day: next,
            activities,
        });
        next += 1;
    }
    days
}

fn deserialize_day_plans<'de, D>(deserializer: D) -> Result<Vec<DayPlan>, D::Error>
where
    D: Deserializer<'de>,
{
    let labeled: HashMap<String, Vec<Activity>> = HashMap::deserialize(deserializer)?;
    Ok(day_plans_from_labels(labeled))
}

fn serialize_day_plans<S>(days: &[DayPlan], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(days.len()))?;
    for day in days {
        map.serialize_entry(&format!("Day {}", day.day), &day.activities)?;
    }
    map.end()
}

/// One generated plan as consumed from the narrative formatter. All fields
/// are defaulted so a structurally valid but sparse response still decodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItineraryPlan {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub duration_days: Option<u32>,
    #[serde(default)]
    pub itinerary_name: Option<String>,
    #[serde(default)]
    pub hotel: HotelInfo,
    #[serde(
        deserialize_with = "deserialize_day_plans",
        serialize_with = "serialize_day_plans",
        default
    )]
    pub itinerary: Vec<DayPlan>,
}

/// Trip metadata summarizing an enriched plan.
#[derive(Debug, Clone, Serialize)]
pub struct TripSummary {
    pub trip_name: String,
    pub itinerary_name: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_days: u32,
    pub destination: String,
}

/// Route-optimization result for one day. When the directions lookup could
/// not be completed, `fallback` is set and `optimized_order` preserves the
/// original activity order.
#[derive(Debug, Clone, Serialize)]
pub struct DayRoute {
    pub day: u32,
    pub optimized_order: Vec<Activity>,
    pub polyline: Option<String>,
    pub fallback: bool,
}

/// Terminal pipeline artifact: one plan with routes and weather attached.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedItinerary {
    pub trip_details: TripSummary,
    pub hotel: HotelInfo,
    pub optimized_routes: Vec<DayRoute>,
    #[serde(serialize_with = "serialize_day_plans")]
    pub itinerary: Vec<DayPlan>,
}
