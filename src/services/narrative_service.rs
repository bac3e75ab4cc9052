//! Narrative Formatter
//!
//! Turns a bucketed day schedule into one or more presentable itinerary
//! plans by prompting a generative text service under a strict JSON-only
//! contract, then validating and, when needed, repairing its output.
//!
//! The consumption protocol is a fixed state machine:
//! Requesting → Parsing → (on decode failure) Repairing → Failed.
//! Exactly one repair attempt is made; a second structural failure is
//! terminal and surfaces the raw repaired text for diagnosis. Callers
//! always receive a list of plans on any non-failure path, even when the
//! service answered with a bare object.

use chrono::NaiveDate;
use reqwest;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

use crate::config::PlannerConfig;
use crate::models::itinerary::ItineraryPlan;
use crate::models::schedule::DaySchedule;

const MAX_OUTPUT_TOKENS: u32 = 24000;

#[derive(Debug, Clone, Copy)]
pub enum GenerationProfile {
    /// Plan generation: some sampling freedom.
    Creative,
    /// Structural JSON repair: no freedom at all.
    Deterministic,
}

/// Abstract generative text contract so the formatter's state machine can
/// be exercised against scripted producers.
pub trait TextGenerator {
    async fn generate(
        &self,
        prompt: &str,
        profile: GenerationProfile,
    ) -> Result<String, Box<dyn Error>>;
}

#[derive(Debug)]
pub enum NarrativeError {
    Generation(String),
    UnexpectedFormat { raw: String },
    InvalidAfterRepair { raw: String },
}

impl fmt::Display for NarrativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NarrativeError::Generation(msg) => write!(f, "Text generation failed: {}", msg),
            NarrativeError::UnexpectedFormat { .. } => {
                write!(f, "Generative response was neither an object nor a list")
            }
            NarrativeError::InvalidAfterRepair { .. } => {
                write!(f, "Invalid JSON even after repair")
            }
        }
    }
}

impl Error for NarrativeError {}

/// Outcome of one strict decode attempt over raw generative output.
#[derive(Debug)]
pub enum ParseAttempt {
    Plans(Vec<ItineraryPlan>),
    UnexpectedShape,
    Malformed,
}

/// Strict JSON decode with the object/list rule: a list is used as-is, a
/// bare object is wrapped as a one-element plan list, anything else is an
/// unexpected shape. A decode error is reported as `Malformed` so the
/// caller can enter the repair state.
pub fn parse_plans(raw: &str) -> ParseAttempt {
    let value: serde_json::Value = match serde_json::from_str(raw.trim()) {
        Ok(value) => value,
        Err(_) => return ParseAttempt::Malformed,
    };

    match value {
        serde_json::Value::Array(_) => match serde_json::from_value::<Vec<ItineraryPlan>>(value) {
            Ok(plans) => ParseAttempt::Plans(plans),
            Err(_) => ParseAttempt::UnexpectedShape,
        },
        serde_json::Value::Object(_) => match serde_json::from_value::<ItineraryPlan>(value) {
            Ok(plan) => ParseAttempt::Plans(vec![plan]),
            Err(_) => ParseAttempt::UnexpectedShape,
        },
        _ => ParseAttempt::UnexpectedShape,
    }
}

pub struct NarrativeService<G: TextGenerator> {
    generator: G,
}

impl<G: TextGenerator> NarrativeService<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    /// Requests three independent, non-overlapping plans for the schedule.
    pub async fn format_plans(
        &self,
        schedule: &DaySchedule,
        user_query: &str,
    ) -> Result<Vec<ItineraryPlan>, NarrativeError> {
        let prompt = build_plan_prompt(schedule, user_query);
        self.consume(&prompt).await
    }

    /// Replan mode: one plan, modifying only what the user asked to change
    /// and preserving the rest of the existing plan verbatim.
    pub async fn replan(
        &self,
        schedule: &DaySchedule,
        user_query: &str,
        existing: &ItineraryPlan,
        today: NaiveDate,
    ) -> Result<Vec<ItineraryPlan>, NarrativeError> {
        let prompt = build_replan_prompt(schedule, user_query, existing, today);
        self.consume(&prompt).await
    }

    async fn consume(&self, prompt: &str) -> Result<Vec<ItineraryPlan>, NarrativeError> {
        let raw = self
            .generator
            .generate(prompt, GenerationProfile::Creative)
            .await
            .map_err(|e| NarrativeError::Generation(e.to_string()))?;

        match parse_plans(&raw) {
            ParseAttempt::Plans(plans) => Ok(plans),
            ParseAttempt::UnexpectedShape => Err(NarrativeError::UnexpectedFormat { raw }),
            ParseAttempt::Malformed => {
                println!("JSON decode failed, attempting structural repair");
                let repaired = self
                    .generator
                    .generate(&build_repair_prompt(&raw), GenerationProfile::Deterministic)
                    .await
                    .map_err(|e| NarrativeError::Generation(e.to_string()))?;

                match parse_plans(&repaired) {
                    ParseAttempt::Plans(plans) => Ok(plans),
                    ParseAttempt::UnexpectedShape => {
                        Err(NarrativeError::UnexpectedFormat { raw: repaired })
                    }
                    // One repair attempt is the hard bound.
                    ParseAttempt::Malformed => {
                        eprintln!("Repair attempt failed, surfacing raw output");
                        Err(NarrativeError::InvalidAfterRepair { raw: repaired })
                    }
                }
            }
        }
    }
}

const PLAN_SCHEMA: &str = r#"{
    "date": "YYYY-MM-DD",
    "duration_days": 3,
    "itinerary_name": "2-3 word catchy itinerary name",
    "hotel": {
        "name": "Uv Bar",
        "lat": 15.5793064,
        "lng": 73.7388843,
        "rating": 3.9,
        "types": ["bar", "establishment"],
        "open_now": true
    },
    "itinerary": {
        "Day 1": [{
            "spot_name": "Dream Beach",
            "lat": 15.55,
            "long": 73.75,
            "description": "very crisp description",
            "estimated_time_spent": "2 hours"
        }],
        "Day 2": []
    }
}"#;

/// Day buckets rendered the way the generative schema expects them: a
/// "Day N"-labeled mapping plus the hub under "hotel_location".
pub fn schedule_payload(schedule: &DaySchedule) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for day in &schedule.days {
        map.insert(
            format!("Day {}", day.day),
            serde_json::to_value(&day.stops).unwrap_or_default(),
        );
    }
    map.insert(
        "hotel_location".to_string(),
        serde_json::to_value(&schedule.hub).unwrap_or_default(),
    );
    serde_json::Value::Object(map)
}

fn build_plan_prompt(schedule: &DaySchedule, user_query: &str) -> String {
    let spots_json = serde_json::to_string(&schedule_payload(schedule)).unwrap_or_default();
    format!(
        "You are a professional travel planner.\n\n\
        TASK: Create three unique trip plans for the user's request below. \
        Each plan must use a different set of places; no spot may repeat across plans.\n\n\
        Follow these steps strictly:\n\
        1. Group nearby spots on the same day to minimize travel.\n\
        2. Start each day near the hotel and pick user-requested or nearby places.\n\
        3. Allocate realistic durations (1-2h for small spots, 3-5h for beaches).\n\
        4. Each plan must be a valid JSON object matching the schema below.\n\
        5. Output an array containing the 3 plans: [plan1, plan2, plan3].\n\n\
        SCHEMA for each plan:\n{schema}\n\n\
        RULES:\n\
        - If the user mentions a number of days, plan exactly that many days (Day 1 ... Day N).\n\
        - If not mentioned, default to 3 days.\n\
        - Each day must have at least 3 activities (morning, afternoon, evening).\n\
        - Each description should be short, 7-8 words max.\n\
        - Prioritize the provided spots; use at least two of them per plan whenever \
        possible, and fill the rest from nearby places with accurate coordinates.\n\
        - The total estimated_time_spent within one day must not exceed 9 hours.\n\
        - Output pure JSON only, no explanations or comments.\n\n\
        User request: {query}\n\
        Spots JSON: {spots}\n\
        Now think carefully and output only the final JSON.",
        schema = PLAN_SCHEMA,
        query = user_query,
        spots = spots_json,
    )
}

fn build_replan_prompt(
    schedule: &DaySchedule,
    user_query: &str,
    existing: &ItineraryPlan,
    today: NaiveDate,
) -> String {
    let spots_json = serde_json::to_string(&schedule_payload(schedule)).unwrap_or_default();
    let plan_json = serde_json::to_string(existing).unwrap_or_default();
    format!(
        "You are a professional travel re-planner.\n\n\
        Your role is to revise an existing plan based on the user's replan request.\n\n\
        Inputs:\n\
        1. The user's replan query: {query}\n\
        2. The plan the user wants to edit: {plan}\n\
        3. Today's date ({today}) in YYYY-MM-DD form; keep the plan's own date.\n\n\
        TASK: Create exactly one trip plan. Output an array containing that \
        single plan: [plan1].\n\n\
        SCHEMA for the plan:\n{schema}\n\n\
        RULES:\n\
        - Modify only what the replan query asks for; keep every other day and \
        activity of the existing plan verbatim.\n\
        - Plan exactly the days already present.\n\
        - Each day must have at least 3 activities (morning, afternoon, evening).\n\
        - Each description should be short, 7-8 words max.\n\
        - Output pure JSON only, no explanations or comments.\n\n\
        Spots JSON: {spots}\n\
        Now think carefully and output only the final JSON.",
        query = user_query,
        plan = plan_json,
        today = today,
        schema = PLAN_SCHEMA,
        spots = spots_json,
    )
}

fn build_repair_prompt(bad_json: &str) -> String {
    format!(
        "The following JSON is invalid or incomplete.\n\
        Your job is to only repair structural issues (missing commas, brackets, \
        quotes) without changing or rewording any field values.\n\
        Return strictly valid JSON. Do not add comments or text.\n\n\
        JSON to fix:\n{}",
        bad_json
    )
}

// ---- Gemini-backed implementation ----

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f64,
    #[serde(rename = "topP", skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: String,
}

/// Gemini `generateContent` client with a JSON response MIME type.
pub struct GeminiClient {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &PlannerConfig) -> Result<Self, Box<dyn Error>> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout * 6)
            .build()?;

        Ok(Self {
            http_client,
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
        })
    }
}

impl TextGenerator for GeminiClient {
    async fn generate(
        &self,
        prompt: &str,
        profile: GenerationProfile,
    ) -> Result<String, Box<dyn Error>> {
        let generation_config = match profile {
            GenerationProfile::Creative => GenerationConfig {
                temperature: 0.6,
                top_p: Some(0.8),
                max_output_tokens: MAX_OUTPUT_TOKENS,
                response_mime_type: "application/json",
            },
            GenerationProfile::Deterministic => GenerationConfig {
                temperature: 0.0,
                top_p: None,
                max_output_tokens: MAX_OUTPUT_TOKENS,
                response_mime_type: "application/json",
            },
        };

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config,
        };

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", &self.api_key)])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(format!(
                "Generation request failed with status {}: {}",
                status, error_text
            )
            .into());
        }

        let body: GenerateResponse = response.json().await?;
        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or("Generation response contained no candidates")?;

        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::poi::Poi;
    use crate::models::schedule::{DayBucket, ScheduledStop};
    use std::cell::RefCell;
    use std::collections::VecDeque;

    struct MockGenerator {
        responses: RefCell<VecDeque<Result<String, String>>>,
        prompts: RefCell<Vec<String>>,
    }

    impl MockGenerator {
        fn scripted(responses: Vec<Result<String, String>>) -> Self {
            Self {
                responses: RefCell::new(responses.into_iter().collect()),
                prompts: RefCell::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.borrow().len()
        }
    }

    impl TextGenerator for MockGenerator {
        async fn generate(
            &self,
            prompt: &str,
            _profile: GenerationProfile,
        ) -> Result<String, Box<dyn Error>> {
            self.prompts.borrow_mut().push(prompt.to_string());
            match self.responses.borrow_mut().pop_front() {
                Some(Ok(text)) => Ok(text),
                Some(Err(msg)) => Err(msg.into()),
                None => Err("no scripted response left".into()),
            }
        }
    }

    fn schedule() -> DaySchedule {
        DaySchedule {
            hub: Poi {
                id: "hub".to_string(),
                name: "Uv Bar".to_string(),
                lat: 15.58,
                lng: 73.74,
                rating: Some(3.9),
                types: vec!["bar".to_string()],
                open_now: Some(true),
            },
            days: vec![DayBucket {
                day: 1,
                stops: vec![ScheduledStop {
                    name: "Dream Beach".to_string(),
                    lat: 15.55,
                    lng: 73.75,
                }],
                travel_time_min: 12.0,
            }],
        }
    }

    fn service(
        responses: Vec<Result<String, String>>,
    ) -> NarrativeService<MockGenerator> {
        NarrativeService::new(MockGenerator::scripted(responses))
    }

    #[tokio::test]
    async fn bare_object_is_wrapped_into_a_list() {
        let service = service(vec![Ok(r#"{"date": "2025-01-01"}"#.to_string())]);
        let plans = service.format_plans(&schedule(), "goa trip").await.unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].date.as_deref(), Some("2025-01-01"));
        assert_eq!(service.generator.calls(), 1);
    }

    #[tokio::test]
    async fn list_responses_pass_through() {
        let service = service(vec![Ok(
            r#"[{"date": "2025-01-01"}, {"date": "2025-01-02"}]"#.to_string()
        )]);
        let plans = service.format_plans(&schedule(), "goa trip").await.unwrap();
        assert_eq!(plans.len(), 2);
    }

    #[tokio::test]
    async fn truncated_json_recovers_through_one_repair() {
        let service = service(vec![
            Ok(r#"[{"date": "2025-01-01""#.to_string()),
            Ok(r#"[{"date": "2025-01-01"}]"#.to_string()),
        ]);
        let plans = service.format_plans(&schedule(), "goa trip").await.unwrap();
        assert_eq!(plans.len(), 1);
        // One plan call plus exactly one repair call.
        assert_eq!(service.generator.calls(), 2);
        let prompts = service.generator.prompts.borrow();
        assert!(prompts[1].contains("only repair structural issues"));
    }

    #[tokio::test]
    async fn second_structural_failure_is_terminal() {
        let service = service(vec![
            Ok("{broken".to_string()),
            Ok("{still broken".to_string()),
        ]);
        let err = service
            .format_plans(&schedule(), "goa trip")
            .await
            .unwrap_err();
        match err {
            NarrativeError::InvalidAfterRepair { raw } => assert_eq!(raw, "{still broken"),
            other => panic!("expected InvalidAfterRepair, got {:?}", other),
        }
        // The repair path runs at most once; no third generation call.
        assert_eq!(service.generator.calls(), 2);
    }

    #[tokio::test]
    async fn scalar_response_is_an_unexpected_format() {
        let service = service(vec![Ok(r#""just a string""#.to_string())]);
        let err = service
            .format_plans(&schedule(), "goa trip")
            .await
            .unwrap_err();
        match err {
            NarrativeError::UnexpectedFormat { raw } => assert!(raw.contains("just a string")),
            other => panic!("expected UnexpectedFormat, got {:?}", other),
        }
        assert_eq!(service.generator.calls(), 1);
    }

    #[tokio::test]
    async fn replan_asks_for_a_single_plan() {
        let existing: ItineraryPlan =
            serde_json::from_str(r#"{"date": "2025-01-01", "itinerary": {"Day 1": []}}"#).unwrap();
        let service = service(vec![Ok(r#"[{"date": "2025-01-01"}]"#.to_string())]);
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();

        let plans = service
            .replan(&schedule(), "swap day 1 for beaches", &existing, today)
            .await
            .unwrap();
        assert_eq!(plans.len(), 1);

        let prompts = service.generator.prompts.borrow();
        assert!(prompts[0].contains("exactly one trip plan"));
        assert!(prompts[0].contains("keep every other day"));
        assert!(prompts[0].contains("2025-01-01"));
    }

    #[test]
    fn schedule_payload_uses_day_labels_and_hub() {
        let payload = schedule_payload(&schedule());
        assert!(payload["Day 1"].is_array());
        assert_eq!(payload["hotel_location"]["name"], "Uv Bar");
    }
}
