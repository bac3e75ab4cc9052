use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

use crate::models::itinerary::ItineraryPlan;
use crate::models::trip_request::TripRequest;
use crate::services::narrative_service::NarrativeError;
use crate::services::planner_service::{PlannerError, TripPlanner};

/*
    /api/itineraries/build
*/
pub async fn build(
    body: web::Json<TripRequest>,
    data: web::Data<TripPlanner>,
) -> impl Responder {
    let request = body.into_inner();
    if request.destination.trim().is_empty() {
        return HttpResponse::BadRequest().body("Destination is required");
    }

    match data.build_itinerary(&request, None).await {
        Ok(itineraries) => HttpResponse::Ok().json(itineraries),
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Deserialize)]
pub struct ReplanRequest {
    pub request: TripRequest,
    pub plan: ItineraryPlan,
}

/*
    /api/itineraries/replan
*/
pub async fn replan(
    body: web::Json<ReplanRequest>,
    data: web::Data<TripPlanner>,
) -> impl Responder {
    let ReplanRequest { request, plan } = body.into_inner();
    if request.destination.trim().is_empty() {
        return HttpResponse::BadRequest().body("Destination is required");
    }

    match data.build_itinerary(&request, Some(&plan)).await {
        Ok(itineraries) => HttpResponse::Ok().json(itineraries),
        Err(err) => error_response(err),
    }
}

// Failed generative output travels back with the raw text attached so the
// caller can diagnose what the service actually produced.
fn error_response(err: PlannerError) -> HttpResponse {
    match err {
        PlannerError::HubNotFound => {
            HttpResponse::NotFound().body("No spots could be located for this destination")
        }
        PlannerError::Narrative(NarrativeError::UnexpectedFormat { raw }) => {
            HttpResponse::BadGateway().json(json!({
                "error": "Unexpected format",
                "raw_text": raw,
            }))
        }
        PlannerError::Narrative(NarrativeError::InvalidAfterRepair { raw }) => {
            HttpResponse::BadGateway().json(json!({
                "error": "Invalid JSON even after fix",
                "raw_text": raw,
            }))
        }
        other => {
            eprintln!("Failed to build itinerary: {}", other);
            HttpResponse::InternalServerError().body("Failed to build itinerary")
        }
    }
}
