//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use along_core::domain::{IntakeAnswer, SegmentRequest};

use crate::pipeline::onboarding::OnboardingAnswers;
use crate::pipeline::PipelineError;
use crate::web::auth;
use crate::web::state::AppState;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        submit_intake_handler,
        build_trip_handler,
        onboarding_handler,
        research_handler,
        refine_research_handler,
        resolve_flights_handler,
        list_locations_handler,
    ),
    components(
        schemas(
            auth::SignupRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            IntakeAnswerPayload,
            IntakeRequest,
            IntakeResponse,
            BuildRequest,
            BuildResponse,
            OnboardingRequest,
            OnboardingResponse,
            ResearchRequest,
            RefineRequest,
            SegmentPayload,
            FlightsRequest,
            FlightsResponse,
            LocationsResponse,
        )
    ),
    tags(
        (name = "Along API", description = "Taste-profiled trip planning endpoints.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Request/Response Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct IntakeAnswerPayload {
    pub question_id: String,
    pub question: String,
    pub answer: String,
}

#[derive(Deserialize, ToSchema)]
pub struct IntakeRequest {
    pub answers: Vec<IntakeAnswerPayload>,
}

#[derive(Serialize, ToSchema)]
pub struct IntakeResponse {
    pub trip_intent_id: Uuid,
    pub destination: String,
    pub status: String,
    pub taste_summary: String,
    /// Zero to three scope options; empty when scope generation degraded.
    pub scope_options: Value,
}

#[derive(Deserialize, ToSchema)]
pub struct BuildRequest {
    pub trip_intent_id: Uuid,
    /// Omitted: falls back to the intent's selected scope, then the first.
    #[serde(default)]
    pub scope_id: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct BuildResponse {
    pub blueprint_id: Uuid,
    pub title: String,
    pub days: usize,
    pub total_places: usize,
    pub locations: Value,
}

#[derive(Deserialize, ToSchema)]
pub struct OnboardingRequest {
    pub image_moods: Vec<String>,
    pub anchor_text: String,
    pub bucket_list_trip: String,
    pub hard_constraint: String,
}

#[derive(Serialize, ToSchema)]
pub struct OnboardingResponse {
    pub taste_phrases: Vec<String>,
    pub taste_summary: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ResearchRequest {
    pub query: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RefineRequest {
    pub query: String,
    pub instruction: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SegmentPayload {
    pub origin_city: String,
    pub destination_city: String,
    #[serde(default)]
    pub origin_iata: Option<String>,
    #[serde(default)]
    pub destination_iata: Option<String>,
    /// ISO date, `YYYY-MM-DD`.
    pub date: String,
    #[serde(default)]
    pub passengers: Option<u32>,
}

#[derive(Deserialize, ToSchema)]
pub struct FlightsRequest {
    pub blueprint_id: Uuid,
    pub segments: Vec<SegmentPayload>,
}

#[derive(Serialize, ToSchema)]
pub struct FlightsResponse {
    /// One entry per requested segment, in request order.
    pub segments: Value,
}

#[derive(Serialize, ToSchema)]
pub struct LocationsResponse {
    pub blueprint_id: Uuid,
    pub locations: Value,
}

//=========================================================================================
// Error Mapping
//=========================================================================================

/// Collapses pipeline failures onto HTTP statuses. Generation failures are
/// upstream-model faults, surfaced as 502 so clients can retry.
fn pipeline_error_response(err: PipelineError) -> (StatusCode, String) {
    use along_core::ports::PortError;
    match err {
        PipelineError::Generation { stage, source } => {
            error!("Generation failed at {stage}: {source:?}");
            (StatusCode::BAD_GATEWAY, format!("{stage} generation failed"))
        }
        PipelineError::Port(PortError::NotFound(msg)) => (StatusCode::NOT_FOUND, msg),
        PipelineError::Port(PortError::Unauthorized) => {
            (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
        }
        PipelineError::Port(PortError::Unexpected(msg)) => {
            error!("Port failure: {msg}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

fn to_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_default()
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Submit intake answers: extracts a taste profile, generates scope options
/// and records the trip intent.
#[utoipa::path(
    post,
    path = "/trips/intake",
    request_body = IntakeRequest,
    responses(
        (status = 201, description = "Intake recorded", body = IntakeResponse),
        (status = 401, description = "Not logged in"),
        (status = 502, description = "Profile extraction failed")
    )
)]
pub async fn submit_intake_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<IntakeRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let answers: Vec<IntakeAnswer> = req
        .answers
        .into_iter()
        .map(|a| IntakeAnswer {
            question_id: a.question_id,
            question: a.question,
            answer: a.answer,
        })
        .collect();

    let outcome = state
        .pipeline
        .submit_intake(user_id, &answers)
        .await
        .map_err(pipeline_error_response)?;

    let response = IntakeResponse {
        trip_intent_id: outcome.trip_intent.id,
        destination: outcome.trip_intent.destination.clone(),
        status: to_value(&outcome.trip_intent.status)
            .as_str()
            .unwrap_or_default()
            .to_string(),
        taste_summary: outcome.profile.taste_summary,
        scope_options: to_value(&outcome.trip_intent.scope_options),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Build the full itinerary for a scope and persist it as a blueprint.
#[utoipa::path(
    post,
    path = "/trips/build",
    request_body = BuildRequest,
    responses(
        (status = 201, description = "Itinerary built", body = BuildResponse),
        (status = 404, description = "Intent, profile or scope not found"),
        (status = 502, description = "Itinerary generation failed")
    )
)]
pub async fn build_trip_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<BuildRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let outcome = state
        .pipeline
        .build_itinerary(user_id, req.trip_intent_id, req.scope_id)
        .await
        .map_err(pipeline_error_response)?;

    let response = BuildResponse {
        blueprint_id: outcome.blueprint_id,
        title: outcome.title,
        days: outcome.days,
        total_places: outcome.total_places,
        locations: to_value(&outcome.locations),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Run the onboarding mirror: a taste profile plus reflective phrases.
#[utoipa::path(
    post,
    path = "/onboarding",
    request_body = OnboardingRequest,
    responses(
        (status = 200, description = "Profile extracted", body = OnboardingResponse),
        (status = 502, description = "Profile extraction failed")
    )
)]
pub async fn onboarding_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<OnboardingRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let answers = OnboardingAnswers {
        image_moods: req.image_moods,
        anchor_text: req.anchor_text,
        bucket_list_trip: req.bucket_list_trip,
        hard_constraint: req.hard_constraint,
    };
    let outcome = state
        .pipeline
        .run_onboarding(user_id, &answers)
        .await
        .map_err(pipeline_error_response)?;

    Ok(Json(OnboardingResponse {
        taste_phrases: outcome.taste_phrases,
        taste_summary: outcome.profile.taste_summary,
    }))
}

/// Free-form research: themed place recommendations, geocoded best-effort.
#[utoipa::path(
    post,
    path = "/research",
    request_body = ResearchRequest,
    responses(
        (status = 200, description = "Research plan", body = Value),
        (status = 502, description = "Plan generation failed")
    )
)]
pub async fn research_handler(
    State(state): State<Arc<AppState>>,
    Extension(_user_id): Extension<Uuid>,
    Json(req): Json<ResearchRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let plan = state
        .pipeline
        .run_research(&req.query)
        .await
        .map_err(pipeline_error_response)?;
    Ok(Json(to_value(&plan)))
}

/// Refine an earlier research query. Stateless: the original query and the
/// refinement instruction travel together in the request.
#[utoipa::path(
    post,
    path = "/research/refine",
    request_body = RefineRequest,
    responses(
        (status = 200, description = "Refined research plan", body = Value),
        (status = 502, description = "Plan generation failed")
    )
)]
pub async fn refine_research_handler(
    State(state): State<Arc<AppState>>,
    Extension(_user_id): Extension<Uuid>,
    Json(req): Json<RefineRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let plan = state
        .pipeline
        .refine_research(&req.query, &req.instruction)
        .await
        .map_err(pipeline_error_response)?;
    Ok(Json(to_value(&plan)))
}

/// Resolve inter-city flight segments for a blueprint.
#[utoipa::path(
    post,
    path = "/connections/flights",
    request_body = FlightsRequest,
    responses(
        (status = 200, description = "Segments resolved", body = FlightsResponse),
        (status = 404, description = "Blueprint not found")
    )
)]
pub async fn resolve_flights_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<FlightsRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let requests: Vec<SegmentRequest> = req
        .segments
        .into_iter()
        .map(|s| SegmentRequest {
            origin_city: s.origin_city,
            destination_city: s.destination_city,
            origin_iata: s.origin_iata,
            destination_iata: s.destination_iata,
            date: s.date,
            passengers: s.passengers,
        })
        .collect();

    let segments = state
        .flight_resolver
        .resolve_segments(user_id, req.blueprint_id, requests)
        .await
        .map_err(pipeline_error_response)?;

    Ok(Json(FlightsResponse {
        segments: to_value(&segments),
    }))
}

/// List the persisted locations of one blueprint, ordered by day.
#[utoipa::path(
    get,
    path = "/blueprints/{id}/locations",
    params(
        ("id" = Uuid, Path, description = "The blueprint id.")
    ),
    responses(
        (status = 200, description = "Locations for the blueprint", body = LocationsResponse),
        (status = 404, description = "Blueprint not found")
    )
)]
pub async fn list_locations_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(blueprint_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let locations = state
        .pipeline
        .list_locations(user_id, blueprint_id)
        .await
        .map_err(pipeline_error_response)?;

    Ok(Json(LocationsResponse {
        blueprint_id,
        locations: to_value(&locations),
    }))
}
