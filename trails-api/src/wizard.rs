use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use trails_draft::{Draft, DraftError, DraftStep, SearchQuery};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::auth::TravellerClaims;
use crate::state::AppState;
use crate::trips::{load_trip, parse_travel_date};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct WizardSearchRequest {
    origin: String,
    destination: String,
    travel_date: String,
    #[serde(default = "default_passengers")]
    passengers: u32,
}

fn default_passengers() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
struct WizardTripRequest {
    trip_id: Uuid,
    pickup_stop: Option<String>,
    dropoff_stop: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WizardSeatsRequest {
    seats: Vec<String>,
}

/// Answer for every wizard step. `redirect_to` is set instead of a 4xx when
/// the visitor arrived out of order: the client sends them to that step.
#[derive(Debug, Serialize)]
struct WizardResponse {
    step: DraftStep,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_to: Option<DraftStep>,
    draft: Draft,
}

#[derive(Debug, Serialize)]
struct WizardStatusResponse {
    step: DraftStep,
    resume_step: DraftStep,
    draft: Draft,
}

// ============================================================================
// Handlers
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/wizard", get(wizard_status))
        .route("/v1/wizard/search", post(wizard_search))
        .route("/v1/wizard/trip", post(wizard_trip))
        .route("/v1/wizard/seats", post(wizard_seats))
        .route("/v1/wizard/price", post(wizard_price))
}

async fn load_draft(state: &AppState, subject: &str) -> Result<Draft, AppError> {
    Ok(state
        .sessions
        .load(subject)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .unwrap_or_default())
}

async fn save_draft(state: &AppState, subject: &str, draft: &Draft) -> Result<(), AppError> {
    state
        .sessions
        .save(subject, draft)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Apply a transition outcome: saved draft on success, redirect envelope on
/// an out-of-order step, error otherwise.
async fn respond(
    state: &AppState,
    subject: &str,
    draft: Draft,
    outcome: Result<(), DraftError>,
) -> Result<Json<WizardResponse>, AppError> {
    match outcome {
        Ok(()) => {
            save_draft(state, subject, &draft).await?;
            Ok(Json(WizardResponse {
                step: draft.step(),
                redirect_to: None,
                draft,
            }))
        }
        Err(DraftError::OutOfOrder { required }) => Ok(Json(WizardResponse {
            step: draft.step(),
            redirect_to: Some(required),
            draft,
        })),
        Err(err) => Err(AppError::from_draft(err)),
    }
}

/// GET /v1/wizard — where is this visitor in the flow?
async fn wizard_status(
    State(state): State<AppState>,
    Extension(claims): Extension<TravellerClaims>,
) -> Result<Json<WizardStatusResponse>, AppError> {
    let draft = load_draft(&state, &claims.sub).await?;
    Ok(Json(WizardStatusResponse {
        step: draft.step(),
        resume_step: draft.resume_step(),
        draft,
    }))
}

/// POST /v1/wizard/search — step 1, also restarts an abandoned draft.
async fn wizard_search(
    State(state): State<AppState>,
    Extension(claims): Extension<TravellerClaims>,
    Json(req): Json<WizardSearchRequest>,
) -> Result<Json<WizardResponse>, AppError> {
    let travel_date = parse_travel_date(&req.travel_date)?;

    let mut draft = load_draft(&state, &claims.sub).await?;
    // A committed draft is finished business: start a fresh one.
    if draft.step() == DraftStep::Committed {
        draft = Draft::new();
    }

    let outcome = draft.enter_search(SearchQuery {
        origin: req.origin,
        destination: req.destination,
        travel_date,
        passengers: req.passengers,
    });
    respond(&state, &claims.sub, draft, outcome).await
}

/// POST /v1/wizard/trip — step 2, pick a trip and boarding points.
async fn wizard_trip(
    State(state): State<AppState>,
    Extension(claims): Extension<TravellerClaims>,
    Json(req): Json<WizardTripRequest>,
) -> Result<Json<WizardResponse>, AppError> {
    // 404 before any state moves.
    load_trip(&state, req.trip_id).await?;

    let mut draft = load_draft(&state, &claims.sub).await?;
    let outcome = draft.select_trip(req.trip_id, req.pickup_stop, req.dropoff_stop);
    respond(&state, &claims.sub, draft, outcome).await
}

/// POST /v1/wizard/seats — step 3. Labels are validated against the coach
/// and the current seat map so the visitor learns about a clash while they
/// can still re-pick cheaply; the commit re-checks atomically.
async fn wizard_seats(
    State(state): State<AppState>,
    Extension(claims): Extension<TravellerClaims>,
    Json(req): Json<WizardSeatsRequest>,
) -> Result<Json<WizardResponse>, AppError> {
    let mut draft = load_draft(&state, &claims.sub).await?;

    if let (Some(trip_id), Some(search)) = (draft.trip_id, draft.search.as_ref()) {
        let trip = load_trip(&state, trip_id).await?;

        if let Some(bad) = req.seats.iter().find(|s| !trip.has_seat(s)) {
            return Err(AppError::ValidationError(format!(
                "No such seat on this coach: {}",
                bad
            )));
        }

        let taken = state
            .ledger
            .booked_seat_labels(trip_id, search.travel_date)
            .await
            .map_err(AppError::from_ledger)?;
        let clashes: Vec<&String> = req.seats.iter().filter(|s| taken.contains(*s)).collect();
        if !clashes.is_empty() {
            return Err(AppError::ConflictError(format!(
                "Seats no longer available: {}",
                clashes
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }
    }

    let outcome = draft.choose_seats(req.seats);
    respond(&state, &claims.sub, draft, outcome).await
}

/// POST /v1/wizard/price — step 4, the server computes the total.
async fn wizard_price(
    State(state): State<AppState>,
    Extension(claims): Extension<TravellerClaims>,
) -> Result<Json<WizardResponse>, AppError> {
    let mut draft = load_draft(&state, &claims.sub).await?;

    let total = match draft.trip_id {
        Some(trip_id) => {
            let trip = load_trip(&state, trip_id).await?;
            trip.fare.total_for(draft.seats.len() as u32)
        }
        // No trip yet: let the transition guard report the right step.
        None => trails_shared::Fare::from_minor(0),
    };

    let outcome = draft.price(total);
    respond(&state, &claims.sub, draft, outcome).await
}
