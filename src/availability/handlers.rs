// HTTP handlers for availability queries

use axum::{extract::State, Json};

use super::engine::{AvailabilityDecision, AvailableCount};
use super::service::{CheckAvailabilityRequest, CountAvailableRequest};
use crate::error::{ApiError, ErrorResponse, JsonBody};
use crate::AppState;

/// Check whether one dress can be rented for an event date
/// POST /api/check-availability
#[utoipa::path(
    post,
    path = "/api/check-availability",
    request_body = CheckAvailabilityRequest,
    responses(
        (status = 200, description = "Availability verdict", body = AvailabilityDecision),
        (status = 400, description = "Missing or malformed parameters", body = ErrorResponse),
        (status = 404, description = "Dress not found", body = ErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    ),
    tag = "availability"
)]
pub async fn check_availability(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CheckAvailabilityRequest>,
) -> Result<Json<AvailabilityDecision>, ApiError> {
    let (dress_id, event_date) = request.parse()?;
    tracing::debug!("Checking availability of dress {} for {}", dress_id, event_date);

    let today = state.availability.today();
    let decision = state
        .availability
        .check_availability(dress_id, event_date, today)
        .await?;

    Ok(Json(decision))
}

/// Count the dresses free for an event date
/// POST /api/check-available-dresses
#[utoipa::path(
    post,
    path = "/api/check-available-dresses",
    request_body = CountAvailableRequest,
    responses(
        (status = 200, description = "Number of available dresses", body = AvailableCount),
        (status = 400, description = "Missing or malformed event date", body = ErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    ),
    tag = "availability"
)]
pub async fn check_available_dresses(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CountAvailableRequest>,
) -> Result<Json<AvailableCount>, ApiError> {
    let event_date = request.parse()?;
    tracing::debug!("Counting available dresses for {}", event_date);

    let today = state.availability.today();
    let count = state
        .availability
        .count_available_for_date(event_date, today)
        .await?;

    Ok(Json(count))
}
