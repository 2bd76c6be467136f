// HTTP handlers for the dress catalog, blocked date ranges and a dress's reservations

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ErrorResponse, JsonBody, MSG_DRESS_NOT_FOUND};
use crate::models::{
    BlockedDateRange, CreateBlockedRange, CreateDress, Dress, Reservation, SetAvailability,
    UpdateDress,
};
use crate::query::{CatalogQueryParams, QueryValidator};
use crate::AppState;

/// Catalog listing with search, filters, sorting and pagination
#[utoipa::path(
    get,
    path = "/api/dresses",
    params(
        ("search" = Option<String>, Query, description = "Partial match on name or description"),
        ("category" = Option<String>, Query, description = "Category, or todos/all for any"),
        ("color" = Option<String>, Query, description = "Color, or multicolor"),
        ("size" = Option<String>, Query, description = "Exact size"),
        ("min_price" = Option<f64>, Query, description = "Inclusive lower daily price"),
        ("max_price" = Option<f64>, Query, description = "Inclusive upper daily price"),
        ("available_date" = Option<String>, Query, description = "YYYY-MM-DD event date the dress must be free for"),
        ("sort" = Option<String>, Query, description = "price or newest"),
        ("order" = Option<String>, Query, description = "asc or desc"),
        ("page" = Option<u32>, Query, description = "1-indexed page"),
        ("limit" = Option<u32>, Query, description = "Items per page, at most 100")
    ),
    responses(
        (status = 200, description = "Matching dresses", body = Vec<Dress>),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    ),
    tag = "dresses"
)]
pub async fn list_dresses(
    State(state): State<AppState>,
    Query(params): Query<CatalogQueryParams>,
) -> Result<Json<Vec<Dress>>, ApiError> {
    tracing::debug!("Fetching dresses with query parameters: {:?}", params);

    let mut filter = QueryValidator::validate(params)?;

    if let Some(event_date) = filter.available_date {
        filter.exclude_ids = state.availability.reserved_dress_ids(event_date).await?;
        tracing::debug!(
            "Hiding {} dresses reserved around {}",
            filter.exclude_ids.len(),
            event_date
        );
    }

    let dresses = state.store.search_dresses(&filter).await?;

    tracing::debug!("Query returned {} dresses", dresses.len());
    Ok(Json(dresses))
}

#[utoipa::path(
    get,
    path = "/api/dresses/{id}",
    params(("id" = Uuid, Path, description = "Dress ID")),
    responses(
        (status = 200, description = "Dress found", body = Dress),
        (status = 404, description = "Dress not found", body = ErrorResponse)
    ),
    tag = "dresses"
)]
pub async fn get_dress(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Dress>, ApiError> {
    let dress = state
        .store
        .get_dress(id)
        .await?
        .ok_or_else(|| ApiError::not_found(MSG_DRESS_NOT_FOUND))?;

    Ok(Json(dress))
}

#[utoipa::path(
    post,
    path = "/api/dresses",
    request_body = CreateDress,
    responses(
        (status = 201, description = "Dress created", body = Dress),
        (status = 400, description = "Invalid input data", body = ErrorResponse)
    ),
    tag = "dresses"
)]
pub async fn create_dress(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateDress>,
) -> Result<(StatusCode, Json<Dress>), ApiError> {
    tracing::debug!("Creating new dress: {}", payload.name);
    payload.validate()?;

    let dress = state.store.create_dress(payload).await?;

    tracing::info!("Created dress {} ({})", dress.id, dress.name);
    Ok((StatusCode::CREATED, Json(dress)))
}

/// Partial update; omitted fields keep their value
#[utoipa::path(
    put,
    path = "/api/dresses/{id}",
    params(("id" = Uuid, Path, description = "Dress ID")),
    request_body = UpdateDress,
    responses(
        (status = 200, description = "Dress updated", body = Dress),
        (status = 400, description = "Invalid input data", body = ErrorResponse),
        (status = 404, description = "Dress not found", body = ErrorResponse)
    ),
    tag = "dresses"
)]
pub async fn update_dress(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateDress>,
) -> Result<Json<Dress>, ApiError> {
    payload.validate()?;

    let dress = state
        .store
        .update_dress(id, payload)
        .await?
        .ok_or_else(|| ApiError::not_found(MSG_DRESS_NOT_FOUND))?;

    tracing::info!("Updated dress {}", id);
    Ok(Json(dress))
}

/// Operator switch; an unavailable dress is unavailable for every date
#[utoipa::path(
    patch,
    path = "/api/dresses/{id}/availability",
    params(("id" = Uuid, Path, description = "Dress ID")),
    request_body = SetAvailability,
    responses(
        (status = 200, description = "Flag updated", body = Dress),
        (status = 404, description = "Dress not found", body = ErrorResponse)
    ),
    tag = "dresses"
)]
pub async fn set_availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<SetAvailability>,
) -> Result<Json<Dress>, ApiError> {
    let dress = state
        .store
        .set_dress_available(id, payload.available)
        .await?
        .ok_or_else(|| ApiError::not_found(MSG_DRESS_NOT_FOUND))?;

    tracing::info!("Dress {} marked available={}", id, dress.available);
    Ok(Json(dress))
}

#[utoipa::path(
    delete,
    path = "/api/dresses/{id}",
    params(("id" = Uuid, Path, description = "Dress ID")),
    responses(
        (status = 204, description = "Dress deleted with its reservations and blocked dates"),
        (status = 404, description = "Dress not found", body = ErrorResponse)
    ),
    tag = "dresses"
)]
pub async fn delete_dress(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !state.store.delete_dress(id).await? {
        tracing::debug!("Dress with id {} not found for deletion", id);
        return Err(ApiError::not_found(MSG_DRESS_NOT_FOUND));
    }

    tracing::info!("Deleted dress {}", id);
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/dresses/{id}/reservations",
    params(("id" = Uuid, Path, description = "Dress ID")),
    responses(
        (status = 200, description = "Reservations of the dress", body = Vec<Reservation>),
        (status = 404, description = "Dress not found", body = ErrorResponse)
    ),
    tag = "reservations"
)]
pub async fn list_reservations(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Reservation>>, ApiError> {
    ensure_dress_exists(&state, id).await?;
    let reservations = state.store.list_reservations_for_dress(id).await?;
    Ok(Json(reservations))
}

#[utoipa::path(
    get,
    path = "/api/dresses/{id}/blocked-dates",
    params(("id" = Uuid, Path, description = "Dress ID")),
    responses(
        (status = 200, description = "Blocked ranges ordered by start date", body = Vec<BlockedDateRange>),
        (status = 404, description = "Dress not found", body = ErrorResponse)
    ),
    tag = "blocked-dates"
)]
pub async fn list_blocked_dates(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<BlockedDateRange>>, ApiError> {
    ensure_dress_exists(&state, id).await?;
    let blocked = state.store.list_blocked_ranges(id).await?;
    Ok(Json(blocked))
}

#[utoipa::path(
    post,
    path = "/api/dresses/{id}/blocked-dates",
    params(("id" = Uuid, Path, description = "Dress ID")),
    request_body = CreateBlockedRange,
    responses(
        (status = 201, description = "Range blocked", body = BlockedDateRange),
        (status = 400, description = "start_date after end_date", body = ErrorResponse),
        (status = 404, description = "Dress not found", body = ErrorResponse)
    ),
    tag = "blocked-dates"
)]
pub async fn create_blocked_dates(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<CreateBlockedRange>,
) -> Result<(StatusCode, Json<BlockedDateRange>), ApiError> {
    payload.validate()?;

    let blocked = state.store.create_blocked_range(id, payload).await?;

    tracing::info!("Blocked dress {} for {}", id, blocked.range());
    Ok((StatusCode::CREATED, Json(blocked)))
}

#[utoipa::path(
    delete,
    path = "/api/blocked-dates/{id}",
    params(("id" = Uuid, Path, description = "Blocked range ID")),
    responses(
        (status = 204, description = "Range removed"),
        (status = 404, description = "Range not found", body = ErrorResponse)
    ),
    tag = "blocked-dates"
)]
pub async fn delete_blocked_dates(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !state.store.delete_blocked_range(id).await? {
        return Err(ApiError::not_found("Rango de fechas bloqueadas no encontrado"));
    }

    tracing::info!("Removed blocked range {}", id);
    Ok(StatusCode::NO_CONTENT)
}

async fn ensure_dress_exists(state: &AppState, id: Uuid) -> Result<(), ApiError> {
    match state.store.get_dress(id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::not_found(MSG_DRESS_NOT_FOUND)),
    }
}
