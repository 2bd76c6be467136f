pub mod availability;
pub mod config;
pub mod db;
pub mod dresses;
pub mod error;
pub mod images;
pub mod models;
pub mod options;
pub mod query;
pub mod reservations;
pub mod store;
pub mod validation;

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    response::Json,
    routing::{delete, get, patch, post},
    Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use availability::{
    engine::{AvailabilityDecision, AvailabilityReason, AvailableCount},
    service::{CheckAvailabilityRequest, CountAvailableRequest},
    AvailabilityEngine, AvailabilityService, Clock,
};
use config::AppConfig;
use error::{ApiError, ErrorResponse};
use models::{
    BlockedDateRange, CreateBlockedRange, CreateDress, CreateReservationRequest, Dress,
    Reservation, ReservationStatus, SetAvailability, UpdateDress,
};
use options::{
    AddOptionRequest, CategoryOption, ColorOption, DeleteOptionRequest, DressOption,
    DressOptions, OptionCreated, OptionDeleted, SizeOption,
};
use store::{DressStore, PgDressStore};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        availability::handlers::check_availability,
        availability::handlers::check_available_dresses,
        dresses::handlers::list_dresses,
        dresses::handlers::get_dress,
        dresses::handlers::create_dress,
        dresses::handlers::update_dress,
        dresses::handlers::set_availability,
        dresses::handlers::delete_dress,
        dresses::handlers::list_reservations,
        dresses::handlers::list_blocked_dates,
        dresses::handlers::create_blocked_dates,
        dresses::handlers::delete_blocked_dates,
        reservations::handlers::create_reservation,
        options::handlers::list_options,
        options::handlers::add_option,
        options::handlers::delete_option,
        images::handlers::analyze_image,
    ),
    components(
        schemas(
            HealthStatus, ErrorResponse,
            CheckAvailabilityRequest, CountAvailableRequest,
            AvailabilityDecision, AvailabilityReason, AvailableCount,
            Dress, CreateDress, UpdateDress, SetAvailability,
            Reservation, ReservationStatus, CreateReservationRequest,
            BlockedDateRange, CreateBlockedRange,
            ColorOption, SizeOption, CategoryOption, DressOption, DressOptions,
            AddOptionRequest, DeleteOptionRequest, OptionCreated, OptionDeleted,
            images::ImageAnalysis,
        )
    ),
    tags(
        (name = "availability", description = "Rental availability checks"),
        (name = "dresses", description = "Dress catalog management"),
        (name = "reservations", description = "Dress bookings"),
        (name = "blocked-dates", description = "Operator-blocked date ranges"),
        (name = "options", description = "Color, size and category vocabularies"),
        (name = "images", description = "Dress photo analysis"),
        (name = "health", description = "Service health")
    ),
    info(
        title = "Dress Rental API",
        version = "1.0.0",
        description = "Catalog, availability and reservations for a dress rental shop"
    )
)]
struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DressStore>,
    pub availability: AvailabilityService,
    pub max_image_bytes: usize,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DressStore>,
        engine: AvailabilityEngine,
        clock: Clock,
        max_image_bytes: usize,
    ) -> Self {
        Self {
            availability: AvailabilityService::new(store.clone(), engine, clock),
            store,
            max_image_bytes,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    #[schema(example = "ok")]
    pub status: String,
}

/// Handler for GET /health
/// Reports whether the record store answers
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and storage are up", body = HealthStatus),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    ),
    tag = "health"
)]
async fn health(State(state): State<AppState>) -> Result<Json<HealthStatus>, ApiError> {
    state.store.ping().await?;
    Ok(Json(HealthStatus {
        status: "ok".to_string(),
    }))
}

/// Creates and configures the application router
/// Maps all API endpoints to their handlers and adds CORS and request tracing
pub fn create_router(state: AppState) -> Router {
    // Configure CORS to allow all origins, methods, and headers
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Oversized uploads up to twice the limit reach the handler and get the
    // descriptive 400; beyond that axum answers 413 on its own
    let upload_limit = DefaultBodyLimit::max(state.max_image_bytes.saturating_mul(2));

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health))
        // Availability
        .route(
            "/api/check-availability",
            post(availability::handlers::check_availability),
        )
        .route(
            "/api/check-available-dresses",
            post(availability::handlers::check_available_dresses),
        )
        // Catalog
        .route("/api/dresses", get(dresses::list_dresses))
        .route("/api/dresses", post(dresses::create_dress))
        .route("/api/dresses/:id", get(dresses::get_dress))
        .route("/api/dresses/:id", axum::routing::put(dresses::update_dress))
        .route("/api/dresses/:id", delete(dresses::delete_dress))
        .route("/api/dresses/:id/availability", patch(dresses::set_availability))
        .route("/api/dresses/:id/reservations", get(dresses::list_reservations))
        .route("/api/dresses/:id/blocked-dates", get(dresses::list_blocked_dates))
        .route("/api/dresses/:id/blocked-dates", post(dresses::create_blocked_dates))
        .route("/api/blocked-dates/:id", delete(dresses::delete_blocked_dates))
        // Reservations
        .route("/api/reservations", post(reservations::create_reservation))
        // Options
        .route("/api/dress-options", get(options::list_options))
        .route("/api/dress-options", post(options::add_option))
        .route("/api/dress-options", delete(options::delete_option))
        // Images
        .route(
            "/api/dress-images/analyze",
            post(images::analyze_image).layer(upload_limit),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // RUST_LOG overrides the default level
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Dress Rental API - Starting...");

    let config = AppConfig::from_env()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;
    db::run_migrations(&pool).await?;

    let store: Arc<dyn DressStore> = Arc::new(PgDressStore::new(pool));
    let policy = config.booking_policy();
    tracing::info!(
        "Booking policy: lead {} days, horizon {} years, pending counts in aggregates: {}, aggregates use occupied windows: {}",
        policy.min_lead_days,
        policy.max_horizon_years,
        policy.aggregate_counts_pending,
        policy.aggregate_uses_occupied_window
    );

    let state = AppState::new(
        store,
        AvailabilityEngine::new(policy),
        Clock::System,
        config.max_image_bytes,
    );
    let app = create_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Dress Rental API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
