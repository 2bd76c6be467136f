// Error handling module for the Dress Rental API
// Provides centralized error types and HTTP response conversion

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use tracing::{debug, error, warn};
use utoipa::ToSchema;

use crate::availability::error::AvailabilityError;
use crate::store::StoreError;

pub const MSG_DRESS_NOT_FOUND: &str = "Vestido no encontrado";
pub const MSG_STORAGE_UNAVAILABLE: &str = "Error de conexión a base de datos";
pub const MSG_NO_LONGER_AVAILABLE: &str = "El vestido ya no está disponible para esta fecha";
pub const MSG_INVALID_BODY: &str = "El cuerpo de la solicitud no es válido";

/// Main error type for the API
/// All handlers should return Result<T, ApiError>
///
/// Business "not available" outcomes are NOT errors; they travel as
/// `AvailabilityDecision` values inside a successful response.
#[derive(Debug)]
pub enum ApiError {
    /// Validation errors from request validation
    /// Maps to HTTP 400 Bad Request
    ValidationError(validator::ValidationErrors),

    /// Malformed input that is not a derive-validation failure
    /// Maps to HTTP 400 Bad Request
    BadRequest {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// A required request field was absent
    /// Maps to HTTP 400 Bad Request
    MissingParameter { message: String, details: String },

    /// Maps to HTTP 404 Not Found
    NotFound { message: String },

    /// Duplicate resource or lost booking race
    /// Maps to HTTP 409 Conflict
    Conflict {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Maps to HTTP 403 Forbidden
    Forbidden(String),

    /// The record store failed or could not be reached
    /// Maps to HTTP 503 Service Unavailable
    /// Sensitive details are filtered from client responses
    StorageUnavailable(String),

    /// Maps to HTTP 500 Internal Server Error
    InternalError(String),
}

/// Consistent error response structure
///
/// `error` is the human-readable message shown to customers, `code` the
/// machine-readable discriminant.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Vestido no encontrado")]
    pub error: String,

    #[schema(example = "NOT_FOUND")]
    pub code: String,

    /// Omitted from JSON when None
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// ISO 8601 timestamp of when the error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, code: &str, details: Option<serde_json::Value>) -> Self {
        Self {
            error: error.into(),
            code: code.to_string(),
            details,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = self.to_error_response();
        (status, Json(error_response)).into_response()
    }
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound {
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            details: None,
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict {
            message: message.into(),
            details: None,
        }
    }

    /// Convert ApiError to HTTP status code and ErrorResponse
    ///
    /// Logs by severity: error! for storage and internal failures,
    /// warn! for conflicts and forbidden operations, debug! for the rest.
    fn to_error_response(&self) -> (StatusCode, ErrorResponse) {
        let status = self.status_code();
        let response = match self {
            ApiError::ValidationError(errors) => {
                debug!("Validation error: {:?}", errors);
                ErrorResponse::new(
                    first_validation_message(errors),
                    "VALIDATION_ERROR",
                    Some(serde_json::to_value(errors).unwrap_or(json!({}))),
                )
            }
            ApiError::BadRequest { message, details } => {
                debug!("Bad request: {}", message);
                ErrorResponse::new(message.clone(), "BAD_REQUEST", details.clone())
            }
            ApiError::MissingParameter { message, details } => {
                debug!("Missing parameter: {} ({})", message, details);
                ErrorResponse::new(
                    message.clone(),
                    "MISSING_PARAMETER",
                    Some(json!(details)),
                )
            }
            ApiError::NotFound { message } => {
                debug!("Resource not found: {}", message);
                ErrorResponse::new(message.clone(), "NOT_FOUND", None)
            }
            ApiError::Conflict { message, details } => {
                warn!("Conflict error: {}", message);
                ErrorResponse::new(message.clone(), "CONFLICT", details.clone())
            }
            ApiError::Forbidden(message) => {
                warn!("Forbidden operation: {}", message);
                ErrorResponse::new(message.clone(), "FORBIDDEN", None)
            }
            ApiError::StorageUnavailable(internal_msg) => {
                // Full cause stays in the log; clients get a generic message
                error!("Storage unavailable: {}", internal_msg);
                ErrorResponse::new(MSG_STORAGE_UNAVAILABLE, "STORAGE_UNAVAILABLE", None)
            }
            ApiError::InternalError(internal_msg) => {
                error!("Internal error: {}", internal_msg);
                ErrorResponse::new("Error interno del servidor", "INTERNAL_ERROR", None)
            }
        };
        (status, response)
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::MissingParameter { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The first field message, so the storefront can show a single line
fn first_validation_message(errors: &validator::ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);
    fields
        .into_iter()
        .flat_map(|(_, errs)| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "La solicitud no es válida".to_string())
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Database(db_error) => ApiError::StorageUnavailable(db_error.to_string()),
            StoreError::DressNotFound(_) => ApiError::not_found(MSG_DRESS_NOT_FOUND),
            StoreError::Duplicate(what) => ApiError::conflict(format!("{} already exists", what)),
            StoreError::BookingConflict(_) => ApiError::conflict(MSG_NO_LONGER_AVAILABLE),
        }
    }
}

impl From<AvailabilityError> for ApiError {
    fn from(error: AvailabilityError) -> Self {
        match error {
            AvailabilityError::MissingParameter { message, details } => {
                ApiError::MissingParameter { message, details }
            }
            AvailabilityError::InvalidParameter(message) => ApiError::bad_request(message),
            AvailabilityError::DressNotFound(_) => ApiError::not_found(MSG_DRESS_NOT_FOUND),
            AvailabilityError::Storage(store_error) => store_error.into(),
        }
    }
}

/// Convert validator errors to ApiError
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors)
    }
}

/// Unreadable JSON bodies answer 400 with the API error payload
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!("Rejected request body: {}", rejection.body_text());
        ApiError::BadRequest {
            message: MSG_INVALID_BODY.to_string(),
            details: Some(json!(rejection.body_text())),
        }
    }
}

/// `Json` extractor whose rejections use `ApiError`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

impl From<crate::query::ValidationError> for ApiError {
    fn from(error: crate::query::ValidationError) -> Self {
        ApiError::bad_request(error.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::MissingParameter {
                message: "x".into(),
                details: "y".into()
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::conflict("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::StorageUnavailable("down".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(ApiError::Forbidden("x".into()).status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_storage_error_hides_cause() {
        let (status, body) =
            ApiError::StorageUnavailable("password authentication failed".into()).to_error_response();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.code, "STORAGE_UNAVAILABLE");
        assert_eq!(body.error, MSG_STORAGE_UNAVAILABLE);
        assert!(body.details.is_none());
    }

    #[test]
    fn test_store_errors_map_to_api_errors() {
        let err: ApiError = StoreError::DressNotFound(Uuid::nil()).into();
        assert!(matches!(err, ApiError::NotFound { ref message } if message == MSG_DRESS_NOT_FOUND));

        let err: ApiError = StoreError::BookingConflict("x".into()).into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let err: ApiError = StoreError::Database(sqlx::Error::PoolTimedOut).into();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_missing_parameter_details_are_serialized() {
        let (_, body) = ApiError::MissingParameter {
            message: "Faltan parámetros requeridos".into(),
            details: "dressId: OK, eventDate: MISSING".into(),
        }
        .to_error_response();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["code"], "MISSING_PARAMETER");
        assert_eq!(json["details"], "dressId: OK, eventDate: MISSING");
        assert!(json["timestamp"].is_string());
    }
}
