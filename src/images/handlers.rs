use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use super::color::{color_hex, dominant_color};
use super::upload::{storage_key, validate_upload, UploadError};
use crate::error::{ApiError, ErrorResponse};
use crate::AppState;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AnalyzeParams {
    /// Original file name, used to build the storage key
    pub filename: Option<String>,
}

/// Result of analyzing an uploaded dress photo
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImageAnalysis {
    /// Closest palette color, suitable for the dress `color` field
    #[schema(example = "Rojo")]
    pub color: String,
    #[schema(example = "#EF4444")]
    pub hex_code: String,
    /// Suggested object key for the caller's image store
    #[schema(example = "dresses/1717171717171-vestido_rojo.jpg")]
    pub storage_key: String,
    pub filename: String,
    pub size: usize,
    pub content_type: String,
}

const DEFAULT_FILENAME: &str = "image";

impl From<UploadError> for ApiError {
    fn from(error: UploadError) -> Self {
        ApiError::BadRequest {
            details: Some(json!(error.details())),
            message: error.to_string(),
        }
    }
}

/// Validate an image and detect its dominant color
/// POST /api/dress-images/analyze
///
/// The body is the raw image; its type comes from `Content-Type`.
#[utoipa::path(
    post,
    path = "/api/dress-images/analyze",
    params(AnalyzeParams),
    request_body(content = Vec<u8>, description = "Raw image bytes", content_type = "image/jpeg"),
    responses(
        (status = 200, description = "Detected color and storage key", body = ImageAnalysis),
        (status = 400, description = "Empty, oversized or unsupported file", body = ErrorResponse)
    ),
    tag = "images"
)]
pub async fn analyze_image(
    State(state): State<AppState>,
    Query(params): Query<AnalyzeParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ImageAnalysis>, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    tracing::debug!(
        "Analyzing image upload: {} bytes, type '{}'",
        body.len(),
        content_type
    );

    validate_upload(&content_type, body.len(), state.max_image_bytes)?;

    let color = dominant_color(&body);
    let filename = params
        .filename
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string());
    let key = storage_key(&filename, Utc::now().timestamp_millis())
        .map_err(|e| ApiError::InternalError(format!("storage key pattern: {}", e)))?;

    tracing::info!("Detected color {} for {}", color, key);
    Ok(Json(ImageAnalysis {
        color: color.to_string(),
        hex_code: color_hex(color),
        storage_key: key,
        filename,
        size: body.len(),
        content_type: super::upload::normalize_content_type(&content_type),
    }))
}
