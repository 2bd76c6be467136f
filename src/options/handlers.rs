// HTTP handlers for the color, size and category vocabularies

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use super::models::{
    is_default_size, AddOptionRequest, DeleteOptionRequest, DressOption, DressOptions,
    NewDressOption, OptionKind, DEFAULT_HEX_CODE,
};
use crate::error::{ApiError, ErrorResponse, JsonBody};
use crate::images::known_color_hex;
use crate::store::StoreError;
use crate::validation::validate_hex_code;
use crate::AppState;

pub const MSG_INVALID_OPTION: &str = "Invalid type or missing name";

#[derive(Debug, Serialize, ToSchema)]
pub struct OptionCreated {
    pub success: bool,
    pub data: DressOption,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OptionDeleted {
    pub success: bool,
}

/// Kind and trimmed name, or the generic 400
fn parse_kind_and_name(
    kind: Option<&str>,
    name: Option<&str>,
) -> Result<(OptionKind, String), ApiError> {
    let kind = kind
        .and_then(|k| k.parse::<OptionKind>().ok())
        .ok_or_else(|| ApiError::bad_request(MSG_INVALID_OPTION))?;
    let name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::bad_request(MSG_INVALID_OPTION))?;
    Ok((kind, name.to_string()))
}

impl AddOptionRequest {
    /// Colors without a hex code take the palette value for known names,
    /// otherwise black
    pub fn into_new_option(self) -> Result<NewDressOption, ApiError> {
        let (kind, name) = parse_kind_and_name(self.kind.as_deref(), self.name.as_deref())?;

        let hex_code = match self.hex_code.as_deref().map(str::trim).filter(|h| !h.is_empty()) {
            Some(hex) if kind == OptionKind::Color => {
                validate_hex_code(hex).map_err(|_| {
                    ApiError::bad_request(format!("Invalid hex code \"{}\"", hex))
                })?;
                hex.to_uppercase()
            }
            _ if kind == OptionKind::Color => known_color_hex(&name)
                .unwrap_or(DEFAULT_HEX_CODE)
                .to_string(),
            _ => String::new(),
        };

        Ok(NewDressOption {
            kind,
            name,
            hex_code,
        })
    }
}

#[utoipa::path(
    get,
    path = "/api/dress-options",
    responses(
        (status = 200, description = "Colors, sizes and categories", body = DressOptions),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    ),
    tag = "options"
)]
pub async fn list_options(State(state): State<AppState>) -> Result<Json<DressOptions>, ApiError> {
    let options = state.store.list_options().await?;
    tracing::debug!(
        "Loaded {} colors, {} sizes, {} categories",
        options.colors.len(),
        options.sizes.len(),
        options.categories.len()
    );
    Ok(Json(options))
}

#[utoipa::path(
    post,
    path = "/api/dress-options",
    request_body = AddOptionRequest,
    responses(
        (status = 201, description = "Option created", body = OptionCreated),
        (status = 400, description = "Invalid type or missing name", body = ErrorResponse),
        (status = 409, description = "Option already exists", body = ErrorResponse)
    ),
    tag = "options"
)]
pub async fn add_option(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<AddOptionRequest>,
) -> Result<(StatusCode, Json<OptionCreated>), ApiError> {
    let option = request.into_new_option()?;
    let (kind, name) = (option.kind, option.name.clone());

    let created = state.store.add_option(option).await.map_err(|e| match e {
        StoreError::Duplicate(_) => ApiError::conflict(format!("{} \"{}\" already exists", kind, name)),
        other => other.into(),
    })?;

    tracing::info!("Added {} option \"{}\"", kind, name);
    Ok((
        StatusCode::CREATED,
        Json(OptionCreated {
            success: true,
            data: created,
        }),
    ))
}

/// Built-in sizes cannot be removed
#[utoipa::path(
    delete,
    path = "/api/dress-options",
    request_body = DeleteOptionRequest,
    responses(
        (status = 200, description = "Option deleted", body = OptionDeleted),
        (status = 400, description = "Invalid type or missing name", body = ErrorResponse),
        (status = 403, description = "Default size", body = ErrorResponse),
        (status = 404, description = "Option not found", body = ErrorResponse)
    ),
    tag = "options"
)]
pub async fn delete_option(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<DeleteOptionRequest>,
) -> Result<Json<OptionDeleted>, ApiError> {
    let (kind, name) = parse_kind_and_name(request.kind.as_deref(), request.name.as_deref())?;

    if kind == OptionKind::Size && is_default_size(&name) {
        return Err(ApiError::Forbidden(format!(
            "Cannot delete default size \"{}\"",
            name
        )));
    }

    if !state.store.delete_option(kind, &name).await? {
        return Err(ApiError::not_found(format!("{} \"{}\" not found", kind, name)));
    }

    tracing::info!("Deleted {} option \"{}\"", kind, name);
    Ok(Json(OptionDeleted { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(kind: &str, name: &str, hex: Option<&str>) -> AddOptionRequest {
        AddOptionRequest {
            kind: Some(kind.to_string()),
            name: Some(name.to_string()),
            hex_code: hex.map(str::to_string),
        }
    }

    #[test]
    fn test_color_hex_defaults() {
        let option = add("color", "Turquesa", None).into_new_option().unwrap();
        assert_eq!(option.hex_code, "#06B6D4");

        let option = add("color", "Fucsia", None).into_new_option().unwrap();
        assert_eq!(option.hex_code, DEFAULT_HEX_CODE);

        let option = add("color", "Fucsia", Some("#ff00aa")).into_new_option().unwrap();
        assert_eq!(option.hex_code, "#FF00AA");
    }

    #[test]
    fn test_invalid_hex_is_rejected() {
        assert!(matches!(
            add("color", "Fucsia", Some("pink")).into_new_option(),
            Err(ApiError::BadRequest { .. })
        ));
    }

    #[test]
    fn test_sizes_ignore_hex() {
        let option = add("size", " XXXL ", Some("#000")).into_new_option().unwrap();
        assert_eq!(option.kind, OptionKind::Size);
        assert_eq!(option.name, "XXXL");
        assert!(option.hex_code.is_empty());
    }

    #[test]
    fn test_invalid_type_or_name() {
        for request in [
            add("fabric", "Seda", None),
            add("color", "   ", None),
            AddOptionRequest {
                kind: None,
                name: Some("Rojo".to_string()),
                hex_code: None,
            },
        ] {
            match request.into_new_option() {
                Err(ApiError::BadRequest { message, .. }) => assert_eq!(message, MSG_INVALID_OPTION),
                other => panic!("unexpected {:?}", other),
            }
        }
    }
}
