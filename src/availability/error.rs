use uuid::Uuid;

use crate::store::StoreError;

pub const MSG_MISSING_PARAMETERS: &str = "Faltan parámetros requeridos";
pub const MSG_MISSING_EVENT_DATE: &str = "Fecha del evento es requerida";

/// Operational failures of an availability query.
///
/// A dress that cannot be rented is not an error; it is an
/// `AvailabilityDecision` with `available = false`.
#[derive(Debug, thiserror::Error)]
pub enum AvailabilityError {
    /// `details` lists every expected field as `name: OK` or `name: MISSING`
    #[error("{message} ({details})")]
    MissingParameter { message: String, details: String },

    #[error("{0}")]
    InvalidParameter(String),

    #[error("Dress not found: {0}")]
    DressNotFound(Uuid),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl AvailabilityError {
    /// Builds the field report for a request with some fields absent
    pub fn missing(message: &str, fields: &[(&str, bool)]) -> Self {
        let details = fields
            .iter()
            .map(|(name, present)| format!("{}: {}", name, if *present { "OK" } else { "MISSING" }))
            .collect::<Vec<_>>()
            .join(", ");
        AvailabilityError::MissingParameter {
            message: message.to_string(),
            details,
        }
    }
}
