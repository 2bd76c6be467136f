// HTTP handlers for reservation endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde_json::json;
use validator::Validate;

use crate::availability::error::AvailabilityError;
use crate::availability::service::{parse_date, parse_dress_id};
use crate::error::{ApiError, ErrorResponse, JsonBody};
use crate::models::{CreateReservationRequest, NewReservation, Reservation};
use crate::store::BookingOutcome;
use crate::AppState;

pub const MSG_MISSING_FIELDS: &str = "Faltan campos requeridos";

impl CreateReservationRequest {
    /// Checks presence of every field, then field formats
    pub fn into_new_reservation(self) -> Result<NewReservation, ApiError> {
        let present = |value: &Option<String>| {
            value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
        };
        let fields = [
            ("dressId", present(&self.dress_id)),
            ("customerName", present(&self.customer_name)),
            ("customerEmail", present(&self.customer_email)),
            ("customerPhone", present(&self.customer_phone)),
            ("eventDate", present(&self.event_date)),
        ];
        if fields.iter().any(|(_, ok)| !ok) {
            return Err(AvailabilityError::missing(MSG_MISSING_FIELDS, &fields).into());
        }

        self.validate()?;

        match (
            self.dress_id,
            self.customer_name,
            self.customer_email,
            self.customer_phone,
            self.event_date,
        ) {
            (Some(raw_id), Some(name), Some(email), Some(phone), Some(raw_date)) => {
                Ok(NewReservation {
                    dress_id: parse_dress_id(&raw_id)?,
                    customer_name: name.trim().to_string(),
                    customer_email: email.trim().to_string(),
                    customer_phone: phone.trim().to_string(),
                    event_date: parse_date(&raw_date)?,
                })
            }
            _ => Err(AvailabilityError::missing(MSG_MISSING_FIELDS, &fields).into()),
        }
    }
}

/// Book a dress for an event date
/// POST /api/reservations
///
/// The availability check and the insert happen as one atomic step.
#[utoipa::path(
    post,
    path = "/api/reservations",
    request_body = CreateReservationRequest,
    responses(
        (status = 201, description = "Pending reservation created", body = Reservation),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 404, description = "Dress not found", body = ErrorResponse),
        (status = 409, description = "Dress not available for that date", body = ErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    ),
    tag = "reservations"
)]
pub async fn create_reservation(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateReservationRequest>,
) -> Result<(StatusCode, Json<Reservation>), ApiError> {
    let booking = request.into_new_reservation()?;
    tracing::debug!(
        "Booking dress {} for {}",
        booking.dress_id,
        booking.event_date
    );

    let today = state.availability.today();
    match state.availability.book(booking, today).await? {
        BookingOutcome::Booked(reservation) => {
            tracing::info!(
                "Created reservation {} for dress {}",
                reservation.id,
                reservation.dress_id
            );
            Ok((StatusCode::CREATED, Json(reservation)))
        }
        BookingOutcome::Rejected(decision) => Err(ApiError::Conflict {
            message: decision.message,
            details: Some(json!({ "reason": decision.reason })),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn request() -> CreateReservationRequest {
        CreateReservationRequest {
            dress_id: Some(Uuid::new_v4().to_string()),
            customer_name: Some(" Ana ".to_string()),
            customer_email: Some("ana@example.com".to_string()),
            customer_phone: Some("5550001111".to_string()),
            event_date: Some("2025-06-10".to_string()),
        }
    }

    #[test]
    fn test_into_new_reservation_trims_and_parses() {
        let booking = request().into_new_reservation().unwrap();
        assert_eq!(booking.customer_name, "Ana");
        assert_eq!(booking.event_date, "2025-06-10".parse().unwrap());
    }

    #[test]
    fn test_missing_fields_are_listed() {
        let mut incomplete = request();
        incomplete.customer_phone = None;
        incomplete.dress_id = None;

        match incomplete.into_new_reservation() {
            Err(ApiError::MissingParameter { message, details }) => {
                assert_eq!(message, MSG_MISSING_FIELDS);
                assert!(details.contains("dressId: MISSING"));
                assert!(details.contains("customerPhone: MISSING"));
                assert!(details.contains("eventDate: OK"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_bad_email_and_date_are_rejected() {
        let mut bad_email = request();
        bad_email.customer_email = Some("nope".to_string());
        assert!(matches!(
            bad_email.into_new_reservation(),
            Err(ApiError::ValidationError(_))
        ));

        let mut bad_date = request();
        bad_date.event_date = Some("mañana".to_string());
        assert!(matches!(
            bad_date.into_new_reservation(),
            Err(ApiError::BadRequest { .. })
        ));

        let mut bad_id = request();
        bad_id.dress_id = Some("abc".to_string());
        assert!(matches!(
            bad_id.into_new_reservation(),
            Err(ApiError::BadRequest { .. })
        ));
    }
}
