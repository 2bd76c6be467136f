use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::availability::dates::{self, DateRange};
use crate::validation::{validate_date_range, validate_non_negative_price, validate_not_blank};

/// A dress in the rental catalog
///
/// `available` is the operator's manual switch; it is independent of the
/// calendar and, when false, makes every date unavailable.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Dress {
    pub id: Uuid,
    #[schema(example = "Vestido Esmeralda")]
    pub name: String,
    #[schema(example = "Vestido largo de gala con espalda descubierta")]
    pub description: Option<String>,
    #[schema(example = "Gala")]
    pub category: String,
    #[schema(example = "Verde")]
    pub color: String,
    #[schema(example = "M")]
    pub size: String,
    #[schema(value_type = f64, example = 450.0)]
    pub price_per_day: Decimal,
    #[schema(example = "https://cdn.example.com/dresses/esmeralda.jpg")]
    pub image_url: String,
    pub additional_images: Option<Vec<String>>,
    #[schema(example = true)]
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for POST /api/dresses
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateDress {
    #[validate(custom(function = "validate_not_blank", message = "Falta el nombre del vestido"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(custom(function = "validate_not_blank", message = "Falta la categoría del vestido"))]
    pub category: String,
    #[validate(custom(function = "validate_not_blank", message = "Falta el color del vestido"))]
    pub color: String,
    #[validate(custom(function = "validate_not_blank", message = "Falta la talla del vestido"))]
    pub size: String,
    #[schema(value_type = f64, example = 450.0)]
    #[validate(custom(function = "validate_non_negative_price", message = "El precio no puede ser negativo"))]
    pub price_per_day: Decimal,
    #[validate(custom(function = "validate_not_blank", message = "Falta la imagen del vestido"))]
    pub image_url: String,
    pub additional_images: Option<Vec<String>>,
}

/// Payload for PUT /api/dresses/{id}
///
/// Omitted fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateDress {
    #[validate(custom(function = "validate_not_blank", message = "El nombre no puede estar vacío"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(custom(function = "validate_not_blank", message = "La categoría no puede estar vacía"))]
    pub category: Option<String>,
    #[validate(custom(function = "validate_not_blank", message = "El color no puede estar vacío"))]
    pub color: Option<String>,
    #[validate(custom(function = "validate_not_blank", message = "La talla no puede estar vacía"))]
    pub size: Option<String>,
    #[schema(value_type = Option<f64>, example = 500.0)]
    #[validate(custom(function = "validate_non_negative_price", message = "El precio no puede ser negativo"))]
    pub price_per_day: Option<Decimal>,
    pub image_url: Option<String>,
    pub additional_images: Option<Vec<String>>,
}

impl UpdateDress {
    /// Merge this update into an existing dress, bumping `updated_at`
    pub fn apply(self, mut dress: Dress, now: DateTime<Utc>) -> Dress {
        if let Some(name) = self.name {
            dress.name = name;
        }
        if self.description.is_some() {
            dress.description = self.description;
        }
        if let Some(category) = self.category {
            dress.category = category;
        }
        if let Some(color) = self.color {
            dress.color = color;
        }
        if let Some(size) = self.size {
            dress.size = size;
        }
        if let Some(price) = self.price_per_day {
            dress.price_per_day = price;
        }
        if let Some(image_url) = self.image_url {
            dress.image_url = image_url;
        }
        if self.additional_images.is_some() {
            dress.additional_images = self.additional_images;
        }
        dress.updated_at = now;
        dress
    }
}

/// Payload for PATCH /api/dresses/{id}/availability
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct SetAvailability {
    pub available: bool,
}

/// Reservation lifecycle status
///
/// Reservations are created as `Pending`; confirmation and cancellation
/// happen outside this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Cancelled => "cancelled",
        }
    }

    /// Whether a reservation in this status holds the dress
    pub fn holds_dress(&self) -> bool {
        matches!(self, ReservationStatus::Pending | ReservationStatus::Confirmed)
    }
}

impl Default for ReservationStatus {
    fn default() -> Self {
        ReservationStatus::Pending
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ReservationStatus::Pending),
            "confirmed" => Ok(ReservationStatus::Confirmed),
            "cancelled" => Ok(ReservationStatus::Cancelled),
            _ => Err(format!("Invalid reservation status: {}", s)),
        }
    }
}

/// A customer's booking of a dress
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Reservation {
    pub id: Uuid,
    pub dress_id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub rental_start_date: NaiveDate,
    pub rental_end_date: NaiveDate,
    #[schema(value_type = f64)]
    pub total_price: Decimal,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    /// The rental dates exactly as stored
    pub fn stored_range(&self) -> DateRange {
        DateRange::new(self.rental_start_date, self.rental_end_date)
    }

    /// Days during which this reservation keeps the dress out of the shop.
    ///
    /// Single-day bookings store only the event date, so the pickup and
    /// return buffers are added back; longer stored ranges already span them.
    pub fn occupied_window(&self) -> DateRange {
        if self.rental_start_date == self.rental_end_date {
            dates::occupied_window(self.rental_start_date)
        } else {
            DateRange::new(self.rental_start_date, self.rental_end_date)
        }
    }
}

/// Payload for POST /api/reservations
///
/// Field names follow the storefront's camelCase wire format.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationRequest {
    #[schema(example = "4f8e7a52-3c1b-4d2e-9a6f-0b1c2d3e4f50")]
    pub dress_id: Option<String>,
    #[validate(custom(function = "validate_not_blank", message = "Falta el nombre del cliente"))]
    pub customer_name: Option<String>,
    #[validate(email(message = "Correo electrónico inválido"))]
    pub customer_email: Option<String>,
    #[validate(custom(function = "validate_not_blank", message = "Falta el teléfono del cliente"))]
    pub customer_phone: Option<String>,
    #[schema(example = "2025-06-10")]
    pub event_date: Option<String>,
}

/// A validated booking ready to be handed to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReservation {
    pub dress_id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub event_date: NaiveDate,
}

/// An operator-defined inclusive period during which a dress cannot be rented
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BlockedDateRange {
    pub id: Uuid,
    pub dress_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BlockedDateRange {
    pub fn range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }
}

/// Payload for POST /api/dresses/{id}/blocked-dates
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_blocked_range", skip_on_field_errors = false))]
pub struct CreateBlockedRange {
    #[schema(example = "2025-12-20")]
    pub start_date: NaiveDate,
    #[schema(example = "2025-12-31")]
    pub end_date: NaiveDate,
    #[schema(example = "Mantenimiento")]
    pub reason: Option<String>,
}

fn validate_blocked_range(payload: &CreateBlockedRange) -> Result<(), validator::ValidationError> {
    validate_date_range(payload.start_date, payload.end_date)
}
