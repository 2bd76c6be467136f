// Record store
//
// All persistence goes through the `DressStore` trait so handlers and the
// availability service never touch a connection directly. `PgDressStore`
// backs the running service; `MemoryStore` backs tests.

pub mod memory;
pub mod postgres;

use axum::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::availability::dates::DateRange;
use crate::availability::engine::{AvailabilityDecision, AvailabilityEngine};
use crate::models::{
    BlockedDateRange, CreateBlockedRange, CreateDress, Dress, NewReservation, Reservation,
    UpdateDress,
};
use crate::options::models::{DressOption, DressOptions, NewDressOption, OptionKind};
use crate::query::CatalogFilter;

pub use memory::MemoryStore;
pub use postgres::PgDressStore;

/// Errors raised by a store implementation
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing database failed or could not be reached
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Dress not found: {0}")]
    DressNotFound(Uuid),

    /// A unique constraint rejected the write
    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    /// A concurrent booking won the race for the same dress and window
    #[error("Booking conflict: {0}")]
    BookingConflict(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of an atomic check-and-book
#[derive(Debug, Clone)]
pub enum BookingOutcome {
    Booked(Reservation),
    /// The engine said no; nothing was written
    Rejected(AvailabilityDecision),
}

/// Data access for dresses, reservations, blocked ranges and catalog options
#[async_trait]
pub trait DressStore: Send + Sync {
    /// Cheap round trip used by the health check
    async fn ping(&self) -> StoreResult<()>;

    async fn get_dress(&self, id: Uuid) -> StoreResult<Option<Dress>>;

    /// Every dress whose operator flag is on
    async fn list_available_dresses(&self) -> StoreResult<Vec<Dress>>;

    async fn search_dresses(&self, filter: &CatalogFilter) -> StoreResult<Vec<Dress>>;

    async fn create_dress(&self, payload: CreateDress) -> StoreResult<Dress>;

    async fn update_dress(&self, id: Uuid, update: UpdateDress) -> StoreResult<Option<Dress>>;

    async fn set_dress_available(&self, id: Uuid, available: bool) -> StoreResult<Option<Dress>>;

    /// Removes the dress with its reservations and blocked ranges.
    /// Returns false when nothing was deleted.
    async fn delete_dress(&self, id: Uuid) -> StoreResult<bool>;

    /// All reservations of a dress regardless of status
    async fn list_reservations_for_dress(&self, dress_id: Uuid) -> StoreResult<Vec<Reservation>>;

    /// Reservations of any dress whose stored date range overlaps `window`,
    /// regardless of status. Callers re-check status with the engine.
    async fn list_reservations_around(&self, window: DateRange) -> StoreResult<Vec<Reservation>>;

    /// Checks availability and inserts a pending reservation as one atomic
    /// step, so two concurrent requests can never both book the same window.
    async fn reserve(
        &self,
        request: NewReservation,
        engine: &AvailabilityEngine,
        today: NaiveDate,
    ) -> StoreResult<BookingOutcome>;

    async fn list_blocked_ranges(&self, dress_id: Uuid) -> StoreResult<Vec<BlockedDateRange>>;

    /// Fails with `DressNotFound` when the dress does not exist
    async fn create_blocked_range(
        &self,
        dress_id: Uuid,
        payload: CreateBlockedRange,
    ) -> StoreResult<BlockedDateRange>;

    async fn delete_blocked_range(&self, id: Uuid) -> StoreResult<bool>;

    async fn list_options(&self) -> StoreResult<DressOptions>;

    /// Fails with `Duplicate` when an option of that kind and name exists
    async fn add_option(&self, option: NewDressOption) -> StoreResult<DressOption>;

    async fn delete_option(&self, kind: OptionKind, name: &str) -> StoreResult<bool>;
}

/// Price of a booking: the daily rate times the number of rental days.
/// A single-event booking is one rental day.
pub fn booking_total(price_per_day: Decimal, start: NaiveDate, end: NaiveDate) -> Decimal {
    let days = (end - start).num_days().max(0) + 1;
    price_per_day * Decimal::from(days)
}
