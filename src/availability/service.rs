use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::dates;
use super::engine::{AvailabilityDecision, AvailabilityEngine, AvailableCount, DressSnapshot};
use super::error::{AvailabilityError, MSG_MISSING_EVENT_DATE, MSG_MISSING_PARAMETERS};
use crate::models::NewReservation;
use crate::store::{BookingOutcome, DressStore};

/// Source of "today" for availability checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clock {
    /// Server-local calendar date
    System,
    /// Pinned date, for tests and replays
    Fixed(NaiveDate),
}

impl Clock {
    pub fn today(&self) -> NaiveDate {
        match self {
            Clock::System => chrono::Local::now().date_naive(),
            Clock::Fixed(date) => *date,
        }
    }
}

/// Payload for POST /api/check-availability
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckAvailabilityRequest {
    #[schema(example = "4f8e7a52-3c1b-4d2e-9a6f-0b1c2d3e4f50")]
    pub dress_id: Option<String>,
    #[schema(example = "2025-06-10")]
    pub event_date: Option<String>,
}

impl CheckAvailabilityRequest {
    /// Presence first, then format
    pub fn parse(&self) -> Result<(Uuid, NaiveDate), AvailabilityError> {
        let dress_id = non_blank(&self.dress_id);
        let event_date = non_blank(&self.event_date);

        let (Some(raw_id), Some(raw_date)) = (dress_id, event_date) else {
            return Err(AvailabilityError::missing(
                MSG_MISSING_PARAMETERS,
                &[("dressId", dress_id.is_some()), ("eventDate", event_date.is_some())],
            ));
        };

        Ok((parse_dress_id(raw_id)?, parse_date(raw_date)?))
    }
}

/// Payload for POST /api/check-available-dresses
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CountAvailableRequest {
    #[schema(example = "2025-06-10")]
    pub event_date: Option<String>,
}

impl CountAvailableRequest {
    pub fn parse(&self) -> Result<NaiveDate, AvailabilityError> {
        let raw = non_blank(&self.event_date).ok_or_else(|| {
            AvailabilityError::missing(MSG_MISSING_EVENT_DATE, &[("eventDate", false)])
        })?;
        parse_date(raw)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn parse_dress_id(raw: &str) -> Result<Uuid, AvailabilityError> {
    Uuid::parse_str(raw.trim()).map_err(|_| {
        AvailabilityError::InvalidParameter(format!("dressId '{}' no es un identificador válido", raw))
    })
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, AvailabilityError> {
    dates::parse_event_date(raw).map_err(|_| {
        AvailabilityError::InvalidParameter(format!(
            "La fecha '{}' debe tener el formato YYYY-MM-DD",
            raw
        ))
    })
}

/// Loads snapshots from the store and hands them to the engine
#[derive(Clone)]
pub struct AvailabilityService {
    store: Arc<dyn DressStore>,
    engine: AvailabilityEngine,
    clock: Clock,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn DressStore>, engine: AvailabilityEngine, clock: Clock) -> Self {
        Self {
            store,
            engine,
            clock,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Verdict for one dress on one event date.
    ///
    /// Horizon failures are answered before the dress is looked up.
    pub async fn check_availability(
        &self,
        dress_id: Uuid,
        event_date: NaiveDate,
        today: NaiveDate,
    ) -> Result<AvailabilityDecision, AvailabilityError> {
        if let Err(rejection) = self.engine.check_event_date(event_date, today) {
            tracing::debug!("Dress {} rejected for {}: {:?}", dress_id, event_date, rejection.reason);
            return Ok(rejection);
        }

        let dress = self
            .store
            .get_dress(dress_id)
            .await?
            .ok_or(AvailabilityError::DressNotFound(dress_id))?;

        let snapshot = DressSnapshot {
            dress,
            reservations: self.store.list_reservations_for_dress(dress_id).await?,
            blocked: self.store.list_blocked_ranges(dress_id).await?,
        };

        let decision = self.engine.check_dress(&snapshot, event_date, today);
        tracing::debug!(
            "Availability of dress {} for {}: {:?}",
            dress_id,
            event_date,
            decision.reason
        );
        Ok(decision)
    }

    /// How many dresses could be rented for `event_date`
    pub async fn count_available_for_date(
        &self,
        event_date: NaiveDate,
        today: NaiveDate,
    ) -> Result<AvailableCount, AvailabilityError> {
        let window = match self.engine.check_event_date(event_date, today) {
            Ok(window) => window,
            Err(_) => return Ok(self.engine.count_available(&[], &[], event_date, today)),
        };

        let dresses = self.store.list_available_dresses().await?;
        let reservations = self
            .store
            .list_reservations_around(self.engine.aggregate_search_window(window))
            .await?;
        let count = self
            .engine
            .count_available(&dresses, &reservations, event_date, today);

        tracing::debug!("{} dresses available for {}", count.available_count, event_date);
        Ok(count)
    }

    /// Dresses the catalog should hide when filtering by `event_date`.
    ///
    /// Uses the same counting rule as `count_available_for_date`.
    pub async fn reserved_dress_ids(&self, event_date: NaiveDate) -> Result<Vec<Uuid>, AvailabilityError> {
        let window = dates::occupied_window(event_date);
        let reservations = self
            .store
            .list_reservations_around(self.engine.aggregate_search_window(window))
            .await?;
        let mut ids: Vec<Uuid> = self
            .engine
            .reserved_dress_ids(&reservations, &window)
            .into_iter()
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// Atomic check-and-book of a pending reservation
    pub async fn book(
        &self,
        request: NewReservation,
        today: NaiveDate,
    ) -> Result<BookingOutcome, AvailabilityError> {
        let outcome = self.store.reserve(request, &self.engine, today).await?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::engine::{AvailabilityReason, BookingPolicy, MSG_EMPTY_CATALOG};
    use crate::models::{CreateDress, Reservation, ReservationStatus};
    use crate::store::MemoryStore;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        "2025-05-01".parse().unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn payload(name: &str) -> CreateDress {
        CreateDress {
            name: name.to_string(),
            description: None,
            category: "Gala".to_string(),
            color: "Azul".to_string(),
            size: "S".to_string(),
            price_per_day: dec!(300),
            image_url: "https://cdn.example.com/d.jpg".to_string(),
            additional_images: None,
        }
    }

    fn reservation(dress_id: Uuid, event: &str, status: ReservationStatus) -> Reservation {
        Reservation {
            id: Uuid::new_v4(),
            dress_id,
            customer_name: "Lucía".to_string(),
            customer_email: "lucia@example.com".to_string(),
            customer_phone: "5552223333".to_string(),
            rental_start_date: date(event),
            rental_end_date: date(event),
            total_price: dec!(300),
            status,
            created_at: Utc::now(),
        }
    }

    fn service(store: Arc<MemoryStore>) -> AvailabilityService {
        AvailabilityService::new(store, AvailabilityEngine::default(), Clock::Fixed(today()))
    }

    #[test]
    fn test_check_request_reports_missing_fields() {
        let request = CheckAvailabilityRequest {
            dress_id: Some("  ".to_string()),
            event_date: Some("2025-06-10".to_string()),
        };
        match request.parse() {
            Err(AvailabilityError::MissingParameter { details, .. }) => {
                assert_eq!(details, "dressId: MISSING, eventDate: OK")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_check_request_rejects_bad_formats() {
        let request = CheckAvailabilityRequest {
            dress_id: Some("abc".to_string()),
            event_date: Some("2025-06-10".to_string()),
        };
        assert!(matches!(request.parse(), Err(AvailabilityError::InvalidParameter(_))));

        let request = CheckAvailabilityRequest {
            dress_id: Some(Uuid::new_v4().to_string()),
            event_date: Some("10/06/2025".to_string()),
        };
        assert!(matches!(request.parse(), Err(AvailabilityError::InvalidParameter(_))));
    }

    #[test]
    fn test_count_request_requires_date() {
        assert!(matches!(
            CountAvailableRequest::default().parse(),
            Err(AvailabilityError::MissingParameter { .. })
        ));
        let request = CountAvailableRequest {
            event_date: Some(" 2025-06-10 ".to_string()),
        };
        assert_eq!(request.parse().unwrap(), date("2025-06-10"));
    }

    #[test]
    fn test_fixed_clock() {
        assert_eq!(Clock::Fixed(today()).today(), today());
    }

    #[tokio::test]
    async fn test_check_unknown_dress_is_not_found() {
        let service = service(Arc::new(MemoryStore::new()));
        let result = service
            .check_availability(Uuid::new_v4(), date("2025-06-10"), today())
            .await;
        assert!(matches!(result, Err(AvailabilityError::DressNotFound(_))));
    }

    #[tokio::test]
    async fn test_check_horizon_is_judged_before_lookup() {
        let service = service(Arc::new(MemoryStore::new()));

        let decision = service
            .check_availability(Uuid::new_v4(), date("2025-05-02"), today())
            .await
            .unwrap();
        assert_eq!(decision.reason, AvailabilityReason::DateTooSoon);

        let decision = service
            .check_availability(Uuid::new_v4(), date("2027-05-02"), today())
            .await
            .unwrap();
        assert_eq!(decision.reason, AvailabilityReason::DateTooFar);
    }

    #[tokio::test]
    async fn test_check_sees_confirmed_reservation() {
        let store = Arc::new(MemoryStore::new());
        let dress = store.create_dress(payload("Zafiro")).await.unwrap();
        store
            .insert_reservation(reservation(dress.id, "2025-06-10", ReservationStatus::Confirmed))
            .await;
        let service = service(store);

        let decision = service
            .check_availability(dress.id, date("2025-06-09"), today())
            .await
            .unwrap();
        assert_eq!(decision.reason, AvailabilityReason::DateConflict);

        let decision = service
            .check_availability(dress.id, date("2025-06-14"), today())
            .await
            .unwrap();
        assert!(decision.available);
    }

    #[tokio::test]
    async fn test_count_ignores_pending_by_default() {
        let store = Arc::new(MemoryStore::new());
        let a = store.create_dress(payload("A")).await.unwrap();
        let b = store.create_dress(payload("B")).await.unwrap();
        store.create_dress(payload("C")).await.unwrap();
        store
            .insert_reservation(reservation(a.id, "2025-06-10", ReservationStatus::Confirmed))
            .await;
        store
            .insert_reservation(reservation(b.id, "2025-06-10", ReservationStatus::Pending))
            .await;

        let count = service(store.clone())
            .count_available_for_date(date("2025-06-10"), today())
            .await
            .unwrap();
        assert_eq!(count.available_count, 2);

        let strict = AvailabilityService::new(
            store,
            AvailabilityEngine::new(BookingPolicy {
                aggregate_counts_pending: true,
                ..Default::default()
            }),
            Clock::Fixed(today()),
        );
        let count = strict
            .count_available_for_date(date("2025-06-10"), today())
            .await
            .unwrap();
        assert_eq!(count.available_count, 1);
    }

    #[tokio::test]
    async fn test_count_ignores_booking_outside_requested_window() {
        let store = Arc::new(MemoryStore::new());
        let dress = store.create_dress(payload("A")).await.unwrap();
        store
            .insert_reservation(reservation(dress.id, "2025-06-12", ReservationStatus::Confirmed))
            .await;

        let count = service(store.clone())
            .count_available_for_date(date("2025-06-10"), today())
            .await
            .unwrap();
        assert_eq!(count.available_count, 1);

        let widened = AvailabilityService::new(
            store,
            AvailabilityEngine::new(BookingPolicy {
                aggregate_uses_occupied_window: true,
                ..Default::default()
            }),
            Clock::Fixed(today()),
        );
        let count = widened
            .count_available_for_date(date("2025-06-10"), today())
            .await
            .unwrap();
        assert_eq!(count.available_count, 0);
    }

    #[tokio::test]
    async fn test_count_empty_catalog() {
        let service = service(Arc::new(MemoryStore::new()));
        let count = service
            .count_available_for_date(date("2025-06-10"), today())
            .await
            .unwrap();
        assert_eq!(count.available_count, 0);
        assert_eq!(count.message, MSG_EMPTY_CATALOG);
    }

    #[tokio::test]
    async fn test_count_too_soon_skips_store() {
        let service = service(Arc::new(MemoryStore::new()));
        let count = service
            .count_available_for_date(date("2025-05-02"), today())
            .await
            .unwrap();
        assert_eq!(count.reason, Some(AvailabilityReason::DateTooSoon));
    }

    #[tokio::test]
    async fn test_reserved_dress_ids_for_catalog() {
        let store = Arc::new(MemoryStore::new());
        let a = store.create_dress(payload("A")).await.unwrap();
        store
            .insert_reservation(reservation(a.id, "2025-06-10", ReservationStatus::Confirmed))
            .await;
        let service = service(store);

        assert_eq!(service.reserved_dress_ids(date("2025-06-12")).await.unwrap(), vec![a.id]);
        assert!(service.reserved_dress_ids(date("2025-06-14")).await.unwrap().is_empty());
    }
}
