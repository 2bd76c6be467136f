use axum::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{booking_total, BookingOutcome, DressStore, StoreError, StoreResult};
use crate::availability::dates::DateRange;
use crate::availability::engine::{AvailabilityEngine, DressSnapshot};
use crate::models::{
    BlockedDateRange, CreateBlockedRange, CreateDress, Dress, NewReservation, Reservation,
    ReservationStatus, UpdateDress,
};
use crate::options::models::{
    CategoryOption, ColorOption, DressOption, DressOptions, NewDressOption, OptionKind,
    SizeOption, APPENDED_DISPLAY_ORDER, DEFAULT_SIZES,
};
use crate::query::CatalogFilter;

#[derive(Debug, Default)]
struct MemoryData {
    dresses: Vec<Dress>,
    reservations: Vec<Reservation>,
    blocked: Vec<BlockedDateRange>,
    colors: Vec<ColorOption>,
    sizes: Vec<SizeOption>,
    categories: Vec<CategoryOption>,
}

/// Process-local store used by tests and local development.
///
/// A single lock guards all collections, so `reserve` is atomic with
/// respect to every other write.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<MemoryData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty store seeded with the built-in sizes
    pub fn with_default_sizes() -> Self {
        let sizes = DEFAULT_SIZES
            .iter()
            .enumerate()
            .map(|(i, name)| SizeOption {
                id: Uuid::new_v4(),
                name: name.to_string(),
                display_order: i as i32 + 1,
            })
            .collect();

        Self {
            data: RwLock::new(MemoryData {
                sizes,
                ..Default::default()
            }),
        }
    }

    /// Inserts a dress as-is, keeping its id and timestamps
    pub async fn insert_dress(&self, dress: Dress) {
        self.data.write().await.dresses.push(dress);
    }

    /// Inserts a reservation as-is, bypassing availability checks
    pub async fn insert_reservation(&self, reservation: Reservation) {
        self.data.write().await.reservations.push(reservation);
    }

    pub async fn insert_blocked_range(&self, blocked: BlockedDateRange) {
        self.data.write().await.blocked.push(blocked);
    }
}

#[async_trait]
impl DressStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn get_dress(&self, id: Uuid) -> StoreResult<Option<Dress>> {
        let data = self.data.read().await;
        Ok(data.dresses.iter().find(|d| d.id == id).cloned())
    }

    async fn list_available_dresses(&self) -> StoreResult<Vec<Dress>> {
        let data = self.data.read().await;
        Ok(data.dresses.iter().filter(|d| d.available).cloned().collect())
    }

    async fn search_dresses(&self, filter: &CatalogFilter) -> StoreResult<Vec<Dress>> {
        let data = self.data.read().await;
        Ok(filter.apply(data.dresses.iter().cloned()))
    }

    async fn create_dress(&self, payload: CreateDress) -> StoreResult<Dress> {
        let now = Utc::now();
        let dress = Dress {
            id: Uuid::new_v4(),
            name: payload.name,
            description: payload.description,
            category: payload.category,
            color: payload.color,
            size: payload.size,
            price_per_day: payload.price_per_day,
            image_url: payload.image_url,
            additional_images: payload.additional_images,
            available: true,
            created_at: now,
            updated_at: now,
        };
        self.data.write().await.dresses.push(dress.clone());
        Ok(dress)
    }

    async fn update_dress(&self, id: Uuid, update: UpdateDress) -> StoreResult<Option<Dress>> {
        let mut data = self.data.write().await;
        let Some(slot) = data.dresses.iter_mut().find(|d| d.id == id) else {
            return Ok(None);
        };
        let updated = update.apply(slot.clone(), Utc::now());
        *slot = updated.clone();
        Ok(Some(updated))
    }

    async fn set_dress_available(&self, id: Uuid, available: bool) -> StoreResult<Option<Dress>> {
        let mut data = self.data.write().await;
        let Some(slot) = data.dresses.iter_mut().find(|d| d.id == id) else {
            return Ok(None);
        };
        slot.available = available;
        slot.updated_at = Utc::now();
        Ok(Some(slot.clone()))
    }

    async fn delete_dress(&self, id: Uuid) -> StoreResult<bool> {
        let mut data = self.data.write().await;
        let before = data.dresses.len();
        data.dresses.retain(|d| d.id != id);
        if data.dresses.len() == before {
            return Ok(false);
        }
        data.reservations.retain(|r| r.dress_id != id);
        data.blocked.retain(|b| b.dress_id != id);
        Ok(true)
    }

    async fn list_reservations_for_dress(&self, dress_id: Uuid) -> StoreResult<Vec<Reservation>> {
        let data = self.data.read().await;
        let mut reservations: Vec<Reservation> = data
            .reservations
            .iter()
            .filter(|r| r.dress_id == dress_id)
            .cloned()
            .collect();
        reservations.sort_by_key(|r| r.rental_start_date);
        Ok(reservations)
    }

    async fn list_reservations_around(&self, window: DateRange) -> StoreResult<Vec<Reservation>> {
        let data = self.data.read().await;
        Ok(data
            .reservations
            .iter()
            .filter(|r| r.stored_range().overlaps(&window))
            .cloned()
            .collect())
    }

    async fn reserve(
        &self,
        request: NewReservation,
        engine: &AvailabilityEngine,
        today: NaiveDate,
    ) -> StoreResult<BookingOutcome> {
        let mut data = self.data.write().await;

        let dress = data
            .dresses
            .iter()
            .find(|d| d.id == request.dress_id)
            .cloned()
            .ok_or(StoreError::DressNotFound(request.dress_id))?;

        let snapshot = DressSnapshot {
            reservations: data
                .reservations
                .iter()
                .filter(|r| r.dress_id == dress.id && r.status.holds_dress())
                .cloned()
                .collect(),
            blocked: data
                .blocked
                .iter()
                .filter(|b| b.dress_id == dress.id)
                .cloned()
                .collect(),
            dress,
        };

        let decision = engine.check_dress(&snapshot, request.event_date, today);
        if !decision.available {
            return Ok(BookingOutcome::Rejected(decision));
        }

        let reservation = Reservation {
            id: Uuid::new_v4(),
            dress_id: request.dress_id,
            customer_name: request.customer_name,
            customer_email: request.customer_email,
            customer_phone: request.customer_phone,
            rental_start_date: request.event_date,
            rental_end_date: request.event_date,
            total_price: booking_total(
                snapshot.dress.price_per_day,
                request.event_date,
                request.event_date,
            ),
            status: ReservationStatus::Pending,
            created_at: Utc::now(),
        };
        data.reservations.push(reservation.clone());
        Ok(BookingOutcome::Booked(reservation))
    }

    async fn list_blocked_ranges(&self, dress_id: Uuid) -> StoreResult<Vec<BlockedDateRange>> {
        let data = self.data.read().await;
        let mut blocked: Vec<BlockedDateRange> = data
            .blocked
            .iter()
            .filter(|b| b.dress_id == dress_id)
            .cloned()
            .collect();
        blocked.sort_by_key(|b| b.start_date);
        Ok(blocked)
    }

    async fn create_blocked_range(
        &self,
        dress_id: Uuid,
        payload: CreateBlockedRange,
    ) -> StoreResult<BlockedDateRange> {
        let mut data = self.data.write().await;
        if !data.dresses.iter().any(|d| d.id == dress_id) {
            return Err(StoreError::DressNotFound(dress_id));
        }
        let blocked = BlockedDateRange {
            id: Uuid::new_v4(),
            dress_id,
            start_date: payload.start_date,
            end_date: payload.end_date,
            reason: payload.reason,
            created_at: Utc::now(),
        };
        data.blocked.push(blocked.clone());
        Ok(blocked)
    }

    async fn delete_blocked_range(&self, id: Uuid) -> StoreResult<bool> {
        let mut data = self.data.write().await;
        let before = data.blocked.len();
        data.blocked.retain(|b| b.id != id);
        Ok(data.blocked.len() != before)
    }

    async fn list_options(&self) -> StoreResult<DressOptions> {
        let data = self.data.read().await;
        let mut colors = data.colors.clone();
        colors.sort_by(|a, b| a.name.cmp(&b.name));
        let mut sizes = data.sizes.clone();
        sizes.sort_by(|a, b| a.display_order.cmp(&b.display_order).then_with(|| a.name.cmp(&b.name)));
        let mut categories = data.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(DressOptions {
            colors,
            sizes,
            categories,
        })
    }

    async fn add_option(&self, option: NewDressOption) -> StoreResult<DressOption> {
        let mut data = self.data.write().await;
        let duplicate = match option.kind {
            OptionKind::Color => data.colors.iter().any(|c| c.name == option.name),
            OptionKind::Size => data.sizes.iter().any(|s| s.name == option.name),
            OptionKind::Category => data.categories.iter().any(|c| c.name == option.name),
        };
        if duplicate {
            return Err(StoreError::Duplicate(format!("{} {}", option.kind, option.name)));
        }

        let created = match option.kind {
            OptionKind::Color => {
                let color = ColorOption {
                    id: Uuid::new_v4(),
                    name: option.name,
                    hex_code: option.hex_code,
                    display_name: None,
                };
                data.colors.push(color.clone());
                DressOption::Color(color)
            }
            OptionKind::Size => {
                let size = SizeOption {
                    id: Uuid::new_v4(),
                    name: option.name,
                    display_order: APPENDED_DISPLAY_ORDER,
                };
                data.sizes.push(size.clone());
                DressOption::Size(size)
            }
            OptionKind::Category => {
                let category = CategoryOption {
                    id: Uuid::new_v4(),
                    name: option.name,
                    display_name: None,
                };
                data.categories.push(category.clone());
                DressOption::Category(category)
            }
        };
        Ok(created)
    }

    async fn delete_option(&self, kind: OptionKind, name: &str) -> StoreResult<bool> {
        let mut data = self.data.write().await;
        let removed = match kind {
            OptionKind::Color => {
                let before = data.colors.len();
                data.colors.retain(|c| c.name != name);
                data.colors.len() != before
            }
            OptionKind::Size => {
                let before = data.sizes.len();
                data.sizes.retain(|s| s.name != name);
                data.sizes.len() != before
            }
            OptionKind::Category => {
                let before = data.categories.len();
                data.categories.retain(|c| c.name != name);
                data.categories.len() != before
            }
        };
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::engine::AvailabilityReason;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn today() -> NaiveDate {
        "2025-05-01".parse().unwrap()
    }

    fn create_payload(name: &str) -> CreateDress {
        CreateDress {
            name: name.to_string(),
            description: None,
            category: "Gala".to_string(),
            color: "Rojo".to_string(),
            size: "M".to_string(),
            price_per_day: dec!(450),
            image_url: "https://cdn.example.com/a.jpg".to_string(),
            additional_images: None,
        }
    }

    fn booking(dress_id: Uuid, event: &str) -> NewReservation {
        NewReservation {
            dress_id,
            customer_name: "Ana".to_string(),
            customer_email: "ana@example.com".to_string(),
            customer_phone: "5550001111".to_string(),
            event_date: event.parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn test_reserve_books_then_rejects_overlap() {
        let store = MemoryStore::new();
        let engine = AvailabilityEngine::default();
        let dress = store.create_dress(create_payload("Rubí")).await.unwrap();

        let first = store
            .reserve(booking(dress.id, "2025-06-10"), &engine, today())
            .await
            .unwrap();
        let BookingOutcome::Booked(reservation) = first else {
            panic!("expected a booking");
        };
        assert_eq!(reservation.status, ReservationStatus::Pending);
        assert_eq!(reservation.total_price, dec!(450));
        assert_eq!(reservation.rental_start_date, reservation.rental_end_date);

        let second = store
            .reserve(booking(dress.id, "2025-06-12"), &engine, today())
            .await
            .unwrap();
        match second {
            BookingOutcome::Rejected(decision) => {
                assert_eq!(decision.reason, AvailabilityReason::DateConflict)
            }
            BookingOutcome::Booked(_) => panic!("overlapping booking accepted"),
        }

        let clear = store
            .reserve(booking(dress.id, "2025-06-14"), &engine, today())
            .await
            .unwrap();
        assert!(matches!(clear, BookingOutcome::Booked(_)));
    }

    #[tokio::test]
    async fn test_reserve_unknown_dress() {
        let store = MemoryStore::new();
        let result = store
            .reserve(
                booking(Uuid::new_v4(), "2025-06-10"),
                &AvailabilityEngine::default(),
                today(),
            )
            .await;
        assert!(matches!(result, Err(StoreError::DressNotFound(_))));
    }

    #[tokio::test]
    async fn test_concurrent_reserve_books_once() {
        let store = Arc::new(MemoryStore::new());
        let dress = store.create_dress(create_payload("Rubí")).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let request = booking(dress.id, "2025-06-10");
            handles.push(tokio::spawn(async move {
                store
                    .reserve(request, &AvailabilityEngine::default(), today())
                    .await
                    .unwrap()
            }));
        }

        let mut booked = 0;
        for handle in handles {
            if let BookingOutcome::Booked(_) = handle.await.unwrap() {
                booked += 1;
            }
        }
        assert_eq!(booked, 1);
    }

    #[tokio::test]
    async fn test_delete_dress_cascades() {
        let store = MemoryStore::new();
        let dress = store.create_dress(create_payload("Rubí")).await.unwrap();
        store
            .reserve(booking(dress.id, "2025-06-10"), &AvailabilityEngine::default(), today())
            .await
            .unwrap();
        store
            .create_blocked_range(
                dress.id,
                CreateBlockedRange {
                    start_date: "2025-07-01".parse().unwrap(),
                    end_date: "2025-07-05".parse().unwrap(),
                    reason: None,
                },
            )
            .await
            .unwrap();

        assert!(store.delete_dress(dress.id).await.unwrap());
        assert!(store.list_reservations_for_dress(dress.id).await.unwrap().is_empty());
        assert!(store.list_blocked_ranges(dress.id).await.unwrap().is_empty());
        assert!(!store.delete_dress(dress.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_blocked_range_requires_dress() {
        let store = MemoryStore::new();
        let result = store
            .create_blocked_range(
                Uuid::new_v4(),
                CreateBlockedRange {
                    start_date: "2025-07-01".parse().unwrap(),
                    end_date: "2025-07-05".parse().unwrap(),
                    reason: None,
                },
            )
            .await;
        assert!(matches!(result, Err(StoreError::DressNotFound(_))));
    }

    #[tokio::test]
    async fn test_reservations_around_matches_stored_dates() {
        let store = MemoryStore::new();
        let dress = store.create_dress(create_payload("Rubí")).await.unwrap();
        store
            .reserve(booking(dress.id, "2025-06-10"), &AvailabilityEngine::default(), today())
            .await
            .unwrap();

        let touching = DateRange::new("2025-06-10".parse().unwrap(), "2025-06-14".parse().unwrap());
        let clear = DateRange::new("2025-06-11".parse().unwrap(), "2025-06-15".parse().unwrap());
        assert_eq!(store.list_reservations_around(touching).await.unwrap().len(), 1);
        assert!(store.list_reservations_around(clear).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_options_duplicate_and_delete() {
        let store = MemoryStore::with_default_sizes();
        let options = store.list_options().await.unwrap();
        assert_eq!(options.sizes.len(), 6);
        assert_eq!(options.sizes[0].name, "XS");

        let added = store
            .add_option(NewDressOption {
                kind: OptionKind::Size,
                name: "XXXL".to_string(),
                hex_code: String::new(),
            })
            .await
            .unwrap();
        match added {
            DressOption::Size(size) => assert_eq!(size.display_order, APPENDED_DISPLAY_ORDER),
            other => panic!("unexpected option {:?}", other),
        }

        let duplicate = store
            .add_option(NewDressOption {
                kind: OptionKind::Size,
                name: "XXXL".to_string(),
                hex_code: String::new(),
            })
            .await;
        assert!(matches!(duplicate, Err(StoreError::Duplicate(_))));

        assert!(store.delete_option(OptionKind::Size, "XXXL").await.unwrap());
        assert!(!store.delete_option(OptionKind::Size, "XXXL").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_and_toggle_availability() {
        let store = MemoryStore::new();
        let dress = store.create_dress(create_payload("Rubí")).await.unwrap();

        let updated = store
            .update_dress(
                dress.id,
                UpdateDress {
                    name: Some("Rubí II".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Rubí II");

        let toggled = store.set_dress_available(dress.id, false).await.unwrap().unwrap();
        assert!(!toggled.available);
        assert!(store.list_available_dresses().await.unwrap().is_empty());
        assert!(store
            .update_dress(Uuid::new_v4(), UpdateDress::default())
            .await
            .unwrap()
            .is_none());
    }
}
