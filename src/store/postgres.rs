use axum::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use super::{booking_total, BookingOutcome, DressStore, StoreError, StoreResult};
use crate::availability::dates::DateRange;
use crate::availability::engine::{AvailabilityEngine, DressSnapshot};
use crate::db;
use crate::models::{
    BlockedDateRange, CreateBlockedRange, CreateDress, Dress, NewReservation, Reservation,
    ReservationStatus, UpdateDress,
};
use crate::options::models::{
    CategoryOption, ColorOption, DressOption, DressOptions, NewDressOption, OptionKind,
    SizeOption, APPENDED_DISPLAY_ORDER,
};
use crate::query::{CatalogFilter, QueryParam, DRESS_COLUMNS};

const RESERVATION_COLUMNS: &str = "id, dress_id, customer_name, customer_email, customer_phone, \
     rental_start_date, rental_end_date, total_price, status, created_at";

const BLOCKED_COLUMNS: &str = "id, dress_id, start_date, end_date, reason, created_at";

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgDressStore {
    pool: PgPool,
}

impl PgDressStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map a failed booking write: a lost race becomes a conflict, anything
/// else is a storage failure
fn booking_error(error: sqlx::Error, dress_id: Uuid) -> StoreError {
    if db::is_booking_race(&error) {
        tracing::warn!("Concurrent booking rejected for dress {}: {}", dress_id, error);
        StoreError::BookingConflict(dress_id.to_string())
    } else {
        StoreError::Database(error)
    }
}

fn option_error(error: sqlx::Error, option: &NewDressOption) -> StoreError {
    if db::is_unique_violation(&error) {
        StoreError::Duplicate(format!("{} {}", option.kind, option.name))
    } else {
        StoreError::Database(error)
    }
}

#[async_trait]
impl DressStore for PgDressStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn get_dress(&self, id: Uuid) -> StoreResult<Option<Dress>> {
        let dress = sqlx::query_as::<_, Dress>(&format!(
            "SELECT {} FROM dresses WHERE id = $1",
            DRESS_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(dress)
    }

    async fn list_available_dresses(&self) -> StoreResult<Vec<Dress>> {
        let dresses = sqlx::query_as::<_, Dress>(&format!(
            "SELECT {} FROM dresses WHERE available = TRUE ORDER BY created_at DESC",
            DRESS_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(dresses)
    }

    async fn search_dresses(&self, filter: &CatalogFilter) -> StoreResult<Vec<Dress>> {
        let (sql, params) = filter.to_builder().build();
        tracing::debug!("Catalog query: {}", sql);

        let mut query = sqlx::query_as::<_, Dress>(&sql);
        for param in params {
            query = match param {
                QueryParam::Text(value) => query.bind(value),
                QueryParam::Decimal(value) => query.bind(value),
                QueryParam::Uuids(value) => query.bind(value),
            };
        }

        let dresses = query.fetch_all(&self.pool).await?;
        Ok(dresses)
    }

    async fn create_dress(&self, payload: CreateDress) -> StoreResult<Dress> {
        let dress = sqlx::query_as::<_, Dress>(&format!(
            r#"
            INSERT INTO dresses (name, description, category, color, size, price_per_day, image_url, additional_images)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            DRESS_COLUMNS
        ))
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(&payload.category)
        .bind(&payload.color)
        .bind(&payload.size)
        .bind(payload.price_per_day)
        .bind(&payload.image_url)
        .bind(&payload.additional_images)
        .fetch_one(&self.pool)
        .await?;

        Ok(dress)
    }

    async fn update_dress(&self, id: Uuid, update: UpdateDress) -> StoreResult<Option<Dress>> {
        let dress = sqlx::query_as::<_, Dress>(&format!(
            r#"
            UPDATE dresses SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                color = COALESCE($5, color),
                size = COALESCE($6, size),
                price_per_day = COALESCE($7, price_per_day),
                image_url = COALESCE($8, image_url),
                additional_images = COALESCE($9, additional_images),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            DRESS_COLUMNS
        ))
        .bind(id)
        .bind(&update.name)
        .bind(&update.description)
        .bind(&update.category)
        .bind(&update.color)
        .bind(&update.size)
        .bind(update.price_per_day)
        .bind(&update.image_url)
        .bind(&update.additional_images)
        .fetch_optional(&self.pool)
        .await?;

        Ok(dress)
    }

    async fn set_dress_available(&self, id: Uuid, available: bool) -> StoreResult<Option<Dress>> {
        let dress = sqlx::query_as::<_, Dress>(&format!(
            "UPDATE dresses SET available = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            DRESS_COLUMNS
        ))
        .bind(id)
        .bind(available)
        .fetch_optional(&self.pool)
        .await?;

        Ok(dress)
    }

    async fn delete_dress(&self, id: Uuid) -> StoreResult<bool> {
        // Reservations and blocked ranges go with it via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM dresses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_reservations_for_dress(&self, dress_id: Uuid) -> StoreResult<Vec<Reservation>> {
        let reservations = sqlx::query_as::<_, Reservation>(&format!(
            "SELECT {} FROM reservations WHERE dress_id = $1 ORDER BY rental_start_date",
            RESERVATION_COLUMNS
        ))
        .bind(dress_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reservations)
    }

    async fn list_reservations_around(&self, window: DateRange) -> StoreResult<Vec<Reservation>> {
        let reservations = sqlx::query_as::<_, Reservation>(&format!(
            "SELECT {} FROM reservations WHERE rental_start_date <= $1 AND rental_end_date >= $2",
            RESERVATION_COLUMNS
        ))
        .bind(window.end)
        .bind(window.start)
        .fetch_all(&self.pool)
        .await?;

        Ok(reservations)
    }

    async fn reserve(
        &self,
        request: NewReservation,
        engine: &AvailabilityEngine,
        today: NaiveDate,
    ) -> StoreResult<BookingOutcome> {
        let dress_id = request.dress_id;
        let mut tx = self.pool.begin().await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;

        // Row lock serializes bookings of the same dress
        let dress = sqlx::query_as::<_, Dress>(&format!(
            "SELECT {} FROM dresses WHERE id = $1 FOR UPDATE",
            DRESS_COLUMNS
        ))
        .bind(dress_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| booking_error(e, dress_id))?
        .ok_or(StoreError::DressNotFound(dress_id))?;

        let reservations = sqlx::query_as::<_, Reservation>(&format!(
            "SELECT {} FROM reservations WHERE dress_id = $1 AND status IN ('pending', 'confirmed')",
            RESERVATION_COLUMNS
        ))
        .bind(dress_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| booking_error(e, dress_id))?;

        let blocked = sqlx::query_as::<_, BlockedDateRange>(&format!(
            "SELECT {} FROM blocked_dates WHERE dress_id = $1",
            BLOCKED_COLUMNS
        ))
        .bind(dress_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| booking_error(e, dress_id))?;

        let snapshot = DressSnapshot {
            dress,
            reservations,
            blocked,
        };

        let decision = engine.check_dress(&snapshot, request.event_date, today);
        if !decision.available {
            tx.rollback().await?;
            return Ok(BookingOutcome::Rejected(decision));
        }

        let total_price = booking_total(
            snapshot.dress.price_per_day,
            request.event_date,
            request.event_date,
        );

        let reservation = sqlx::query_as::<_, Reservation>(&format!(
            r#"
            INSERT INTO reservations
                (dress_id, customer_name, customer_email, customer_phone,
                 rental_start_date, rental_end_date, total_price, status)
            VALUES ($1, $2, $3, $4, $5, $5, $6, $7)
            RETURNING {}
            "#,
            RESERVATION_COLUMNS
        ))
        .bind(dress_id)
        .bind(&request.customer_name)
        .bind(&request.customer_email)
        .bind(&request.customer_phone)
        .bind(request.event_date)
        .bind(total_price)
        .bind(ReservationStatus::Pending)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| booking_error(e, dress_id))?;

        tx.commit().await.map_err(|e| booking_error(e, dress_id))?;

        tracing::info!(
            "Reservation {} booked for dress {} on {}",
            reservation.id,
            dress_id,
            request.event_date
        );
        Ok(BookingOutcome::Booked(reservation))
    }

    async fn list_blocked_ranges(&self, dress_id: Uuid) -> StoreResult<Vec<BlockedDateRange>> {
        let blocked = sqlx::query_as::<_, BlockedDateRange>(&format!(
            "SELECT {} FROM blocked_dates WHERE dress_id = $1 ORDER BY start_date",
            BLOCKED_COLUMNS
        ))
        .bind(dress_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(blocked)
    }

    async fn create_blocked_range(
        &self,
        dress_id: Uuid,
        payload: CreateBlockedRange,
    ) -> StoreResult<BlockedDateRange> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM dresses WHERE id = $1)")
            .bind(dress_id)
            .fetch_one(&self.pool)
            .await?;
        if !exists {
            return Err(StoreError::DressNotFound(dress_id));
        }

        let blocked = sqlx::query_as::<_, BlockedDateRange>(&format!(
            r#"
            INSERT INTO blocked_dates (dress_id, start_date, end_date, reason)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            BLOCKED_COLUMNS
        ))
        .bind(dress_id)
        .bind(payload.start_date)
        .bind(payload.end_date)
        .bind(&payload.reason)
        .fetch_one(&self.pool)
        .await?;

        Ok(blocked)
    }

    async fn delete_blocked_range(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM blocked_dates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_options(&self) -> StoreResult<DressOptions> {
        let colors = sqlx::query_as::<_, ColorOption>(
            "SELECT id, name, hex_code, display_name FROM dress_colors ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        let sizes = sqlx::query_as::<_, SizeOption>(
            "SELECT id, name, display_order FROM dress_sizes ORDER BY display_order, name",
        )
        .fetch_all(&self.pool)
        .await?;

        let categories = sqlx::query_as::<_, CategoryOption>(
            "SELECT id, name, display_name FROM dress_categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(DressOptions {
            colors,
            sizes,
            categories,
        })
    }

    async fn add_option(&self, option: NewDressOption) -> StoreResult<DressOption> {
        let created = match option.kind {
            OptionKind::Color => sqlx::query_as::<_, ColorOption>(
                "INSERT INTO dress_colors (name, hex_code) VALUES ($1, $2) \
                 RETURNING id, name, hex_code, display_name",
            )
            .bind(&option.name)
            .bind(&option.hex_code)
            .fetch_one(&self.pool)
            .await
            .map(DressOption::Color),
            OptionKind::Size => sqlx::query_as::<_, SizeOption>(
                "INSERT INTO dress_sizes (name, display_order) VALUES ($1, $2) \
                 RETURNING id, name, display_order",
            )
            .bind(&option.name)
            .bind(APPENDED_DISPLAY_ORDER)
            .fetch_one(&self.pool)
            .await
            .map(DressOption::Size),
            OptionKind::Category => sqlx::query_as::<_, CategoryOption>(
                "INSERT INTO dress_categories (name, display_order) VALUES ($1, $2) \
                 RETURNING id, name, display_name",
            )
            .bind(&option.name)
            .bind(APPENDED_DISPLAY_ORDER)
            .fetch_one(&self.pool)
            .await
            .map(DressOption::Category),
        };

        created.map_err(|e| option_error(e, &option))
    }

    async fn delete_option(&self, kind: OptionKind, name: &str) -> StoreResult<bool> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE name = $1", kind.table()))
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
