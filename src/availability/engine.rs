// Availability Engine
//
// Decides whether a dress can be booked for an event date. Pure: every
// decision is computed from an already-fetched snapshot and an injected
// "today", so identical inputs always give identical verdicts.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::availability::dates::{self, DateRange};
use crate::models::{BlockedDateRange, Dress, Reservation, ReservationStatus};

pub const MSG_TOO_SOON: &str = "No se pueden consultar vestidos de fechas anteriores al día de hoy";
pub const MSG_MARKED_UNAVAILABLE: &str = "Este vestido no está disponible actualmente";
pub const MSG_BLOCKED: &str = "El vestido no está disponible en las fechas seleccionadas. Por favor elige otra fecha.";
pub const MSG_CONFLICT: &str = "El vestido no está disponible en esta fecha. Por favor elige otra fecha.";
pub const MSG_AVAILABLE: &str = "¡El vestido está disponible para tu evento!";
pub const MSG_EMPTY_CATALOG: &str = "No hay vestidos en el catálogo";
pub const MSG_NONE_AVAILABLE: &str = "No hay vestidos disponibles para esta fecha";

/// The first year that can no longer be queried, named in the "too far" message
pub fn too_far_message(today: NaiveDate, horizon_years: i32) -> String {
    format!(
        "No se pueden consultar vestidos de {} o posteriores",
        today.year() + horizon_years
    )
}

pub fn available_count_message(count: usize) -> String {
    if count > 0 {
        format!("Hay {} vestido(s) disponible(s)", count)
    } else {
        MSG_NONE_AVAILABLE.to_string()
    }
}

/// Why a dress is or is not bookable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityReason {
    Available,
    DateTooSoon,
    DateTooFar,
    MarkedUnavailable,
    DateBlocked,
    DateConflict,
}

/// Verdict for one dress on one event date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AvailabilityDecision {
    pub available: bool,
    pub message: String,
    pub reason: AvailabilityReason,
}

impl AvailabilityDecision {
    pub fn available() -> Self {
        Self {
            available: true,
            message: MSG_AVAILABLE.to_string(),
            reason: AvailabilityReason::Available,
        }
    }

    pub fn unavailable(reason: AvailabilityReason, message: impl Into<String>) -> Self {
        Self {
            available: false,
            message: message.into(),
            reason,
        }
    }
}

/// Result of counting the catalog for one event date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailableCount {
    pub available_count: usize,
    pub message: String,
    /// Set only when the date itself was rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<AvailabilityReason>,
}

/// Booking rules the engine applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingPolicy {
    /// Earliest bookable event date is `today + min_lead_days`
    pub min_lead_days: u64,
    /// Latest bookable event date is `today + max_horizon_years`
    pub max_horizon_years: i32,
    /// Whether pending reservations remove a dress from catalog-wide counts.
    /// Single-dress checks always honour pending reservations.
    pub aggregate_counts_pending: bool,
    /// Whether catalog-wide counts widen single-day reservations to their
    /// occupied window. Off: the stored date range is compared as is.
    pub aggregate_uses_occupied_window: bool,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            min_lead_days: dates::PRE_EVENT_DAYS,
            max_horizon_years: 2,
            aggregate_counts_pending: false,
            aggregate_uses_occupied_window: false,
        }
    }
}

/// Everything the engine needs to judge a single dress
#[derive(Debug, Clone)]
pub struct DressSnapshot {
    pub dress: Dress,
    pub reservations: Vec<Reservation>,
    pub blocked: Vec<BlockedDateRange>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AvailabilityEngine {
    policy: BookingPolicy,
}

impl AvailabilityEngine {
    pub fn new(policy: BookingPolicy) -> Self {
        Self { policy }
    }

    /// Checks the booking horizon and returns the event's occupied window.
    ///
    /// Both bounds are inclusive: `today + 2 days` and `today + 2 years` are
    /// still bookable.
    pub fn check_event_date(
        &self,
        event_date: NaiveDate,
        today: NaiveDate,
    ) -> Result<DateRange, AvailabilityDecision> {
        let earliest = dates::add_days(today, self.policy.min_lead_days);
        if event_date < earliest {
            return Err(AvailabilityDecision::unavailable(
                AvailabilityReason::DateTooSoon,
                MSG_TOO_SOON,
            ));
        }

        let latest = dates::add_years(today, self.policy.max_horizon_years);
        if event_date > latest {
            return Err(AvailabilityDecision::unavailable(
                AvailabilityReason::DateTooFar,
                too_far_message(today, self.policy.max_horizon_years),
            ));
        }

        Ok(dates::occupied_window(event_date))
    }

    /// Full verdict for one dress. Checks run in a fixed order and the first
    /// failing one wins: horizon, manual flag, blocked ranges, reservations.
    pub fn check_dress(
        &self,
        snapshot: &DressSnapshot,
        event_date: NaiveDate,
        today: NaiveDate,
    ) -> AvailabilityDecision {
        let window = match self.check_event_date(event_date, today) {
            Ok(window) => window,
            Err(rejection) => return rejection,
        };

        if !snapshot.dress.available {
            return AvailabilityDecision::unavailable(
                AvailabilityReason::MarkedUnavailable,
                MSG_MARKED_UNAVAILABLE,
            );
        }

        if let Some(blocked) = snapshot
            .blocked
            .iter()
            .find(|b| b.dress_id == snapshot.dress.id && b.range().overlaps(&window))
        {
            tracing::debug!(
                "Dress {} blocked by range {} for window {}",
                snapshot.dress.id,
                blocked.range(),
                window
            );
            return AvailabilityDecision::unavailable(AvailabilityReason::DateBlocked, MSG_BLOCKED);
        }

        if let Some(conflict) = snapshot.reservations.iter().find(|r| {
            r.dress_id == snapshot.dress.id
                && r.status.holds_dress()
                && r.occupied_window().overlaps(&window)
        }) {
            tracing::debug!(
                "Dress {} conflicts with reservation {} ({}) for window {}",
                snapshot.dress.id,
                conflict.id,
                conflict.occupied_window(),
                window
            );
            return AvailabilityDecision::unavailable(AvailabilityReason::DateConflict, MSG_CONFLICT);
        }

        AvailabilityDecision::available()
    }

    /// Whether a reservation takes its dress out of catalog-wide counts
    pub fn counts_against_catalog(&self, status: ReservationStatus) -> bool {
        match status {
            ReservationStatus::Confirmed => true,
            ReservationStatus::Pending => self.policy.aggregate_counts_pending,
            ReservationStatus::Cancelled => false,
        }
    }

    /// Days a reservation covers in catalog-wide counts
    pub fn aggregate_range(&self, reservation: &Reservation) -> DateRange {
        if self.policy.aggregate_uses_occupied_window {
            reservation.occupied_window()
        } else {
            reservation.stored_range()
        }
    }

    /// Stored-range search window that finds every reservation whose
    /// aggregate range can touch `window`
    pub fn aggregate_search_window(&self, window: DateRange) -> DateRange {
        if !self.policy.aggregate_uses_occupied_window {
            return window;
        }
        DateRange::new(
            window
                .start
                .checked_sub_days(Days::new(dates::POST_EVENT_DAYS))
                .unwrap_or(NaiveDate::MIN),
            dates::add_days(window.end, dates::PRE_EVENT_DAYS),
        )
    }

    /// Dresses that some counted reservation keeps busy during `window`
    pub fn reserved_dress_ids(&self, reservations: &[Reservation], window: &DateRange) -> HashSet<Uuid> {
        reservations
            .iter()
            .filter(|r| self.counts_against_catalog(r.status))
            .filter(|r| self.aggregate_range(r).overlaps(window))
            .map(|r| r.dress_id)
            .collect()
    }

    /// How many operator-available dresses are free on `event_date`.
    ///
    /// `dresses` should already be the operator-available ones; any with
    /// `available = false` are skipped regardless.
    pub fn count_available(
        &self,
        dresses: &[Dress],
        reservations: &[Reservation],
        event_date: NaiveDate,
        today: NaiveDate,
    ) -> AvailableCount {
        let window = match self.check_event_date(event_date, today) {
            Ok(window) => window,
            Err(rejection) => {
                return AvailableCount {
                    available_count: 0,
                    message: rejection.message,
                    reason: Some(rejection.reason),
                }
            }
        };

        let candidates: Vec<&Dress> = dresses.iter().filter(|d| d.available).collect();
        if candidates.is_empty() {
            return AvailableCount {
                available_count: 0,
                message: MSG_EMPTY_CATALOG.to_string(),
                reason: None,
            };
        }

        let reserved = self.reserved_dress_ids(reservations, &window);
        let available_count = candidates.iter().filter(|d| !reserved.contains(&d.id)).count();

        AvailableCount {
            available_count,
            message: available_count_message(available_count),
            reason: None,
        }
    }
}
