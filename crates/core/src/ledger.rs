//! Storage contracts consumed by the booking engine.
//!
//! A [`LedgerStore`] hands out two kinds of handles: lock-free read
//! snapshots for browsing and previews, and transactions that take exclusive
//! per-resource locks for the duration of a booking or cancellation. Nothing
//! a transaction writes is visible to anyone else until [`LedgerTx::commit`];
//! dropping a transaction rolls it back.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    errors::BookingResult,
    models::{
        pricing::{BasePrice, PriceClass, PricingRule},
        reservation::{ClaimedSlot, NewReservation, Reservation, ReservationId, ReservationStatus},
        resource::{Coach, CoachId, CoachWindow, Court, CourtId, EquipmentId, EquipmentUnit, ResourceKind},
    },
    time_window::TimeWindow,
};

/// Read access to the catalog, the reservation ledger and pricing configuration.
#[async_trait]
pub trait Ledger: Send {
    async fn court(&mut self, id: CourtId) -> BookingResult<Option<Court>>;

    async fn coach(&mut self, id: CoachId) -> BookingResult<Option<Coach>>;

    async fn equipment(&mut self, id: EquipmentId) -> BookingResult<Option<EquipmentUnit>>;

    /// Active courts ordered by id.
    async fn active_courts(&mut self) -> BookingResult<Vec<Court>>;

    /// Active coaches ordered by id.
    async fn active_coaches(&mut self) -> BookingResult<Vec<Coach>>;

    /// Active equipment units ordered by id.
    async fn active_equipment(&mut self) -> BookingResult<Vec<EquipmentUnit>>;

    async fn coach_windows(
        &mut self,
        coach_id: CoachId,
        date: NaiveDate,
    ) -> BookingResult<Vec<CoachWindow>>;

    /// Claims on one resource held by CONFIRMED reservations on `date` whose
    /// slot overlaps `window`, optionally ignoring one reservation.
    async fn overlapping_claims(
        &mut self,
        kind: ResourceKind,
        resource_id: i64,
        date: NaiveDate,
        window: TimeWindow,
        exclude: Option<ReservationId>,
    ) -> BookingResult<Vec<ClaimedSlot>>;

    /// Every claim of `kind` held by CONFIRMED reservations on `date`.
    async fn confirmed_claims_on(
        &mut self,
        kind: ResourceKind,
        date: NaiveDate,
    ) -> BookingResult<Vec<ClaimedSlot>>;

    async fn reservation(&mut self, id: ReservationId) -> BookingResult<Option<Reservation>>;

    /// Reservations newest first, filtered by owner and status when given.
    async fn reservations(
        &mut self,
        owner_id: Option<Uuid>,
        status: Option<ReservationStatus>,
    ) -> BookingResult<Vec<Reservation>>;

    /// Active rules ordered by kind.
    async fn active_pricing_rules(&mut self) -> BookingResult<Vec<PricingRule>>;

    async fn active_base_price(&mut self, class: PriceClass) -> BookingResult<Option<BasePrice>>;

    async fn active_base_prices(&mut self) -> BookingResult<Vec<BasePrice>>;
}

/// A transaction over the ledger. Every `lock_*` call holds the row until
/// commit or rollback and must be issued in canonical order: court, then
/// equipment by ascending id, then coach.
#[async_trait]
pub trait LedgerTx: Ledger {
    async fn lock_court(&mut self, id: CourtId) -> BookingResult<Option<Court>>;

    async fn lock_equipment(&mut self, id: EquipmentId) -> BookingResult<Option<EquipmentUnit>>;

    async fn lock_coach(&mut self, id: CoachId) -> BookingResult<Option<Coach>>;

    async fn lock_reservation(&mut self, id: ReservationId) -> BookingResult<Option<Reservation>>;

    async fn insert_reservation(&mut self, reservation: NewReservation) -> BookingResult<Reservation>;

    async fn update_status(
        &mut self,
        id: ReservationId,
        status: ReservationStatus,
        updated_at: DateTime<Utc>,
    ) -> BookingResult<Reservation>;

    async fn commit(self: Box<Self>) -> BookingResult<()>;
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// A read-only view that takes no locks and may trail concurrent commits.
    async fn snapshot(&self) -> BookingResult<Box<dyn Ledger + '_>>;

    async fn begin(&self) -> BookingResult<Box<dyn LedgerTx + '_>>;
}
