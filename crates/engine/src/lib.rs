//! # Courtside Engine
//!
//! Availability, pricing and reservation logic for a racket-sports facility.
//! [`BookingEngine`] bundles a ledger store with a clock and exposes the
//! operations a transport layer calls into; the underlying modules can also
//! be used directly against any [`Ledger`](courtside_core::ledger::Ledger).

pub mod availability;
pub mod config;
pub mod matrix;
pub mod pricing;
pub mod reservation;
pub mod telemetry;

use chrono::NaiveDate;
use courtside_core::{
    BookingResult, TimeWindow,
    clock::{Clock, SystemClock},
    ledger::LedgerStore,
    models::{
        availability::{AddonAvailability, CourtDay, EquipmentAvailability},
        pricing::{PriceBreakdown, PriceClass, PricingConfig},
        reservation::{BookingRequest, Caller, Reservation, ReservationId, ReservationReceipt, ReservationStatus},
        resource::{Coach, CoachId, Court, CourtId, EquipmentId},
    },
};
use courtside_db::{PgStore, create_pool};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::config::ServiceConfig;

/// Entry point for booking operations.
///
/// Reads run on a lock-free snapshot and may trail concurrent commits;
/// `create_reservation` and `cancel_reservation` re-validate under lock.
#[derive(Debug, Clone)]
pub struct BookingEngine<S, C = SystemClock> {
    store: S,
    clock: C,
}

impl BookingEngine<PgStore, SystemClock> {
    /// Connects to PostgreSQL using the service configuration.
    pub async fn connect(config: &ServiceConfig) -> eyre::Result<Self> {
        let pool = create_pool(&config.database_url, config.max_connections).await?;
        info!(
            "Booking engine ready (timezone={}, lock_timeout={:?})",
            config.timezone, config.lock_timeout
        );
        Ok(Self::new(
            PgStore::new(pool, config.lock_timeout),
            SystemClock::new(config.timezone),
        ))
    }
}

impl<S, C> BookingEngine<S, C>
where
    S: LedgerStore,
    C: Clock,
{
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    // Reservations

    pub async fn create_reservation(
        &self,
        caller: &Caller,
        request: &BookingRequest,
    ) -> BookingResult<ReservationReceipt> {
        reservation::create_reservation(&self.store, &self.clock, caller, request).await
    }

    pub async fn cancel_reservation(
        &self,
        caller: &Caller,
        reservation_id: ReservationId,
    ) -> BookingResult<Reservation> {
        reservation::cancel_reservation(&self.store, &self.clock, caller, reservation_id).await
    }

    pub async fn list_reservations(
        &self,
        caller: &Caller,
        owner_id: Option<Uuid>,
        status: Option<ReservationStatus>,
    ) -> BookingResult<Vec<Reservation>> {
        reservation::list_reservations(&self.store, caller, owner_id, status).await
    }

    // Availability

    pub async fn court_available(
        &self,
        court_id: CourtId,
        date: NaiveDate,
        window: TimeWindow,
    ) -> BookingResult<bool> {
        let mut ledger = self.store.snapshot().await?;
        availability::court_available(ledger.as_mut(), court_id, date, window, None).await
    }

    pub async fn coach_available(
        &self,
        coach_id: CoachId,
        date: NaiveDate,
        window: TimeWindow,
    ) -> BookingResult<bool> {
        let mut ledger = self.store.snapshot().await?;
        availability::coach_available(ledger.as_mut(), coach_id, date, window, None).await
    }

    pub async fn equipment_available(
        &self,
        equipment_id: EquipmentId,
        quantity: u32,
        date: NaiveDate,
        window: TimeWindow,
    ) -> BookingResult<bool> {
        let mut ledger = self.store.snapshot().await?;
        availability::equipment_available(ledger.as_mut(), equipment_id, quantity, date, window, None)
            .await
    }

    pub async fn available_courts(
        &self,
        date: NaiveDate,
        window: TimeWindow,
    ) -> BookingResult<Vec<Court>> {
        let mut ledger = self.store.snapshot().await?;
        availability::available_courts(ledger.as_mut(), date, window).await
    }

    pub async fn available_coaches(
        &self,
        date: NaiveDate,
        window: TimeWindow,
    ) -> BookingResult<Vec<Coach>> {
        let mut ledger = self.store.snapshot().await?;
        availability::available_coaches(ledger.as_mut(), date, window).await
    }

    pub async fn equipment_availability(
        &self,
        date: NaiveDate,
        window: TimeWindow,
    ) -> BookingResult<Vec<EquipmentAvailability>> {
        let mut ledger = self.store.snapshot().await?;
        availability::equipment_availability(ledger.as_mut(), date, window).await
    }

    pub async fn addon_availability(
        &self,
        date: NaiveDate,
        window: TimeWindow,
    ) -> BookingResult<AddonAvailability> {
        let mut ledger = self.store.snapshot().await?;
        availability::addon_availability(ledger.as_mut(), date, window).await
    }

    pub async fn daily_court_matrix(
        &self,
        caller: &Caller,
        date: NaiveDate,
    ) -> BookingResult<Vec<CourtDay>> {
        let mut ledger = self.store.snapshot().await?;
        matrix::daily_court_matrix(ledger.as_mut(), caller, date).await
    }

    // Pricing

    pub async fn base_price(&self, class: PriceClass) -> BookingResult<Decimal> {
        let mut ledger = self.store.snapshot().await?;
        pricing::base_price(ledger.as_mut(), class).await
    }

    /// Price preview. Identical to the price charged by `create_reservation`
    /// for the same request and configuration.
    pub async fn calculate_booking_price(
        &self,
        request: &BookingRequest,
    ) -> BookingResult<PriceBreakdown> {
        let mut ledger = self.store.snapshot().await?;
        pricing::calculate_booking_price(ledger.as_mut(), request).await
    }

    pub async fn pricing_config(&self) -> BookingResult<PricingConfig> {
        let mut ledger = self.store.snapshot().await?;
        pricing::pricing_config(ledger.as_mut()).await
    }
}
