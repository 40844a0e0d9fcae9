//! # Reservation Orchestrator
//!
//! Creation and cancellation each run in one ledger transaction. Resources
//! are locked in a fixed order (court, equipment by ascending id, coach) and
//! re-checked under the lock, so two overlapping requests serialize and the
//! second one observes the first one's claims. Any error drops the
//! transaction, which rolls back everything it staged.

use courtside_core::{
    BookingError, BookingResult,
    clock::Clock,
    ledger::{LedgerStore, LedgerTx},
    models::{
        reservation::{
            BookingRequest, Caller, NewClaim, NewReservation, Reservation, ReservationId,
            ReservationReceipt, ReservationStatus,
        },
        resource::Resource,
    },
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{availability::resource_available, pricing::calculate_booking_price};

/// Books a court, with optional equipment and coach, for `caller`.
pub async fn create_reservation<S, C>(
    store: &S,
    clock: &C,
    caller: &Caller,
    request: &BookingRequest,
) -> BookingResult<ReservationReceipt>
where
    S: LedgerStore + ?Sized,
    C: Clock + ?Sized,
{
    validate(clock, request)?;

    let mut tx = store.begin().await?;
    let claims = claim_resources(&mut *tx, request).await?;

    let price_breakdown = calculate_booking_price(&mut *tx, request).await?;
    let reservation = tx
        .insert_reservation(NewReservation {
            owner_id: caller.id,
            date: request.date,
            window: request.window,
            total_price: price_breakdown.total,
            claims,
            created_at: clock.utc_now(),
        })
        .await?;
    tx.commit().await?;

    info!(
        "Reservation {} confirmed for {} on {} {}-{} (total {})",
        reservation.id,
        caller.id,
        reservation.date,
        reservation.window.start(),
        reservation.window.end(),
        reservation.total_price
    );

    Ok(ReservationReceipt {
        reservation,
        price_breakdown,
        message: "Reservation confirmed".to_string(),
    })
}

fn validate<C: Clock + ?Sized>(clock: &C, request: &BookingRequest) -> BookingResult<()> {
    if request.date < clock.today() {
        warn!("Rejected booking for past date {}", request.date);
        return Err(BookingError::Validation(
            "Cannot book for past dates".to_string(),
        ));
    }

    if let Some(item) = request.equipment.iter().find(|item| item.quantity == 0) {
        return Err(BookingError::Validation(format!(
            "Quantity for equipment {} must be at least 1",
            item.equipment_id
        )));
    }

    request.merged_equipment().map(|_| ())
}

/// Locks and re-checks every requested resource, returning the claims to insert.
async fn claim_resources<T: LedgerTx + ?Sized>(
    tx: &mut T,
    request: &BookingRequest,
) -> BookingResult<Vec<NewClaim>> {
    let mut claims = Vec::new();

    let court = tx
        .lock_court(request.court_id)
        .await?
        .filter(|court| court.is_active)
        .ok_or_else(|| BookingError::NotFound(format!("Court {}", request.court_id)))?;
    let court = Resource::Court(court);
    ensure_available(tx, &court, 1, request).await?;
    claims.push(NewClaim::on(&court, 1));

    for item in request.merged_equipment()? {
        let unit = tx
            .lock_equipment(item.equipment_id)
            .await?
            .filter(|unit| unit.is_active)
            .ok_or_else(|| BookingError::NotFound(format!("Equipment {}", item.equipment_id)))?;
        let unit = Resource::Equipment(unit);
        ensure_available(tx, &unit, item.quantity, request).await?;
        claims.push(NewClaim::on(&unit, item.quantity));
    }

    if let Some(coach_id) = request.coach_id {
        let coach = tx
            .lock_coach(coach_id)
            .await?
            .filter(|coach| coach.is_active)
            .ok_or_else(|| BookingError::NotFound(format!("Coach {coach_id}")))?;
        let coach = Resource::Coach(coach);
        ensure_available(tx, &coach, 1, request).await?;
        claims.push(NewClaim::on(&coach, 1));
    }

    Ok(claims)
}

async fn ensure_available<T: LedgerTx + ?Sized>(
    tx: &mut T,
    resource: &Resource,
    quantity: u32,
    request: &BookingRequest,
) -> BookingResult<()> {
    if resource_available(tx, resource, quantity, request.date, request.window, None).await? {
        return Ok(());
    }

    warn!(
        "{} {} unavailable on {} {}-{}",
        resource.kind().as_str(),
        resource.id(),
        request.date,
        request.window.start(),
        request.window.end()
    );

    let message = match resource {
        Resource::Court(court) => format!("{} is not available for the selected time", court.name),
        Resource::Coach(coach) => format!("{} is not available for the selected time", coach.name),
        Resource::Equipment(unit) => format!("Insufficient {} available", unit.name),
    };
    Err(BookingError::Conflict(message))
}

/// Cancels a confirmed, not yet started reservation owned by `caller`
/// (or any reservation when `caller` is privileged).
pub async fn cancel_reservation<S, C>(
    store: &S,
    clock: &C,
    caller: &Caller,
    reservation_id: ReservationId,
) -> BookingResult<Reservation>
where
    S: LedgerStore + ?Sized,
    C: Clock + ?Sized,
{
    let mut tx = store.begin().await?;
    let reservation = tx
        .lock_reservation(reservation_id)
        .await?
        .ok_or_else(|| BookingError::NotFound(format!("Reservation {reservation_id}")))?;

    if !caller.may_manage(reservation.owner_id) {
        warn!(
            "{} attempted to cancel reservation {} owned by {}",
            caller.id, reservation.id, reservation.owner_id
        );
        return Err(BookingError::Forbidden(
            "You can only cancel your own reservations".to_string(),
        ));
    }

    if reservation.status == ReservationStatus::Cancelled {
        return Err(BookingError::Conflict(
            "Reservation is already cancelled".to_string(),
        ));
    }

    if reservation.starts_at() < clock.local_now() {
        return Err(BookingError::Conflict(
            "Cannot cancel past reservations".to_string(),
        ));
    }

    let cancelled = tx
        .update_status(reservation.id, ReservationStatus::Cancelled, clock.utc_now())
        .await?;
    tx.commit().await?;

    info!("Reservation {} cancelled by {}", cancelled.id, caller.id);
    Ok(cancelled)
}

/// Members only ever see their own reservations; privileged callers may
/// filter by any owner or see everyone's.
pub async fn list_reservations<S>(
    store: &S,
    caller: &Caller,
    owner_id: Option<Uuid>,
    status: Option<ReservationStatus>,
) -> BookingResult<Vec<Reservation>>
where
    S: LedgerStore + ?Sized,
{
    let owner_filter = if caller.privileged {
        owner_id
    } else {
        Some(caller.id)
    };

    let mut ledger = store.snapshot().await?;
    ledger.reservations(owner_filter, status).await
}
