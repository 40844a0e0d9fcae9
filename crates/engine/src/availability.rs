//! # Availability Engine
//!
//! Every answer is recomputed from the reservation ledger: a resource is free
//! when the CONFIRMED claims overlapping the requested window leave enough
//! capacity. Missing or inactive resources are never available.
//!
//! The functions are generic over [`Ledger`] so that the same checks serve
//! lock-free browsing on a snapshot and the re-check under lock inside a
//! booking transaction.

use chrono::NaiveDate;
use courtside_core::{
    BookingResult, TimeWindow,
    ledger::Ledger,
    models::{
        availability::{AddonAvailability, EquipmentAvailability},
        reservation::ReservationId,
        resource::{Coach, CoachId, Court, CourtId, EquipmentId, EquipmentUnit, Resource, ResourceKind},
    },
};
use tracing::debug;

pub async fn court_available<L: Ledger + ?Sized>(
    ledger: &mut L,
    court_id: CourtId,
    date: NaiveDate,
    window: TimeWindow,
    exclude: Option<ReservationId>,
) -> BookingResult<bool> {
    match ledger.court(court_id).await? {
        Some(court) if court.is_active => {
            court_is_free(ledger, court_id, date, window, exclude).await
        }
        _ => Ok(false),
    }
}

pub async fn coach_available<L: Ledger + ?Sized>(
    ledger: &mut L,
    coach_id: CoachId,
    date: NaiveDate,
    window: TimeWindow,
    exclude: Option<ReservationId>,
) -> BookingResult<bool> {
    match ledger.coach(coach_id).await? {
        Some(coach) if coach.is_active => {
            coach_is_free(ledger, coach_id, date, window, exclude).await
        }
        _ => Ok(false),
    }
}

pub async fn equipment_available<L: Ledger + ?Sized>(
    ledger: &mut L,
    equipment_id: EquipmentId,
    quantity: u32,
    date: NaiveDate,
    window: TimeWindow,
    exclude: Option<ReservationId>,
) -> BookingResult<bool> {
    match ledger.equipment(equipment_id).await? {
        Some(unit) if unit.is_active => {
            if quantity > unit.total_quantity {
                return Ok(false);
            }
            let free = free_quantity(ledger, &unit, date, window, exclude).await?;
            Ok(free >= quantity)
        }
        _ => Ok(false),
    }
}

/// Checks capacity for an already resolved resource, switching on its kind.
/// `quantity` only matters for equipment.
pub async fn resource_available<L: Ledger + ?Sized>(
    ledger: &mut L,
    resource: &Resource,
    quantity: u32,
    date: NaiveDate,
    window: TimeWindow,
    exclude: Option<ReservationId>,
) -> BookingResult<bool> {
    if !resource.is_active() {
        return Ok(false);
    }

    match resource {
        Resource::Court(court) => court_is_free(ledger, court.id, date, window, exclude).await,
        Resource::Coach(coach) => coach_is_free(ledger, coach.id, date, window, exclude).await,
        Resource::Equipment(unit) => {
            if quantity > unit.total_quantity {
                return Ok(false);
            }
            let free = free_quantity(ledger, unit, date, window, exclude).await?;
            Ok(free >= quantity)
        }
    }
}

/// Active courts with no overlapping confirmed booking, ordered by id.
pub async fn available_courts<L: Ledger + ?Sized>(
    ledger: &mut L,
    date: NaiveDate,
    window: TimeWindow,
) -> BookingResult<Vec<Court>> {
    let mut available = Vec::new();
    for court in ledger.active_courts().await? {
        if court_is_free(ledger, court.id, date, window, None).await? {
            available.push(court);
        }
    }
    Ok(available)
}

pub async fn available_coaches<L: Ledger + ?Sized>(
    ledger: &mut L,
    date: NaiveDate,
    window: TimeWindow,
) -> BookingResult<Vec<Coach>> {
    let mut available = Vec::new();
    for coach in ledger.active_coaches().await? {
        if coach_is_free(ledger, coach.id, date, window, None).await? {
            available.push(coach);
        }
    }
    Ok(available)
}

/// Free quantity of every active equipment unit for the window, including
/// fully booked units.
pub async fn equipment_availability<L: Ledger + ?Sized>(
    ledger: &mut L,
    date: NaiveDate,
    window: TimeWindow,
) -> BookingResult<Vec<EquipmentAvailability>> {
    let mut report = Vec::new();
    for unit in ledger.active_equipment().await? {
        let available_quantity = free_quantity(ledger, &unit, date, window, None).await?;
        report.push(EquipmentAvailability {
            total_quantity: unit.total_quantity,
            available_quantity,
            equipment: unit,
        });
    }
    Ok(report)
}

/// Coaches and equipment that could be added to a court booking for the window.
pub async fn addon_availability<L: Ledger + ?Sized>(
    ledger: &mut L,
    date: NaiveDate,
    window: TimeWindow,
) -> BookingResult<AddonAvailability> {
    let coaches = available_coaches(ledger, date, window).await?;
    let equipment = equipment_availability(ledger, date, window).await?;
    Ok(AddonAvailability { coaches, equipment })
}

pub(crate) async fn court_is_free<L: Ledger + ?Sized>(
    ledger: &mut L,
    court_id: CourtId,
    date: NaiveDate,
    window: TimeWindow,
    exclude: Option<ReservationId>,
) -> BookingResult<bool> {
    let clashes = ledger
        .overlapping_claims(ResourceKind::Court, court_id, date, window, exclude)
        .await?;

    debug!(
        "Court {} on {} {}-{}: {} overlapping bookings",
        court_id,
        date,
        window.start(),
        window.end(),
        clashes.len()
    );
    Ok(clashes.is_empty())
}

/// The coach must work the whole window (an explicit row for the date, or the
/// default day when there is none) and must not already be booked.
pub(crate) async fn coach_is_free<L: Ledger + ?Sized>(
    ledger: &mut L,
    coach_id: CoachId,
    date: NaiveDate,
    window: TimeWindow,
    exclude: Option<ReservationId>,
) -> BookingResult<bool> {
    let rows = ledger.coach_windows(coach_id, date).await?;
    let on_duty = if rows.is_empty() {
        TimeWindow::default_coach_hours().contains(&window)
    } else {
        rows.iter().any(|row| row.window.contains(&window))
    };

    if !on_duty {
        debug!(
            "Coach {} is not on duty on {} for {}-{}",
            coach_id,
            date,
            window.start(),
            window.end()
        );
        return Ok(false);
    }

    let clashes = ledger
        .overlapping_claims(ResourceKind::Coach, coach_id, date, window, exclude)
        .await?;
    Ok(clashes.is_empty())
}

/// `total_quantity` minus the units held by overlapping confirmed claims.
pub(crate) async fn free_quantity<L: Ledger + ?Sized>(
    ledger: &mut L,
    unit: &EquipmentUnit,
    date: NaiveDate,
    window: TimeWindow,
    exclude: Option<ReservationId>,
) -> BookingResult<u32> {
    let booked: u32 = ledger
        .overlapping_claims(ResourceKind::Equipment, unit.id, date, window, exclude)
        .await?
        .iter()
        .map(|slot| slot.quantity)
        .sum();

    let free = unit.total_quantity.saturating_sub(booked);
    debug!(
        "Equipment {} on {} {}-{}: {} of {} free",
        unit.id,
        date,
        window.start(),
        window.end(),
        free,
        unit.total_quantity
    );
    Ok(free)
}
