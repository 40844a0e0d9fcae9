use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};
use courtside_core::{
    BookingResult, TimeWindow,
    ledger::Ledger,
    models::{
        availability::{CourtDay, MatrixSlot},
        pricing::{PriceClass, round_money},
        reservation::{Caller, ClaimedSlot},
        resource::{CourtId, ResourceKind},
    },
};
use tracing::debug;

use crate::pricing::{base_price, evaluate_rules};

/// First and last bookable hour shown in the daily matrix.
pub const FIRST_SLOT_HOUR: u32 = 6;
pub const LAST_SLOT_HOUR: u32 = 22;

/// Hourly booking grid of every active court for `date`.
///
/// A slot is booked when a confirmed reservation starts at or before the slot
/// time and ends after it. Each slot carries the rule-adjusted price of a
/// one-hour court booking starting at that time.
pub async fn daily_court_matrix<L: Ledger + ?Sized>(
    ledger: &mut L,
    caller: &Caller,
    date: NaiveDate,
) -> BookingResult<Vec<CourtDay>> {
    let courts = ledger.active_courts().await?;
    let rules = ledger.active_pricing_rules().await?;
    let hourly_rate = base_price(ledger, PriceClass::CourtHour).await?;

    let mut booked: HashMap<CourtId, Vec<ClaimedSlot>> = HashMap::new();
    for slot in ledger.confirmed_claims_on(ResourceKind::Court, date).await? {
        booked.entry(slot.resource_id).or_default().push(slot);
    }

    let mut matrix = Vec::with_capacity(courts.len());
    for court in courts {
        let claims = booked.get(&court.id).map(Vec::as_slice).unwrap_or_default();
        let mut slots = Vec::new();

        for hour in FIRST_SLOT_HOUR..=LAST_SLOT_HOUR {
            let window = TimeWindow::hours(hour, hour + 1)?;
            let time = window.start();
            let holder = claims.iter().find(|claim| claim.window.covers(time));
            let (price, _) = evaluate_rules(&rules, hourly_rate, date, window, Some(court.court_type));

            slots.push(MatrixSlot {
                time,
                is_booked: holder.is_some(),
                reservation_id: holder.map(|claim| claim.reservation_id),
                is_user_booking: holder.is_some_and(|claim| claim.owner_id == caller.id),
                price: round_money(price),
            });
        }

        debug!(
            "Court {} on {}: {} of {} slots booked",
            court.id,
            date,
            slots.iter().filter(|slot| slot.is_booked).count(),
            slots.len()
        );
        matrix.push(CourtDay {
            court_id: court.id,
            name: court.name,
            slots,
        });
    }

    Ok(matrix)
}
