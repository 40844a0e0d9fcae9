//! # Pricing Engine
//!
//! Prices are computed from the base rate of each resource class and the
//! active pricing rules, reloaded on every call. Only the court line is
//! adjusted by rules. Percentages of all applied rules are summed and applied
//! once, then fixed amounts are added, so 10% and 15% on 100.00 give 125.00.

use chrono::{Datelike, NaiveDate, Weekday};
use courtside_core::{
    BookingResult, TimeWindow,
    ledger::Ledger,
    models::{
        pricing::{
            AppliedRule, CoachLine, CourtLine, EquipmentLine, PriceBreakdown, PriceClass,
            PricingConfig, PricingRule, RuleKind, round_money,
        },
        reservation::BookingRequest,
        resource::{CourtId, CourtType},
    },
};
use rust_decimal::Decimal;
use tracing::debug;

/// Hourly rate for a class, falling back to the built-in default when no
/// active row is configured.
pub async fn base_price<L: Ledger + ?Sized>(ledger: &mut L, class: PriceClass) -> BookingResult<Decimal> {
    let rate = match ledger.active_base_price(class).await? {
        Some(configured) => configured.price,
        None => class.default_rate(),
    };
    Ok(rate)
}

pub fn duration_hours(window: TimeWindow) -> Decimal {
    window.duration_hours()
}

pub fn is_peak_hour(window: TimeWindow) -> bool {
    window.overlaps(&TimeWindow::peak_hours())
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// False for outdoor and unknown courts alike.
pub async fn is_indoor_court<L: Ledger + ?Sized>(ledger: &mut L, court_id: CourtId) -> BookingResult<bool> {
    let court = ledger.court(court_id).await?;
    Ok(court.is_some_and(|court| court.court_type == CourtType::Indoor))
}

/// Combines applied rules: `base * (1 + Σ% / 100) + Σfixed`.
pub fn stack_rules<'a, I>(base: Decimal, applied: I) -> Decimal
where
    I: IntoIterator<Item = &'a PricingRule>,
{
    let (percent, fixed) = applied
        .into_iter()
        .fold((Decimal::ZERO, Decimal::ZERO), |(percent, fixed), rule| {
            if rule.is_percentage {
                (percent + rule.value, fixed)
            } else {
                (percent, fixed + rule.value)
            }
        });

    base * (Decimal::ONE + percent / Decimal::ONE_HUNDRED) + fixed
}

/// Selects the rules whose conditions hold and stacks them onto `base`.
///
/// `court_type` is `None` when no court takes part in the calculation, in
/// which case court-type rules never apply.
pub fn evaluate_rules(
    rules: &[PricingRule],
    base: Decimal,
    date: NaiveDate,
    window: TimeWindow,
    court_type: Option<CourtType>,
) -> (Decimal, Vec<AppliedRule>) {
    let applied: Vec<&PricingRule> = rules
        .iter()
        .filter(|rule| rule.is_active)
        .filter(|rule| match rule.kind {
            RuleKind::PeakHour => is_peak_hour(window),
            RuleKind::Weekend => is_weekend(date),
            RuleKind::IndoorCourt => court_type == Some(CourtType::Indoor),
        })
        .collect();

    let amount = stack_rules(base, applied.iter().copied());
    (amount, applied.into_iter().map(AppliedRule::from).collect())
}

/// Loads the active rules and applies them to `base`.
pub async fn apply_rules<L: Ledger + ?Sized>(
    ledger: &mut L,
    base: Decimal,
    date: NaiveDate,
    window: TimeWindow,
    court_id: Option<CourtId>,
) -> BookingResult<(Decimal, Vec<AppliedRule>)> {
    let rules = ledger.active_pricing_rules().await?;

    let court_type = match court_id {
        Some(court_id) => {
            if is_indoor_court(ledger, court_id).await? {
                Some(CourtType::Indoor)
            } else {
                Some(CourtType::Outdoor)
            }
        }
        None => None,
    };

    Ok(evaluate_rules(&rules, base, date, window, court_type))
}

/// Itemised price for a booking request.
///
/// Equipment or coaches that do not exist, or are inactive, are left out of
/// the breakdown. Booking rejects them separately.
pub async fn calculate_booking_price<L: Ledger + ?Sized>(
    ledger: &mut L,
    request: &BookingRequest,
) -> BookingResult<PriceBreakdown> {
    let hours = duration_hours(request.window);

    let court_rate = base_price(ledger, PriceClass::CourtHour).await?;
    let court_base = court_rate * hours;
    let (court_final, applied_rules) = apply_rules(
        ledger,
        court_base,
        request.date,
        request.window,
        Some(request.court_id),
    )
    .await?;
    let court = CourtLine {
        court_id: request.court_id,
        rate_per_hour: court_rate,
        base_total: round_money(court_base),
        final_price: round_money(court_final),
        applied_rules,
    };

    let mut equipment = Vec::new();
    let equipment_rate = base_price(ledger, PriceClass::EquipmentHour).await?;
    for item in request.merged_equipment()? {
        let Some(unit) = ledger.equipment(item.equipment_id).await? else {
            continue;
        };
        if !unit.is_active {
            continue;
        }
        equipment.push(EquipmentLine {
            equipment_id: unit.id,
            name: unit.name,
            quantity: item.quantity,
            rate_per_hour: equipment_rate,
            total: round_money(equipment_rate * hours * Decimal::from(item.quantity)),
        });
    }

    let mut coach = None;
    if let Some(coach_id) = request.coach_id {
        if let Some(found) = ledger.coach(coach_id).await?.filter(|c| c.is_active) {
            let rate = base_price(ledger, PriceClass::CoachHour).await?;
            coach = Some(CoachLine {
                coach_id: found.id,
                name: found.name,
                rate_per_hour: rate,
                total: round_money(rate * hours),
            });
        }
    }

    let total = court.final_price
        + equipment.iter().map(|line| line.total).sum::<Decimal>()
        + coach.as_ref().map_or(Decimal::ZERO, |line| line.total);

    debug!(
        "Priced court {} on {} {}-{}: total {} ({} rules applied)",
        request.court_id,
        request.date,
        request.window.start(),
        request.window.end(),
        total,
        court.applied_rules.len()
    );

    Ok(PriceBreakdown {
        duration_hours: hours,
        court,
        equipment,
        coach,
        total,
    })
}

/// Active base prices and rules, for publishing to customers.
pub async fn pricing_config<L: Ledger + ?Sized>(ledger: &mut L) -> BookingResult<PricingConfig> {
    let base_prices = ledger.active_base_prices().await?;
    let rules = ledger.active_pricing_rules().await?;
    Ok(PricingConfig { base_prices, rules })
}
