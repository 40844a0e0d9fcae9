use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::models::resource::{CoachId, CourtId, EquipmentId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleKind {
    PeakHour,
    Weekend,
    IndoorCourt,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::PeakHour => "PEAK_HOUR",
            RuleKind::Weekend => "WEEKEND",
            RuleKind::IndoorCourt => "INDOOR_COURT",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PEAK_HOUR" => Some(RuleKind::PeakHour),
            "WEEKEND" => Some(RuleKind::Weekend),
            "INDOOR_COURT" => Some(RuleKind::IndoorCourt),
            _ => None,
        }
    }

    /// Human readable name shown next to an applied rule.
    pub fn label(&self) -> &'static str {
        match self {
            RuleKind::PeakHour => "Peak Hour Surcharge",
            RuleKind::Weekend => "Weekend Surcharge",
            RuleKind::IndoorCourt => "Indoor Court Premium",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingRule {
    pub id: i64,
    pub kind: RuleKind,
    /// Percentage points when `is_percentage`, otherwise a fixed amount.
    pub value: Decimal,
    pub is_percentage: bool,
    pub description: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceClass {
    CourtHour,
    EquipmentHour,
    CoachHour,
}

impl PriceClass {
    pub const ALL: [PriceClass; 3] = [
        PriceClass::CourtHour,
        PriceClass::EquipmentHour,
        PriceClass::CoachHour,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceClass::CourtHour => "COURT_HOUR",
            PriceClass::EquipmentHour => "EQUIPMENT_HOUR",
            PriceClass::CoachHour => "COACH_HOUR",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "COURT_HOUR" => Some(PriceClass::CourtHour),
            "EQUIPMENT_HOUR" => Some(PriceClass::EquipmentHour),
            "COACH_HOUR" => Some(PriceClass::CoachHour),
            _ => None,
        }
    }

    /// Hourly rate used when no active base price is configured.
    pub fn default_rate(&self) -> Decimal {
        match self {
            PriceClass::CourtHour => Decimal::new(5000, 2),
            PriceClass::EquipmentHour => Decimal::new(1000, 2),
            PriceClass::CoachHour => Decimal::new(7500, 2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasePrice {
    pub class: PriceClass,
    pub price: Decimal,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedRule {
    pub kind: RuleKind,
    pub label: String,
    pub value: Decimal,
    pub is_percentage: bool,
}

impl From<&PricingRule> for AppliedRule {
    fn from(rule: &PricingRule) -> Self {
        Self {
            kind: rule.kind,
            label: rule.kind.label().to_string(),
            value: rule.value,
            is_percentage: rule.is_percentage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourtLine {
    pub court_id: CourtId,
    pub rate_per_hour: Decimal,
    pub base_total: Decimal,
    pub final_price: Decimal,
    pub applied_rules: Vec<AppliedRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentLine {
    pub equipment_id: EquipmentId,
    pub name: String,
    pub quantity: u32,
    pub rate_per_hour: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachLine {
    pub coach_id: CoachId,
    pub name: String,
    pub rate_per_hour: Decimal,
    pub total: Decimal,
}

/// Itemised price of a booking, reproducible from the same inputs and configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub duration_hours: Decimal,
    pub court: CourtLine,
    pub equipment: Vec<EquipmentLine>,
    pub coach: Option<CoachLine>,
    pub total: Decimal,
}

/// Active base prices and rules, as published to customers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    pub base_prices: Vec<BasePrice>,
    pub rules: Vec<PricingRule>,
}

/// Rounds an amount to cents, halves away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
