use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use courtside_core::{
    BookingError, BookingResult, TimeWindow,
    models::{
        pricing::{BasePrice, PriceClass, PricingRule, RuleKind},
        reservation::{ClaimedSlot, Reservation, ReservationStatus, ResourceClaim},
        resource::{Coach, CoachWindow, Court, CourtType, EquipmentUnit, ResourceKind},
    },
};
use eyre::eyre;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbCourt {
    pub id: i64,
    pub name: String,
    pub court_type: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbCoach {
    pub id: i64,
    pub name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbCoachAvailability {
    pub id: i64,
    pub coach_id: i64,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbEquipment {
    pub id: i64,
    pub name: String,
    pub total_quantity: i32,
    pub available_quantity: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbReservation {
    pub id: i64,
    pub owner_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub total_price: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbReservationClaim {
    pub id: i64,
    pub reservation_id: i64,
    pub resource_type: String,
    pub resource_id: i64,
    pub quantity: i32,
}

/// A claim joined with its reservation's slot.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbClaimedSlot {
    pub reservation_id: i64,
    pub owner_id: Uuid,
    pub resource_id: i64,
    pub quantity: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbPricingRule {
    pub id: i64,
    pub rule_type: String,
    pub value: Decimal,
    pub is_percentage: bool,
    pub description: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbBasePrice {
    pub resource_type: String,
    pub price: Decimal,
    pub is_active: bool,
}

fn corrupt(what: &str, value: impl std::fmt::Display) -> BookingError {
    BookingError::Database(eyre!("Unexpected {} value in database: {}", what, value))
}

fn quantity(value: i32) -> BookingResult<u32> {
    u32::try_from(value).map_err(|_| corrupt("quantity", value))
}

fn window(start: NaiveTime, end: NaiveTime) -> BookingResult<TimeWindow> {
    TimeWindow::new(start, end).map_err(|_| corrupt("time range", format!("{start}-{end}")))
}

impl TryFrom<DbCourt> for Court {
    type Error = BookingError;

    fn try_from(row: DbCourt) -> BookingResult<Self> {
        let court_type =
            CourtType::parse(&row.court_type).ok_or_else(|| corrupt("court_type", &row.court_type))?;
        Ok(Court {
            id: row.id,
            name: row.name,
            court_type,
            is_active: row.is_active,
        })
    }
}

impl From<DbCoach> for Coach {
    fn from(row: DbCoach) -> Self {
        Coach {
            id: row.id,
            name: row.name,
            is_active: row.is_active,
        }
    }
}

impl TryFrom<DbCoachAvailability> for CoachWindow {
    type Error = BookingError;

    fn try_from(row: DbCoachAvailability) -> BookingResult<Self> {
        Ok(CoachWindow {
            id: row.id,
            coach_id: row.coach_id,
            date: row.date,
            window: window(row.start_time, row.end_time)?,
        })
    }
}

impl TryFrom<DbEquipment> for EquipmentUnit {
    type Error = BookingError;

    fn try_from(row: DbEquipment) -> BookingResult<Self> {
        let mut unit = EquipmentUnit::new(row.id, row.name, 0);
        unit.set_stock(quantity(row.total_quantity)?, quantity(row.available_quantity)?);
        unit.is_active = row.is_active;
        Ok(unit)
    }
}

impl TryFrom<DbReservationClaim> for ResourceClaim {
    type Error = BookingError;

    fn try_from(row: DbReservationClaim) -> BookingResult<Self> {
        let kind = ResourceKind::parse(&row.resource_type)
            .ok_or_else(|| corrupt("resource_type", &row.resource_type))?;
        Ok(ResourceClaim {
            id: row.id,
            reservation_id: row.reservation_id,
            kind,
            resource_id: row.resource_id,
            quantity: quantity(row.quantity)?,
        })
    }
}

impl TryFrom<DbClaimedSlot> for ClaimedSlot {
    type Error = BookingError;

    fn try_from(row: DbClaimedSlot) -> BookingResult<Self> {
        Ok(ClaimedSlot {
            reservation_id: row.reservation_id,
            owner_id: row.owner_id,
            resource_id: row.resource_id,
            quantity: quantity(row.quantity)?,
            window: window(row.start_time, row.end_time)?,
        })
    }
}

impl DbReservation {
    pub fn into_reservation(self, claims: Vec<DbReservationClaim>) -> BookingResult<Reservation> {
        let status =
            ReservationStatus::parse(&self.status).ok_or_else(|| corrupt("status", &self.status))?;
        let claims = claims
            .into_iter()
            .map(ResourceClaim::try_from)
            .collect::<BookingResult<Vec<_>>>()?;

        Ok(Reservation {
            id: self.id,
            owner_id: self.owner_id,
            date: self.date,
            window: window(self.start_time, self.end_time)?,
            total_price: self.total_price,
            status,
            claims,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl TryFrom<DbPricingRule> for PricingRule {
    type Error = BookingError;

    fn try_from(row: DbPricingRule) -> BookingResult<Self> {
        let kind = RuleKind::parse(&row.rule_type).ok_or_else(|| corrupt("rule_type", &row.rule_type))?;
        Ok(PricingRule {
            id: row.id,
            kind,
            value: row.value,
            is_percentage: row.is_percentage,
            description: row.description,
            is_active: row.is_active,
        })
    }
}

impl TryFrom<DbBasePrice> for BasePrice {
    type Error = BookingError;

    fn try_from(row: DbBasePrice) -> BookingResult<Self> {
        let class = PriceClass::parse(&row.resource_type)
            .ok_or_else(|| corrupt("resource_type", &row.resource_type))?;
        Ok(BasePrice {
            class,
            price: row.price,
            is_active: row.is_active,
        })
    }
}
