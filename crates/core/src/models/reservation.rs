use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    errors::{BookingError, BookingResult},
    models::{
        pricing::PriceBreakdown,
        resource::{CoachId, CourtId, EquipmentId, Resource, ResourceKind},
    },
    time_window::TimeWindow,
};

pub type ReservationId = i64;

/// Opaque identity of whoever is calling into the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub id: Uuid,
    pub privileged: bool,
}

impl Caller {
    pub fn member(id: Uuid) -> Self {
        Self {
            id,
            privileged: false,
        }
    }

    pub fn staff(id: Uuid) -> Self {
        Self {
            id,
            privileged: true,
        }
    }

    pub fn may_manage(&self, owner_id: Uuid) -> bool {
        self.privileged || self.id == owner_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Confirmed,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Confirmed => "CONFIRMED",
            ReservationStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "CONFIRMED" => Some(ReservationStatus::Confirmed),
            "CANCELLED" => Some(ReservationStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceClaim {
    pub id: i64,
    pub reservation_id: ReservationId,
    pub kind: ResourceKind,
    pub resource_id: i64,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub owner_id: Uuid,
    pub date: NaiveDate,
    pub window: TimeWindow,
    pub total_price: Decimal,
    pub status: ReservationStatus,
    pub claims: Vec<ResourceClaim>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.window.start())
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == ReservationStatus::Confirmed
    }

    pub fn claims_of(&self, kind: ResourceKind) -> impl Iterator<Item = &ResourceClaim> {
        self.claims.iter().filter(move |claim| claim.kind == kind)
    }
}

/// A claim that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClaim {
    pub kind: ResourceKind,
    pub resource_id: i64,
    pub quantity: u32,
}

impl NewClaim {
    pub fn on(resource: &Resource, quantity: u32) -> Self {
        Self {
            kind: resource.kind(),
            resource_id: resource.id(),
            quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReservation {
    pub owner_id: Uuid,
    pub date: NaiveDate,
    pub window: TimeWindow,
    pub total_price: Decimal,
    pub claims: Vec<NewClaim>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentRequest {
    pub equipment_id: EquipmentId,
    pub quantity: u32,
}

/// Everything needed to price or book one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub date: NaiveDate,
    pub window: TimeWindow,
    pub court_id: CourtId,
    #[serde(default)]
    pub equipment: Vec<EquipmentRequest>,
    pub coach_id: Option<CoachId>,
}

impl BookingRequest {
    pub fn court(date: NaiveDate, window: TimeWindow, court_id: CourtId) -> Self {
        Self {
            date,
            window,
            court_id,
            equipment: Vec::new(),
            coach_id: None,
        }
    }

    pub fn with_equipment(mut self, equipment_id: EquipmentId, quantity: u32) -> Self {
        self.equipment.push(EquipmentRequest {
            equipment_id,
            quantity,
        });
        self
    }

    pub fn with_coach(mut self, coach_id: CoachId) -> Self {
        self.coach_id = Some(coach_id);
        self
    }

    /// Equipment lines merged per unit and ordered by ascending id.
    ///
    /// Fails with `Validation` when the summed quantity of a unit does not fit in a `u32`.
    pub fn merged_equipment(&self) -> BookingResult<Vec<EquipmentRequest>> {
        let mut merged: BTreeMap<EquipmentId, u32> = BTreeMap::new();
        for item in &self.equipment {
            let total = merged.entry(item.equipment_id).or_default();
            *total = total.checked_add(item.quantity).ok_or_else(|| {
                BookingError::Validation(format!(
                    "Requested quantity for equipment {} is too large",
                    item.equipment_id
                ))
            })?;
        }

        Ok(merged
            .into_iter()
            .map(|(equipment_id, quantity)| EquipmentRequest {
                equipment_id,
                quantity,
            })
            .collect())
    }
}

/// A confirmed claim projected onto its reservation's time slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimedSlot {
    pub reservation_id: ReservationId,
    pub owner_id: Uuid,
    pub resource_id: i64,
    pub quantity: u32,
    pub window: TimeWindow,
}

/// Result of a successful booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationReceipt {
    pub reservation: Reservation,
    pub price_breakdown: PriceBreakdown,
    pub message: String,
}
