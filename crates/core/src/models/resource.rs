use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::time_window::TimeWindow;

pub type CourtId = i64;
pub type CoachId = i64;
pub type EquipmentId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CourtType {
    Indoor,
    Outdoor,
}

impl CourtType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourtType::Indoor => "INDOOR",
            CourtType::Outdoor => "OUTDOOR",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "INDOOR" => Some(CourtType::Indoor),
            "OUTDOOR" => Some(CourtType::Outdoor),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Court {
    pub id: CourtId,
    pub name: String,
    pub court_type: CourtType,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coach {
    pub id: CoachId,
    pub name: String,
    pub is_active: bool,
}

/// An explicit availability row for a coach on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachWindow {
    pub id: i64,
    pub coach_id: CoachId,
    pub date: NaiveDate,
    pub window: TimeWindow,
}

/// A pool of interchangeable rental items, e.g. rackets.
///
/// `available_quantity` is a display cache only. Capacity decisions are made
/// from `total_quantity` and the reservation ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentUnit {
    pub id: EquipmentId,
    pub name: String,
    pub total_quantity: u32,
    pub available_quantity: u32,
    pub is_active: bool,
}

impl EquipmentUnit {
    pub fn new(id: EquipmentId, name: impl Into<String>, total_quantity: u32) -> Self {
        Self {
            id,
            name: name.into(),
            total_quantity,
            available_quantity: total_quantity,
            is_active: true,
        }
    }

    /// Updates the stock figures, clamping the cached counter to the total.
    pub fn set_stock(&mut self, total_quantity: u32, available_quantity: u32) {
        self.total_quantity = total_quantity;
        self.available_quantity = available_quantity.min(total_quantity);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceKind {
    Court,
    Equipment,
    Coach,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Court => "COURT",
            ResourceKind::Equipment => "EQUIPMENT",
            ResourceKind::Coach => "COACH",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "COURT" => Some(ResourceKind::Court),
            "EQUIPMENT" => Some(ResourceKind::Equipment),
            "COACH" => Some(ResourceKind::Coach),
            _ => None,
        }
    }
}

/// Any bookable entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Resource {
    Court(Court),
    Coach(Coach),
    Equipment(EquipmentUnit),
}

impl Resource {
    pub fn id(&self) -> i64 {
        match self {
            Resource::Court(court) => court.id,
            Resource::Coach(coach) => coach.id,
            Resource::Equipment(unit) => unit.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Resource::Court(court) => &court.name,
            Resource::Coach(coach) => &coach.name,
            Resource::Equipment(unit) => &unit.name,
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            Resource::Court(court) => court.is_active,
            Resource::Coach(coach) => coach.is_active,
            Resource::Equipment(unit) => unit.is_active,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Court(_) => ResourceKind::Court,
            Resource::Coach(_) => ResourceKind::Coach,
            Resource::Equipment(_) => ResourceKind::Equipment,
        }
    }

    /// How many overlapping claims the resource can hold at once.
    pub fn capacity(&self) -> u32 {
        match self {
            Resource::Court(_) | Resource::Coach(_) => 1,
            Resource::Equipment(unit) => unit.total_quantity,
        }
    }
}
