use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{
    reservation::ReservationId,
    resource::{Coach, CourtId, EquipmentUnit},
};

/// How many units of an equipment pool are free for a given slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentAvailability {
    pub equipment: EquipmentUnit,
    pub available_quantity: u32,
    pub total_quantity: u32,
}

/// Add-ons (coaches and equipment) that can join a court booking for a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddonAvailability {
    pub coaches: Vec<Coach>,
    pub equipment: Vec<EquipmentAvailability>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixSlot {
    pub time: NaiveTime,
    pub is_booked: bool,
    pub reservation_id: Option<ReservationId>,
    pub is_user_booking: bool,
    pub price: Decimal,
}

/// One court's hourly schedule for a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourtDay {
    pub court_id: CourtId,
    pub name: String,
    pub slots: Vec<MatrixSlot>,
}
