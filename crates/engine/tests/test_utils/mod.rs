#![allow(dead_code)]

use std::{str::FromStr, sync::Arc, time::Duration};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use courtside_core::{
    TimeWindow,
    clock::FixedClock,
    models::{
        reservation::{BookingRequest, Caller},
        resource::{Coach, Court, CourtType, EquipmentUnit},
    },
};
use courtside_db::MemoryStore;
use courtside_engine::BookingEngine;
use rust_decimal::Decimal;
use uuid::Uuid;

pub type Engine = BookingEngine<MemoryStore, FixedClock>;

/// "Now" for every test: Monday 2026-10-19, 09:00 facility time.
pub fn now() -> NaiveDateTime {
    today().and_time(at(9, 0))
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

pub fn saturday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 24).unwrap()
}

pub fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 26).unwrap()
}

pub fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

pub fn hours(start: u32, end: u32) -> TimeWindow {
    TimeWindow::hours(start, end).unwrap()
}

pub fn window(start: NaiveTime, end: NaiveTime) -> TimeWindow {
    TimeWindow::new(start, end).unwrap()
}

pub fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

/// A small facility: two courts, a pool of five rackets and one coach.
/// Pricing is unconfigured, so the built-in default rates apply.
pub struct TestContext {
    pub engine: Arc<Engine>,
    pub store: MemoryStore,
    pub indoor: Court,
    pub outdoor: Court,
    pub rackets: EquipmentUnit,
    pub coach: Coach,
    pub member: Caller,
    pub other_member: Caller,
    pub staff: Caller,
}

impl TestContext {
    pub async fn new() -> Self {
        let store = MemoryStore::new(Duration::from_secs(2));

        let indoor = store.add_court("Court 1", CourtType::Indoor).await;
        let outdoor = store.add_court("Court 2", CourtType::Outdoor).await;
        let rackets = store.add_equipment("Racket", 5).await;
        let coach = store.add_coach("Sam Rivera").await;

        let engine = Arc::new(BookingEngine::new(store.clone(), FixedClock::utc(now())));

        Self {
            engine,
            store,
            indoor,
            outdoor,
            rackets,
            coach,
            member: Caller::member(Uuid::new_v4()),
            other_member: Caller::member(Uuid::new_v4()),
            staff: Caller::staff(Uuid::new_v4()),
        }
    }

    pub fn indoor_booking(&self, date: NaiveDate, slot: TimeWindow) -> BookingRequest {
        BookingRequest::court(date, slot, self.indoor.id)
    }

    pub fn outdoor_booking(&self, date: NaiveDate, slot: TimeWindow) -> BookingRequest {
        BookingRequest::court(date, slot, self.outdoor.id)
    }
}
