//! Half-open wall-clock intervals within a single day.

use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{BookingError, BookingResult};

const SECONDS_PER_HOUR: i64 = 3600;

/// A `[start, end)` interval of wall-clock time. `start < end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimeWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> BookingResult<Self> {
        if start >= end {
            return Err(BookingError::Validation(
                "Start time must be before end time".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    /// Builds a window from whole hours, e.g. `hours(18, 21)`.
    pub fn hours(start_hour: u32, end_hour: u32) -> BookingResult<Self> {
        let start = on_the_hour(start_hour)?;
        let end = on_the_hour(end_hour)?;
        Self::new(start, end)
    }

    /// The window a coach is bookable in on a day without explicit availability rows.
    pub fn default_coach_hours() -> Self {
        Self {
            start: clock_hour(6),
            end: clock_hour(22),
        }
    }

    /// Evening window that triggers the peak-hour pricing rule.
    pub fn peak_hours() -> Self {
        Self {
            start: clock_hour(18),
            end: clock_hour(21),
        }
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Touching endpoints do not overlap.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        other.start < self.end && other.end > self.start
    }

    pub fn contains(&self, other: &TimeWindow) -> bool {
        self.start <= other.start && self.end >= other.end
    }

    pub fn covers(&self, instant: NaiveTime) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Exact fractional hours, e.g. 90 minutes is `1.5`.
    pub fn duration_hours(&self) -> Decimal {
        let seconds = self.end.signed_duration_since(self.start).num_seconds();
        Decimal::from(seconds) / Decimal::from(SECONDS_PER_HOUR)
    }
}

impl<'de> Deserialize<'de> for TimeWindow {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            start: NaiveTime,
            end: NaiveTime,
        }

        let raw = Raw::deserialize(deserializer)?;
        TimeWindow::new(raw.start, raw.end).map_err(serde::de::Error::custom)
    }
}

fn on_the_hour(hour: u32) -> BookingResult<NaiveTime> {
    NaiveTime::from_hms_opt(hour, 0, 0)
        .ok_or_else(|| BookingError::Validation(format!("{hour} is not a valid hour of the day")))
}

fn clock_hour(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or_default()
}
