use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Source of "now" for booking policy checks.
///
/// Reservation dates and times are facility wall-clock values, so policy
/// decisions (no past bookings, no cancelling started sessions) compare
/// against [`Clock::local_now`]. Audit timestamps use [`Clock::utc_now`].
pub trait Clock: Send + Sync {
    fn utc_now(&self) -> DateTime<Utc>;

    fn local_now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.local_now().date()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    timezone: Tz,
}

impl SystemClock {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl Clock for SystemClock {
    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_now(&self) -> NaiveDateTime {
        self.timezone.from_utc_datetime(&Utc::now().naive_utc()).naive_local()
    }
}

/// A clock frozen at a facility-local instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    local: NaiveDateTime,
    timezone: Tz,
}

impl FixedClock {
    pub fn new(local: NaiveDateTime, timezone: Tz) -> Self {
        Self { local, timezone }
    }

    pub fn utc(local: NaiveDateTime) -> Self {
        Self::new(local, Tz::UTC)
    }
}

impl Clock for FixedClock {
    fn utc_now(&self) -> DateTime<Utc> {
        self.timezone
            .from_local_datetime(&self.local)
            .earliest()
            .map(|at| at.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&self.local))
    }

    fn local_now(&self) -> NaiveDateTime {
        self.local
    }
}
