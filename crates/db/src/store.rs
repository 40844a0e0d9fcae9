//! PostgreSQL implementation of the ledger contracts.
//!
//! Snapshots run on a plain pooled connection. Transactions set a local
//! `lock_timeout` so that a blocked `FOR UPDATE` fails fast instead of
//! queueing indefinitely behind another booking.

use std::{collections::HashMap, ops::DerefMut, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use courtside_core::{
    BookingError, BookingResult, TimeWindow,
    ledger::{Ledger, LedgerStore, LedgerTx},
    models::{
        pricing::{BasePrice, PriceClass, PricingRule},
        reservation::{ClaimedSlot, NewReservation, Reservation, ReservationId, ReservationStatus},
        resource::{Coach, CoachId, CoachWindow, Court, CourtId, EquipmentId, EquipmentUnit, ResourceKind},
    },
};
use sqlx::{PgConnection, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    DbPool,
    models::{DbReservation, DbReservationClaim},
    repositories::{RowLock, catalog, pricing, reservation},
};

/// SQLSTATE codes that mean "another transaction holds what you need".
const CONTENTION_CODES: [&str; 3] = [
    "55P03", // lock_not_available
    "40P01", // deadlock_detected
    "40001", // serialization_failure
];

/// Maps a repository failure onto the booking error taxonomy.
pub fn storage_error(report: eyre::Report) -> BookingError {
    let contention = report
        .downcast_ref::<sqlx::Error>()
        .and_then(|error| match error {
            sqlx::Error::Database(db) => db.code().map(|code| code.into_owned()),
            _ => None,
        })
        .filter(|code| CONTENTION_CODES.contains(&code.as_str()));

    match contention {
        Some(code) => {
            tracing::warn!("Row lock contention (SQLSTATE {}): {}", code, report);
            BookingError::Conflict("The requested resources are busy, please retry".to_string())
        }
        None => BookingError::Database(report),
    }
}

fn sqlx_error(error: sqlx::Error) -> BookingError {
    storage_error(eyre::Report::new(error))
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
    lock_timeout: Duration,
}

impl PgStore {
    pub fn new(pool: DbPool, lock_timeout: Duration) -> Self {
        Self { pool, lock_timeout }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl LedgerStore for PgStore {
    async fn snapshot(&self) -> BookingResult<Box<dyn Ledger + '_>> {
        let conn = self.pool.acquire().await.map_err(sqlx_error)?;
        Ok(Box::new(PgLedger { conn }))
    }

    async fn begin(&self) -> BookingResult<Box<dyn LedgerTx + '_>> {
        let mut tx = self.pool.begin().await.map_err(sqlx_error)?;

        // SET does not accept bind parameters.
        let statement = format!("SET LOCAL lock_timeout = '{}ms'", self.lock_timeout.as_millis());
        sqlx::query(&statement)
            .execute(&mut *tx)
            .await
            .map_err(sqlx_error)?;

        Ok(Box::new(PgLedger { conn: tx }))
    }
}

/// A ledger view over either a pooled connection or an open transaction.
pub struct PgLedger<C> {
    conn: C,
}

impl<C> PgLedger<C>
where
    C: DerefMut<Target = PgConnection> + Send,
{
    async fn load_reservation(
        &mut self,
        id: ReservationId,
        lock: RowLock,
    ) -> BookingResult<Option<Reservation>> {
        let Some(row) = reservation::get_reservation_by_id(&mut self.conn, id, lock)
            .await
            .map_err(storage_error)?
        else {
            return Ok(None);
        };

        let claims = reservation::get_claims_for_reservations(&mut self.conn, &[row.id])
            .await
            .map_err(storage_error)?;

        row.into_reservation(claims).map(Some)
    }

    async fn attach_claims(&mut self, rows: Vec<DbReservation>) -> BookingResult<Vec<Reservation>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let mut by_reservation: HashMap<i64, Vec<DbReservationClaim>> = HashMap::new();
        for claim in reservation::get_claims_for_reservations(&mut self.conn, &ids)
            .await
            .map_err(storage_error)?
        {
            by_reservation
                .entry(claim.reservation_id)
                .or_default()
                .push(claim);
        }

        rows.into_iter()
            .map(|row| {
                let claims = by_reservation.remove(&row.id).unwrap_or_default();
                row.into_reservation(claims)
            })
            .collect()
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> BookingResult<Vec<T>>
where
    T: TryFrom<R, Error = BookingError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[async_trait]
impl<C> Ledger for PgLedger<C>
where
    C: DerefMut<Target = PgConnection> + Send,
{
    async fn court(&mut self, id: CourtId) -> BookingResult<Option<Court>> {
        catalog::get_court_by_id(&mut self.conn, id, RowLock::None)
            .await
            .map_err(storage_error)?
            .map(Court::try_from)
            .transpose()
    }

    async fn coach(&mut self, id: CoachId) -> BookingResult<Option<Coach>> {
        let coach = catalog::get_coach_by_id(&mut self.conn, id, RowLock::None)
            .await
            .map_err(storage_error)?;
        Ok(coach.map(Coach::from))
    }

    async fn equipment(&mut self, id: EquipmentId) -> BookingResult<Option<EquipmentUnit>> {
        catalog::get_equipment_by_id(&mut self.conn, id, RowLock::None)
            .await
            .map_err(storage_error)?
            .map(EquipmentUnit::try_from)
            .transpose()
    }

    async fn active_courts(&mut self) -> BookingResult<Vec<Court>> {
        let rows = catalog::list_active_courts(&mut self.conn)
            .await
            .map_err(storage_error)?;
        convert_all(rows)
    }

    async fn active_coaches(&mut self) -> BookingResult<Vec<Coach>> {
        let rows = catalog::list_active_coaches(&mut self.conn)
            .await
            .map_err(storage_error)?;
        Ok(rows.into_iter().map(Coach::from).collect())
    }

    async fn active_equipment(&mut self) -> BookingResult<Vec<EquipmentUnit>> {
        let rows = catalog::list_active_equipment(&mut self.conn)
            .await
            .map_err(storage_error)?;
        convert_all(rows)
    }

    async fn coach_windows(
        &mut self,
        coach_id: CoachId,
        date: NaiveDate,
    ) -> BookingResult<Vec<CoachWindow>> {
        let rows = catalog::get_coach_availabilities(&mut self.conn, coach_id, date)
            .await
            .map_err(storage_error)?;
        convert_all(rows)
    }

    async fn overlapping_claims(
        &mut self,
        kind: ResourceKind,
        resource_id: i64,
        date: NaiveDate,
        window: TimeWindow,
        exclude: Option<ReservationId>,
    ) -> BookingResult<Vec<ClaimedSlot>> {
        let rows = reservation::get_overlapping_claims(
            &mut self.conn,
            kind,
            resource_id,
            date,
            window,
            exclude,
        )
        .await
        .map_err(storage_error)?;
        convert_all(rows)
    }

    async fn confirmed_claims_on(
        &mut self,
        kind: ResourceKind,
        date: NaiveDate,
    ) -> BookingResult<Vec<ClaimedSlot>> {
        let rows = reservation::get_confirmed_claims_on(&mut self.conn, kind, date)
            .await
            .map_err(storage_error)?;
        convert_all(rows)
    }

    async fn reservation(&mut self, id: ReservationId) -> BookingResult<Option<Reservation>> {
        self.load_reservation(id, RowLock::None).await
    }

    async fn reservations(
        &mut self,
        owner_id: Option<Uuid>,
        status: Option<ReservationStatus>,
    ) -> BookingResult<Vec<Reservation>> {
        let rows = reservation::list_reservations(&mut self.conn, owner_id, status)
            .await
            .map_err(storage_error)?;
        self.attach_claims(rows).await
    }

    async fn active_pricing_rules(&mut self) -> BookingResult<Vec<PricingRule>> {
        let rows = pricing::list_active_pricing_rules(&mut self.conn)
            .await
            .map_err(storage_error)?;
        convert_all(rows)
    }

    async fn active_base_price(&mut self, class: PriceClass) -> BookingResult<Option<BasePrice>> {
        pricing::get_active_base_price(&mut self.conn, class)
            .await
            .map_err(storage_error)?
            .map(BasePrice::try_from)
            .transpose()
    }

    async fn active_base_prices(&mut self) -> BookingResult<Vec<BasePrice>> {
        let rows = pricing::list_active_base_prices(&mut self.conn)
            .await
            .map_err(storage_error)?;
        convert_all(rows)
    }
}

#[async_trait]
impl LedgerTx for PgLedger<Transaction<'static, Postgres>> {
    async fn lock_court(&mut self, id: CourtId) -> BookingResult<Option<Court>> {
        catalog::get_court_by_id(&mut self.conn, id, RowLock::ForUpdate)
            .await
            .map_err(storage_error)?
            .map(Court::try_from)
            .transpose()
    }

    async fn lock_equipment(&mut self, id: EquipmentId) -> BookingResult<Option<EquipmentUnit>> {
        catalog::get_equipment_by_id(&mut self.conn, id, RowLock::ForUpdate)
            .await
            .map_err(storage_error)?
            .map(EquipmentUnit::try_from)
            .transpose()
    }

    async fn lock_coach(&mut self, id: CoachId) -> BookingResult<Option<Coach>> {
        let coach = catalog::get_coach_by_id(&mut self.conn, id, RowLock::ForUpdate)
            .await
            .map_err(storage_error)?;
        Ok(coach.map(Coach::from))
    }

    async fn lock_reservation(&mut self, id: ReservationId) -> BookingResult<Option<Reservation>> {
        self.load_reservation(id, RowLock::ForUpdate).await
    }

    async fn insert_reservation(&mut self, new: NewReservation) -> BookingResult<Reservation> {
        let (row, claims) = reservation::insert_reservation(&mut self.conn, &new)
            .await
            .map_err(storage_error)?;
        row.into_reservation(claims)
    }

    async fn update_status(
        &mut self,
        id: ReservationId,
        status: ReservationStatus,
        updated_at: DateTime<Utc>,
    ) -> BookingResult<Reservation> {
        let row = reservation::update_reservation_status(&mut self.conn, id, status, updated_at)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| BookingError::NotFound(format!("Reservation {id}")))?;

        let claims = reservation::get_claims_for_reservations(&mut self.conn, &[id])
            .await
            .map_err(storage_error)?;
        row.into_reservation(claims)
    }

    async fn commit(self: Box<Self>) -> BookingResult<()> {
        let ledger = *self;
        ledger.conn.commit().await.map_err(sqlx_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_sqlx_failures_stay_database_errors() {
        let error = storage_error(eyre::eyre!("connection reset"));
        assert!(matches!(error, BookingError::Database(_)));
        assert!(!error.is_retryable());
    }

    #[test]
    fn row_not_found_is_not_contention() {
        let error = sqlx_error(sqlx::Error::RowNotFound);
        assert!(matches!(error, BookingError::Database(_)));
    }
}
