use crate::{
    models::{DbClaimedSlot, DbReservation, DbReservationClaim},
    repositories::RowLock,
};
use chrono::{DateTime, NaiveDate, Utc};
use courtside_core::{
    TimeWindow,
    models::{
        reservation::{NewReservation, ReservationStatus},
        resource::ResourceKind,
    },
};
use eyre::{Result, WrapErr};
use sqlx::PgConnection;
use uuid::Uuid;

const RESERVATION_COLUMNS: &str =
    "id, owner_id, date, start_time, end_time, total_price, status, created_at, updated_at";

/// Inserts a CONFIRMED reservation and one claim row per requested resource.
pub async fn insert_reservation(
    conn: &mut PgConnection,
    reservation: &NewReservation,
) -> Result<(DbReservation, Vec<DbReservationClaim>)> {
    let row = sqlx::query_as::<_, DbReservation>(&format!(
        r#"
        INSERT INTO reservations
            (owner_id, date, start_time, end_time, total_price, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
        RETURNING {RESERVATION_COLUMNS}
        "#
    ))
    .bind(reservation.owner_id)
    .bind(reservation.date)
    .bind(reservation.window.start())
    .bind(reservation.window.end())
    .bind(reservation.total_price)
    .bind(ReservationStatus::Confirmed.as_str())
    .bind(reservation.created_at)
    .fetch_one(&mut *conn)
    .await?;

    let mut claims = Vec::with_capacity(reservation.claims.len());
    for claim in &reservation.claims {
        let quantity = i32::try_from(claim.quantity).wrap_err("Claim quantity out of range")?;
        let claim_row = sqlx::query_as::<_, DbReservationClaim>(
            r#"
            INSERT INTO reservation_claims (reservation_id, resource_type, resource_id, quantity)
            VALUES ($1, $2, $3, $4)
            RETURNING id, reservation_id, resource_type, resource_id, quantity
            "#,
        )
        .bind(row.id)
        .bind(claim.kind.as_str())
        .bind(claim.resource_id)
        .bind(quantity)
        .fetch_one(&mut *conn)
        .await?;
        claims.push(claim_row);
    }

    tracing::debug!(
        "Reservation inserted: id={}, claims={}",
        row.id,
        claims.len()
    );
    Ok((row, claims))
}

pub async fn get_reservation_by_id(
    conn: &mut PgConnection,
    id: i64,
    lock: RowLock,
) -> Result<Option<DbReservation>> {
    let sql = format!(
        "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1{}",
        lock.clause()
    );

    let reservation = sqlx::query_as::<_, DbReservation>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(reservation)
}

pub async fn get_claims_for_reservations(
    conn: &mut PgConnection,
    reservation_ids: &[i64],
) -> Result<Vec<DbReservationClaim>> {
    let claims = sqlx::query_as::<_, DbReservationClaim>(
        r#"
        SELECT id, reservation_id, resource_type, resource_id, quantity
        FROM reservation_claims
        WHERE reservation_id = ANY($1)
        ORDER BY reservation_id ASC, resource_type ASC, resource_id ASC
        "#,
    )
    .bind(reservation_ids)
    .fetch_all(&mut *conn)
    .await?;

    Ok(claims)
}

/// Newest first: date, then start time, both descending.
pub async fn list_reservations(
    conn: &mut PgConnection,
    owner_id: Option<Uuid>,
    status: Option<ReservationStatus>,
) -> Result<Vec<DbReservation>> {
    let reservations = sqlx::query_as::<_, DbReservation>(&format!(
        r#"
        SELECT {RESERVATION_COLUMNS}
        FROM reservations
        WHERE ($1::UUID IS NULL OR owner_id = $1)
          AND ($2::VARCHAR IS NULL OR status = $2)
        ORDER BY date DESC, start_time DESC, id DESC
        "#
    ))
    .bind(owner_id)
    .bind(status.map(|s| s.as_str()))
    .fetch_all(&mut *conn)
    .await?;

    Ok(reservations)
}

pub async fn update_reservation_status(
    conn: &mut PgConnection,
    id: i64,
    status: ReservationStatus,
    updated_at: DateTime<Utc>,
) -> Result<Option<DbReservation>> {
    let reservation = sqlx::query_as::<_, DbReservation>(&format!(
        r#"
        UPDATE reservations
        SET status = $2, updated_at = $3
        WHERE id = $1
        RETURNING {RESERVATION_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(status.as_str())
    .bind(updated_at)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(reservation)
}

/// Claims on one resource held by CONFIRMED reservations overlapping `window` on `date`.
pub async fn get_overlapping_claims(
    conn: &mut PgConnection,
    kind: ResourceKind,
    resource_id: i64,
    date: NaiveDate,
    window: TimeWindow,
    exclude: Option<i64>,
) -> Result<Vec<DbClaimedSlot>> {
    let slots = sqlx::query_as::<_, DbClaimedSlot>(
        r#"
        SELECT r.id AS reservation_id, r.owner_id, c.resource_id, c.quantity,
               r.start_time, r.end_time
        FROM reservation_claims AS c
        INNER JOIN reservations AS r ON r.id = c.reservation_id
        WHERE c.resource_type = $1
          AND c.resource_id = $2
          AND r.date = $3
          AND r.status = 'CONFIRMED'
          AND r.start_time < $5
          AND r.end_time > $4
          AND ($6::BIGINT IS NULL OR r.id <> $6)
        ORDER BY r.start_time ASC, r.id ASC
        "#,
    )
    .bind(kind.as_str())
    .bind(resource_id)
    .bind(date)
    .bind(window.start())
    .bind(window.end())
    .bind(exclude)
    .fetch_all(&mut *conn)
    .await?;

    Ok(slots)
}

pub async fn get_confirmed_claims_on(
    conn: &mut PgConnection,
    kind: ResourceKind,
    date: NaiveDate,
) -> Result<Vec<DbClaimedSlot>> {
    let slots = sqlx::query_as::<_, DbClaimedSlot>(
        r#"
        SELECT r.id AS reservation_id, r.owner_id, c.resource_id, c.quantity,
               r.start_time, r.end_time
        FROM reservation_claims AS c
        INNER JOIN reservations AS r ON r.id = c.reservation_id
        WHERE c.resource_type = $1
          AND r.date = $2
          AND r.status = 'CONFIRMED'
        ORDER BY c.resource_id ASC, r.start_time ASC
        "#,
    )
    .bind(kind.as_str())
    .bind(date)
    .fetch_all(&mut *conn)
    .await?;

    Ok(slots)
}
