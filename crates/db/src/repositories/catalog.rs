use crate::{
    models::{DbCoach, DbCoachAvailability, DbCourt, DbEquipment},
    repositories::RowLock,
};
use chrono::{NaiveDate, NaiveTime};
use courtside_core::models::resource::{CourtType, ResourceKind};
use eyre::Result;
use sqlx::PgConnection;

// Courts

pub async fn create_court(
    conn: &mut PgConnection,
    name: &str,
    court_type: CourtType,
    is_active: bool,
) -> Result<DbCourt> {
    tracing::debug!("Creating court: name={}, type={}", name, court_type.as_str());

    let court = sqlx::query_as::<_, DbCourt>(
        r#"
        INSERT INTO courts (name, court_type, is_active)
        VALUES ($1, $2, $3)
        RETURNING id, name, court_type, is_active
        "#,
    )
    .bind(name)
    .bind(court_type.as_str())
    .bind(is_active)
    .fetch_one(&mut *conn)
    .await?;

    Ok(court)
}

pub async fn get_court_by_id(
    conn: &mut PgConnection,
    id: i64,
    lock: RowLock,
) -> Result<Option<DbCourt>> {
    let sql = format!(
        "SELECT id, name, court_type, is_active FROM courts WHERE id = $1{}",
        lock.clause()
    );

    let court = sqlx::query_as::<_, DbCourt>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(court)
}

pub async fn list_active_courts(conn: &mut PgConnection) -> Result<Vec<DbCourt>> {
    let courts = sqlx::query_as::<_, DbCourt>(
        r#"
        SELECT id, name, court_type, is_active
        FROM courts
        WHERE is_active
        ORDER BY id ASC
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(courts)
}

// Coaches

pub async fn create_coach(conn: &mut PgConnection, name: &str, is_active: bool) -> Result<DbCoach> {
    tracing::debug!("Creating coach: name={}", name);

    let coach = sqlx::query_as::<_, DbCoach>(
        r#"
        INSERT INTO coaches (name, is_active)
        VALUES ($1, $2)
        RETURNING id, name, is_active
        "#,
    )
    .bind(name)
    .bind(is_active)
    .fetch_one(&mut *conn)
    .await?;

    Ok(coach)
}

pub async fn get_coach_by_id(
    conn: &mut PgConnection,
    id: i64,
    lock: RowLock,
) -> Result<Option<DbCoach>> {
    let sql = format!(
        "SELECT id, name, is_active FROM coaches WHERE id = $1{}",
        lock.clause()
    );

    let coach = sqlx::query_as::<_, DbCoach>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(coach)
}

pub async fn list_active_coaches(conn: &mut PgConnection) -> Result<Vec<DbCoach>> {
    let coaches = sqlx::query_as::<_, DbCoach>(
        r#"
        SELECT id, name, is_active
        FROM coaches
        WHERE is_active
        ORDER BY id ASC
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(coaches)
}

pub async fn create_coach_availability(
    conn: &mut PgConnection,
    coach_id: i64,
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
) -> Result<DbCoachAvailability> {
    let availability = sqlx::query_as::<_, DbCoachAvailability>(
        r#"
        INSERT INTO coach_availabilities (coach_id, date, start_time, end_time)
        VALUES ($1, $2, $3, $4)
        RETURNING id, coach_id, date, start_time, end_time
        "#,
    )
    .bind(coach_id)
    .bind(date)
    .bind(start_time)
    .bind(end_time)
    .fetch_one(&mut *conn)
    .await?;

    Ok(availability)
}

pub async fn get_coach_availabilities(
    conn: &mut PgConnection,
    coach_id: i64,
    date: NaiveDate,
) -> Result<Vec<DbCoachAvailability>> {
    let availabilities = sqlx::query_as::<_, DbCoachAvailability>(
        r#"
        SELECT id, coach_id, date, start_time, end_time
        FROM coach_availabilities
        WHERE coach_id = $1 AND date = $2
        ORDER BY start_time ASC
        "#,
    )
    .bind(coach_id)
    .bind(date)
    .fetch_all(&mut *conn)
    .await?;

    Ok(availabilities)
}

// Equipment

pub async fn create_equipment(
    conn: &mut PgConnection,
    name: &str,
    total_quantity: i32,
) -> Result<DbEquipment> {
    tracing::debug!("Creating equipment: name={}, total={}", name, total_quantity);

    let equipment = sqlx::query_as::<_, DbEquipment>(
        r#"
        INSERT INTO equipment (name, total_quantity, available_quantity)
        VALUES ($1, $2, $2)
        RETURNING id, name, total_quantity, available_quantity, is_active
        "#,
    )
    .bind(name)
    .bind(total_quantity)
    .fetch_one(&mut *conn)
    .await?;

    Ok(equipment)
}

/// Changes the stock of a unit; the display counter is clamped to the new total.
pub async fn update_equipment_stock(
    conn: &mut PgConnection,
    id: i64,
    total_quantity: i32,
    available_quantity: i32,
) -> Result<Option<DbEquipment>> {
    let equipment = sqlx::query_as::<_, DbEquipment>(
        r#"
        UPDATE equipment
        SET total_quantity = $2,
            available_quantity = LEAST($3, $2),
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, name, total_quantity, available_quantity, is_active
        "#,
    )
    .bind(id)
    .bind(total_quantity)
    .bind(available_quantity)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(equipment)
}

pub async fn get_equipment_by_id(
    conn: &mut PgConnection,
    id: i64,
    lock: RowLock,
) -> Result<Option<DbEquipment>> {
    let sql = format!(
        "SELECT id, name, total_quantity, available_quantity, is_active FROM equipment WHERE id = $1{}",
        lock.clause()
    );

    let equipment = sqlx::query_as::<_, DbEquipment>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(equipment)
}

pub async fn list_active_equipment(conn: &mut PgConnection) -> Result<Vec<DbEquipment>> {
    let equipment = sqlx::query_as::<_, DbEquipment>(
        r#"
        SELECT id, name, total_quantity, available_quantity, is_active
        FROM equipment
        WHERE is_active
        ORDER BY id ASC
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(equipment)
}

// Active flags

/// Activates or retires a catalog row. Returns false when no row has `id`.
pub async fn set_active(
    conn: &mut PgConnection,
    kind: ResourceKind,
    id: i64,
    is_active: bool,
) -> Result<bool> {
    tracing::debug!("Setting active flag: kind={}, id={}, active={}", kind.as_str(), id, is_active);

    let table = match kind {
        ResourceKind::Court => "courts",
        ResourceKind::Coach => "coaches",
        ResourceKind::Equipment => "equipment",
    };
    let sql = format!("UPDATE {table} SET is_active = $2, updated_at = NOW() WHERE id = $1");

    let result = sqlx::query(&sql)
        .bind(id)
        .bind(is_active)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() == 1)
}
