use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

const TABLES: [&str; 8] = [
    r#"
    CREATE TABLE IF NOT EXISTS courts (
        id BIGSERIAL PRIMARY KEY,
        name VARCHAR(100) NOT NULL UNIQUE,
        court_type VARCHAR(10) NOT NULL DEFAULT 'INDOOR',
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        CONSTRAINT valid_court_type CHECK (court_type IN ('INDOOR', 'OUTDOOR'))
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS coaches (
        id BIGSERIAL PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS coach_availabilities (
        id BIGSERIAL PRIMARY KEY,
        coach_id BIGINT NOT NULL REFERENCES coaches(id) ON DELETE CASCADE,
        date DATE NOT NULL,
        start_time TIME NOT NULL,
        end_time TIME NOT NULL,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        CONSTRAINT unique_coach_window UNIQUE (coach_id, date, start_time),
        CONSTRAINT valid_window CHECK (end_time > start_time)
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS equipment (
        id BIGSERIAL PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        total_quantity INTEGER NOT NULL DEFAULT 0,
        available_quantity INTEGER NOT NULL DEFAULT 0,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        CONSTRAINT valid_stock CHECK (
            total_quantity >= 0
            AND available_quantity >= 0
            AND available_quantity <= total_quantity
        )
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reservations (
        id BIGSERIAL PRIMARY KEY,
        owner_id UUID NOT NULL,
        date DATE NOT NULL,
        start_time TIME NOT NULL,
        end_time TIME NOT NULL,
        total_price NUMERIC(10, 2) NOT NULL,
        status VARCHAR(10) NOT NULL DEFAULT 'CONFIRMED',
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        CONSTRAINT valid_time_range CHECK (end_time > start_time),
        CONSTRAINT valid_price CHECK (total_price >= 0),
        CONSTRAINT valid_status CHECK (status IN ('CONFIRMED', 'CANCELLED'))
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reservation_claims (
        id BIGSERIAL PRIMARY KEY,
        reservation_id BIGINT NOT NULL REFERENCES reservations(id) ON DELETE CASCADE,
        resource_type VARCHAR(10) NOT NULL,
        resource_id BIGINT NOT NULL,
        quantity INTEGER NOT NULL DEFAULT 1,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        CONSTRAINT valid_resource_type CHECK (resource_type IN ('COURT', 'EQUIPMENT', 'COACH')),
        CONSTRAINT valid_quantity CHECK (quantity >= 1)
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS pricing_rules (
        id BIGSERIAL PRIMARY KEY,
        rule_type VARCHAR(20) NOT NULL UNIQUE,
        value NUMERIC(10, 2) NOT NULL,
        is_percentage BOOLEAN NOT NULL DEFAULT TRUE,
        description VARCHAR(255) NOT NULL DEFAULT '',
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        CONSTRAINT valid_rule_type CHECK (rule_type IN ('PEAK_HOUR', 'WEEKEND', 'INDOOR_COURT')),
        CONSTRAINT valid_rule_value CHECK (value >= 0)
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS base_prices (
        id BIGSERIAL PRIMARY KEY,
        resource_type VARCHAR(20) NOT NULL UNIQUE,
        price NUMERIC(10, 2) NOT NULL,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        CONSTRAINT valid_price_class CHECK (resource_type IN ('COURT_HOUR', 'EQUIPMENT_HOUR', 'COACH_HOUR')),
        CONSTRAINT valid_base_price CHECK (price >= 0)
    );
    "#,
];

const INDEXES: [&str; 5] = [
    "CREATE INDEX IF NOT EXISTS idx_reservations_date_status ON reservations(date, status)",
    "CREATE INDEX IF NOT EXISTS idx_reservations_owner_id ON reservations(owner_id)",
    "CREATE INDEX IF NOT EXISTS idx_claims_reservation_id ON reservation_claims(reservation_id)",
    "CREATE INDEX IF NOT EXISTS idx_claims_resource ON reservation_claims(resource_type, resource_id)",
    "CREATE INDEX IF NOT EXISTS idx_coach_availabilities_lookup ON coach_availabilities(coach_id, date)",
];

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    for statement in TABLES {
        sqlx::query(statement).execute(pool).await?;
    }

    for statement in INDEXES {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("Database schema initialized successfully.");
    Ok(())
}
