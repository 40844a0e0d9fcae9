use color_eyre::eyre::Result;
use courtside_core::models::pricing::{PriceClass, RuleKind};
use courtside_db::{
    repositories::pricing::{upsert_base_price, upsert_pricing_rule},
    schema::initialize_database,
};
use courtside_engine::{config::ServiceConfig, telemetry::init_tracing};
use dotenv::dotenv;
use rust_decimal::Decimal;
use tracing::info;

const BASE_PRICES: [(PriceClass, i64); 3] = [
    (PriceClass::CourtHour, 200),
    (PriceClass::EquipmentHour, 100),
    (PriceClass::CoachHour, 500),
];

const PRICING_RULES: [(RuleKind, i64); 3] = [
    (RuleKind::PeakHour, 10),
    (RuleKind::Weekend, 15),
    (RuleKind::IndoorCourt, 5),
];

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenv().ok();

    let config = ServiceConfig::from_env()?;
    init_tracing(config.log_level)?;

    info!("Connecting to database...");
    let pool = courtside_db::create_pool(&config.database_url, config.max_connections).await?;
    initialize_database(&pool).await?;

    // Seed rows are upserts, so re-running resets prices to these values.
    let mut conn = pool.acquire().await?;
    for (class, price) in BASE_PRICES {
        upsert_base_price(&mut conn, class, Decimal::from(price), true).await?;
    }
    for (kind, percent) in PRICING_RULES {
        upsert_pricing_rule(&mut conn, kind, Decimal::from(percent), true, kind.label(), true).await?;
    }

    info!(
        "Seeded {} base prices and {} pricing rules",
        BASE_PRICES.len(),
        PRICING_RULES.len()
    );
    Ok(())
}
