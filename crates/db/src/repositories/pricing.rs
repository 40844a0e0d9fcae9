use crate::models::{DbBasePrice, DbPricingRule};
use courtside_core::models::pricing::{PriceClass, RuleKind};
use eyre::Result;
use rust_decimal::Decimal;
use sqlx::PgConnection;

pub async fn list_active_pricing_rules(conn: &mut PgConnection) -> Result<Vec<DbPricingRule>> {
    let rules = sqlx::query_as::<_, DbPricingRule>(
        r#"
        SELECT id, rule_type, value, is_percentage, description, is_active
        FROM pricing_rules
        WHERE is_active
        ORDER BY rule_type ASC
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(rules)
}

/// Creates or replaces the single rule of `kind`.
pub async fn upsert_pricing_rule(
    conn: &mut PgConnection,
    kind: RuleKind,
    value: Decimal,
    is_percentage: bool,
    description: &str,
    is_active: bool,
) -> Result<DbPricingRule> {
    tracing::debug!(
        "Upserting pricing rule: kind={}, value={}, percentage={}",
        kind.as_str(),
        value,
        is_percentage
    );

    let rule = sqlx::query_as::<_, DbPricingRule>(
        r#"
        INSERT INTO pricing_rules (rule_type, value, is_percentage, description, is_active)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (rule_type)
        DO UPDATE SET value = $2, is_percentage = $3, description = $4,
                      is_active = $5, updated_at = NOW()
        RETURNING id, rule_type, value, is_percentage, description, is_active
        "#,
    )
    .bind(kind.as_str())
    .bind(value)
    .bind(is_percentage)
    .bind(description)
    .bind(is_active)
    .fetch_one(&mut *conn)
    .await?;

    Ok(rule)
}

pub async fn get_active_base_price(
    conn: &mut PgConnection,
    class: PriceClass,
) -> Result<Option<DbBasePrice>> {
    let price = sqlx::query_as::<_, DbBasePrice>(
        r#"
        SELECT resource_type, price, is_active
        FROM base_prices
        WHERE resource_type = $1 AND is_active
        "#,
    )
    .bind(class.as_str())
    .fetch_optional(&mut *conn)
    .await?;

    Ok(price)
}

pub async fn list_active_base_prices(conn: &mut PgConnection) -> Result<Vec<DbBasePrice>> {
    let prices = sqlx::query_as::<_, DbBasePrice>(
        r#"
        SELECT resource_type, price, is_active
        FROM base_prices
        WHERE is_active
        ORDER BY resource_type ASC
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(prices)
}

pub async fn upsert_base_price(
    conn: &mut PgConnection,
    class: PriceClass,
    price: Decimal,
    is_active: bool,
) -> Result<DbBasePrice> {
    tracing::debug!("Upserting base price: class={}, price={}", class.as_str(), price);

    let base_price = sqlx::query_as::<_, DbBasePrice>(
        r#"
        INSERT INTO base_prices (resource_type, price, is_active)
        VALUES ($1, $2, $3)
        ON CONFLICT (resource_type)
        DO UPDATE SET price = $2, is_active = $3, updated_at = NOW()
        RETURNING resource_type, price, is_active
        "#,
    )
    .bind(class.as_str())
    .bind(price)
    .bind(is_active)
    .fetch_one(&mut *conn)
    .await?;

    Ok(base_price)
}
