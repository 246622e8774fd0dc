use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

use super::pools::PoolResolver;
use crate::domain::{LimitOrder, Pool, User};
use crate::error::Result;
use crate::signing::SecretKeyMaterial;
use crate::store::{DeleteOutcome, OrderStore};

/// PostgreSQL storage adapter: order store plus pool registry
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Create a PostgreSQL store from an existing connection pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Register a user (onboarding path, exercised by ops tooling and tests)
    pub async fn upsert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (telegram_id, wallet_address, secret_key)
            VALUES ($1, $2, $3)
            ON CONFLICT (telegram_id) DO UPDATE SET
                wallet_address = EXCLUDED.wallet_address,
                secret_key = EXCLUDED.secret_key
            "#,
        )
        .bind(&user.telegram_id)
        .bind(&user.wallet_address)
        .bind(user.secret_key.to_stored())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Place a standing order for a user
    pub async fn insert_order(&self, telegram_id: &str, order: &LimitOrder) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, telegram_id, pair, main_coin, is_buy, amount, price)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(order.id)
        .bind(telegram_id)
        .bind(&order.pair)
        .bind(order.main_coin as i16)
        .bind(order.is_buy)
        .bind(order.amount)
        .bind(order.price)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Register or update pool metadata
    pub async fn upsert_pool(&self, pool: &Pool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO pools (caption, asset0, asset1, decimals0, decimals1)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (caption) DO UPDATE SET
                asset0 = EXCLUDED.asset0,
                asset1 = EXCLUDED.asset1,
                decimals0 = EXCLUDED.decimals0,
                decimals1 = EXCLUDED.decimals1
            "#,
        )
        .bind(&pool.caption)
        .bind(pool.assets[0].to_registry_string())
        .bind(pool.assets[1].to_registry_string())
        .bind(pool.decimals[0] as i32)
        .bind(pool.decimals[1] as i32)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn order_from_row(row: &sqlx::postgres::PgRow) -> Result<LimitOrder> {
    let main_coin: i16 = row.try_get("main_coin")?;
    Ok(LimitOrder {
        id: row.try_get("id")?,
        pair: row.try_get("pair")?,
        main_coin: main_coin as u8,
        is_buy: row.try_get("is_buy")?,
        amount: row.try_get::<Decimal, _>("amount")?,
        price: row.try_get::<Decimal, _>("price")?,
    })
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn list_users_with_orders(&self) -> Result<Vec<User>> {
        let order_rows = sqlx::query(
            r#"
            SELECT id, telegram_id, pair, main_coin, is_buy, amount, price
            FROM orders
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut orders_by_user: HashMap<String, Vec<LimitOrder>> = HashMap::new();
        for row in &order_rows {
            let telegram_id: String = row.try_get("telegram_id")?;
            orders_by_user
                .entry(telegram_id)
                .or_default()
                .push(order_from_row(row)?);
        }

        if orders_by_user.is_empty() {
            return Ok(Vec::new());
        }

        let user_rows = sqlx::query(
            r#"
            SELECT telegram_id, wallet_address, secret_key
            FROM users
            WHERE telegram_id = ANY($1)
            "#,
        )
        .bind(orders_by_user.keys().cloned().collect::<Vec<_>>())
        .fetch_all(&self.pool)
        .await?;

        let mut users = Vec::with_capacity(user_rows.len());
        for row in &user_rows {
            let telegram_id: String = row.try_get("telegram_id")?;
            let stored_key: String = row.try_get("secret_key")?;
            // Corrupt material becomes an empty seed; wallet reconstruction
            // then fails for exactly this user and the cycle skips them.
            let secret_key = SecretKeyMaterial::from_stored(&stored_key)
                .unwrap_or_else(|_| SecretKeyMaterial::from_bytes(Vec::new()));

            let orders = orders_by_user.remove(&telegram_id).unwrap_or_default();
            users.push(
                User::new(telegram_id, row.try_get::<String, _>("wallet_address")?, secret_key)
                    .with_orders(orders),
            );
        }

        debug!(users = users.len(), "loaded users with pending orders");
        Ok(users)
    }

    async fn delete_order(&self, telegram_id: &str, order_id: Uuid) -> Result<DeleteOutcome> {
        let result = sqlx::query(
            r#"
            DELETE FROM orders
            WHERE id = $1 AND telegram_id = $2
            "#,
        )
        .bind(order_id)
        .bind(telegram_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            debug!(%order_id, telegram_id, "order retired");
            Ok(DeleteOutcome::Deleted)
        } else {
            // Already removed by a retry or an overlapping cycle
            Ok(DeleteOutcome::AlreadyGone)
        }
    }
}

#[async_trait]
impl PoolResolver for PostgresStore {
    async fn get_pool(&self, caption: &str) -> Result<Option<Pool>> {
        let row = sqlx::query(
            r#"
            SELECT caption, asset0, asset1, decimals0, decimals1
            FROM pools
            WHERE caption = $1
            "#,
        )
        .bind(caption)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let asset0: String = row.try_get("asset0")?;
        let asset1: String = row.try_get("asset1")?;
        let decimals0: i32 = row.try_get("decimals0")?;
        let decimals1: i32 = row.try_get("decimals1")?;

        Ok(Some(Pool::from_registry(
            row.try_get::<String, _>("caption")?,
            [asset0.as_str(), asset1.as_str()],
            [decimals0 as u32, decimals1 as u32],
        )?))
    }
}
