use anyhow::Context;
use axum::async_trait;
use sqlx::PgPool;

/// Per-device usage counters for unauthenticated callers.
#[async_trait]
pub trait GuestStore: Send + Sync {
    /// Count one use for `device_id` while it is below `quota`.
    ///
    /// Creates the counter at 1 on first sight. Returns the new count, or
    /// `None` when the quota is already spent (the counter is left untouched).
    async fn try_consume(&self, device_id: &str, quota: i32) -> anyhow::Result<Option<i32>>;
}

#[derive(Clone)]
pub struct PgGuestStore {
    db: PgPool,
}

impl PgGuestStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl GuestStore for PgGuestStore {
    async fn try_consume(&self, device_id: &str, quota: i32) -> anyhow::Result<Option<i32>> {
        // Conditional upsert: concurrent requests from one device serialize on the row.
        let row = sqlx::query_as::<_, (i32,)>(
            r#"
            INSERT INTO guest_usage (device_id, usage_count, last_used_at)
            VALUES ($1, 1, now())
            ON CONFLICT (device_id) DO UPDATE
               SET usage_count = guest_usage.usage_count + 1,
                   last_used_at = now()
             WHERE guest_usage.usage_count < $2
            RETURNING usage_count
            "#,
        )
        .bind(device_id)
        .bind(quota)
        .fetch_optional(&self.db)
        .await
        .context("consume guest usage")?;
        Ok(row.map(|(count,)| count))
    }
}
