use anyhow::Context;
use axum::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::User;

/// Credential store for registered users.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;

    /// Insert an unverified user. Returns `None` when the email is already taken.
    async fn create(
        &self,
        email: &str,
        password_hash: &str,
        verification_token: &str,
    ) -> anyhow::Result<Option<User>>;

    /// Replace the pending verification token; the previous one stops working.
    async fn set_verification_token(&self, id: Uuid, token: &str) -> anyhow::Result<()>;

    /// Mark the owner of `token` verified and clear the token in one step.
    async fn consume_verification_token(&self, token: &str) -> anyhow::Result<Option<User>>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, is_verified, verification_token, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, is_verified, verification_token, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn create(
        &self,
        email: &str,
        password_hash: &str,
        verification_token: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, verification_token)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO NOTHING
            RETURNING id, email, password_hash, is_verified, verification_token, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(verification_token)
        .fetch_optional(&self.db)
        .await
        .context("insert user")?;
        Ok(user)
    }

    async fn set_verification_token(&self, id: Uuid, token: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
               SET verification_token = $2
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token)
        .execute(&self.db)
        .await
        .context("update verification token")?;
        Ok(())
    }

    async fn consume_verification_token(&self, token: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET is_verified = TRUE,
                   verification_token = NULL
             WHERE verification_token = $1
            RETURNING id, email, password_hash, is_verified, verification_token, created_at
            "#,
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await
        .context("consume verification token")?;
        Ok(user)
    }
}
