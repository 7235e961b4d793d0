use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    ai::{AiService, ChatClient, CohereClient},
    auth::repo::{PgUserStore, UserStore},
    config::AppConfig,
    db,
    guest::repo::{GuestStore, PgGuestStore},
    mailer::{HttpMailer, Mailer},
};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub guests: Arc<dyn GuestStore>,
    pub mailer: Arc<dyn Mailer>,
    pub ai: Arc<AiService>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = db::connect(&config.database_url).await?;
        db::migrate(&db).await;

        let mailer = Arc::new(HttpMailer::new(config.mail.clone())?) as Arc<dyn Mailer>;
        let chat = Arc::new(CohereClient::new(config.ai.clone())?) as Arc<dyn ChatClient>;

        Ok(Self::from_parts(
            db.clone(),
            config,
            Arc::new(PgUserStore::new(db.clone())),
            Arc::new(PgGuestStore::new(db)),
            mailer,
            Arc::new(AiService::new(chat)),
        ))
    }

    pub fn from_parts(
        db: PgPool,
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        guests: Arc<dyn GuestStore>,
        mailer: Arc<dyn Mailer>,
        ai: Arc<AiService>,
    ) -> Self {
        Self {
            db,
            config,
            users,
            guests,
            mailer,
            ai,
        }
    }

    pub async fn shutdown(&self) {
        self.db.close().await;
        tracing::info!("database pool closed");
    }
}
