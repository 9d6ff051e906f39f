use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::auth::store::{CredentialStore, PgCredentialStore};
use crate::config::AppConfig;
use crate::notify::{LogNotifier, Notifier};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn CredentialStore>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;
        let users = Arc::new(PgCredentialStore::new(db.clone())) as Arc<dyn CredentialStore>;
        let notifier = Arc::new(LogNotifier) as Arc<dyn Notifier>;
        Ok(Self::from_parts(db, config, users, notifier))
    }

    pub fn from_parts(
        db: PgPool,
        config: Arc<AppConfig>,
        users: Arc<dyn CredentialStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            db,
            config,
            users,
            notifier,
        }
    }
}
