use std::{env, sync::Arc};

use anyhow::{Context, Result, anyhow};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;

use crate::{config::AppConfig, recaptcha::RecaptchaClient, web::storage};

#[derive(Clone)]
pub struct AppState {
    pool: PgPool,
    config: Arc<AppConfig>,
    recaptcha: RecaptchaClient,
}

impl AppState {
    pub async fn new() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL env var is missing")?;

        let config = AppConfig::from_env();
        let recaptcha = RecaptchaClient::new(config.recaptcha_secret_key.clone());

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(&database_url)
            .await
            .context("failed to connect to Postgres")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run database migrations")?;

        storage::ensure_media_layout(&config.media_root)
            .await
            .context("failed to prepare media directories")?;

        Ok(Self {
            pool,
            config: Arc::new(config),
            recaptcha,
        })
    }

    pub async fn ensure_seed_admin(&self) -> Result<()> {
        let has_admin: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE is_admin = TRUE)")
                .fetch_one(&self.pool)
                .await
                .context("failed to verify admin presence")?;

        if !has_admin {
            let password_hash = crate::web::auth::hash_password("change-me")
                .map_err(|err| anyhow!("failed to hash seed admin password: {err}"))?;

            sqlx::query(
                "INSERT INTO users (name, email, password_hash, is_admin) VALUES ($1, $2, $3, TRUE)",
            )
            .bind("Administrator")
            .bind("admin@jurnal.local")
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .context("failed to insert seed admin user")?;

            info!(
                "Seeded default admin 'admin@jurnal.local' (password: 'change-me'). Update it promptly."
            );
        }

        Ok(())
    }

    pub fn pool(&self) -> PgPool {
        self.pool.clone()
    }

    pub fn pool_ref(&self) -> &PgPool {
        &self.pool
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn recaptcha(&self) -> &RecaptchaClient {
        &self.recaptcha
    }
}
