use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::config::AppConfig;

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    username     TEXT NOT NULL,
    password     TEXT NOT NULL,
    first_name   TEXT NOT NULL,
    last_name    TEXT NOT NULL,
    email        TEXT NOT NULL,
    phone_number TEXT NOT NULL,
    city         TEXT NOT NULL,
    gender       TEXT NOT NULL,
    age          INTEGER,
    full_name    TEXT,
    interests    TEXT
)
"#;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let options = SqliteConnectOptions::from_str(&config.database_url)
            .context("parse DATABASE_URL")?
            .create_if_missing(true);
        let db = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("connect to database")?;
        Ok(Self { db, config })
    }

    /// Creates the schema if absent. Any storage error propagates; the
    /// process must not serve requests against a database it could not
    /// initialize.
    pub async fn init_db(&self) -> anyhow::Result<()> {
        sqlx::query(CREATE_USERS_TABLE)
            .execute(&self.db)
            .await
            .context("create users table")?;
        Ok(())
    }

    pub async fn shutdown(&self) {
        self.db.close().await;
    }

    /// State over a private in-memory database with a fixed signing secret.
    /// Single connection, so every query sees the same database.
    pub async fn in_memory() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig {
            database_url: "sqlite::memory:".into(),
            jwt: crate::config::JwtConfig {
                secret: "test-secret".into(),
                ttl_minutes: 30,
            },
        });
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self { db, config })
    }
}
