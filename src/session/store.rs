use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tokio::sync::RwLock;

use crate::api::User;

const TOKEN_KEY: &str = "token";
const PROFILE_KEY: &str = "user_profile";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredSession {
    pub token: Option<String>,
    pub profile: Option<User>,
}

/// Durable home of the credential and cached profile.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> Result<StoredSession>;
    async fn save_token(&self, token: &str) -> Result<()>;
    async fn save_profile(&self, profile: &User) -> Result<()>;
    async fn clear(&self) -> Result<()>;
    async fn close(&self);
}

pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    pub async fn open(database_path: &str) -> Result<Self> {
        let connection_string = if database_path.starts_with("sqlite:") {
            database_path.to_string()
        } else {
            if let Some(parent) = Path::new(database_path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            format!("sqlite://{}?mode=rwc", database_path)
        };

        // In-memory databases live per connection.
        let max_connections = if connection_string.contains(":memory:") { 1 } else { 4 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(&connection_string)
            .await?;

        let store = Self { pool };
        store.initialize_schema().await?;
        Ok(store)
    }

    async fn initialize_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS session_kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        tracing::debug!("Session store schema initialized");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM session_kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO session_kv (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn load(&self) -> Result<StoredSession> {
        let token = self.get(TOKEN_KEY).await?;
        let profile = match self.get(PROFILE_KEY).await? {
            Some(raw) => match serde_json::from_str::<User>(&raw) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    tracing::warn!("Discarding unreadable cached profile: {}", e);
                    None
                }
            },
            None => None,
        };
        Ok(StoredSession { token, profile })
    }

    async fn save_token(&self, token: &str) -> Result<()> {
        self.put(TOKEN_KEY, token).await
    }

    async fn save_profile(&self, profile: &User) -> Result<()> {
        let raw = serde_json::to_string(profile)?;
        self.put(PROFILE_KEY, &raw).await
    }

    async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM session_kv WHERE key IN (?, ?)")
            .bind(TOKEN_KEY)
            .bind(PROFILE_KEY)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Non-durable store for tests and ephemeral runs.
#[derive(Default)]
pub struct MemorySessionStore {
    inner: RwLock<StoredSession>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: StoredSession) -> Self {
        Self {
            inner: RwLock::new(session),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<StoredSession> {
        Ok(self.inner.read().await.clone())
    }

    async fn save_token(&self, token: &str) -> Result<()> {
        self.inner.write().await.token = Some(token.to_string());
        Ok(())
    }

    async fn save_profile(&self, profile: &User) -> Result<()> {
        self.inner.write().await.profile = Some(profile.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.inner.write().await = StoredSession::default();
        Ok(())
    }

    async fn close(&self) {}
}
