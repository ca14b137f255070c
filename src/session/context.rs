use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::store::{MemorySessionStore, SessionStore, StoredSession};
use super::token;
use crate::api::{Species, User};

/// The signed-in identity shared by the API client, auth flows and
/// governance controls. Every mutation is written through to the store.
pub struct SessionContext {
    store: Arc<dyn SessionStore>,
    state: RwLock<StoredSession>,
}

impl SessionContext {
    /// Restores whatever the store holds. An already expired token is
    /// dropped here rather than sent.
    pub async fn init(store: Arc<dyn SessionStore>) -> Result<Self> {
        let mut restored = store.load().await?;

        if let Some(t) = restored.token.as_deref() {
            if token::is_expired(t, Utc::now()) {
                tracing::info!("Stored session token has expired, starting signed out");
                store.clear().await?;
                restored = StoredSession::default();
            }
        }

        tracing::debug!(
            has_token = restored.token.is_some(),
            has_profile = restored.profile.is_some(),
            "Session restored"
        );

        Ok(Self {
            store,
            state: RwLock::new(restored),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(MemorySessionStore::new()),
            state: RwLock::new(StoredSession::default()),
        }
    }

    pub async fn token(&self) -> Option<String> {
        self.state.read().await.token.clone()
    }

    /// Token to attach to outgoing requests, if one is held and not expired.
    pub async fn bearer(&self) -> Option<String> {
        let current = self.token().await?;
        if token::is_expired(&current, Utc::now()) {
            tracing::info!("Session token expired, signing out");
            if let Err(e) = self.clear().await {
                tracing::error!("Failed to clear expired session: {}", e);
            }
            return None;
        }
        Some(current)
    }

    pub async fn profile(&self) -> Option<User> {
        self.state.read().await.profile.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.profile.is_some()
    }

    pub async fn set_token(&self, token: &str) -> Result<()> {
        self.store.save_token(token).await?;
        self.state.write().await.token = Some(token.to_string());
        Ok(())
    }

    pub async fn set_profile(&self, profile: User) -> Result<()> {
        self.store.save_profile(&profile).await?;
        self.state.write().await.profile = Some(profile);
        Ok(())
    }

    /// Changes the species on the cached profile. Returns `false` when
    /// nobody is signed in.
    pub async fn update_species(&self, species: Species) -> Result<bool> {
        let Some(mut profile) = self.profile().await else {
            return Ok(false);
        };
        profile.species = species;
        self.set_profile(profile).await?;
        Ok(true)
    }

    pub async fn clear(&self) -> Result<()> {
        *self.state.write().await = StoredSession::default();
        self.store.clear().await
    }

    pub async fn teardown(&self) {
        self.store.close().await;
        tracing::debug!("Session context torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose, Engine as _};

    #[tokio::test]
    async fn test_init_restores_stored_session() {
        let store = Arc::new(MemorySessionStore::with_session(StoredSession {
            token: Some("demo_token_123".to_string()),
            profile: Some(User::traveler()),
        }));
        let session = SessionContext::init(store).await.unwrap();

        assert_eq!(session.bearer().await.as_deref(), Some("demo_token_123"));
        assert!(session.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_init_drops_expired_token() {
        let payload = general_purpose::URL_SAFE_NO_PAD.encode(r#"{"exp":1000}"#);
        let store = Arc::new(MemorySessionStore::with_session(StoredSession {
            token: Some(format!("h.{}.s", payload)),
            profile: Some(User::traveler()),
        }));
        let session = SessionContext::init(store.clone()).await.unwrap();

        assert_eq!(session.token().await, None);
        assert_eq!(store.load().await.unwrap(), StoredSession::default());
    }

    #[tokio::test]
    async fn test_update_species_persists() {
        let store = Arc::new(MemorySessionStore::new());
        let session = SessionContext::init(store.clone()).await.unwrap();
        assert!(!session.update_species(Species::Ai).await.unwrap());

        session.set_profile(User::traveler()).await.unwrap();
        assert!(session.update_species(Species::Company).await.unwrap());

        let stored = store.load().await.unwrap();
        assert_eq!(stored.profile.unwrap().species, Species::Company);
    }

    #[tokio::test]
    async fn test_clear_signs_out() {
        let session = SessionContext::in_memory();
        session.set_token("abc").await.unwrap();
        session.set_profile(User::traveler()).await.unwrap();

        session.clear().await.unwrap();
        assert_eq!(session.bearer().await, None);
        assert!(!session.is_authenticated().await);
    }
}
