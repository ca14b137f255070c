use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use crate::session::SessionContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// Result of the last liveness probe.
    Backend,
    /// Whether the last sync cycle was applied.
    Sync,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// `live` while the backend answers its probe, `simulation` otherwise.
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: ComponentHealth,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub backend: bool,
    pub session: bool,
    pub sync: bool,
}

#[derive(Clone)]
pub struct HealthChecker {
    start_time: Instant,
    flags: Arc<RwLock<ComponentHealth>>,
    session: Option<Arc<SessionContext>>,
}

impl HealthChecker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            flags: Arc::new(RwLock::new(ComponentHealth::default())),
            session: None,
        }
    }

    /// Reports `session` from the live context, so a 401 or an expired
    /// token shows up on the next status read.
    pub fn with_session(mut self, session: Arc<SessionContext>) -> Self {
        self.session = Some(session);
        self
    }

    pub async fn get_status(&self) -> HealthStatus {
        let mut components = *self.flags.read().await;
        components.session = match &self.session {
            Some(session) => session.is_authenticated().await,
            None => false,
        };

        HealthStatus {
            status: if components.backend { "live" } else { "simulation" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            components,
        }
    }

    pub async fn is_online(&self) -> bool {
        self.flags.read().await.backend
    }

    pub async fn update_component(&self, component: Component, healthy: bool) {
        let mut flags = self.flags.write().await;
        match component {
            Component::Backend => flags.backend = healthy,
            Component::Sync => flags.sync = healthy,
        }
    }
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new()
    }
}
