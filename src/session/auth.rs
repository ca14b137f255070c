use std::sync::Arc;

use crate::api::resilient::{resilient, Fetched};
use crate::api::{ClientError, ClientResult, RegisterRequest, Species, SupernovaClient, User};

use super::SessionContext;

/// Username that gets an offline demo session when the live login fails.
pub const DEMO_USERNAME: &str = "demo";
pub const DEMO_TOKEN: &str = "demo_token_123";

pub struct AuthService {
    client: Arc<SupernovaClient>,
    session: Arc<SessionContext>,
}

impl AuthService {
    pub fn new(client: Arc<SupernovaClient>, session: Arc<SessionContext>) -> Self {
        Self { client, session }
    }

    /// Re-validates a stored token against the backend. Returns the signed-in
    /// profile, or `None` when there is no usable session.
    pub async fn restore(&self) -> Option<User> {
        self.session.token().await?;

        match self.load_profile().await {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::warn!("Session restore failed, logging out: {}", e);
                self.logout().await;
                None
            }
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> ClientResult<User> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ClientError::Validation(
                "Username and password are required.".to_string(),
            ));
        }

        let token = match self.client.login(username, password).await {
            Ok(auth) => auth.access_token,
            Err(e) if username == DEMO_USERNAME && e.is_recoverable() => {
                tracing::warn!("Live login failed ({}), using demo session", e);
                DEMO_TOKEN.to_string()
            }
            Err(e) => return Err(e),
        };

        self.session
            .set_token(&token)
            .await
            .map_err(|e| ClientError::Session(e.to_string()))?;

        self.load_profile().await
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
        species: Species,
    ) -> ClientResult<User> {
        self.client
            .register(&RegisterRequest::new(username, password, species))
            .await?;
        tracing::info!("Registered harmonizer '{}'", username);
        self.login(username, password).await
    }

    pub async fn logout(&self) {
        if let Err(e) = self.session.clear().await {
            tracing::error!("Failed to clear session: {}", e);
        }
    }

    /// Fetches `/users/me`. A held token with an unreachable profile endpoint
    /// keeps the cached profile, or a placeholder traveler.
    async fn load_profile(&self) -> ClientResult<User> {
        let cached = self.session.profile().await;
        let fetched = resilient("profile", self.client.current_user(), || {
            Some(cached.unwrap_or_else(User::traveler))
        })
        .await;

        let profile = match fetched {
            Fetched::Live(profile) | Fetched::Fallback(profile) => profile,
            Fetched::Failed(e) => return Err(e),
        };

        self.session
            .set_profile(profile.clone())
            .await
            .map_err(|e| ClientError::Session(e.to_string()))?;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ApiConfig;
    use std::net::SocketAddr;
    use warp::http::StatusCode;
    use warp::Filter;

    async fn auth_backend() -> SocketAddr {
        let token = warp::post()
            .and(warp::path("token"))
            .and(warp::body::form::<std::collections::HashMap<String, String>>())
            .map(|form: std::collections::HashMap<String, String>| {
                if form.get("password").map(String::as_str) == Some("secret") {
                    warp::reply::with_status(
                        warp::reply::json(&serde_json::json!({
                            "access_token": "live-token",
                            "token_type": "bearer"
                        })),
                        StatusCode::OK,
                    )
                } else {
                    warp::reply::with_status(
                        warp::reply::json(&serde_json::json!({"detail": "bad credentials"})),
                        StatusCode::UNAUTHORIZED,
                    )
                }
            });

        let me = warp::get()
            .and(warp::path("users"))
            .and(warp::path("me"))
            .and(warp::header::<String>("authorization"))
            .map(|auth: String| {
                assert_eq!(auth, "Bearer live-token");
                warp::reply::json(&serde_json::json!({
                    "id": 1,
                    "username": "ada",
                    "species": "ai",
                    "harmony_score": 10,
                    "creative_spark": "20",
                    "network_centrality": 0.1
                }))
            });

        let register = warp::post()
            .and(warp::path!("users" / "register"))
            .and(warp::body::json::<serde_json::Value>())
            .map(|body: serde_json::Value| {
                if body["username"] == "ada" {
                    return warp::reply::with_status(
                        warp::reply::json(&serde_json::json!({"detail": "Username already registered"})),
                        StatusCode::BAD_REQUEST,
                    );
                }
                assert_eq!(body["species"], "company");
                assert_eq!(body["harmony_score"], "50");
                warp::reply::with_status(
                    warp::reply::json(&serde_json::json!({
                        "id": 2,
                        "username": body["username"],
                        "species": body["species"]
                    })),
                    StatusCode::OK,
                )
            });

        let (addr, server) =
            warp::serve(token.or(register).or(me)).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        addr
    }

    fn service(base_url: String) -> (AuthService, Arc<SessionContext>) {
        let session = Arc::new(SessionContext::in_memory());
        let config = ApiConfig {
            base_url,
            request_timeout_secs: 5,
        };
        let client = Arc::new(SupernovaClient::new(&config, session.clone()).unwrap());
        (AuthService::new(client, session.clone()), session)
    }

    #[tokio::test]
    async fn test_login_stores_token_and_profile() {
        let addr = auth_backend().await;
        let (auth, session) = service(format!("http://{}", addr));

        let user = auth.login("ada", "secret").await.unwrap();
        assert_eq!(user.username, "ada");
        assert_eq!(user.species, Species::Ai);
        assert_eq!(user.harmony_score, "10");
        assert_eq!(session.token().await.as_deref(), Some("live-token"));
        assert!(session.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_bad_credentials_are_rejected() {
        let addr = auth_backend().await;
        let (auth, session) = service(format!("http://{}", addr));

        let err = auth.login("ada", "wrong").await.unwrap_err();
        assert!(matches!(err, ClientError::Unauthorized));
        assert_eq!(session.token().await, None);
    }

    #[tokio::test]
    async fn test_register_then_signs_in() {
        let addr = auth_backend().await;
        let (auth, session) = service(format!("http://{}", addr));

        let user = auth.register("grace", "secret", Species::Company).await.unwrap();
        assert_eq!(user.username, "ada");
        assert_eq!(session.token().await.as_deref(), Some("live-token"));
        assert!(session.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_register_taken_name_leaves_session_empty() {
        let addr = auth_backend().await;
        let (auth, session) = service(format!("http://{}", addr));

        let err = auth.register("ada", "secret", Species::Company).await.unwrap_err();
        assert!(matches!(err, ClientError::Status { status: 400, .. }));
        assert_eq!(session.token().await, None);
    }

    #[tokio::test]
    async fn test_demo_login_works_offline() {
        let (auth, session) = service("http://127.0.0.1:9".to_string());

        let user = auth.login(DEMO_USERNAME, "anything").await.unwrap();
        assert_eq!(user, User::traveler());
        assert_eq!(session.token().await.as_deref(), Some(DEMO_TOKEN));

        auth.logout().await;
        assert!(!session.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_restore_without_token_is_signed_out() {
        let (auth, _session) = service("http://127.0.0.1:9".to_string());
        assert!(auth.restore().await.is_none());
        assert!(matches!(
            auth.login(" ", "x").await,
            Err(ClientError::Validation(_))
        ));
    }
}
