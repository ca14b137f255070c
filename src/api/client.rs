use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use super::backend::{DashboardApi, GovernanceApi};
use super::error::{ClientError, ClientResult};
use super::types::*;
use crate::core::config::{normalize_base_url, ApiConfig};
use crate::governance::content::{Attachment, AuthorFields, FileAttachment, ProposalDraft, VideoSource};
use crate::session::SessionContext;

enum Payload {
    Json(serde_json::Value),
    Form(Vec<(&'static str, String)>),
    Multipart(Form),
}

/// One backend call. Authenticated calls carry the session bearer token and
/// treat 401 as an expired session.
struct Call {
    method: Method,
    endpoint: String,
    query: Vec<(&'static str, String)>,
    payload: Option<Payload>,
    authenticated: bool,
}

impl Call {
    fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            query: Vec::new(),
            payload: None,
            authenticated: true,
        }
    }

    fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::POST, endpoint)
    }

    fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(Method::DELETE, endpoint)
    }

    fn query(mut self, params: Vec<(&'static str, String)>) -> Self {
        self.query.extend(params);
        self
    }

    fn json<T: serde::Serialize>(mut self, body: &T) -> ClientResult<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| ClientError::Validation(format!("Unserializable request body: {}", e)))?;
        self.payload = Some(Payload::Json(value));
        Ok(self)
    }

    fn form(mut self, fields: Vec<(&'static str, String)>) -> Self {
        self.payload = Some(Payload::Form(fields));
        self
    }

    fn multipart(mut self, form: Form) -> Self {
        self.payload = Some(Payload::Multipart(form));
        self
    }

    fn anonymous(mut self) -> Self {
        self.authenticated = false;
        self
    }
}

pub struct SupernovaClient {
    client: Client,
    base_url: String,
    session: Arc<SessionContext>,
}

impl SupernovaClient {
    pub fn new(config: &ApiConfig, session: Arc<SessionContext>) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ClientError::Network {
                endpoint: config.base_url.clone(),
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: normalize_base_url(&config.base_url),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    async fn send(&self, call: Call) -> ClientResult<Response> {
        let url = format!("{}{}", self.base_url, call.endpoint);
        let mut request = self.client.request(call.method, &url);

        if !call.query.is_empty() {
            request = request.query(&call.query);
        }

        if call.authenticated {
            if let Some(token) = self.session.bearer().await {
                request = request.bearer_auth(token);
            }
        }

        request = match call.payload {
            Some(Payload::Json(body)) => request.json(&body),
            Some(Payload::Form(fields)) => request.form(&fields),
            Some(Payload::Multipart(form)) => request.multipart(form),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(&call.endpoint, e))?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            if call.authenticated {
                tracing::warn!("Backend rejected credentials on {}, clearing session", call.endpoint);
                if let Err(e) = self.session.clear().await {
                    tracing::error!("Failed to clear session after 401: {}", e);
                }
            }
            return Err(ClientError::Unauthorized);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!("Backend error on {}: {} - {}", call.endpoint, status, error_text);
            return Err(ClientError::Status {
                status: status.as_u16(),
                endpoint: call.endpoint,
            });
        }

        Ok(response)
    }

    async fn request<T: DeserializeOwned>(&self, call: Call) -> ClientResult<T> {
        let endpoint = call.endpoint.clone();
        let response = self.send(call).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Decode {
                endpoint,
                message: e.to_string(),
            })
    }

    async fn execute(&self, call: Call) -> ClientResult<()> {
        self.send(call).await.map(|_| ())
    }

    // System
    pub async fn health(&self) -> bool {
        match self.send(Call::get("/healthz").anonymous()).await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("Health probe failed: {}", e);
                false
            }
        }
    }

    pub async fn get_status(&self) -> ClientResult<SystemMetrics> {
        self.request(Call::get("/status")).await
    }

    pub async fn get_network_analysis(&self, limit: u32) -> ClientResult<GraphData> {
        self.request(Call::get("/network-analysis/").query(vec![("limit", limit.to_string())]))
            .await
    }

    // Content
    /// The backend has no plain listing endpoint, so feed items are derived
    /// from the vibenode entries of the network graph.
    pub async fn get_vibenodes(&self, limit: u32) -> ClientResult<Vec<VibeNode>> {
        Ok(self.get_network_analysis(limit).await?.vibenodes())
    }

    pub async fn create_vibenode(&self, node: &NewVibeNode) -> ClientResult<VibeNode> {
        self.request(Call::post("/vibenodes/").json(node)?).await
    }

    pub async fn like_vibenode(&self, id: i64) -> ClientResult<MessageResponse> {
        self.request(Call::post(format!("/vibenodes/{}/like", id))).await
    }

    // Governance
    pub async fn get_proposals(&self, query: &ProposalQuery) -> ClientResult<Vec<Proposal>> {
        self.request(Call::get("/proposals").query(query.params())).await
    }

    pub async fn get_proposal(&self, id: i64) -> ClientResult<Proposal> {
        self.request(Call::get(format!("/proposals/{}", id))).await
    }

    pub async fn vote(&self, vote: &VoteRequest) -> ClientResult<()> {
        self.execute(Call::post("/votes").json(vote)?).await
    }

    pub async fn delete_vote(&self, proposal_id: i64, username: &str) -> ClientResult<()> {
        self.execute(Call::delete("/votes").query(vec![
            ("proposal_id", proposal_id.to_string()),
            ("username", username.to_string()),
        ]))
        .await
    }

    pub async fn get_comments(&self, proposal_id: i64) -> ClientResult<Vec<Comment>> {
        self.request(Call::get("/comments").query(vec![("proposal_id", proposal_id.to_string())]))
            .await
    }

    pub async fn post_comment(&self, comment: &CommentRequest) -> ClientResult<()> {
        self.execute(Call::post("/comments").json(comment)?).await
    }

    pub async fn create_proposal(
        &self,
        draft: &ProposalDraft,
        author: &AuthorFields,
    ) -> ClientResult<serde_json::Value> {
        let mut form = Form::new()
            .text("title", draft.title.clone())
            .text("body", draft.body.clone())
            .text("author", author.author.clone())
            .text("userName", author.user_name.clone())
            .text("userInitials", author.user_initials.clone())
            .text("author_type", author.author_type.to_string())
            .text("author_img", author.author_img.clone())
            .text("date", author.date.clone());

        form = match &draft.attachment {
            Some(Attachment::Image(file)) => form.part("image", file_part(file)?),
            Some(Attachment::Video(VideoSource::Upload(file))) => form.part("video", file_part(file)?),
            Some(Attachment::Video(VideoSource::Url(url))) => form.text("video", url.clone()),
            Some(Attachment::File(file)) => form.part("file", file_part(file)?),
            Some(Attachment::Link(url)) => form.text("link", url.clone()),
            None => form,
        };

        self.request(Call::post("/proposals").multipart(form)).await
    }

    // Auth
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<AuthResponse> {
        self.request(
            Call::post("/token")
                .form(vec![
                    ("username", username.to_string()),
                    ("password", password.to_string()),
                ])
                .anonymous(),
        )
        .await
    }

    pub async fn register(&self, request: &RegisterRequest) -> ClientResult<User> {
        self.request(Call::post("/users/register").json(request)?.anonymous())
            .await
    }

    pub async fn current_user(&self) -> ClientResult<User> {
        self.request(Call::get("/users/me")).await
    }
}

fn file_part(file: &FileAttachment) -> ClientResult<Part> {
    let part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
    match &file.content_type {
        Some(mime) => part.mime_str(mime).map_err(|e| {
            ClientError::Validation(format!("Invalid content type '{}': {}", mime, e))
        }),
        None => Ok(part),
    }
}

#[async_trait]
impl DashboardApi for SupernovaClient {
    async fn check_health(&self) -> bool {
        self.health().await
    }

    async fn fetch_status(&self) -> ClientResult<SystemMetrics> {
        self.get_status().await
    }

    async fn fetch_network(&self, limit: u32) -> ClientResult<GraphData> {
        self.get_network_analysis(limit).await
    }

    async fn fetch_vibenodes(&self, limit: u32) -> ClientResult<Vec<VibeNode>> {
        self.get_vibenodes(limit).await
    }

    async fn fetch_proposals(&self, query: &ProposalQuery) -> ClientResult<Vec<Proposal>> {
        self.get_proposals(query).await
    }
}

#[async_trait]
impl GovernanceApi for SupernovaClient {
    async fn cast_vote(&self, vote: &VoteRequest) -> ClientResult<()> {
        self.vote(vote).await
    }

    async fn remove_vote(&self, proposal_id: i64, username: &str) -> ClientResult<()> {
        self.delete_vote(proposal_id, username).await
    }

    async fn fetch_comments(&self, proposal_id: i64) -> ClientResult<Vec<Comment>> {
        self.get_comments(proposal_id).await
    }

    async fn add_comment(&self, comment: &CommentRequest) -> ClientResult<()> {
        self.post_comment(comment).await
    }
}
