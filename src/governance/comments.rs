use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::Utc;

use super::WriteError;
use crate::api::resilient::{resilient, Fetched};
use crate::api::{Comment, CommentRequest, GovernanceApi};
use crate::session::SessionContext;

// Optimistic entries get negative ids so they never collide with backend ids.
static NEXT_TEMP_ID: AtomicI64 = AtomicI64::new(-1);

fn temp_id() -> i64 {
    NEXT_TEMP_ID.fetch_sub(1, Ordering::Relaxed)
}

/// Comments on one proposal, newest first.
pub struct CommentThread {
    api: Arc<dyn GovernanceApi>,
    session: Arc<SessionContext>,
    proposal_id: i64,
    comments: Vec<Comment>,
}

impl CommentThread {
    pub fn new(api: Arc<dyn GovernanceApi>, session: Arc<SessionContext>, proposal_id: i64) -> Self {
        Self {
            api,
            session,
            proposal_id,
            comments: Vec::new(),
        }
    }

    /// Starts from comments already embedded in a proposal payload.
    pub fn with_comments(mut self, comments: Vec<Comment>) -> Self {
        self.comments = comments;
        self
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Refreshes from the backend. An unreachable backend keeps what is
    /// already shown.
    pub async fn load(&mut self) -> Result<&[Comment], WriteError> {
        let current = self.comments.clone();
        let fetched = resilient(
            "comments",
            self.api.fetch_comments(self.proposal_id),
            || Some(current),
        )
        .await;

        match fetched {
            Fetched::Live(comments) | Fetched::Fallback(comments) => self.comments = comments,
            Fetched::Failed(e) => return Err(WriteError::rejected("load comments", e)),
        }
        Ok(&self.comments)
    }

    pub async fn post(&mut self, text: &str) -> Result<&Comment, WriteError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(WriteError::Invalid("Comment cannot be empty.".to_string()));
        }

        let profile = self
            .session
            .profile()
            .await
            .ok_or(WriteError::NotLoggedIn("comment"))?;

        let id = temp_id();
        self.comments.insert(
            0,
            Comment {
                id,
                proposal_id: self.proposal_id,
                user_id: profile.id,
                user: profile.username.clone(),
                user_img: profile.avatar.clone(),
                species: profile.species,
                comment: text.to_string(),
                created_at: Utc::now().to_rfc3339(),
            },
        );

        let request = CommentRequest {
            proposal_id: self.proposal_id,
            user: profile.username,
            comment: text.to_string(),
            species: profile.species,
        };

        if let Err(e) = self.api.add_comment(&request).await {
            tracing::warn!(proposal_id = self.proposal_id, "Comment rolled back: {}", e);
            self.comments.retain(|c| c.id != id);
            return Err(WriteError::rejected("post comment", e));
        }

        Ok(&self.comments[0])
    }
}
