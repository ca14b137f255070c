use async_trait::async_trait;

use super::error::ClientResult;
use super::types::*;

/// Read side of the backend, polled by the sync loop.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DashboardApi: Send + Sync {
    /// Liveness probe. Never errors: an unreachable backend is `false`.
    async fn check_health(&self) -> bool;

    async fn fetch_status(&self) -> ClientResult<SystemMetrics>;

    async fn fetch_network(&self, limit: u32) -> ClientResult<GraphData>;

    async fn fetch_vibenodes(&self, limit: u32) -> ClientResult<Vec<VibeNode>>;

    async fn fetch_proposals(&self, query: &ProposalQuery) -> ClientResult<Vec<Proposal>>;
}

/// Write side used by vote and comment controls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GovernanceApi: Send + Sync {
    async fn cast_vote(&self, vote: &VoteRequest) -> ClientResult<()>;

    async fn remove_vote(&self, proposal_id: i64, username: &str) -> ClientResult<()>;

    async fn fetch_comments(&self, proposal_id: i64) -> ClientResult<Vec<Comment>>;

    async fn add_comment(&self, comment: &CommentRequest) -> ClientResult<()>;
}
