use std::sync::Arc;

use serde::Serialize;

use super::WriteError;
use crate::api::{GovernanceApi, Proposal, Species, VoteChoice, VoteRequest, VoteSummary};
use crate::session::SessionContext;

/// Local like/dislike state for one proposal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VoteState {
    /// The signed-in user's current vote, if any.
    pub clicked: Option<VoteChoice>,
    pub summary: VoteSummary,
}

impl VoteState {
    pub fn from_proposal(proposal: &Proposal) -> Self {
        Self {
            clicked: None,
            summary: proposal.vote_summary(),
        }
    }

    pub fn likes(&self) -> u64 {
        self.summary.iter().map(|(_, tally)| tally.up).sum()
    }

    pub fn dislikes(&self) -> u64 {
        self.summary.iter().map(|(_, tally)| tally.down).sum()
    }

    /// Applies a click and returns `true` when it adds or moves a vote,
    /// `false` when it retracts the current one.
    fn apply(&mut self, species: Species, choice: VoteChoice) -> bool {
        match self.clicked {
            Some(current) if current == choice => {
                self.summary.retract(species, choice);
                self.clicked = None;
                false
            }
            Some(current) => {
                self.summary.retract(species, current);
                self.summary.record(species, choice);
                self.clicked = Some(choice);
                true
            }
            None => {
                self.summary.record(species, choice);
                self.clicked = Some(choice);
                true
            }
        }
    }
}

/// Vote toggle for one proposal. Clicking the active choice again removes
/// the vote; clicking the other one moves it. The local counts change
/// before the request goes out and are restored if it fails.
pub struct VoteControl {
    api: Arc<dyn GovernanceApi>,
    session: Arc<SessionContext>,
    proposal_id: i64,
    state: VoteState,
}

impl VoteControl {
    pub fn new(
        api: Arc<dyn GovernanceApi>,
        session: Arc<SessionContext>,
        proposal_id: i64,
        state: VoteState,
    ) -> Self {
        Self {
            api,
            session,
            proposal_id,
            state,
        }
    }

    pub fn for_proposal(
        api: Arc<dyn GovernanceApi>,
        session: Arc<SessionContext>,
        proposal: &Proposal,
    ) -> Self {
        Self::new(api, session, proposal.id, VoteState::from_proposal(proposal))
    }

    pub fn state(&self) -> &VoteState {
        &self.state
    }

    pub async fn like(&mut self) -> Result<&VoteState, WriteError> {
        self.toggle(VoteChoice::Up).await
    }

    pub async fn dislike(&mut self) -> Result<&VoteState, WriteError> {
        self.toggle(VoteChoice::Down).await
    }

    pub async fn toggle(&mut self, choice: VoteChoice) -> Result<&VoteState, WriteError> {
        let profile = self
            .session
            .profile()
            .await
            .ok_or(WriteError::NotLoggedIn("vote"))?;

        let previous = self.state.clone();
        let casting = self.state.apply(profile.species, choice);

        let result = if casting {
            let request = VoteRequest {
                proposal_id: self.proposal_id,
                username: profile.username.clone(),
                choice,
                voter_type: profile.species,
            };
            self.api
                .cast_vote(&request)
                .await
                .map_err(|e| WriteError::rejected("send vote", e))
        } else {
            self.api
                .remove_vote(self.proposal_id, &profile.username)
                .await
                .map_err(|e| WriteError::rejected("remove vote", e))
        };

        if let Err(e) = result {
            tracing::warn!(proposal_id = self.proposal_id, "Vote rolled back: {}", e);
            self.state = previous;
            return Err(e);
        }

        tracing::debug!(
            proposal_id = self.proposal_id,
            clicked = ?self.state.clicked,
            "Vote updated"
        );
        Ok(&self.state)
    }
}
