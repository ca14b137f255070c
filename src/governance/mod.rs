pub mod aggregator;
pub mod comments;
pub mod content;
pub mod voting;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::{ClientError, Species};

pub use aggregator::{weighted_score, SpeciesBreakdown, VoteAggregator, WeightedScore};
pub use comments::CommentThread;
pub use content::{AuthorFields, ProposalDraft};
pub use voting::{VoteControl, VoteState};

/// Relative influence of each species in the weighted score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeciesWeights {
    pub human: f64,
    pub ai: f64,
    pub company: f64,
}

impl Default for SpeciesWeights {
    fn default() -> Self {
        Self {
            human: 1.0,
            ai: 1.0,
            company: 1.0,
        }
    }
}

impl SpeciesWeights {
    pub fn new(human: f64, ai: f64, company: f64) -> Self {
        Self { human, ai, company }
    }

    pub fn get(&self, species: Species) -> f64 {
        match species {
            Species::Human => self.human,
            Species::Ai => self.ai,
            Species::Company => self.company,
        }
    }

    pub fn set(&mut self, species: Species, weight: f64) {
        match species {
            Species::Human => self.human = weight,
            Species::Ai => self.ai = weight,
            Species::Company => self.company = weight,
        }
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.human * factor, self.ai * factor, self.company * factor)
    }
}

/// Failure of a user-initiated write. The display text is the inline
/// message shown next to the control.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("You must be logged in to {0}.")]
    NotLoggedIn(&'static str),

    #[error("{0}")]
    Invalid(String),

    #[error("Failed to {action}: {source}")]
    Rejected {
        action: &'static str,
        #[source]
        source: ClientError,
    },
}

impl WriteError {
    pub fn rejected(action: &'static str, source: ClientError) -> Self {
        WriteError::Rejected { action, source }
    }

    /// True when the session was invalidated and the user must sign in again.
    pub fn requires_login(&self) -> bool {
        match self {
            WriteError::NotLoggedIn(_) => true,
            WriteError::Rejected { source, .. } => matches!(source, ClientError::Unauthorized),
            WriteError::Invalid(_) => false,
        }
    }
}
