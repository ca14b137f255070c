use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::api::{FetchOutcome, GraphData, Proposal, SystemMetrics, VibeNode};

pub type SharedSnapshot = Arc<RwLock<SyncSnapshot>>;

/// One sample of system entropy, labelled with its local `HH:MM` time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntropyPoint {
    pub name: String,
    pub entropy: f64,
}

impl EntropyPoint {
    pub fn new(name: impl Into<String>, entropy: f64) -> Self {
        Self {
            name: name.into(),
            entropy,
        }
    }

    pub fn now(entropy: f64) -> Self {
        Self::new(Local::now().format("%H:%M").to_string(), entropy)
    }
}

/// Bounded entropy time series. A sample whose label matches the newest
/// stored one is dropped, so at most one point exists per minute.
#[derive(Debug, Clone, Serialize)]
pub struct EntropyHistory {
    #[serde(skip)]
    capacity: usize,
    points: VecDeque<EntropyPoint>,
}

impl EntropyHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            points: VecDeque::with_capacity(capacity),
        }
    }

    /// Returns `false` when the point was a duplicate of the newest label.
    pub fn push(&mut self, point: EntropyPoint) -> bool {
        if self.points.back().is_some_and(|last| last.name == point.name) {
            return false;
        }
        self.points.push_back(point);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
        true
    }

    pub fn points(&self) -> impl Iterator<Item = &EntropyPoint> {
        self.points.iter()
    }

    pub fn latest(&self) -> Option<&EntropyPoint> {
        self.points.back()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EntropyHistory {
    fn default() -> Self {
        Self::new(20)
    }
}

/// Where each slice of the current snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SnapshotSources {
    pub status: FetchOutcome,
    pub graph: FetchOutcome,
    pub feed: FetchOutcome,
    pub proposals: FetchOutcome,
}

impl SnapshotSources {
    pub fn all_live(&self) -> bool {
        [self.status, self.graph, self.feed, self.proposals]
            .iter()
            .all(|o| *o == FetchOutcome::Live)
    }
}

/// Everything the dashboard shows, replaced as a whole at the end of each
/// successful cycle. Cycle 0 is the empty state before the first sync.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncSnapshot {
    pub cycle: u64,
    pub fetched_at: Option<DateTime<Utc>>,
    pub online: bool,
    pub status: Option<SystemMetrics>,
    pub graph: Option<GraphData>,
    pub feed: Vec<VibeNode>,
    pub proposals: Vec<Proposal>,
    pub history: EntropyHistory,
    pub sources: Option<SnapshotSources>,
}

impl SyncSnapshot {
    pub fn empty(history_capacity: usize) -> Self {
        Self {
            history: EntropyHistory::new(history_capacity),
            ..Default::default()
        }
    }

    pub fn is_synced(&self) -> bool {
        self.cycle > 0
    }

    pub fn entropy(&self) -> Option<f64> {
        self.status
            .as_ref()
            .map(|s| s.metrics.current_system_entropy)
    }
}
