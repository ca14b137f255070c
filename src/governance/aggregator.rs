//! Weighted multi-species vote aggregation.
//!
//! A species counts only when it has at least one vote. Active species
//! split the influence in proportion to their weights, so a silent species
//! never drags the result toward zero.

use serde::Serialize;

use super::SpeciesWeights;
use crate::api::{Species, VoteSummary};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeciesBreakdown {
    pub species: Species,
    pub up: u64,
    pub down: u64,
    /// `up - down`, the value drawn on the score bar.
    pub net: i64,
    /// Share of this species' votes that are up, in percent.
    pub approval_pct: Option<f64>,
    /// Normalized influence among active species.
    pub share: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightedScore {
    /// `round((weighted_up - weighted_down) * 100)`, in `[-100, 100]`.
    pub score: i32,
    /// `round(weighted_up * 100)`, in `[0, 100]`.
    pub approval: u8,
    pub weighted_up: f64,
    pub weighted_down: f64,
    pub breakdown: Vec<SpeciesBreakdown>,
}

impl WeightedScore {
    /// Unweighted sum of per-species net scores.
    pub fn net_total(&self) -> i64 {
        self.breakdown
            .iter()
            .fold(0i64, |acc, b| acc.saturating_add(b.net))
    }

    pub fn active_species(&self) -> impl Iterator<Item = Species> + '_ {
        self.breakdown
            .iter()
            .filter(|b| b.share.is_some())
            .map(|b| b.species)
    }
}

pub fn weighted_score(summary: &VoteSummary, weights: &SpeciesWeights) -> WeightedScore {
    let total_weight: f64 = summary
        .iter()
        .filter(|(_, tally)| tally.is_active())
        .map(|(species, _)| weights.get(species))
        .sum();

    let mut weighted_up = 0.0;
    let mut weighted_down = 0.0;
    let mut breakdown = Vec::with_capacity(Species::ALL.len());

    for (species, tally) in summary.iter() {
        let (approval_pct, share) = if tally.is_active() && total_weight > 0.0 {
            let total = tally.up as f64 + tally.down as f64;
            let share = weights.get(species) / total_weight;
            weighted_up += (tally.up as f64 / total) * share;
            weighted_down += (tally.down as f64 / total) * share;
            (Some(tally.up as f64 / total * 100.0), Some(share))
        } else {
            (None, None)
        };

        breakdown.push(SpeciesBreakdown {
            species,
            up: tally.up,
            down: tally.down,
            net: tally.net(),
            approval_pct,
            share,
        });
    }

    let score = ((weighted_up - weighted_down) * 100.0).round().clamp(-100.0, 100.0) as i32;
    let approval = (weighted_up * 100.0).round().clamp(0.0, 100.0) as u8;

    WeightedScore {
        score,
        approval,
        weighted_up,
        weighted_down,
        breakdown,
    }
}

#[derive(Debug, Clone, Default)]
pub struct VoteAggregator {
    weights: SpeciesWeights,
}

impl VoteAggregator {
    pub fn new(weights: SpeciesWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &SpeciesWeights {
        &self.weights
    }

    pub fn aggregate(&self, summary: &VoteSummary) -> WeightedScore {
        weighted_score(summary, &self.weights)
    }
}
