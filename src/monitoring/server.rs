use serde::Serialize;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use super::metrics::SyncMetrics;
use crate::api::{resolve_media_url, MediaRef};
use crate::core::HealthChecker;
use crate::governance::{VoteAggregator, WeightedScore};
use crate::sync::{SharedSnapshot, SyncSnapshot};

#[derive(Clone)]
pub struct DashboardState {
    pub health: HealthChecker,
    pub snapshot: SharedSnapshot,
    pub metrics: Arc<SyncMetrics>,
    pub aggregator: Arc<VoteAggregator>,
    pub api_base_url: String,
}

#[derive(Serialize)]
struct SnapshotView<'a> {
    #[serde(flatten)]
    snapshot: &'a SyncSnapshot,
    harmony_pct: Option<f64>,
    wellspring: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ProposalScore {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub media: Option<MediaRef>,
    #[serde(flatten)]
    pub score: WeightedScore,
}

pub fn proposal_scores(
    snapshot: &SyncSnapshot,
    aggregator: &VoteAggregator,
    api_base_url: &str,
) -> Vec<ProposalScore> {
    snapshot
        .proposals
        .iter()
        .map(|p| ProposalScore {
            id: p.id,
            title: p.title.clone(),
            author: p.author_display_name(),
            media: p.primary_media().map(|m| MediaRef {
                url: resolve_media_url(api_base_url, &m.url),
                ..m
            }),
            score: aggregator.aggregate(&p.vote_summary()),
        })
        .collect()
}

fn with_state(
    state: DashboardState,
) -> impl Filter<Extract = (DashboardState,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || state.clone())
}

pub fn routes(
    state: DashboardState,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let health = warp::path("health")
        .and(warp::path::end())
        .and(with_state(state.clone()))
        .and_then(|state: DashboardState| async move {
            let status = state.health.get_status().await;
            Ok::<_, Rejection>(warp::reply::json(&status))
        });

    let snapshot = warp::path("snapshot")
        .and(warp::path::end())
        .and(with_state(state.clone()))
        .and_then(|state: DashboardState| async move {
            let snapshot = state.snapshot.read().await.clone();
            let view = SnapshotView {
                harmony_pct: snapshot.status.as_ref().map(|s| s.harmony_pct()),
                wellspring: snapshot.status.as_ref().map(|s| s.wellspring_value()),
                snapshot: &snapshot,
            };
            Ok::<_, Rejection>(warp::reply::json(&view))
        });

    let scores = warp::path!("proposals" / "scores")
        .and(with_state(state.clone()))
        .and_then(|state: DashboardState| async move {
            let snapshot = state.snapshot.read().await;
            let scores = proposal_scores(&snapshot, &state.aggregator, &state.api_base_url);
            Ok::<_, Rejection>(warp::reply::json(&scores))
        });

    let metrics = warp::path("metrics")
        .and(warp::path::end())
        .and(with_state(state))
        .and_then(|state: DashboardState| async move {
            let reply = match state.metrics.encode() {
                Ok(text) => warp::reply::with_status(text, StatusCode::OK),
                Err(e) => {
                    tracing::error!("Failed to encode metrics: {}", e);
                    warp::reply::with_status(String::new(), StatusCode::INTERNAL_SERVER_ERROR)
                }
            };
            Ok::<_, Rejection>(warp::reply::with_header(
                reply,
                "content-type",
                "text/plain; version=0.0.4",
            ))
        });

    warp::get().and(health.or(snapshot).or(scores).or(metrics))
}

pub async fn serve(state: DashboardState, port: u16) {
    tracing::info!("📊 Dashboard endpoint listening on port {}", port);
    warp::serve(routes(state)).run(([0, 0, 0, 0], port)).await;
}
