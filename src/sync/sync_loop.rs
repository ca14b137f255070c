use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::snapshot::{EntropyPoint, SharedSnapshot, SnapshotSources, SyncSnapshot};
use crate::api::resilient::{resilient, simulated_graph, simulated_metrics, Fetched};
use crate::api::{ClientError, DashboardApi, ProposalQuery};
use crate::core::config::SyncConfig;
use crate::core::{Component, HealthChecker};
use crate::monitoring::metrics::SyncMetrics;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleReport {
    Applied {
        cycle: u64,
        online: bool,
        sources: SnapshotSources,
    },
    /// A fetch failed in a way no fallback covers; the previous snapshot stays.
    Suppressed { cycle: u64, reason: String },
    /// A newer cycle already landed.
    Stale { cycle: u64 },
}

pub struct SyncLoop {
    api: Arc<dyn DashboardApi>,
    state: SharedSnapshot,
    health: HealthChecker,
    metrics: Arc<SyncMetrics>,
    config: SyncConfig,
    cycles: AtomicU64,
}

impl SyncLoop {
    pub fn new(
        api: Arc<dyn DashboardApi>,
        health: HealthChecker,
        metrics: Arc<SyncMetrics>,
        config: SyncConfig,
    ) -> Self {
        Self {
            api,
            state: Arc::new(RwLock::new(SyncSnapshot::empty(config.history_capacity))),
            health,
            metrics,
            config,
            cycles: AtomicU64::new(0),
        }
    }

    pub fn snapshot_handle(&self) -> SharedSnapshot {
        self.state.clone()
    }

    pub async fn snapshot(&self) -> SyncSnapshot {
        self.state.read().await.clone()
    }

    /// Probe, fetch the four slices concurrently, then swap in the new
    /// snapshot. Each slice falls back to its previous value, or to
    /// simulated data before the first successful sync.
    pub async fn run_cycle(&self) -> CycleReport {
        let cycle = self.cycles.fetch_add(1, Ordering::SeqCst) + 1;
        self.metrics.cycles_total.inc();

        let online = self.api.check_health().await;
        self.metrics.set_online(online);
        self.health.update_component(Component::Backend, online).await;
        if !online {
            tracing::warn!(cycle, "⚠️  Backend unreachable, serving cached or simulated data");
        }

        let previous = self.snapshot().await;
        let limit = self.config.network_limit;
        let query = ProposalQuery::default();

        let (status, graph, feed, proposals) = futures::join!(
            resilient("status", self.api.fetch_status(), || {
                Some(previous.status.clone().unwrap_or_else(simulated_metrics))
            }),
            resilient("graph", self.api.fetch_network(limit), || {
                Some(previous.graph.clone().unwrap_or_else(simulated_graph))
            }),
            resilient("feed", self.api.fetch_vibenodes(limit), || {
                Some(previous.feed.clone())
            }),
            resilient("proposals", self.api.fetch_proposals(&query), || {
                Some(previous.proposals.clone())
            }),
        );

        let sources = SnapshotSources {
            status: status.outcome(),
            graph: graph.outcome(),
            feed: feed.outcome(),
            proposals: proposals.outcome(),
        };
        self.metrics.observe_fetch("status", sources.status);
        self.metrics.observe_fetch("graph", sources.graph);
        self.metrics.observe_fetch("feed", sources.feed);
        self.metrics.observe_fetch("proposals", sources.proposals);

        let fetched = (|| -> Result<_, ClientError> {
            Ok((
                take(status)?,
                take(graph)?,
                take(feed)?,
                take(proposals)?,
            ))
        })();

        let (status, graph, feed, proposals) = match fetched {
            Ok(slices) => slices,
            Err(e) => {
                tracing::error!(cycle, "❌ Sync cycle suppressed: {}", e);
                self.metrics.cycles_suppressed.inc();
                self.health.update_component(Component::Sync, false).await;
                return CycleReport::Suppressed {
                    cycle,
                    reason: e.to_string(),
                };
            }
        };

        let entropy = status.metrics.current_system_entropy;
        {
            let mut state = self.state.write().await;
            if state.cycle > cycle {
                tracing::debug!(cycle, newest = state.cycle, "Discarding stale sync result");
                return CycleReport::Stale { cycle };
            }

            let mut history = std::mem::take(&mut state.history);
            history.push(EntropyPoint::now(entropy));

            *state = SyncSnapshot {
                cycle,
                fetched_at: Some(Utc::now()),
                online,
                status: Some(status),
                graph: Some(graph),
                feed,
                proposals,
                history,
                sources: Some(sources),
            };
        }

        self.metrics.system_entropy.set(entropy);
        self.health.update_component(Component::Sync, true).await;
        tracing::debug!(
            cycle,
            online,
            live = sources.all_live(),
            "Sync cycle applied"
        );

        CycleReport::Applied {
            cycle,
            online,
            sources,
        }
    }

    /// Runs one cycle immediately and then one per interval until the
    /// returned handle is stopped. Cycles never overlap.
    pub fn spawn(self: Arc<Self>) -> SyncHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let interval_secs = self.config.interval_secs.max(1);

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        self.run_cycle().await;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            tracing::info!("Sync loop stopped");
        });

        tracing::info!("✅ Sync loop started (every {}s)", interval_secs);
        SyncHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

fn take<T>(fetched: Fetched<T>) -> Result<T, ClientError> {
    fetched.into_result().map(|(value, _)| value)
}

pub struct SyncHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::error!("Sync loop task failed: {}", e);
        }
    }
}
