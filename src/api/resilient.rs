//! Uniform degradation for read paths.
//!
//! Every read goes through [`resilient`], which turns a fallible fetch into a
//! [`Fetched`] value: the live payload, a fallback payload when the failure
//! is recoverable and the caller has one, or the error itself.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::warn;

use super::error::{ClientError, ClientResult};
use super::types::{
    GraphData, GraphMetrics, MetricValues, NetworkLink, NetworkNode, NodeType, SystemMetrics,
};

#[derive(Debug)]
pub enum Fetched<T> {
    Live(T),
    Fallback(T),
    Failed(ClientError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchOutcome {
    Live,
    Fallback,
    Failed,
}

impl FetchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchOutcome::Live => "live",
            FetchOutcome::Fallback => "fallback",
            FetchOutcome::Failed => "failed",
        }
    }
}

impl<T> Fetched<T> {
    pub fn outcome(&self) -> FetchOutcome {
        match self {
            Fetched::Live(_) => FetchOutcome::Live,
            Fetched::Fallback(_) => FetchOutcome::Fallback,
            Fetched::Failed(_) => FetchOutcome::Failed,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Fetched::Live(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Fetched::Live(value) | Fetched::Fallback(value) => Some(value),
            Fetched::Failed(_) => None,
        }
    }

    /// The payload with the outcome that produced it, or the error that
    /// got past the fallback.
    pub fn into_result(self) -> ClientResult<(T, FetchOutcome)> {
        match self {
            Fetched::Live(value) => Ok((value, FetchOutcome::Live)),
            Fetched::Fallback(value) => Ok((value, FetchOutcome::Fallback)),
            Fetched::Failed(err) => Err(err),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Fetched<U> {
        match self {
            Fetched::Live(value) => Fetched::Live(f(value)),
            Fetched::Fallback(value) => Fetched::Fallback(f(value)),
            Fetched::Failed(err) => Fetched::Failed(err),
        }
    }
}

pub async fn resilient<T, Fut, F>(resource: &str, fetch: Fut, fallback: F) -> Fetched<T>
where
    Fut: Future<Output = ClientResult<T>>,
    F: FnOnce() -> Option<T>,
{
    match fetch.await {
        Ok(value) => Fetched::Live(value),
        Err(err) if err.is_recoverable() => match fallback() {
            Some(value) => {
                warn!(resource, error = %err, "Fetch degraded to fallback");
                Fetched::Fallback(value)
            }
            None => Fetched::Failed(err),
        },
        Err(err) => Fetched::Failed(err),
    }
}

pub fn simulated_metrics() -> SystemMetrics {
    SystemMetrics {
        status: "simulation".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        metrics: MetricValues {
            total_harmonizers: 1042,
            total_vibenodes: 8503,
            community_wellspring: "54200.50".to_string(),
            current_system_entropy: 1150.5,
        },
        mission: "To create order and meaning from chaos through collective resonance."
            .to_string(),
    }
}

const SIMULATED_NODES: usize = 15;
const SIMULATED_EDGES: usize = 20;

/// A fixed 15-node, 20-edge graph. Values are spread deterministically so
/// repeated fallbacks render the same picture.
pub fn simulated_graph() -> GraphData {
    let nodes = (0..SIMULATED_NODES)
        .map(|i| NetworkNode {
            id: format!("sim_node_{}", i),
            label: format!("Resonance Node {}", i),
            node_type: if i % 3 == 0 {
                NodeType::Harmonizer
            } else {
                NodeType::Vibenode
            },
            degree_centrality: Some((i as f64 * 0.37).fract()),
            echo: Some(((i * 7) % 10) as f64),
        })
        .collect();

    let edges = (0..SIMULATED_EDGES)
        .map(|i| NetworkLink {
            source: format!("sim_node_{}", (i * 7) % SIMULATED_NODES),
            target: format!("sim_node_{}", (i * 11 + 3) % SIMULATED_NODES),
            link_type: "entangled".to_string(),
            strength: Some(((i * 13) % 10) as f64 / 10.0),
        })
        .collect();

    GraphData {
        nodes,
        edges,
        metrics: GraphMetrics {
            node_count: SIMULATED_NODES,
            edge_count: SIMULATED_EDGES,
            density: 0.1,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network_error() -> ClientError {
        ClientError::Network {
            endpoint: "/status".to_string(),
            message: "connection refused".to_string(),
        }
    }

    #[tokio::test]
    async fn test_live_value_passes_through() {
        let fetched = resilient("status", async { Ok::<_, ClientError>(5) }, || Some(0)).await;
        assert!(fetched.is_live());
        assert_eq!(fetched.value(), Some(&5));
    }

    #[tokio::test]
    async fn test_recoverable_error_uses_fallback() {
        let fetched = resilient("status", async { Err::<u32, _>(network_error()) }, || Some(7)).await;
        assert_eq!(fetched.outcome(), FetchOutcome::Fallback);
        assert_eq!(fetched.into_result().unwrap(), (7, FetchOutcome::Fallback));
    }

    #[tokio::test]
    async fn test_recoverable_error_without_fallback_fails() {
        let fetched = resilient("status", async { Err::<u32, _>(network_error()) }, || None).await;
        assert_eq!(fetched.outcome(), FetchOutcome::Failed);
    }

    #[tokio::test]
    async fn test_unauthorized_skips_fallback() {
        let fetched = resilient(
            "proposals",
            async { Err::<Vec<u32>, _>(ClientError::Unauthorized) },
            || Some(Vec::new()),
        )
        .await;
        assert!(matches!(fetched, Fetched::Failed(ClientError::Unauthorized)));
    }

    #[test]
    fn test_simulated_graph_shape() {
        let graph = simulated_graph();
        assert_eq!(graph.nodes.len(), 15);
        assert_eq!(graph.edges.len(), 20);
        assert!(graph.edges.iter().all(|e| graph.nodes.iter().any(|n| n.id == e.source)));
        assert!(!graph.vibenodes().is_empty());
        assert!(simulated_metrics().is_simulated());
    }
}
