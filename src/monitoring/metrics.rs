use anyhow::Result;
use prometheus::{Encoder, Gauge, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::api::FetchOutcome;

/// Sync loop counters, kept in a private registry so tests can build as
/// many instances as they like.
pub struct SyncMetrics {
    registry: Registry,
    pub cycles_total: IntCounter,
    pub cycles_suppressed: IntCounter,
    pub fetch_outcomes: IntCounterVec,
    pub backend_online: IntGauge,
    pub system_entropy: Gauge,
}

impl SyncMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new_custom(Some("supernova".to_string()), None)?;

        let cycles_total = IntCounter::new("sync_cycles_total", "Sync cycles started")?;
        let cycles_suppressed = IntCounter::new(
            "sync_cycles_suppressed_total",
            "Sync cycles whose update was dropped",
        )?;
        let fetch_outcomes = IntCounterVec::new(
            Opts::new("fetch_outcomes_total", "Fetch results by resource and outcome"),
            &["resource", "outcome"],
        )?;
        let backend_online = IntGauge::new("backend_online", "1 when the last health probe succeeded")?;
        let system_entropy = Gauge::new("system_entropy", "Most recent system entropy reading")?;

        registry.register(Box::new(cycles_total.clone()))?;
        registry.register(Box::new(cycles_suppressed.clone()))?;
        registry.register(Box::new(fetch_outcomes.clone()))?;
        registry.register(Box::new(backend_online.clone()))?;
        registry.register(Box::new(system_entropy.clone()))?;

        Ok(Self {
            registry,
            cycles_total,
            cycles_suppressed,
            fetch_outcomes,
            backend_online,
            system_entropy,
        })
    }

    pub fn observe_fetch(&self, resource: &str, outcome: FetchOutcome) {
        self.fetch_outcomes
            .with_label_values(&[resource, outcome.as_str()])
            .inc();
    }

    pub fn set_online(&self, online: bool) {
        self.backend_online.set(i64::from(online));
    }

    pub fn fetch_count(&self, resource: &str, outcome: FetchOutcome) -> u64 {
        self.fetch_outcomes
            .with_label_values(&[resource, outcome.as_str()])
            .get()
    }

    /// Prometheus text exposition of every metric in the registry.
    pub fn encode(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_and_encoding() {
        let metrics = SyncMetrics::new().unwrap();
        metrics.cycles_total.inc();
        metrics.observe_fetch("status", FetchOutcome::Fallback);
        metrics.observe_fetch("status", FetchOutcome::Fallback);
        metrics.set_online(true);
        metrics.system_entropy.set(1150.5);

        assert_eq!(metrics.fetch_count("status", FetchOutcome::Fallback), 2);
        assert_eq!(metrics.fetch_count("status", FetchOutcome::Live), 0);

        let text = metrics.encode().unwrap();
        assert!(text.contains("supernova_sync_cycles_total 1"));
        assert!(text.contains("supernova_backend_online 1"));
        assert!(text
            .lines()
            .any(|l| l.starts_with("supernova_fetch_outcomes_total{")
                && l.contains(r#"outcome="fallback""#)
                && l.ends_with(" 2")));
    }

    #[test]
    fn test_instances_are_independent() {
        let a = SyncMetrics::new().unwrap();
        let b = SyncMetrics::new().unwrap();
        a.cycles_suppressed.inc();
        assert_eq!(a.cycles_suppressed.get(), 1);
        assert_eq!(b.cycles_suppressed.get(), 0);
    }
}
