use prometheus::{Encoder, IntCounter, Opts, Registry, TextEncoder};
use std::sync::Arc;

#[derive(Clone)]
pub struct SearchMetrics {
    pub scans_started: IntCounter,
    pub scans_completed: IntCounter,
    pub items_matched: IntCounter,
    pub stale_events_dropped: IntCounter,
    pub sync_fallbacks: IntCounter,
    registry: Arc<Registry>,
}

impl Default for SearchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();
        let scans_started = counter("scans_started", "Number of search scans started");
        let scans_completed = counter("scans_completed", "Number of search scans run to the end");
        let items_matched = counter("items_matched", "Number of guides, feeds and articles matched");
        let stale_events_dropped = counter(
            "stale_events_dropped",
            "Result events discarded because a newer search superseded them",
        );
        let sync_fallbacks = counter(
            "sync_fallbacks",
            "Scans run on the caller thread because the worker was unavailable",
        );

        registry.register(Box::new(scans_started.clone())).ok();
        registry.register(Box::new(scans_completed.clone())).ok();
        registry.register(Box::new(items_matched.clone())).ok();
        registry.register(Box::new(stale_events_dropped.clone())).ok();
        registry.register(Box::new(sync_fallbacks.clone())).ok();

        SearchMetrics {
            scans_started,
            scans_completed,
            items_matched,
            stale_events_dropped,
            sync_fallbacks,
            registry: Arc::new(registry),
        }
    }

    pub fn gather(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if encoder.encode(&metric_families, &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

fn counter(name: &str, help: &str) -> IntCounter {
    IntCounter::with_opts(Opts::new(name, help)).expect("valid counter options")
}
