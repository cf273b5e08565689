use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    turns_total: AtomicU64,
    classifier_fallback_total: AtomicU64,
    provider_fallback_total: AtomicU64,
    plans_generated_total: AtomicU64,
    search_cache_hits_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub turns_total: u64,
    pub classifier_fallback_total: u64,
    pub provider_fallback_total: u64,
    pub plans_generated_total: u64,
    pub search_cache_hits_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_turn(&self) {
        self.turns_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_classifier_fallback(&self) {
        self.classifier_fallback_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_provider_fallback(&self) {
        self.provider_fallback_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_plan_generated(&self) {
        self.plans_generated_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_search_cache_hit(&self) {
        self.search_cache_hits_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let turns = self.turns_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            turns_total: turns,
            classifier_fallback_total: self.classifier_fallback_total.load(Ordering::Relaxed),
            provider_fallback_total: self.provider_fallback_total.load(Ordering::Relaxed),
            plans_generated_total: self.plans_generated_total.load(Ordering::Relaxed),
            search_cache_hits_total: self.search_cache_hits_total.load(Ordering::Relaxed),
            avg_latency_millis: if turns == 0 {
                0.0
            } else {
                latency as f64 / turns as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,voyage_api=info,voyage_agents=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .init();
    });
}
