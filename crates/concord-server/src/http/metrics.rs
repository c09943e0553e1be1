use concord_core::{ConcordError, ReconciliationResponse};
use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::Histogram;
use prometheus_client::registry::Registry;
use std::time::Duration;

// ── Label types ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct OutcomeLabel {
    pub outcome: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RecommendationLabel {
    pub recommendation: String,
}

// ── Metrics registry ───────────────────────────────────────────────────────────

pub struct ConcordMetrics {
    pub registry: Registry,

    // Requests by outcome: ok | client_error | error
    pub requests: Family<OutcomeLabel, Counter>,
    pub entities: Counter,
    pub recommendations: Family<RecommendationLabel, Counter>,
    pub request_duration: Histogram,
}

impl ConcordMetrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let requests: Family<OutcomeLabel, Counter> = Family::default();
        registry.register(
            "concord_requests",
            "Reconciliation requests by outcome",
            requests.clone(),
        );

        let entities: Counter = Counter::default();
        registry.register(
            "concord_entities",
            "Input entities reconciled",
            entities.clone(),
        );

        let recommendations: Family<RecommendationLabel, Counter> = Family::default();
        registry.register(
            "concord_recommendations",
            "Reconciliation results by recommendation",
            recommendations.clone(),
        );

        let request_duration =
            Histogram::new([0.05_f64, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0].into_iter());
        registry.register(
            "concord_request_duration_seconds",
            "Reconciliation request duration in seconds",
            request_duration.clone(),
        );

        Self {
            registry,
            requests,
            entities,
            recommendations,
            request_duration,
        }
    }

    pub fn record_success(&self, response: &ReconciliationResponse, elapsed: Duration) {
        self.outcome("ok").inc();
        self.entities.inc_by(response.results.len() as u64);
        for result in &response.results {
            self.recommendations
                .get_or_create(&RecommendationLabel {
                    recommendation: result.recommendation.as_str().to_string(),
                })
                .inc();
        }
        self.request_duration.observe(elapsed.as_secs_f64());
    }

    pub fn record_failure(&self, error: &ConcordError) {
        let outcome = if error.is_client_error() { "client_error" } else { "error" };
        self.outcome(outcome).inc();
    }

    /// Requests rejected before reaching the orchestrator (bad JSON).
    pub fn record_rejected(&self) {
        self.outcome("client_error").inc();
    }

    fn outcome(&self, outcome: &str) -> Counter {
        self.requests
            .get_or_create(&OutcomeLabel {
                outcome: outcome.to_string(),
            })
            .clone()
    }

    /// Prometheus text exposition.
    pub fn render(&self) -> Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}

impl Default for ConcordMetrics {
    fn default() -> Self {
        Self::new()
    }
}
