use crate::conflicts::ConflictsChecker;
use crate::error::{ConcordError, Result};
use crate::reconcile::ReconciliationEngine;
use crate::types::{ReconciliationRequest, ReconciliationResponse};
use futures::stream::{self, StreamExt};
use log::info;
use std::time::Instant;

pub const DEFAULT_THRESHOLD: u8 = 70;

/// Clamp a caller-supplied threshold into `0..=100`.
pub fn normalize_threshold(threshold: Option<i64>, default: u8) -> u8 {
    threshold
        .map(|t| t.clamp(0, 100) as u8)
        .unwrap_or(default.min(100))
}

/// Runs a whole request: per-entity reconciliation plus the optional
/// conflicts check.
pub struct RequestOrchestrator {
    engine: ReconciliationEngine,
    conflicts: ConflictsChecker,
    concurrency: usize,
    default_threshold: u8,
}

impl RequestOrchestrator {
    pub fn new(engine: ReconciliationEngine, conflicts: ConflictsChecker) -> Self {
        Self {
            engine,
            conflicts,
            concurrency: 1,
            default_threshold: DEFAULT_THRESHOLD,
        }
    }

    /// Threshold for requests that do not carry one.
    pub fn with_default_threshold(mut self, threshold: u8) -> Self {
        self.default_threshold = threshold;
        self
    }

    /// Entities reconciled at once. Results keep input order regardless.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub async fn handle(&self, request: ReconciliationRequest) -> Result<ReconciliationResponse> {
        if request.entities.is_empty() {
            return Err(ConcordError::EmptyInput);
        }

        let start = Instant::now();
        let threshold = normalize_threshold(request.threshold, self.default_threshold);
        let entities = request.entities;

        // Owned entities: borrowed ones make the handler future non-`Send`.
        let results: Vec<_> = stream::iter(entities.iter().cloned())
            .map(|entity| async move { self.engine.reconcile(&entity, threshold).await })
            .buffered(self.concurrency)
            .collect()
            .await;

        let conflicts_report = if request.include_conflicts_check.unwrap_or(false) {
            Some(self.conflicts.check(&entities, &results).await)
        } else {
            None
        };

        let processing_time = start.elapsed().as_millis() as u64;
        info!(
            "Reconciled {} entities (threshold {}) in {}ms",
            results.len(),
            threshold,
            processing_time
        );

        Ok(ReconciliationResponse {
            results,
            conflicts_report,
            processing_time,
        })
    }
}
