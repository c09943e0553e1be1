use crate::store::sample::sample_entities;
use crate::store::traits::EntityStore;
use crate::types::{CandidateEntity, EntityType};
use log::{debug, warn};
use std::sync::Arc;

pub const DEFAULT_FETCH_LIMIT: usize = 100;

/// Read side of the candidate store as seen by the reconciliation engine.
///
/// Never fails: a store error is answered with the built-in sample set
/// (or nothing, when `sample_on_error` is off). An empty result means
/// "no prior entities".
#[derive(Clone)]
pub struct CandidateGateway {
    store: Option<Arc<dyn EntityStore>>,
    limit: usize,
    sample_on_error: bool,
}

impl CandidateGateway {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            store: Some(store),
            limit: DEFAULT_FETCH_LIMIT,
            sample_on_error: true,
        }
    }

    /// Gateway with no backing store; every fetch takes the degraded path.
    pub fn unavailable() -> Self {
        Self {
            store: None,
            limit: DEFAULT_FETCH_LIMIT,
            sample_on_error: true,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_sample_on_error(mut self, enabled: bool) -> Self {
        self.sample_on_error = enabled;
        self
    }

    /// Candidates of `entity_type`, at most the configured limit.
    pub fn fetch(&self, entity_type: &EntityType) -> Vec<CandidateEntity> {
        self.fetch_with_limit(entity_type, self.limit)
    }

    pub fn fetch_with_limit(&self, entity_type: &EntityType, limit: usize) -> Vec<CandidateEntity> {
        let result = match &self.store {
            Some(store) => store.list_by_type(entity_type, limit),
            None => {
                debug!("No entity store configured, using degraded candidate set");
                return self.degraded(entity_type);
            }
        };

        match result {
            Ok(entities) => {
                debug!("Fetched {} '{}' candidates", entities.len(), entity_type);
                entities
            }
            Err(e) => {
                warn!("Error fetching '{}' entities: {}", entity_type, e);
                self.degraded(entity_type)
            }
        }
    }

    fn degraded(&self, entity_type: &EntityType) -> Vec<CandidateEntity> {
        if self.sample_on_error {
            sample_entities(entity_type)
        } else {
            Vec::new()
        }
    }
}
