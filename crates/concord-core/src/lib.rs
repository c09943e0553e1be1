pub mod types;
pub mod error;
pub mod similarity;
pub mod store;
pub mod oracle;
pub mod matcher;
pub mod reconcile;
pub mod conflicts;
pub mod orchestrator;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use error::{ConcordError, Result};
pub use types::*;
pub use store::{
    CandidateGateway, EntityStore, RedbEntityStore, CURRENT_SCHEMA_VERSION, DEFAULT_FETCH_LIMIT,
};
pub use oracle::{AnthropicOracle, AnthropicOracleConfig, DisabledOracle, Oracle, SamplingParams};
pub use matcher::{fallback_matches, MatchOracleAdapter};
pub use reconcile::ReconciliationEngine;
pub use conflicts::ConflictsChecker;
pub use orchestrator::{normalize_threshold, RequestOrchestrator, DEFAULT_THRESHOLD};
