use crate::matcher::MatchOracleAdapter;
use crate::store::CandidateGateway;
use crate::types::{InputEntity, ReconciliationResult, Recommendation, ScoredMatch};
use log::debug;

/// Top match score at which an existing entity is selected without review.
pub const USE_EXISTING_SCORE: u8 = 90;

/// Reconciles one input entity against the known candidates of its type.
pub struct ReconciliationEngine {
    gateway: CandidateGateway,
    matcher: MatchOracleAdapter,
}

impl ReconciliationEngine {
    pub fn new(gateway: CandidateGateway, matcher: MatchOracleAdapter) -> Self {
        Self { gateway, matcher }
    }

    /// Never fails; store and oracle problems only degrade match quality.
    pub async fn reconcile(&self, entity: &InputEntity, threshold: u8) -> ReconciliationResult {
        let name = entity.trimmed_name();
        if name.is_empty() {
            return ReconciliationResult::create_new(entity.clone());
        }

        let entity_type = entity.entity_type();
        let candidates = self.gateway.fetch(&entity_type);
        if candidates.is_empty() {
            debug!("No '{}' candidates for '{}'", entity_type, name);
            return ReconciliationResult::create_new(entity.clone());
        }

        let mut matches = self
            .matcher
            .match_candidates(name, &candidates, &entity_type)
            .await;
        matches.retain(|m| m.match_score >= threshold);

        let (recommendation, selected_match) = recommend(&matches);
        debug!(
            "'{}': {} matches >= {}, {}",
            name,
            matches.len(),
            threshold,
            recommendation.as_str()
        );

        ReconciliationResult {
            input_entity: entity.clone(),
            matches,
            recommendation,
            selected_match,
        }
    }
}

/// Recommendation for matches already filtered by threshold and sorted
/// highest score first.
pub fn recommend(filtered: &[ScoredMatch]) -> (Recommendation, Option<ScoredMatch>) {
    match filtered.first() {
        None => (Recommendation::CreateNew, None),
        Some(top) if top.match_score >= USE_EXISTING_SCORE => {
            (Recommendation::UseExisting, Some(top.clone()))
        }
        Some(_) => (Recommendation::NeedsReview, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::DisabledOracle;
    use crate::testing::{RecordingStore, ScriptedOracle};
    use crate::types::{CandidateEntity, EntityType};
    use std::sync::Arc;

    fn store() -> Arc<RecordingStore> {
        Arc::new(RecordingStore::with_entities(vec![
            CandidateEntity::new("CLI-001", "John E. Smith", EntityType::client())
                .with_email("jsmith@example.com"),
            CandidateEntity::new("CLI-002", "Jane Smith LLC", EntityType::client()),
            CandidateEntity::new("CLI-003", "ABC Corporation", EntityType::client()),
        ]))
    }

    fn engine(store: Arc<RecordingStore>, oracle: Arc<ScriptedOracle>) -> ReconciliationEngine {
        ReconciliationEngine::new(CandidateGateway::new(store), MatchOracleAdapter::new(oracle))
    }

    fn oracle_scoring(pairs: &[(&str, u8)]) -> Arc<ScriptedOracle> {
        let items: Vec<String> = pairs
            .iter()
            .map(|(id, score)| {
                format!(
                    r#"{{"existingId": "{}", "matchScore": {}, "matchReason": "test", "suggestedAction": "review"}}"#,
                    id, score
                )
            })
            .collect();
        Arc::new(ScriptedOracle::replying(format!("[{}]", items.join(","))))
    }

    #[tokio::test]
    async fn test_empty_name_short_circuits() {
        let store = store();
        let oracle = Arc::new(ScriptedOracle::replying("[]"));
        let engine = engine(store.clone(), oracle.clone());

        let result = engine
            .reconcile(&InputEntity::new("   ", EntityType::client()), 70)
            .await;

        assert_eq!(result.recommendation, Recommendation::CreateNew);
        assert!(result.matches.is_empty());
        assert!(result.selected_match.is_none());
        assert_eq!(store.list_calls(), 0);
        assert_eq!(oracle.calls(), 0);
    }

    #[tokio::test]
    async fn test_no_candidates_creates_new() {
        let store = store();
        let oracle = Arc::new(ScriptedOracle::replying("[]"));
        let engine = engine(store.clone(), oracle.clone());

        let result = engine
            .reconcile(&InputEntity::new("Acme", EntityType::opposing_party()), 70)
            .await;

        assert_eq!(result.recommendation, Recommendation::CreateNew);
        assert!(result.matches.is_empty());
        assert_eq!(store.list_calls(), 1);
        assert_eq!(oracle.calls(), 0);
    }

    #[tokio::test]
    async fn test_high_score_uses_existing() {
        let engine = engine(store(), oracle_scoring(&[("CLI-002", 75), ("CLI-001", 92)]));

        let result = engine
            .reconcile(&InputEntity::new("John Smith", EntityType::client()), 70)
            .await;

        assert_eq!(result.recommendation, Recommendation::UseExisting);
        let selected = result.selected_match.as_ref().unwrap();
        assert_eq!(selected.match_score, 92);
        assert_eq!(selected, &result.matches[0]);
        assert_eq!(result.matches.len(), 2);
    }

    #[tokio::test]
    async fn test_mid_score_needs_review() {
        let engine = engine(store(), oracle_scoring(&[("CLI-001", 75)]));

        let result = engine
            .reconcile(&InputEntity::new("Jon Smyth", EntityType::client()), 70)
            .await;

        assert_eq!(result.recommendation, Recommendation::NeedsReview);
        assert!(result.selected_match.is_none());
        assert_eq!(result.matches.len(), 1);
    }

    #[tokio::test]
    async fn test_all_below_threshold_creates_new() {
        let engine = engine(store(), oracle_scoring(&[("CLI-001", 65), ("CLI-002", 50)]));

        let result = engine
            .reconcile(&InputEntity::new("J. Smith", EntityType::client()), 70)
            .await;

        assert_eq!(result.recommendation, Recommendation::CreateNew);
        assert!(result.matches.is_empty());
        assert!(result.selected_match.is_none());
    }

    #[tokio::test]
    async fn test_threshold_is_inclusive() {
        let engine = engine(store(), oracle_scoring(&[("CLI-003", 70)]));
        let result = engine
            .reconcile(&InputEntity::new("ABC Co", EntityType::client()), 70)
            .await;
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.recommendation, Recommendation::NeedsReview);
    }

    #[tokio::test]
    async fn test_fallback_scoring_without_oracle() {
        let engine = ReconciliationEngine::new(
            CandidateGateway::new(store()),
            MatchOracleAdapter::new(Arc::new(DisabledOracle)),
        );

        let result = engine
            .reconcile(&InputEntity::new("john smith", EntityType::client()), 70)
            .await;

        assert_eq!(result.recommendation, Recommendation::NeedsReview);
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].existing_id, "CLI-001");
        assert_eq!(result.matches[0].match_score, 80);
    }

    #[tokio::test]
    async fn test_input_entity_echoed_with_original_name() {
        let engine = engine(store(), oracle_scoring(&[]));
        let entity = InputEntity::new("  Padded Name  ", EntityType::client());
        let result = engine.reconcile(&entity, 70).await;
        assert_eq!(result.input_entity, entity);
    }

    #[test]
    fn test_recommend_boundaries() {
        let make = |score: u8| ScoredMatch {
            existing_id: "X".into(),
            existing_name: "X".into(),
            match_score: score,
            match_reason: String::new(),
            suggested_action: crate::types::SuggestedAction::Review,
            entity_type: EntityType::client(),
            additional_data: Default::default(),
        };

        assert_eq!(recommend(&[]).0, Recommendation::CreateNew);
        assert_eq!(recommend(&[make(90)]).0, Recommendation::UseExisting);
        assert_eq!(recommend(&[make(89)]).0, Recommendation::NeedsReview);
        assert!(recommend(&[make(89)]).1.is_none());
    }
}
