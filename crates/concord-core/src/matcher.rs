//! Match oracle adapter: turns an input name and a candidate list into a
//! ranked list of scored matches.
//!
//! The oracle sees at most [`ORACLE_CANDIDATE_LIMIT`] candidates. When it
//! cannot be reached or its reply does not validate, the whole call is
//! answered by the deterministic scorer instead, which only considers the
//! first [`FALLBACK_CANDIDATE_LIMIT`] candidates. The two caps differ on
//! purpose and are kept that way.

use crate::error::{ConcordError, Result};
use crate::oracle::extract::extract_json_array;
use crate::oracle::{Oracle, SamplingParams};
use crate::similarity;
use crate::types::{CandidateEntity, EntityType, ScoredMatch, SuggestedAction};
use log::{debug, warn};
use serde_json::Value;
use std::fmt::Write as _;
use std::sync::Arc;

/// Candidates included in the oracle prompt (token budget).
pub const ORACLE_CANDIDATE_LIMIT: usize = 20;

/// Candidates scored by the fallback path.
pub const FALLBACK_CANDIDATE_LIMIT: usize = 10;

/// Fallback matches scoring below this are discarded.
pub const FALLBACK_MIN_SCORE: u8 = 60;

/// Fallback matches at or above this suggest `merge`.
pub const FALLBACK_MERGE_SCORE: u8 = 90;

pub const MATCH_MAX_TOKENS: u32 = 2000;
pub const ORACLE_TEMPERATURE: f32 = 0.1;

/// One entry of the oracle's reply after validation, before enrichment.
#[derive(Debug, Clone, PartialEq)]
struct OracleMatch {
    existing_id: String,
    existing_name: Option<String>,
    match_score: u8,
    match_reason: String,
    suggested_action: SuggestedAction,
}

pub struct MatchOracleAdapter {
    oracle: Arc<dyn Oracle>,
    params: SamplingParams,
}

impl MatchOracleAdapter {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self {
            oracle,
            params: SamplingParams::new(ORACLE_TEMPERATURE, MATCH_MAX_TOKENS),
        }
    }

    pub fn with_params(mut self, params: SamplingParams) -> Self {
        self.params = params;
        self
    }

    /// Ranked matches for `input_name`, highest score first. Never fails.
    pub async fn match_candidates(
        &self,
        input_name: &str,
        candidates: &[CandidateEntity],
        entity_type: &EntityType,
    ) -> Vec<ScoredMatch> {
        match self.oracle_matches(input_name, candidates, entity_type).await {
            Ok(matches) => matches,
            Err(e) => {
                warn!(
                    "Oracle '{}' matching failed for '{}', using string similarity: {}",
                    self.oracle.name(),
                    input_name,
                    e
                );
                fallback_matches(input_name, candidates, entity_type)
            }
        }
    }

    async fn oracle_matches(
        &self,
        input_name: &str,
        candidates: &[CandidateEntity],
        entity_type: &EntityType,
    ) -> Result<Vec<ScoredMatch>> {
        let shortlist = &candidates[..candidates.len().min(ORACLE_CANDIDATE_LIMIT)];
        let prompt = build_match_prompt(input_name, shortlist, entity_type);
        let reply = self.oracle.complete(&prompt, self.params).await?;
        let parsed = parse_match_reply(&reply)?;
        Ok(enrich(parsed, candidates, entity_type))
    }
}

/// Prompt asking the oracle to score `candidates` against `input_name`.
pub fn build_match_prompt(
    input_name: &str,
    candidates: &[CandidateEntity],
    entity_type: &EntityType,
) -> String {
    let mut listing = String::new();
    for (i, candidate) in candidates.iter().enumerate() {
        let name = if candidate.name.is_empty() { "Unknown" } else { &candidate.name };
        let _ = writeln!(listing, "{}. {} (ID: {})", i + 1, name, candidate.id);
    }

    let quoted_name = serde_json::to_string(input_name).unwrap_or_else(|_| format!("\"{}\"", input_name));

    format!(
        r#"You are a legal entity name matching system. Decide whether the input name refers to any of the existing entities listed below. Consider:

1. Exact matches, ignoring case and punctuation
2. Spelling variants and typos
3. Nicknames and abbreviations (e.g. "Bob" for "Robert", "ABC Corp" for "ABC Corporation")
4. Name order differences (e.g. "Smith, John" and "John Smith")
5. Middle names and initials
6. Equivalent corporate suffixes (LLC, Inc, Ltd, Corp, ...)
7. Phonetic similarity

Input name: {quoted_name}
Entity type: {entity_type}

Existing entities:
{listing}
For every entity that could plausibly be the same as the input name, give a match score from 0 to 100, a short reason, and a suggested action (merge, create_new or review).

Respond with ONLY a JSON array, no markdown and no commentary, in exactly this form:
[
  {{
    "existingId": "entity id",
    "existingName": "entity name",
    "matchScore": 95,
    "matchReason": "same name, different capitalization",
    "suggestedAction": "merge"
  }}
]

If nothing matches, respond with an empty array: []

Score bands:
- 95-100: nearly identical (merge)
- 80-94: very similar (merge likely, review recommended)
- 60-79: moderately similar (review required)
- below 60: weak match (probably different entities)
"#
    )
}

/// Validate the oracle's reply. Any schema violation rejects the whole reply.
fn parse_match_reply(reply: &str) -> Result<Vec<OracleMatch>> {
    let array_text = extract_json_array(reply)
        .ok_or_else(|| ConcordError::OracleMalformedReply("No JSON array in reply".into()))?;

    let items: Vec<Value> = serde_json::from_str(array_text)
        .map_err(|e| ConcordError::OracleMalformedReply(format!("Invalid JSON array: {}", e)))?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| parse_match_item(item).map_err(|reason| {
            ConcordError::OracleMalformedReply(format!("Match {}: {}", i, reason))
        }))
        .collect()
}

fn parse_match_item(item: &Value) -> std::result::Result<OracleMatch, String> {
    let obj = item.as_object().ok_or("not an object")?;

    let existing_id = obj
        .get("existingId")
        .and_then(Value::as_str)
        .ok_or("missing string existingId")?
        .to_string();

    let raw_score = obj
        .get("matchScore")
        .and_then(Value::as_f64)
        .ok_or("missing numeric matchScore")?;
    if !raw_score.is_finite() {
        return Err("matchScore is not finite".into());
    }

    let text = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);

    Ok(OracleMatch {
        existing_id,
        existing_name: text("existingName"),
        match_score: raw_score.round().clamp(0.0, 100.0) as u8,
        match_reason: text("matchReason").unwrap_or_default(),
        suggested_action: text("suggestedAction")
            .map(|a| SuggestedAction::parse_lenient(&a))
            .unwrap_or(SuggestedAction::Review),
    })
}

/// Attach candidate details; drop ids that name no known candidate.
fn enrich(
    parsed: Vec<OracleMatch>,
    candidates: &[CandidateEntity],
    entity_type: &EntityType,
) -> Vec<ScoredMatch> {
    let mut matches: Vec<ScoredMatch> = parsed
        .into_iter()
        .filter_map(|m| {
            let Some(candidate) = candidates.iter().find(|c| c.id == m.existing_id) else {
                debug!("Dropping oracle match for unknown id '{}'", m.existing_id);
                return None;
            };
            Some(ScoredMatch {
                existing_name: m.existing_name.unwrap_or_else(|| candidate.name.clone()),
                existing_id: m.existing_id,
                match_score: m.match_score,
                match_reason: m.match_reason,
                suggested_action: m.suggested_action,
                entity_type: entity_type.clone(),
                additional_data: candidate.additional_data(),
            })
        })
        .collect();

    sort_by_score(&mut matches);
    matches
}

/// Deterministic matching over the first [`FALLBACK_CANDIDATE_LIMIT`] candidates.
pub fn fallback_matches(
    input_name: &str,
    candidates: &[CandidateEntity],
    entity_type: &EntityType,
) -> Vec<ScoredMatch> {
    let mut matches: Vec<ScoredMatch> = candidates
        .iter()
        .take(FALLBACK_CANDIDATE_LIMIT)
        .filter_map(|candidate| {
            let score = similarity::score(input_name, &candidate.name);
            if score < FALLBACK_MIN_SCORE {
                return None;
            }
            Some(ScoredMatch {
                existing_id: candidate.id.clone(),
                existing_name: candidate.name.clone(),
                match_score: score,
                match_reason: format!("String similarity: {}%", score),
                suggested_action: if score >= FALLBACK_MERGE_SCORE {
                    SuggestedAction::Merge
                } else {
                    SuggestedAction::Review
                },
                entity_type: entity_type.clone(),
                additional_data: candidate.additional_data(),
            })
        })
        .collect();

    sort_by_score(&mut matches);
    matches
}

// Stable: equal scores keep their incoming order.
fn sort_by_score(matches: &mut [ScoredMatch]) {
    matches.sort_by(|a, b| b.match_score.cmp(&a.match_score));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::DisabledOracle;
    use crate::store::sample_entities;
    use crate::testing::ScriptedOracle;

    fn candidates() -> Vec<CandidateEntity> {
        sample_entities(&EntityType::client())
    }

    fn numbered(n: usize) -> Vec<CandidateEntity> {
        (0..n)
            .map(|i| CandidateEntity::new(format!("N-{:02}", i), "Acme Holdings", EntityType::client()))
            .collect()
    }

    #[tokio::test]
    async fn test_oracle_reply_in_prose_is_enriched_and_sorted() {
        let reply = r#"Sure! Here is the analysis:
[
  {"existingId": "CLI-002", "existingName": "Jane Smith LLC", "matchScore": 72, "matchReason": "shared surname", "suggestedAction": "review"},
  {"existingId": "CLI-001", "existingName": "John E. Smith", "matchScore": 96, "matchReason": "middle initial", "suggestedAction": "merge"}
]
Hope this helps."#;
        let oracle = Arc::new(ScriptedOracle::replying(reply));
        let adapter = MatchOracleAdapter::new(oracle.clone());

        let matches = adapter
            .match_candidates("John Smith", &candidates(), &EntityType::client())
            .await;

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].existing_id, "CLI-001");
        assert_eq!(matches[0].match_score, 96);
        assert_eq!(matches[0].suggested_action, SuggestedAction::Merge);
        assert_eq!(matches[0].entity_type, EntityType::client());
        assert_eq!(matches[0].additional_data.email.as_deref(), Some("jsmith@example.com"));
        assert_eq!(matches[0].additional_data.last_modified.as_deref(), Some("2024-11-15T10:30:00Z"));
        assert_eq!(matches[1].existing_id, "CLI-002");
        assert_eq!(oracle.calls(), 1);
    }

    #[tokio::test]
    async fn test_hallucinated_ids_are_dropped() {
        let reply = r#"[{"existingId": "CLI-999", "existingName": "Ghost", "matchScore": 99, "matchReason": "", "suggestedAction": "merge"},
                        {"existingId": "CLI-003", "matchScore": 88}]"#;
        let adapter = MatchOracleAdapter::new(Arc::new(ScriptedOracle::replying(reply)));

        let matches = adapter
            .match_candidates("ABC Corp", &candidates(), &EntityType::client())
            .await;

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].existing_id, "CLI-003");
        // Missing optional fields get defaults
        assert_eq!(matches[0].existing_name, "ABC Corporation");
        assert_eq!(matches[0].match_reason, "");
        assert_eq!(matches[0].suggested_action, SuggestedAction::Review);
    }

    #[tokio::test]
    async fn test_empty_array_means_no_matches() {
        let adapter = MatchOracleAdapter::new(Arc::new(ScriptedOracle::replying("[]")));
        let matches = adapter
            .match_candidates("John Smith", &candidates(), &EntityType::client())
            .await;
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn test_scores_are_clamped_and_rounded() {
        let reply = r#"[{"existingId": "CLI-001", "matchScore": 140}, {"existingId": "CLI-004", "matchScore": 61.6}]"#;
        let adapter = MatchOracleAdapter::new(Arc::new(ScriptedOracle::replying(reply)));
        let matches = adapter
            .match_candidates("x", &candidates(), &EntityType::client())
            .await;
        assert_eq!(matches[0].match_score, 100);
        assert_eq!(matches[1].match_score, 62);
    }

    #[tokio::test]
    async fn test_reply_without_array_falls_back() {
        let _ = env_logger::builder().is_test(true).try_init();
        let adapter = MatchOracleAdapter::new(Arc::new(ScriptedOracle::replying(
            "I could not find any matches.",
        )));
        let matches = adapter
            .match_candidates("john smith", &candidates(), &EntityType::client())
            .await;

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].existing_id, "CLI-001");
        assert_eq!(matches[0].match_score, 80);
        assert_eq!(matches[0].match_reason, "String similarity: 80%");
    }

    #[tokio::test]
    async fn test_schema_violation_falls_back() {
        let reply = r#"[{"existingId": "CLI-001", "matchScore": "high"}]"#;
        let adapter = MatchOracleAdapter::new(Arc::new(ScriptedOracle::replying(reply)));
        let matches = adapter
            .match_candidates("ABC Corporation", &candidates(), &EntityType::client())
            .await;

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].existing_id, "CLI-003");
        assert_eq!(matches[0].match_score, 100);
        assert_eq!(matches[0].suggested_action, SuggestedAction::Merge);
    }

    #[tokio::test]
    async fn test_unreachable_oracle_falls_back() {
        let adapter = MatchOracleAdapter::new(Arc::new(DisabledOracle));
        let matches = adapter
            .match_candidates("Jane Smith", &candidates(), &EntityType::client())
            .await;
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].existing_id, "CLI-002");
        assert_eq!(matches[0].match_score, 85);
        assert_eq!(matches[0].suggested_action, SuggestedAction::Review);
    }

    #[tokio::test]
    async fn test_prompt_holds_at_most_twenty_candidates() {
        let oracle = Arc::new(ScriptedOracle::replying("[]"));
        let adapter = MatchOracleAdapter::new(oracle.clone());
        adapter
            .match_candidates("Acme", &numbered(25), &EntityType::client())
            .await;

        let prompt = oracle.last_prompt().unwrap();
        assert!(prompt.contains("(ID: N-19)"));
        assert!(!prompt.contains("(ID: N-20)"));
        assert_eq!(oracle.last_params().unwrap().max_tokens, MATCH_MAX_TOKENS);
    }

    #[tokio::test]
    async fn test_enrichment_resolves_ids_beyond_prompt_window() {
        let reply = r#"[{"existingId": "N-22", "matchScore": 91}]"#;
        let adapter = MatchOracleAdapter::new(Arc::new(ScriptedOracle::replying(reply)));
        let matches = adapter
            .match_candidates("Acme", &numbered(25), &EntityType::client())
            .await;
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].existing_id, "N-22");
    }

    #[test]
    fn test_fallback_caps_at_ten_and_filters_weak_scores() {
        let mut pool = numbered(15);
        pool.insert(3, CandidateEntity::new("WEAK", "Zeta Partners", EntityType::client()));

        let matches = fallback_matches("Acme Holdings", &pool, &EntityType::client());
        assert_eq!(matches.len(), 9);
        assert!(matches.iter().all(|m| m.match_score >= FALLBACK_MIN_SCORE));
        assert!(matches.iter().all(|m| m.existing_id != "WEAK"));
        // Only the first ten candidates are considered
        assert!(matches.iter().all(|m| m.existing_id.as_str() < "N-09"));
    }

    #[test]
    fn test_fallback_orders_by_score() {
        let pool = vec![
            CandidateEntity::new("A", "Smith Jones Partners", EntityType::client()),
            CandidateEntity::new("B", "Smith Jones", EntityType::client()),
            CandidateEntity::new("C", "smith jones", EntityType::client()),
        ];
        let matches = fallback_matches("Smith Jones", &pool, &EntityType::contact());
        let ids: Vec<_> = matches.iter().map(|m| m.existing_id.as_str()).collect();
        assert_eq!(ids, vec!["B", "C", "A"]);
        assert_eq!(matches[2].match_score, 85);
        assert!(matches.iter().all(|m| m.entity_type == EntityType::contact()));
    }

    #[test]
    fn test_prompt_mentions_matching_rules() {
        let prompt = build_match_prompt("O'Brien \"Mac\"", &candidates(), &EntityType::client());
        assert!(prompt.contains(r#"Input name: "O'Brien \"Mac\"""#));
        assert!(prompt.contains("1. John E. Smith (ID: CLI-001)"));
        assert!(prompt.contains("Entity type: client"));
        assert!(prompt.contains("95-100"));
        assert!(prompt.contains("empty array: []"));
    }
}
