//! Batch conflicts-of-interest check over all submitted entities.
//!
//! The oracle is asked for a report object. A reply that contains any `[`
//! is read as a bare conflicts array (extracted with
//! [`extract_json_array`]); otherwise it is read as the report object.
//! Object replies that list their conflicts inline therefore go down the
//! array path and are interpreted through that list alone.

use crate::error::{ConcordError, Result};
use crate::oracle::extract::{extract_json_array, extract_json_object};
use crate::oracle::{Oracle, SamplingParams};
use crate::types::{
    ConflictItem, ConflictSeverity, ConflictsReport, InputEntity, ReconciliationResult, RiskLevel,
};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::Deserialize;
use std::sync::Arc;

pub const CONFLICTS_MAX_TOKENS: u32 = 1500;

/// Report fields the oracle is trusted to supply. `generatedAt` is always
/// stamped locally.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OracleReport {
    has_conflicts: bool,
    #[serde(default)]
    conflicts: Vec<ConflictItem>,
    risk_level: RiskLevel,
}

pub struct ConflictsChecker {
    oracle: Arc<dyn Oracle>,
    params: SamplingParams,
}

impl ConflictsChecker {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self {
            oracle,
            params: SamplingParams::new(crate::matcher::ORACLE_TEMPERATURE, CONFLICTS_MAX_TOKENS),
        }
    }

    pub fn with_params(mut self, params: SamplingParams) -> Self {
        self.params = params;
        self
    }

    /// Never fails; any oracle problem yields a clear report.
    pub async fn check(
        &self,
        entities: &[InputEntity],
        results: &[ReconciliationResult],
    ) -> ConflictsReport {
        debug!(
            "Checking conflicts across {} entities ({} reconciled)",
            entities.len(),
            results.len()
        );

        match self.oracle_report(entities).await {
            Ok(report) => report,
            Err(e) => {
                warn!("Conflicts check via '{}' failed: {}", self.oracle.name(), e);
                ConflictsReport::clear(Utc::now())
            }
        }
    }

    /// The report is stamped once the oracle has replied.
    async fn oracle_report(&self, entities: &[InputEntity]) -> Result<ConflictsReport> {
        let prompt = build_conflicts_prompt(entities)?;
        let reply = self.oracle.complete(&prompt, self.params).await?;
        parse_conflicts_reply(&reply, Utc::now())
    }
}

pub fn build_conflicts_prompt(entities: &[InputEntity]) -> Result<String> {
    let names: Vec<&str> = entities.iter().map(|e| e.name.as_str()).collect();
    let names = serde_json::to_string_pretty(&names)?;

    Ok(format!(
        r#"You are a legal conflicts checking system. Analyze these entities for potential conflicts of interest:

Entities being checked:
{names}

Check for:
1. Direct conflicts (representing opposing parties in same matter)
2. Positional conflicts (conflicting business interests)
3. Prior representation conflicts
4. Business relationship conflicts

Return ONLY valid JSON in this format:
{{
  "hasConflicts": false,
  "conflicts": [],
  "riskLevel": "none"
}}

If conflicts are found, include them in the conflicts array with:
- conflictType
- description
- affectedParties (array of names)
- severity ("critical", "high", "medium", "low")
- recommendedAction
"#
    ))
}

/// Parse a raw reply into a report stamped with `now`.
pub fn parse_conflicts_reply(reply: &str, now: DateTime<Utc>) -> Result<ConflictsReport> {
    if reply.contains('[') {
        let json = extract_json_array(reply)
            .ok_or_else(|| ConcordError::OracleMalformedReply("No JSON array in conflicts reply".into()))?;
        let conflicts: Vec<ConflictItem> = serde_json::from_str(json)
            .map_err(|e| ConcordError::OracleMalformedReply(format!("Invalid conflicts array: {}", e)))?;
        return Ok(report_from_items(conflicts, now));
    }

    let trimmed = reply.trim();
    let report: OracleReport = match serde_json::from_str(trimmed) {
        Ok(report) => report,
        Err(_) => {
            let json = extract_json_object(reply).ok_or_else(|| {
                ConcordError::OracleMalformedReply("No JSON object in conflicts reply".into())
            })?;
            serde_json::from_str(json)
                .map_err(|e| ConcordError::OracleMalformedReply(format!("Invalid conflicts report: {}", e)))?
        }
    };

    Ok(ConflictsReport {
        has_conflicts: report.has_conflicts,
        conflicts: report.conflicts,
        risk_level: report.risk_level,
        generated_at: now,
    })
}

fn report_from_items(conflicts: Vec<ConflictItem>, now: DateTime<Utc>) -> ConflictsReport {
    let risk_level = conflicts
        .iter()
        .map(|c| severity_risk(c.severity))
        .max_by_key(|r| risk_rank(*r))
        .unwrap_or(RiskLevel::None);

    ConflictsReport {
        has_conflicts: !conflicts.is_empty(),
        conflicts,
        risk_level,
        generated_at: now,
    }
}

fn severity_risk(severity: ConflictSeverity) -> RiskLevel {
    match severity {
        ConflictSeverity::Critical => RiskLevel::Critical,
        ConflictSeverity::High => RiskLevel::High,
        ConflictSeverity::Medium => RiskLevel::Medium,
        ConflictSeverity::Low => RiskLevel::Low,
    }
}

fn risk_rank(level: RiskLevel) -> u8 {
    match level {
        RiskLevel::None => 0,
        RiskLevel::Low => 1,
        RiskLevel::Medium => 2,
        RiskLevel::High => 3,
        RiskLevel::Critical => 4,
    }
}
