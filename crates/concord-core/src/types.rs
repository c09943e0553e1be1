use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Entity category used to scope candidate lookups.
///
/// Open-ended: the well-known categories have constructors, but any
/// caller-supplied value is accepted and compared verbatim (after trimming).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct EntityType(String);

impl EntityType {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Self::client();
        }
        Self(trimmed.to_string())
    }

    pub fn client() -> Self {
        Self("client".to_string())
    }

    pub fn opposing_party() -> Self {
        Self("opposing_party".to_string())
    }

    pub fn contact() -> Self {
        Self("contact".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EntityType {
    fn default() -> Self {
        Self::client()
    }
}

impl From<String> for EntityType {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for EntityType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<EntityType> for String {
    fn from(value: EntityType) -> Self {
        value.0
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A name submitted for reconciliation.
///
/// Only `name` and `entityType` are interpreted; every other field the
/// caller sends is carried in `extra` and echoed back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputEntity {
    #[serde(default)]
    pub name: String,

    /// As submitted. Use [`InputEntity::entity_type`] for the normalised value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InputEntity {
    pub fn new(name: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            name: name.into(),
            entity_type: Some(entity_type.into()),
            extra: Map::new(),
        }
    }

    /// Category used for candidate lookup; a missing or blank value means `client`.
    pub fn entity_type(&self) -> EntityType {
        self.entity_type.as_deref().map(EntityType::new).unwrap_or_default()
    }

    /// Name with surrounding whitespace removed.
    pub fn trimmed_name(&self) -> &str {
        self.name.trim()
    }
}

/// A previously known entity, as held by the candidate store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateEntity {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub entity_type: EntityType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CandidateEntity {
    pub fn new(id: impl Into<String>, name: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            entity_type,
            email: None,
            phone: None,
            last_modified: None,
            created_by: None,
            extra: Map::new(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_last_modified(mut self, last_modified: impl Into<String>) -> Self {
        self.last_modified = Some(last_modified.into());
        self
    }

    pub fn with_created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = Some(created_by.into());
        self
    }

    pub fn additional_data(&self) -> AdditionalData {
        AdditionalData {
            email: self.email.clone(),
            phone: self.phone.clone(),
            last_modified: self.last_modified.clone(),
            created_by: self.created_by.clone(),
        }
    }
}

/// Contact details copied from the matched candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalData {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub last_modified: Option<String>,
    pub created_by: Option<String>,
}

/// What the matcher suggests doing with a single candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    Merge,
    CreateNew,
    Review,
}

impl SuggestedAction {
    /// Lenient parse for oracle output. Unknown values map to `Review`.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "merge" => SuggestedAction::Merge,
            "create_new" | "create-new" | "createnew" => SuggestedAction::CreateNew,
            _ => SuggestedAction::Review,
        }
    }
}

/// One candidate judged against an input name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredMatch {
    pub existing_id: String,
    pub existing_name: String,
    /// 0-100
    pub match_score: u8,
    pub match_reason: String,
    pub suggested_action: SuggestedAction,
    pub entity_type: EntityType,
    pub additional_data: AdditionalData,
}

/// Outcome for one input entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    CreateNew,
    UseExisting,
    NeedsReview,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::CreateNew => "create_new",
            Recommendation::UseExisting => "use_existing",
            Recommendation::NeedsReview => "needs_review",
        }
    }
}

/// `selected_match` is set iff `recommendation` is `UseExisting`, and is
/// then equal to `matches[0]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResult {
    pub input_entity: InputEntity,
    pub matches: Vec<ScoredMatch>,
    pub recommendation: Recommendation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_match: Option<ScoredMatch>,
}

impl ReconciliationResult {
    /// No usable candidates: recommend creating a new entity.
    pub fn create_new(input_entity: InputEntity) -> Self {
        Self {
            input_entity,
            matches: Vec::new(),
            recommendation: Recommendation::CreateNew,
            selected_match: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSeverity {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    None,
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictItem {
    /// direct, positional, prior_representation, business, ...
    pub conflict_type: String,
    pub description: String,
    /// Accepts a single string as well as a list.
    #[serde(default, deserialize_with = "one_or_many")]
    pub affected_parties: Vec<String>,
    pub severity: ConflictSeverity,
    #[serde(default)]
    pub recommended_action: String,
}

fn one_or_many<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(party)) if party.trim().is_empty() => Vec::new(),
        Some(OneOrMany::One(party)) => vec![party],
        Some(OneOrMany::Many(parties)) => parties,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictsReport {
    pub has_conflicts: bool,
    pub conflicts: Vec<ConflictItem>,
    pub risk_level: RiskLevel,
    #[serde(with = "utc_seconds")]
    pub generated_at: DateTime<Utc>,
}

impl ConflictsReport {
    /// The report returned when no conflicts analysis could be obtained.
    pub fn clear(generated_at: DateTime<Utc>) -> Self {
        Self {
            has_conflicts: false,
            conflicts: Vec::new(),
            risk_level: RiskLevel::None,
            generated_at,
        }
    }
}

/// Inbound request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationRequest {
    #[serde(default)]
    pub entities: Vec<InputEntity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_conflicts_check: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResponse {
    pub results: Vec<ReconciliationResult>,
    pub conflicts_report: Option<ConflictsReport>,
    /// Milliseconds.
    pub processing_time: u64,
}

/// `YYYY-MM-DDTHH:MM:SSZ`, no fractional seconds.
pub mod utc_seconds {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

    pub fn format(ts: &DateTime<Utc>) -> String {
        ts.format(FORMAT).to_string()
    }

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}
