//! Bulk loading of candidate entities from JSON, JSONL and CSV.

use crate::error::{ConcordError, Result};
use crate::types::{CandidateEntity, EntityType};
use serde::Deserialize;
use std::io::{BufRead, Read};
use std::path::Path;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Json,
    Jsonl,
    Csv,
}

impl ImportFormat {
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "json" => Ok(ImportFormat::Json),
            "jsonl" | "ndjson" => Ok(ImportFormat::Jsonl),
            "csv" => Ok(ImportFormat::Csv),
            other => Err(ConcordError::Validation(format!("Unknown format: {}", other))),
        }
    }

    /// Guess from the file extension, defaulting to JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("jsonl") | Some("ndjson") => ImportFormat::Jsonl,
            Some("csv") => ImportFormat::Csv,
            _ => ImportFormat::Json,
        }
    }
}

pub fn read_entities<R: BufRead>(reader: R, format: ImportFormat) -> Result<Vec<CandidateEntity>> {
    match format {
        ImportFormat::Json => parse_json(reader),
        ImportFormat::Jsonl => parse_jsonl(reader),
        ImportFormat::Csv => parse_csv(reader),
    }
}

/// A single JSON array of entities.
pub fn parse_json<R: Read>(reader: R) -> Result<Vec<CandidateEntity>> {
    Ok(serde_json::from_reader(reader)?)
}

/// One entity per line; blank lines are skipped.
pub fn parse_jsonl<R: BufRead>(reader: R) -> Result<Vec<CandidateEntity>> {
    let mut entities = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| ConcordError::Validation(format!("Read error: {}", e)))?;
        if line.trim().is_empty() {
            continue;
        }
        let entity = serde_json::from_str(&line).map_err(|e| {
            ConcordError::Validation(format!("Line {}: {}", lineno + 1, e))
        })?;
        entities.push(entity);
    }
    Ok(entities)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CsvRow {
    #[serde(default)]
    id: String,
    name: String,
    #[serde(default)]
    entity_type: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    last_modified: Option<String>,
    #[serde(default)]
    created_by: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Header: `id,name,entityType,email,phone,lastModified,createdBy`.
/// Only `name` is required.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<CandidateEntity>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut entities = Vec::new();
    for row in rdr.deserialize::<CsvRow>() {
        let row = row?;
        let mut entity = CandidateEntity::new(
            row.id,
            row.name,
            non_empty(row.entity_type).map(EntityType::new).unwrap_or_default(),
        );
        entity.email = non_empty(row.email);
        entity.phone = non_empty(row.phone);
        entity.last_modified = non_empty(row.last_modified);
        entity.created_by = non_empty(row.created_by);
        entities.push(entity);
    }
    Ok(entities)
}

/// Give every entity with a blank id a fresh time-ordered one.
/// Returns how many ids were assigned.
pub fn assign_missing_ids(entities: &mut [CandidateEntity]) -> usize {
    let mut assigned = 0;
    for entity in entities.iter_mut().filter(|e| e.id.trim().is_empty()) {
        entity.id = Uuid::now_v7().to_string();
        assigned += 1;
    }
    assigned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv() {
        let data = "id,name,entityType,email,phone,lastModified,createdBy\n\
                    CLI-010,Acme Ltd,client,legal@acme.test,,2024-01-02T00:00:00Z,importer\n\
                    OPP-010, Widget Co ,opposing_party,,,,\n";
        let entities = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].email.as_deref(), Some("legal@acme.test"));
        assert_eq!(entities[0].phone, None);
        assert_eq!(entities[0].created_by.as_deref(), Some("importer"));
        assert_eq!(entities[1].name, "Widget Co");
        assert_eq!(entities[1].entity_type, EntityType::opposing_party());
    }

    #[test]
    fn test_parse_csv_without_optional_columns() {
        let data = "id,name\nC-1,Solo Name\n";
        let entities = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(entities[0].entity_type, EntityType::client());
    }

    #[test]
    fn test_parse_jsonl_skips_blank_lines() {
        let data = "{\"id\":\"A\",\"name\":\"Alpha\"}\n\n{\"id\":\"B\",\"name\":\"Beta\",\"entityType\":\"contact\",\"region\":\"EU\"}\n";
        let entities = parse_jsonl(data.as_bytes()).unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[1].entity_type, EntityType::contact());
        assert_eq!(entities[1].extra["region"], "EU");
    }

    #[test]
    fn test_parse_jsonl_reports_line() {
        let data = "{\"id\":\"A\",\"name\":\"Alpha\"}\nnot json\n";
        let err = parse_jsonl(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Line 2"));
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(ImportFormat::from_path(Path::new("x.csv")), ImportFormat::Csv);
        assert_eq!(ImportFormat::from_path(Path::new("x.ndjson")), ImportFormat::Jsonl);
        assert_eq!(ImportFormat::from_path(Path::new("x")), ImportFormat::Json);
        assert!(ImportFormat::parse("xml").is_err());
    }

    #[test]
    fn test_assign_missing_ids() {
        let data = "id,name\n,First\nKEEP-1,Second\n  ,Third\n";
        let mut entities = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(assign_missing_ids(&mut entities), 2);
        assert_eq!(entities[1].id, "KEEP-1");
        assert!(Uuid::parse_str(&entities[0].id).is_ok());
        assert_ne!(entities[0].id, entities[2].id);
    }
}
