use crate::types::{CandidateEntity, EntityType};

/// Built-in candidates served when the store cannot be read.
///
/// Stamped with the requested type so downstream enrichment stays coherent.
pub fn sample_entities(entity_type: &EntityType) -> Vec<CandidateEntity> {
    vec![
        CandidateEntity::new("CLI-001", "John E. Smith", entity_type.clone())
            .with_email("jsmith@example.com")
            .with_phone("+1-555-0101")
            .with_last_modified("2024-11-15T10:30:00Z"),
        CandidateEntity::new("CLI-002", "Jane Smith LLC", entity_type.clone())
            .with_email("jane.smith@smithllc.com")
            .with_phone("+1-555-0102")
            .with_last_modified("2024-10-20T14:15:00Z"),
        CandidateEntity::new("CLI-003", "ABC Corporation", entity_type.clone())
            .with_email("legal@abccorp.com")
            .with_phone("+1-555-0103")
            .with_last_modified("2024-09-05T09:00:00Z"),
        CandidateEntity::new("CLI-004", "Robert Johnson", entity_type.clone())
            .with_email("rjohnson@email.com")
            .with_last_modified("2024-08-12T16:45:00Z"),
    ]
}
