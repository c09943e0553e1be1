use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConcordError>;

#[derive(Debug, Error)]
pub enum ConcordError {
    #[error("Storage error: {0}")]
    Storage(#[from] redb::Error),

    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Storage operation error: {0}")]
    StorageOperation(#[from] redb::StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Oracle unavailable: {0}")]
    OracleUnavailable(String),

    #[error("Malformed oracle reply: {0}")]
    OracleMalformedReply(String),

    #[error("No entities provided")]
    EmptyInput,

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ConcordError {
    /// Errors the caller caused and should not retry.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ConcordError::EmptyInput | ConcordError::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(ConcordError::EmptyInput.is_client_error());
        assert!(ConcordError::Validation("bad".into()).is_client_error());
        assert!(!ConcordError::OracleUnavailable("down".into()).is_client_error());
        assert!(!ConcordError::OracleMalformedReply("junk".into()).is_client_error());
    }

    #[test]
    fn test_empty_input_message() {
        assert_eq!(ConcordError::EmptyInput.to_string(), "No entities provided");
    }
}
