//! Error handling for sales report ingestion
//!
//! Defines the classified import error returned by the pipeline and
//! establishes a unified Result type using anyhow for plumbing code.

use thiserror::Error;

/// Outcome classes of a failed import attempt
///
/// `Extraction` and `NoValidRecords` are raised before any database work.
/// `DuplicateKey` and `Persistence` are raised after the transaction has
/// already been rolled back.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("extraction error: {0}")]
    Extraction(String),

    #[error("no valid sale records were found in the report")]
    NoValidRecords,

    #[error("duplicate key in database: {0}")]
    DuplicateKey(String),

    #[error("failed to save import data: {0}")]
    Persistence(String),
}

impl ImportError {
    /// Only a uniqueness race is worth retrying unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, ImportError::DuplicateKey(_))
    }

    /// Classify a persistence-phase failure.
    ///
    /// Walks the error chain looking for a SQLite UNIQUE/PRIMARY KEY
    /// violation; anything else is a generic persistence error.
    pub fn from_persistence(err: anyhow::Error) -> Self {
        let unique_violation = err.chain().find_map(|cause| {
            match cause.downcast_ref::<rusqlite::Error>() {
                Some(rusqlite::Error::SqliteFailure(failure, detail))
                    if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                        || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
                {
                    Some(detail.clone().unwrap_or_else(|| failure.to_string()))
                }
                _ => None,
            }
        });

        match unique_violation {
            Some(detail) => ImportError::DuplicateKey(detail),
            None => ImportError::Persistence(format!("{:#}", err)),
        }
    }
}

/// Result type alias for plumbing code
pub type Result<T> = anyhow::Result<T>;
