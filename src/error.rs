use thiserror::Error;

/// Failures surfaced by the record and workbook stores.
///
/// Validation problems are not errors: they come back as
/// [`crate::validation::ValidationErrors`] values.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{what} not found")]
    NotFound { what: String },

    #[error("invalid record identifier {0:?}")]
    InvalidIdentifier(String),

    /// I/O or parse failure; the chain carries the file involved.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl StoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        StoreError::NotFound { what: what.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
