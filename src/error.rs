use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Issue {0} not found")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, StoreError::InvalidInput(_))
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
