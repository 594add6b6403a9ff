//! Failure taxonomy for the entity store.

use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} '{id}' already exists")]
    Duplicate { entity: &'static str, id: String },

    #[error("invalid cursor '{0}'")]
    InvalidCursor(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::Duplicate { .. } => StatusCode::CONFLICT,
            StoreError::InvalidCursor(_) => StatusCode::BAD_REQUEST,
            StoreError::Database(_) | StoreError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}
