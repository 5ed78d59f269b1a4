use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GorevError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Remote store error: {0}")]
    Remote(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{message}")]
    Auth { message: String },
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl GorevError {
    pub fn to_error_code(&self) -> &'static str {
        match self {
            GorevError::Database(_) => "DATABASE_ERROR",
            GorevError::Io(_) => "IO_ERROR",
            GorevError::Remote(_) => "REMOTE_ERROR",
            GorevError::Json(_) => "JSON_ERROR",
            GorevError::InvalidInput(_) => "INVALID_INPUT",
            GorevError::Auth { .. } => "AUTH_FAILED",
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
            code: self.to_error_code().to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GorevError>;
