//! Error types for the finance tracker core

use thiserror::Error;

/// Result type alias for tracker operations
pub type Result<T> = std::result::Result<T, TrackerError>;

#[derive(Error, Debug)]
pub enum TrackerError {

    // =============================
    // Record Errors
    // =============================

    /// Malformed form input, surfaced inline next to the field.
    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("Transaction not found: {0}")]
    NotFound(String),

    #[error("Snapshot persistence error: {0}")]
    Persistence(String),

    // =============================
    // Gateway Errors
    // =============================

    #[error("AI service not configured: {0}")]
    GatewayUnconfigured(String),

    #[error("AI service error: {0}")]
    GatewayFailure(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl TrackerError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        TrackerError::Validation {
            field,
            message: message.into(),
        }
    }

    /// Whether the user can retry or fix the condition without restarting.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TrackerError::GatewayUnconfigured(_)
                | TrackerError::GatewayFailure(_)
                | TrackerError::HttpError(_)
        )
    }

    /// Text shown to the user in place of an AI response.
    pub fn user_message(&self) -> String {
        match self {
            TrackerError::GatewayUnconfigured(_) => {
                "API Key not configured. Please add your Gemini API key.".to_string()
            }
            TrackerError::GatewayFailure(_) | TrackerError::HttpError(_) => {
                "Sorry, I'm having trouble connecting. Please try again later.".to_string()
            }
            TrackerError::InvalidInput(message) => message.clone(),
            TrackerError::Validation { field, message } => format!("{}: {}", field, message),
            other => other.to_string(),
        }
    }

    /// Text shown in place of a financial summary. Only remote failures differ
    /// from `user_message`.
    pub fn summary_message(&self) -> String {
        match self {
            TrackerError::GatewayFailure(_) | TrackerError::HttpError(_) => {
                "Sorry, I couldn't generate a summary at this moment.".to_string()
            }
            other => other.user_message(),
        }
    }
}
