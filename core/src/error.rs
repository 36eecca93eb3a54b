use thiserror::Error;

/// Input problems caught before any network call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a complaint text")]
    EmptyComplaintText,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },
}

#[derive(Error, Debug)]
pub enum DeskError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("API error ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Api { status: u16, message: Option<String> },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("A {action} request is already in flight")]
    Busy { action: &'static str },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DeskError {
    /// Text shown inline next to the form that triggered the failure.
    ///
    /// Validation errors carry their own wording, server errors use the
    /// server-provided `error` field, everything else falls back to a
    /// generic "<action> failed" line.
    pub fn inline_message(&self, action: &str) -> String {
        match self {
            DeskError::Validation(v) => v.to_string(),
            DeskError::Api { message: Some(m), .. } if !m.trim().is_empty() => m.clone(),
            _ => format!("{action} failed. Please try again."),
        }
    }
}

pub type DeskResult<T> = Result<T, DeskError>;
