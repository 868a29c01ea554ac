use thiserror::Error;

/// Failures surfaced by roster operations.
#[derive(Debug, Error)]
pub enum RosterError {
    /// Rejected locally, no request was sent.
    #[error("{0}")]
    Validation(String),
    #[error("server replied {status}: {message}")]
    Server { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl RosterError {
    /// Text shown to the user in toasts and alerts.
    pub fn user_message(&self) -> String {
        match self {
            RosterError::Validation(msg) => msg.clone(),
            RosterError::Server { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RosterError>;
