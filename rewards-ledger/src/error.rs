//! Error types for the ledger

use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Timestamp is not valid RFC 3339
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Negative adjustment would drive a payer below zero
    #[error("Insufficient points for {payer}: balance {balance}, adjustment {requested}")]
    InsufficientPoints {
        /// Payer the adjustment was for
        payer: String,
        /// Balance at the time of the request
        balance: i64,
        /// Requested (negative) adjustment
        requested: i64,
    },

    /// Redemption exceeds the total available across all payers
    #[error("Not enough points: requested {requested}, available {available}")]
    InsufficientTotalPoints {
        /// Points requested
        requested: i64,
        /// Points available across every payer
        available: i64,
    },

    /// Required request field absent
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Malformed or semantically invalid input
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),
}

impl Error {
    /// Short message shown to API consumers
    pub fn public_message(&self) -> String {
        match self {
            Error::InvalidTimestamp(_) => "Invalid timestamp".to_string(),
            Error::InsufficientPoints { .. } => {
                "Insufficient points to apply transaction".to_string()
            }
            Error::InsufficientTotalPoints { .. } => "Not enough points".to_string(),
            Error::MissingField(_) => "Missing required parameters".to_string(),
            Error::InvalidRequest(msg) => format!("Invalid request: {}", msg),
            other => other.to_string(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_messages() {
        assert_eq!(
            Error::InvalidTimestamp("x".into()).public_message(),
            "Invalid timestamp"
        );
        assert_eq!(
            Error::InsufficientTotalPoints { requested: 10, available: 5 }.public_message(),
            "Not enough points"
        );
        assert_eq!(
            Error::MissingField("payer").public_message(),
            "Missing required parameters"
        );
        assert_eq!(
            Error::InvalidRequest("negative".into()).public_message(),
            "Invalid request: negative"
        );
    }
}
