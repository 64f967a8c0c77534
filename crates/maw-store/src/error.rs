//! Error types for maw-store

use maw_types::StatsError;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for entity store operations
#[derive(Debug, Error)]
pub enum Error {
    #[error("NATS error: {0}")]
    Nats(#[from] async_nats::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("KV error: {0}")]
    Kv(String),

    #[error("Invalid stats: {0}")]
    InvalidStats(#[from] StatsError),

    #[error("Write conflict on '{0}' persisted after retries")]
    Conflict(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_display() {
        let err = Error::Connection("refused".to_string());
        assert_eq!(err.to_string(), "Connection error: refused");
    }

    #[test]
    fn test_kv_error_display() {
        let err = Error::Kv("bucket not found".to_string());
        assert_eq!(err.to_string(), "KV error: bucket not found");
    }

    #[test]
    fn test_from_stats_error() {
        let stats_err = StatsError {
            stat: "health",
            value: 200,
            min: -1,
            max: 115,
        };
        let err: Error = stats_err.into();
        assert_eq!(
            err.to_string(),
            "Invalid stats: health = 200 is outside [-1, 115]"
        );
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err: serde_json::Error = serde_json::from_str::<i32>("not_a_number").unwrap_err();
        let err: Error = json_err.into();
        assert!(err.to_string().starts_with("Serialization error:"));
    }
}
