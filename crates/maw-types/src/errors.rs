//! Discord API error codes the bot reacts to.

use serde::{Deserialize, Serialize};

/// Messages of known-benign interaction races. Errors carrying these are
/// routed to the low-visibility channel rather than the main report channel.
pub const SUPPRESSED_MESSAGES: [&str; 3] = [
    "Interaction has already been acknowledged",
    "Unknown interaction",
    "Unknown Message",
];

/// High-level category of a Discord API error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Rate limit hit, wait before retrying.
    RateLimit,
    /// Target resource (interaction, message, member …) not found.
    NotFound,
    /// Insufficient bot permissions for the requested action.
    PermissionDenied,
    /// The interaction was already answered.
    AlreadyAcknowledged,
    /// Malformed or semantically invalid input.
    InvalidInput,
    /// Network or I/O error (transient).
    Network,
    /// Unknown or uncategorised error.
    Unknown,
}

/// Discord JSON error code (subset relevant to interaction handling).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiscordErrorCode {
    /// 10003: Unknown channel.
    UnknownChannel,
    /// 10007: Unknown member (left the guild).
    UnknownMember,
    /// 10008: Unknown message (likely deleted).
    UnknownMessage,
    /// 10062: Unknown interaction (token expired).
    UnknownInteraction,
    /// 40060: Interaction has already been acknowledged.
    AlreadyAcknowledged,
    /// 50001: Missing access.
    MissingAccess,
    /// 50013: Missing permissions.
    MissingPermissions,
    /// HTTP 429: Global or per-route rate limit.
    RateLimited,
    /// 50035: Invalid form body (validation failed).
    InvalidFormBody,
    /// 130000: API resource overloaded.
    ApiOverloaded,
    /// Network or I/O error on the client side.
    NetworkError,
    /// Any Discord JSON error code not listed above.
    Unknown,
}

impl DiscordErrorCode {
    /// Derive the code from a raw Discord JSON error code integer.
    pub fn from_raw(code: u32) -> Self {
        match code {
            10003 => Self::UnknownChannel,
            10007 => Self::UnknownMember,
            10008 => Self::UnknownMessage,
            10062 => Self::UnknownInteraction,
            40060 => Self::AlreadyAcknowledged,
            50001 => Self::MissingAccess,
            50013 => Self::MissingPermissions,
            50035 => Self::InvalidFormBody,
            130000 => Self::ApiOverloaded,
            _ => Self::Unknown,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownChannel
            | Self::UnknownMember
            | Self::UnknownMessage
            | Self::UnknownInteraction => ErrorCategory::NotFound,
            Self::AlreadyAcknowledged => ErrorCategory::AlreadyAcknowledged,
            Self::MissingAccess | Self::MissingPermissions => ErrorCategory::PermissionDenied,
            Self::RateLimited => ErrorCategory::RateLimit,
            Self::InvalidFormBody => ErrorCategory::InvalidInput,
            Self::NetworkError => ErrorCategory::Network,
            Self::ApiOverloaded | Self::Unknown => ErrorCategory::Unknown,
        }
    }

    /// True if the operation should **not** be retried (the error is permanent).
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::UnknownChannel
                | Self::UnknownMember
                | Self::UnknownMessage
                | Self::UnknownInteraction
                | Self::AlreadyAcknowledged
                | Self::MissingAccess
                | Self::MissingPermissions
        )
    }

    /// True if retrying the operation after a delay is worthwhile.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::NetworkError | Self::ApiOverloaded
        )
    }

    /// Benign interaction races: double acknowledgement, expired
    /// interaction, message deleted under us.
    pub fn is_suppressed(&self) -> bool {
        matches!(
            self,
            Self::AlreadyAcknowledged | Self::UnknownInteraction | Self::UnknownMessage
        )
    }
}

/// True when an error message describes a benign interaction race
pub fn is_suppressed_message(message: &str) -> bool {
    SUPPRESSED_MESSAGES.iter().any(|m| message.contains(m))
}
