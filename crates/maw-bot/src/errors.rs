//! Discord-specific error handling for the bot.
//!
//! Converts serenity errors into structured `ErrorOutcome`s and decides which
//! failures are benign interaction races that should be suppressed.

use std::time::Duration;

use maw_types::errors::{is_suppressed_message, DiscordErrorCode, ErrorCategory};
use serenity::http::HttpError;
use tracing::{debug, error, warn};

/// Structured view of a failed Discord API call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub code: DiscordErrorCode,
    pub category: ErrorCategory,
    pub message: String,
    pub raw_discord_code: u32,
    pub http_status: u16,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{:?}/{:?} code={} status={}] {}",
            self.category, self.code, self.raw_discord_code, self.http_status, self.message
        )
    }
}

/// Result of handling a Discord API error.
#[derive(Debug)]
pub enum ErrorOutcome {
    /// Retry the operation after this duration (rate limit / overload).
    Retry(Duration),
    /// Permanent failure; do not retry.
    Permanent(ApiError),
    /// Non-permanent failure; log and continue.
    Transient(ApiError),
}

/// Classify a serenity `Error` and return the appropriate `ErrorOutcome`.
pub fn classify(context: &str, err: &serenity::Error) -> ErrorOutcome {
    match err {
        serenity::Error::Http(http_err) => classify_http(context, http_err),
        _ => {
            debug!("Non-HTTP serenity error on '{}': {}", context, err);
            ErrorOutcome::Transient(make_error(DiscordErrorCode::NetworkError, &err.to_string(), 0, 0))
        }
    }
}

/// Log a pre-classified `ErrorOutcome` at the appropriate level.
pub fn log_outcome(context: &str, outcome: &ErrorOutcome) {
    match outcome {
        ErrorOutcome::Permanent(e) if e.code.is_suppressed() => {
            debug!("{}: {}", context, e);
        }
        ErrorOutcome::Permanent(e) => {
            error!("{}: {}", context, e);
        }
        ErrorOutcome::Transient(e) => {
            warn!("{}: {}", context, e);
        }
        ErrorOutcome::Retry(dur) => {
            warn!("{}: rate limited, retry after {:?}", context, dur);
        }
    }
}

/// True when `err` is a known-benign interaction race: a double
/// acknowledgement, an expired interaction or a message deleted under us.
///
/// Checks Discord error codes on any serenity error in the chain, then falls
/// back to matching the rendered message.
pub fn is_suppressed(err: &anyhow::Error) -> bool {
    let by_code = err.chain().any(|cause| {
        cause
            .downcast_ref::<serenity::Error>()
            .is_some_and(|e| match classify("suppression check", e) {
                ErrorOutcome::Permanent(api) | ErrorOutcome::Transient(api) => api.code.is_suppressed(),
                ErrorOutcome::Retry(_) => false,
            })
    });
    by_code || is_suppressed_message(&format!("{err:#}"))
}

fn classify_http(context: &str, http_err: &HttpError) -> ErrorOutcome {
    match http_err {
        HttpError::UnsuccessfulRequest(resp) => {
            let status = resp.status_code.as_u16();

            if status == 429 {
                // Serenity's ratelimiter already waited; this is the leftover.
                return ErrorOutcome::Retry(Duration::from_secs(1));
            }

            let raw_code = resp.error.code as u32;
            let code = DiscordErrorCode::from_raw(raw_code);
            let api = make_error(code, &resp.error.message, raw_code, status);

            if code.is_permanent() {
                ErrorOutcome::Permanent(api)
            } else if code.is_retryable() {
                debug!(
                    "Retryable Discord error on '{}' (HTTP {} / code {})",
                    context, status, raw_code
                );
                ErrorOutcome::Retry(Duration::from_secs(5))
            } else {
                ErrorOutcome::Transient(api)
            }
        }
        _ => ErrorOutcome::Transient(make_error(
            DiscordErrorCode::NetworkError,
            &http_err.to_string(),
            0,
            0,
        )),
    }
}

fn make_error(code: DiscordErrorCode, message: &str, raw_discord_code: u32, http_status: u16) -> ApiError {
    ApiError {
        code,
        category: code.category(),
        message: message.to_string(),
        raw_discord_code,
        http_status,
    }
}
