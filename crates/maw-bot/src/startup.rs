//! Startup-fatal failures and their process exit codes.
//!
//! Anything that goes wrong before the bot is ready ends the process. Each
//! failure class gets its own exit code so supervisors can tell them apart.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration: {0:#}")]
    Config(anyhow::Error),

    #[error("narrative table: {0:#}")]
    Narratives(anyhow::Error),

    #[error("gateway client: {0}")]
    Gateway(#[from] serenity::Error),

    #[error("entity store unreachable: {0}")]
    Store(#[from] maw_store::Error),
}

impl StartupError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 10,
            Self::Narratives(_) => 11,
            Self::Gateway(_) => 14,
            Self::Store(_) => 16,
        }
    }
}
