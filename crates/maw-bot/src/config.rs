//! Configuration management for maw-bot

#[path = "config_tests.rs"]
mod config_tests;

use std::fs;
use std::time::Duration;

use anyhow::{Context, Result};
use maw_store::NatsConfig;
use serde::{Deserialize, Serialize};

/// Complete bot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub discord: DiscordBotConfig,
    #[serde(default)]
    pub nats: NatsConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub recovery: RecoveryConfig,
    /// JSON file mapping narrative categories to templates
    #[serde(default = "default_narratives_path")]
    pub narratives_path: String,
}

/// Discord bot specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordBotConfig {
    /// Bot token from the Discord developer portal
    #[serde(default)]
    pub bot_token: String,
    /// Channel receiving handler failures and timeouts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_channel_id: Option<u64>,
    /// Channel receiving suppressed, known-benign errors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppress_channel_id: Option<u64>,
    /// Reject interactions from direct messages
    #[serde(default = "default_true")]
    pub guild_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds a handler has to reply before the timeout notice
    #[serde(default = "default_ack_timeout_secs")]
    pub ack_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ack_timeout_secs: default_ack_timeout_secs(),
        }
    }
}

impl EngineConfig {
    pub fn ack_timeout(&self) -> Duration {
        Duration::from_secs(self.ack_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// How long a relationship must sit untouched before its prey heals
    #[serde(default = "default_idle_threshold_secs")]
    pub idle_threshold_secs: u64,
    /// Relationships processed in parallel within one sweep
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            idle_threshold_secs: default_idle_threshold_secs(),
            concurrency: default_concurrency(),
        }
    }
}

impl RecoveryConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn idle_threshold(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.idle_threshold_secs as i64)
    }
}

/// Source of environment variables, injectable for tests
pub trait ReadEnv {
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads the real process environment
pub struct SystemEnv;

impl ReadEnv for SystemEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_env_impl(&SystemEnv)
    }

    pub(crate) fn from_env_impl(env: &impl ReadEnv) -> Result<Self> {
        let bot_token = env
            .var("DISCORD_BOT_TOKEN")
            .context("DISCORD_BOT_TOKEN not set")?;

        let mut nats = match env.var("MAW_PREFIX") {
            Some(prefix) => NatsConfig::for_prefix(prefix),
            None => NatsConfig::default(),
        };
        if let Some(list) = env.var("NATS_URL") {
            nats.set_servers(&list);
        }
        nats.credentials_file = env.var("NATS_CREDENTIALS_FILE");
        nats.username = env.var("NATS_USER");
        nats.password = env.var("NATS_PASSWORD");

        let guild_only = env
            .var("MAW_GUILD_ONLY")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        let config = Config {
            discord: DiscordBotConfig {
                bot_token,
                report_channel_id: parse_id(env, "MAW_REPORT_CHANNEL_ID")?,
                suppress_channel_id: parse_id(env, "MAW_SUPPRESS_CHANNEL_ID")?,
                guild_only,
            },
            nats,
            engine: EngineConfig {
                ack_timeout_secs: parse_or(env, "MAW_ACK_TIMEOUT_SECS", default_ack_timeout_secs())?,
            },
            recovery: RecoveryConfig {
                interval_secs: parse_or(env, "MAW_RECOVERY_INTERVAL_SECS", default_interval_secs())?,
                idle_threshold_secs: parse_or(
                    env,
                    "MAW_RECOVERY_IDLE_SECS",
                    default_idle_threshold_secs(),
                )?,
                concurrency: parse_or(env, "MAW_RECOVERY_CONCURRENCY", default_concurrency())?,
            },
            narratives_path: env
                .var("MAW_NARRATIVES_PATH")
                .unwrap_or_else(default_narratives_path),
        };
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.nats.prefix_is_valid(),
            "nats.prefix '{}' may only contain letters, digits, '_' and '-'",
            self.nats.prefix
        );
        anyhow::ensure!(self.engine.ack_timeout_secs > 0, "engine.ack_timeout_secs must be positive");
        anyhow::ensure!(self.recovery.interval_secs > 0, "recovery.interval_secs must be positive");
        anyhow::ensure!(self.recovery.concurrency > 0, "recovery.concurrency must be positive");
        Ok(())
    }
}

fn parse_id(env: &impl ReadEnv, key: &str) -> Result<Option<u64>> {
    env.var(key)
        .filter(|v| !v.trim().is_empty())
        .map(|v| v.trim().parse::<u64>().with_context(|| format!("{key} is not a valid id")))
        .transpose()
}

fn parse_or<T>(env: &impl ReadEnv, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env.var(key) {
        Some(v) => v.trim().parse::<T>().with_context(|| format!("{key} is invalid")),
        None => Ok(default),
    }
}

fn default_true() -> bool {
    true
}

fn default_ack_timeout_secs() -> u64 {
    10
}

fn default_interval_secs() -> u64 {
    60
}

fn default_idle_threshold_secs() -> u64 {
    21_600
}

fn default_concurrency() -> usize {
    8
}

fn default_narratives_path() -> String {
    "config/responses.json".to_string()
}
