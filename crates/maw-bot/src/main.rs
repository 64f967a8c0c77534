//! Maw bot
//!
//! Routes Discord slash commands, modal submissions and button presses to
//! registered handlers, resolves consent prompts between participants, and
//! heals idle relationships on a schedule. Entities live in NATS JetStream KV.

mod bridge;
mod commands;
mod config;
mod consent;
mod consent_button;
mod engine;
mod errors;
mod handlers;
mod health;
mod narratives;
mod outbound;
mod recovery;
mod registry;
mod reply;
mod report;
mod startup;
#[cfg(test)]
mod testing;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use maw_store::{connect, KvEntityStore, SystemClock};
use serenity::http::Http;
use serenity::model::gateway::GatewayIntents;
use serenity::prelude::*;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::StatsCommand;
use crate::config::Config;
use crate::consent::ConsentMachine;
use crate::consent_button::{is_consent_button, ConsentButton};
use crate::engine::{Engine, Readiness};
use crate::handlers::Handler;
use crate::health::AppState;
use crate::narratives::NarrativeTable;
use crate::outbound::{ChannelSink, SerenityMembers, SerenityResponder};
use crate::recovery::{LastSweep, RecoveryJob};
use crate::registry::Registry;
use crate::startup::StartupError;

/// Maw bot CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/maw-bot.toml")]
    config: String,

    /// NATS URL (overrides config file)
    #[arg(long, env = "NATS_URL")]
    nats_url: Option<String>,

    /// Discord bot token (overrides config file)
    #[arg(long, env = "DISCORD_BOT_TOKEN")]
    bot_token: Option<String>,

    /// Bucket prefix (overrides config file)
    #[arg(long, env = "MAW_PREFIX")]
    prefix: Option<String>,

    /// Health check server port
    #[arg(long, env = "HEALTH_CHECK_PORT", default_value = "3001")]
    health_port: u16,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "maw_bot=debug,maw_store=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting maw bot");

    let args = Args::parse();
    match run(args).await {
        Ok(()) => {
            info!("Maw bot stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Startup failed: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = if std::path::Path::new(&args.config).exists() {
        info!("Loading config from file: {}", args.config);
        Config::from_file(&args.config)?
    } else {
        info!("Config file not found, loading from environment");
        Config::from_env()?
    };

    if let Some(nats_url) = &args.nats_url {
        config.nats.set_servers(nats_url);
    }
    if let Some(bot_token) = &args.bot_token {
        config.discord.bot_token = bot_token.clone();
    }
    if let Some(prefix) = &args.prefix {
        config.nats.prefix = prefix.clone();
    }
    anyhow::ensure!(!config.discord.bot_token.is_empty(), "Discord bot token is empty");
    config.validate()?;
    Ok(config)
}

async fn run(args: Args) -> Result<(), StartupError> {
    let config = load_config(&args).map_err(StartupError::Config)?;
    info!("Bucket prefix: {}", config.nats.prefix);

    let narratives = NarrativeTable::from_file(&config.narratives_path).map_err(StartupError::Narratives)?;
    info!(
        "Loaded narratives for {} categories from {}",
        narratives.category_count(),
        config.narratives_path
    );

    let nats_client = connect(&config.nats).await?;
    let js = async_nats::jetstream::new(nats_client);
    let store = Arc::new(KvEntityStore::open(&js, &config.nats).await?);
    info!("Entity store ready");

    let readiness = Readiness::new();
    readiness.mark_store_ready();
    let last_sweep = LastSweep::default();

    let http = Arc::new(Http::new(&config.discord.bot_token));
    let members = Arc::new(SerenityMembers::new(http.clone()));
    let machine = ConsentMachine::new(store.clone(), members, Arc::new(narratives));

    let registry = Registry::builder()
        .command(commands::stats::NAME, Arc::new(StatsCommand::new(store.clone())))
        .map_err(|e| StartupError::Config(e.into()))?
        .button(is_consent_button, Arc::new(ConsentButton::new(machine)))
        .build();
    for name in registry.command_names() {
        info!("Registered command /{}", name);
    }

    let sink = Arc::new(ChannelSink::new(
        http.clone(),
        config.discord.report_channel_id,
        config.discord.suppress_channel_id,
    ));
    let engine = Arc::new(
        Engine::new(
            Arc::new(registry),
            Arc::new(SerenityResponder::new(http)),
            sink,
            readiness.clone(),
            config.engine.ack_timeout(),
        )
        .with_guild_only(config.discord.guild_only),
    );

    let recovery = Arc::new(
        RecoveryJob::new(
            store,
            SystemClock,
            config.recovery.idle_threshold(),
            config.recovery.concurrency,
        )
        .with_last_sweep(last_sweep.clone()),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handler = Handler::new(engine, recovery, config.recovery.interval(), shutdown_rx);

    let mut client = Client::builder(&config.discord.bot_token, GatewayIntents::GUILDS)
        .event_handler(handler)
        .await?;

    let health_state = AppState::new(readiness.clone(), last_sweep);
    {
        let mut data = client.data.write().await;
        data.insert::<AppState>(health_state.clone());
    }

    let health_port = args.health_port;
    tokio::spawn(async move {
        if let Err(e) = health::start_health_server(health_state, health_port).await {
            error!("Health server error: {}", e);
        }
    });

    // Graceful shutdown: stop dispatch and the sweep, then close all shards.
    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm = signal(SignalKind::terminate()).expect("SIGTERM handler");
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c().await.ok();
        }
        info!("Shutdown signal received, stopping Discord client...");
        readiness.shutdown();
        let _ = shutdown_tx.send(true);
        shard_manager.shutdown_all().await;
    });

    info!("Starting Discord gateway connection...");
    client.start().await?;
    Ok(())
}
