//! Serenity event handler implementation

use std::sync::Arc;
use std::time::Duration;

use maw_store::KvEntityStore;
use serenity::async_trait;
use serenity::model::application::Interaction;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::bridge;
use crate::engine::Engine;
use crate::health::AppState;
use crate::recovery::RecoveryJob;

pub struct Handler {
    engine: Arc<Engine>,
    recovery: Arc<RecoveryJob<KvEntityStore>>,
    recovery_interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl Handler {
    pub fn new(
        engine: Arc<Engine>,
        recovery: Arc<RecoveryJob<KvEntityStore>>,
        recovery_interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            engine,
            recovery,
            recovery_interval,
            shutdown,
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            "Discord bot connected as {} in {} guild(s)",
            ready.user.name,
            ready.guilds.len()
        );

        let health = ctx.data.read().await.get::<AppState>().cloned();
        match health {
            Some(state) => state.set_bot_username(ready.user.name.clone()).await,
            None => warn!("AppState not found in context data"),
        }

        // Reconnects deliver Ready again; the sweep starts only once.
        if !self.engine.readiness().mark_gateway_ready() {
            return;
        }
        info!("Dispatch accepting interactions");

        let mut shutdown = self.shutdown.clone();
        let job = self.recovery.clone();
        tokio::spawn(job.run(self.recovery_interval, async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        }));
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let emojis = match &interaction {
            Interaction::Command(cmd) => cmd
                .guild_id
                .and_then(|guild_id| bridge::everyone_external_emojis(&ctx.cache, guild_id, cmd.channel_id)),
            _ => None,
        };

        let Some(routed) = bridge::convert_interaction(&interaction, emojis) else {
            debug!("Ignoring unsupported interaction {:?}", interaction.kind());
            return;
        };

        let label = routed.event.kind.label();
        let outcome = self.engine.handle(routed.event, routed.target).await;
        debug!(kind = label, ?outcome, "Interaction dispatched");
    }
}
