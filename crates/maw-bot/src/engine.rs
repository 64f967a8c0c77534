//! Dispatch-and-acknowledge engine.
//!
//! Routes each inbound interaction to one registered handler, runs it on its
//! own task and races it against the acknowledgement deadline. The deadline
//! is soft: when it passes without a visible reply the engine posts a single
//! timeout notice, but the handler keeps running and may still overwrite it.

#[path = "engine_tests.rs"]
mod engine_tests;

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use maw_types::{InteractionEvent, InteractionKind, Notice, Reply, Severity};
use tracing::{debug, error, info, warn};

use crate::errors::is_suppressed;
use crate::registry::Registry;
use crate::reply::{InteractionRef, ReplyHandle, Responder};
use crate::report::{ErrorSink, Report};

const HEADS_UP: &str = "**Heads Up**\n> This bot uses external emojis and has detected that the `@everyone` role cannot use external emojis in this channel. In order for these to work properly, you must allow the `@everyone` role to use external emojis in this channel (Or across the entire server, which is a better solution). If you do not do this, some emojis may look weird when sent by the bot\n> \n> *This is a one-time message that is sent whenever the bot restarts. Re run your command and it'll work normally*";

/// Process-wide readiness. Dispatch is accepted once both the entity store
/// and the gateway are up.
#[derive(Clone, Default)]
pub struct Readiness {
    store: Arc<AtomicBool>,
    gateway: Arc<AtomicBool>,
}

impl Readiness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_store_ready(&self) {
        self.store.store(true, Ordering::Release);
    }

    /// Returns true the first time the gateway becomes ready.
    pub fn mark_gateway_ready(&self) -> bool {
        !self.gateway.swap(true, Ordering::AcqRel)
    }

    pub fn is_ready(&self) -> bool {
        self.store.load(Ordering::Acquire) && self.gateway.load(Ordering::Acquire)
    }

    /// Teardown hook: stop accepting dispatch.
    pub fn shutdown(&self) {
        self.store.store(false, Ordering::Release);
        self.gateway.store(false, Ordering::Release);
    }
}

/// Guilds that already received the external-emoji heads-up since start.
#[derive(Clone, Default)]
pub struct WarnedGuilds(Arc<Mutex<HashSet<u64>>>);

impl WarnedGuilds {
    /// Record `guild_id`; true if it had not been warned before.
    pub fn first_warning(&self, guild_id: u64) -> bool {
        match self.0.lock() {
            Ok(mut guilds) => guilds.insert(guild_id),
            Err(poisoned) => poisoned.into_inner().insert(guild_id),
        }
    }
}

/// How the engine disposed of one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    NotReady,
    DirectMessage,
    HeadsUp,
    /// No handler registered; swallowed
    Unhandled,
    Completed,
    Failed,
    /// Deadline passed first; `notice_sent` is false when a visible reply
    /// already existed
    TimedOut { notice_sent: bool },
}

pub struct Engine {
    registry: Arc<Registry>,
    responder: Arc<dyn Responder>,
    sink: Arc<dyn ErrorSink>,
    readiness: Readiness,
    warned: WarnedGuilds,
    ack_timeout: Duration,
    guild_only: bool,
}

impl Engine {
    pub fn new(
        registry: Arc<Registry>,
        responder: Arc<dyn Responder>,
        sink: Arc<dyn ErrorSink>,
        readiness: Readiness,
        ack_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            responder,
            sink,
            readiness,
            warned: WarnedGuilds::default(),
            ack_timeout,
            guild_only: true,
        }
    }

    pub fn with_guild_only(mut self, guild_only: bool) -> Self {
        self.guild_only = guild_only;
        self
    }

    pub fn readiness(&self) -> &Readiness {
        &self.readiness
    }

    pub async fn handle(&self, event: InteractionEvent, target: InteractionRef) -> Dispatch {
        let reply = Arc::new(ReplyHandle::new(target, self.responder.clone()));
        let label = event.kind.label();
        let context = format!("{} {}", label, event.kind.identifier());

        if !self.readiness.is_ready() {
            let notice = Notice::new(Severity::Information, "", "The bot is starting up, please wait");
            self.reply_quietly(&reply, &context, notice.into_reply(true)).await;
            return Dispatch::NotReady;
        }

        if self.guild_only && !event.in_guild() {
            let notice = Notice::new(
                Severity::Warning,
                "[WARN-NODM]",
                "Interactions are only supported inside servers",
            );
            self.reply_quietly(&reply, &context, notice.into_reply(true)).await;
            return Dispatch::DirectMessage;
        }

        if let (Some(guild_id), InteractionKind::Command { everyone_external_emojis: Some(false), .. }) =
            (event.guild_id, &event.kind)
        {
            if self.warned.first_warning(guild_id) {
                info!(guild_id, "Sending external emoji heads-up");
                self.reply_quietly(&reply, &context, Reply::text(HEADS_UP)).await;
                return Dispatch::HeadsUp;
            }
        }

        let Some(handler) = self.registry.resolve(&event.kind) else {
            debug!(kind = label, identifier = event.kind.identifier(), "No handler registered");
            return Dispatch::Unhandled;
        };

        debug!(
            kind = label,
            identifier = event.kind.identifier(),
            user_id = event.user.id,
            guild_id = ?event.guild_id,
            "Dispatching interaction"
        );

        let task = {
            let reply = reply.clone();
            let sink = self.sink.clone();
            let context = context.clone();
            tokio::spawn(async move {
                match handler.run(&event, &reply).await {
                    Ok(()) => true,
                    Err(e) => {
                        on_handler_error(&reply, sink.as_ref(), &context, label, e).await;
                        false
                    }
                }
            })
        };

        tokio::select! {
            joined = task => match joined {
                Ok(true) => Dispatch::Completed,
                Ok(false) => Dispatch::Failed,
                Err(join_err) => {
                    let e = anyhow::anyhow!("handler task aborted: {join_err}");
                    on_handler_error(&reply, self.sink.as_ref(), &context, label, e).await;
                    Dispatch::Failed
                }
            },
            _ = tokio::time::sleep(self.ack_timeout) => {
                let notice_sent = self.on_timeout(&reply, &context, label).await;
                Dispatch::TimedOut { notice_sent }
            }
        }
    }

    async fn on_timeout(&self, reply: &ReplyHandle, context: &str, label: &str) -> bool {
        let secs = self.ack_timeout.as_secs();
        let notice = Notice::new(
            Severity::Error,
            "[ERR-UNK]",
            format!("The {label} timed out and failed to reply in {secs} seconds"),
        );
        match reply.send_fallback(notice).await {
            Ok(true) => {
                warn!(context, "Handler produced no reply within {}s", secs);
                self.sink
                    .report(Report::timeout(context, format!("no reply within {secs} seconds")))
                    .await;
                true
            }
            Ok(false) => false,
            Err(e) => {
                report_transport_error(self.sink.as_ref(), context, e).await;
                false
            }
        }
    }

    /// Short-circuit replies; delivery failures are reported, not returned.
    async fn reply_quietly(&self, reply: &ReplyHandle, context: &str, message: Reply) {
        if let Err(e) = reply.send(message).await {
            report_transport_error(self.sink.as_ref(), context, e).await;
        }
    }
}

async fn on_handler_error(
    reply: &ReplyHandle,
    sink: &dyn ErrorSink,
    context: &str,
    label: &str,
    err: anyhow::Error,
) {
    if is_suppressed(&err) {
        sink.report(Report::suppressed(context, format!("{err:#}"))).await;
        return;
    }

    error!(context, error = %format!("{err:#}"), "Handler failed");
    let text = format!("Something went wrong while executing the {label}. Please report this to a developer");
    if let Err(e) = reply.send_failure(&text).await {
        report_transport_error(sink, context, e).await;
    }
    sink.report(Report::failure(context, format!("{err:?}"))).await;
}

async fn report_transport_error(sink: &dyn ErrorSink, context: &str, err: anyhow::Error) {
    if is_suppressed(&err) {
        sink.report(Report::suppressed(context, format!("{err:#}"))).await;
    } else {
        sink.report(Report::failure(context, format!("reply failed: {err:#}"))).await;
    }
}
