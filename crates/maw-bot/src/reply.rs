//! Per-interaction reply handle.
//!
//! A [`ReplyHandle`] is shared by the handler task and the engine's timeout
//! path. Its state records whether the interaction has been acknowledged,
//! whether anything visible has been sent and whether the engine already
//! posted its fallback notice. The state lock is held across each transport
//! call, so the two paths never both acknowledge the same interaction.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use maw_types::{Notice, Reply};
use tokio::sync::Mutex;

/// What Discord needs to answer one interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionRef {
    pub id: u64,
    pub token: String,
}

/// Initial acknowledgement without content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    /// "Bot is thinking..." placeholder, later replaced by an edit
    Defer { ephemeral: bool },
    /// Component interactions: keep the message, edit it later
    DeferUpdate,
}

/// Transport for interaction replies.
#[async_trait]
pub trait Responder: Send + Sync + 'static {
    async fn acknowledge(&self, target: &InteractionRef, ack: Ack) -> Result<()>;

    /// Initial response carrying content
    async fn respond(&self, target: &InteractionRef, reply: &Reply) -> Result<()>;

    /// Replace the original response (or the component's message after
    /// [`Ack::DeferUpdate`])
    async fn edit(&self, target: &InteractionRef, reply: &Reply) -> Result<()>;

    async fn followup(&self, target: &InteractionRef, reply: &Reply) -> Result<()>;
}

#[derive(Debug, Default)]
struct ReplyState {
    acknowledged: bool,
    visible: bool,
    fallback_sent: bool,
}

pub struct ReplyHandle {
    target: InteractionRef,
    responder: Arc<dyn Responder>,
    state: Mutex<ReplyState>,
}

impl ReplyHandle {
    pub fn new(target: InteractionRef, responder: Arc<dyn Responder>) -> Self {
        Self {
            target,
            responder,
            state: Mutex::new(ReplyState::default()),
        }
    }

    /// Acknowledge now and reply later. No-op once acknowledged.
    pub async fn defer(&self, ephemeral: bool) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.acknowledged {
            return Ok(());
        }
        self.responder
            .acknowledge(&self.target, Ack::Defer { ephemeral })
            .await?;
        state.acknowledged = true;
        Ok(())
    }

    /// Acknowledge a component press while keeping its message on screen.
    pub async fn defer_update(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.acknowledged {
            return Ok(());
        }
        self.responder.acknowledge(&self.target, Ack::DeferUpdate).await?;
        state.acknowledged = true;
        // The component's message stays visible.
        state.visible = true;
        Ok(())
    }

    /// Send the main reply: the initial response, or an edit once acknowledged.
    pub async fn send(&self, reply: Reply) -> Result<()> {
        let mut state = self.state.lock().await;
        self.deliver(&mut state, &reply).await
    }

    /// Extra message after the main reply. Acts as the initial response when
    /// nothing has been sent yet.
    pub async fn followup(&self, reply: Reply) -> Result<()> {
        let mut state = self.state.lock().await;
        if !state.acknowledged {
            return self.deliver(&mut state, &reply).await;
        }
        self.responder.followup(&self.target, &reply).await?;
        state.visible |= reply.is_visible();
        Ok(())
    }

    /// Engine timeout path: post `notice` only if nothing visible exists and
    /// no fallback was posted before. Returns whether it was sent.
    pub async fn send_fallback(&self, notice: Notice) -> Result<bool> {
        let mut state = self.state.lock().await;
        if state.visible || state.fallback_sent {
            return Ok(false);
        }
        state.fallback_sent = true;
        let reply = notice.into_reply(true);
        self.deliver(&mut state, &reply).await?;
        Ok(true)
    }

    /// Engine failure path: replace whatever is shown with `text` and drop
    /// the message's components.
    pub async fn send_failure(&self, text: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let reply = Reply::text(text).clear_components();
        self.deliver(&mut state, &reply).await
    }

    pub async fn has_visible_reply(&self) -> bool {
        self.state.lock().await.visible
    }

    async fn deliver(&self, state: &mut ReplyState, reply: &Reply) -> Result<()> {
        if state.acknowledged {
            self.responder.edit(&self.target, reply).await?;
        } else {
            self.responder.respond(&self.target, reply).await?;
            state.acknowledged = true;
        }
        state.visible |= reply.is_visible();
        Ok(())
    }
}
