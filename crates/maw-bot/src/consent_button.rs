//! Button handler wiring consent buttons to the state machine.

use anyhow::{Context, Result};
use async_trait::async_trait;
use maw_store::EntityStore;
use maw_types::{ButtonId, InteractionEvent, InteractionKind, Reply};
use tracing::debug;

use crate::consent::{
    ConsentMachine, ConsentOutcome, ConsentRequest, ALREADY_SETTLED, NOT_YOUR_CHOICE, PREDATOR_GONE,
};
use crate::registry::InteractionHandler;
use crate::reply::ReplyHandle;

/// Registry matcher: ids ending in `_yes` or `_no`
pub fn is_consent_button(custom_id: &str) -> bool {
    custom_id.ends_with("_yes") || custom_id.ends_with("_no")
}

pub struct ConsentButton<S: EntityStore> {
    machine: ConsentMachine<S>,
}

impl<S: EntityStore> ConsentButton<S> {
    pub fn new(machine: ConsentMachine<S>) -> Self {
        Self { machine }
    }
}

#[async_trait]
impl<S: EntityStore> InteractionHandler for ConsentButton<S> {
    async fn run(&self, event: &InteractionEvent, reply: &ReplyHandle) -> Result<()> {
        let InteractionKind::Button {
            custom_id,
            message_content,
            ..
        } = &event.kind
        else {
            return Ok(());
        };
        let Some(button) = ButtonId::parse(custom_id) else {
            debug!(custom_id, "Not a consent button");
            return Ok(());
        };
        let guild_id = event
            .guild_id
            .context("consent buttons are only answered inside a guild")?;

        reply.defer_update().await?;

        let outcome = self
            .machine
            .answer(ConsentRequest {
                guild_id,
                responder: event.user.id,
                button: &button,
                message: message_content,
            })
            .await
            .with_context(|| format!("answering consent button '{custom_id}'"))?;

        match outcome {
            ConsentOutcome::NotYourChoice => {
                reply.followup(Reply::text(NOT_YOUR_CHOICE).ephemeral()).await
            }
            ConsentOutcome::AlreadySettled => {
                reply.followup(Reply::text(ALREADY_SETTLED).ephemeral()).await
            }
            ConsentOutcome::Stale => Ok(()),
            ConsentOutcome::PredatorGone => {
                reply.send(Reply::text(PREDATOR_GONE).clear_components()).await
            }
            ConsentOutcome::Resolved { narrative } | ConsentOutcome::Escaped { narrative } => {
                reply.send(Reply::text(narrative).clear_components()).await
            }
        }
    }
}
