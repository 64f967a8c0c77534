//! Consent state machine for predator/prey relationships.
//!
//! ```text
//!            yes (prey only)
//!   Active ─────────────────▶ Resolved
//!     │  │
//!     │  └── no (prey only) ──▶ row deleted
//!     │
//!     └── predator left the guild ──▶ Free
//! ```
//!
//! Every status change is a compare-and-swap on the expected prior status,
//! so of two concurrent answers only one takes effect; the other sees
//! [`ConsentOutcome::AlreadySettled`].

#[path = "consent_tests.rs"]
mod consent_tests;

use std::sync::Arc;

use async_trait::async_trait;
use maw_store::EntityStore;
use maw_types::prompt::PromptError;
use maw_types::{
    Answer, ButtonId, ConsentPrompt, Participant, RelationshipId, RelationshipStatus,
};
use tracing::{debug, info};

use crate::narratives::{render, NarrativeTable};

pub const NOT_YOUR_CHOICE: &str = "This is not your choice to make!";
pub const PREDATOR_GONE: &str =
    "*For some reason, you notice that your predator is gone. They must've left the server.*";
pub const ALREADY_SETTLED: &str = "This choice has already been made.";

pub fn escape_narrative(prey: &str, pred: &str) -> String {
    format!(
        "*Unfortunately, {prey} didn't consent and as such, they escaped from {pred}. Maybe try a more willing prey?*"
    )
}

/// Whether a user can still be found in a guild. Lookup failures count as
/// "not a member".
#[async_trait]
pub trait MemberDirectory: Send + Sync + 'static {
    async fn is_member(&self, guild_id: u64, user_id: u64) -> bool;
}

/// One press of a consent button
#[derive(Debug, Clone, Copy)]
pub struct ConsentRequest<'a> {
    pub guild_id: u64,
    /// User who pressed the button
    pub responder: u64,
    pub button: &'a ButtonId,
    /// Text of the message carrying the buttons
    pub message: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsentOutcome {
    /// Someone other than the prey's controlling user answered
    NotYourChoice,
    /// Predator left; the prey's Active rows were reset to Free
    PredatorGone,
    /// The prey record no longer matches the prompt; nothing done
    Stale,
    Resolved { narrative: String },
    Escaped { narrative: String },
    /// No Active row left to act on
    AlreadySettled,
}

#[derive(Debug, thiserror::Error)]
pub enum ConsentError {
    #[error("consent prompt not recognised: {0}")]
    MalformedPrompt(#[from] PromptError),

    #[error("no narratives for category '{0}'")]
    UnknownCategory(String),

    #[error(transparent)]
    Store(#[from] maw_store::Error),
}

/// Both sides of the pairing, as far as the answer is concerned
struct Pairing {
    prey: Participant,
    prey_name: String,
    pred_user: u64,
    pred_name: String,
    /// `None` acts on every Active row of the prey
    target: Option<RelationshipId>,
}

enum Lookup {
    Found(Pairing),
    Done(ConsentOutcome),
}

pub struct ConsentMachine<S: EntityStore> {
    store: Arc<S>,
    members: Arc<dyn MemberDirectory>,
    narratives: Arc<NarrativeTable>,
}

impl<S: EntityStore> ConsentMachine<S> {
    pub fn new(store: Arc<S>, members: Arc<dyn MemberDirectory>, narratives: Arc<NarrativeTable>) -> Self {
        Self {
            store,
            members,
            narratives,
        }
    }

    pub async fn answer(&self, req: ConsentRequest<'_>) -> Result<ConsentOutcome, ConsentError> {
        let lookup = match req.button.relationship {
            Some(id) => self.lookup_by_id(id, req.responder).await?,
            None => self.lookup_by_prompt(req.message, req.responder).await?,
        };
        let pairing = match lookup {
            Lookup::Found(p) => p,
            Lookup::Done(outcome) => return Ok(outcome),
        };

        let category = &req.button.category;
        if req.button.answer == Answer::Yes && !self.narratives.contains(category) {
            return Err(ConsentError::UnknownCategory(category.clone()));
        }

        if !self.members.is_member(req.guild_id, pairing.pred_user).await {
            let reset = self.reset_prey(&pairing).await?;
            info!(prey = %pairing.prey.id, reset, "Predator left; relationships freed");
            return Ok(ConsentOutcome::PredatorGone);
        }

        let targets = match pairing.target {
            Some(id) => vec![id],
            None => self
                .store
                .active_for_prey(pairing.prey.id)
                .await?
                .into_iter()
                .map(|r| r.id)
                .collect(),
        };

        match req.button.answer {
            Answer::Yes => {
                let template = self
                    .narratives
                    .pick(category, &mut rand::thread_rng())
                    .map(str::to_owned)
                    .ok_or_else(|| ConsentError::UnknownCategory(category.clone()))?;

                let mut resolved = 0;
                for id in targets {
                    if self
                        .store
                        .transition(id, RelationshipStatus::Active, RelationshipStatus::Resolved)
                        .await?
                    {
                        resolved += 1;
                    }
                }
                if resolved == 0 {
                    return Ok(ConsentOutcome::AlreadySettled);
                }
                info!(prey = %pairing.prey.id, category = %category, "Consent given");
                Ok(ConsentOutcome::Resolved {
                    narrative: render(&template, &pairing.prey_name, &pairing.pred_name),
                })
            }
            Answer::No => {
                let mut removed = 0;
                for id in targets {
                    if self.store.delete_if(id, RelationshipStatus::Active).await? {
                        removed += 1;
                    }
                }
                if removed == 0 {
                    return Ok(ConsentOutcome::AlreadySettled);
                }
                info!(prey = %pairing.prey.id, "Consent refused; prey escaped");
                Ok(ConsentOutcome::Escaped {
                    narrative: escape_narrative(&pairing.prey_name, &pairing.pred_name),
                })
            }
        }
    }

    /// Structured button: both sides come from stored records.
    async fn lookup_by_id(&self, id: RelationshipId, responder: u64) -> Result<Lookup, ConsentError> {
        let Some(rel) = self.store.relationship(id).await? else {
            return Ok(Lookup::Done(ConsentOutcome::AlreadySettled));
        };
        let (Some(prey), Some(pred)) = (
            self.store.participant(rel.prey).await?,
            self.store.participant(rel.predator).await?,
        ) else {
            return Ok(Lookup::Done(ConsentOutcome::Stale));
        };

        if !prey.is_controlled_by(responder) {
            return Ok(Lookup::Done(ConsentOutcome::NotYourChoice));
        }
        if rel.status != RelationshipStatus::Active {
            return Ok(Lookup::Done(ConsentOutcome::AlreadySettled));
        }

        Ok(Lookup::Found(Pairing {
            prey_name: prey.name.clone(),
            pred_user: pred.user_id,
            pred_name: pred.name,
            prey,
            target: Some(id),
        }))
    }

    /// Legacy button: the pairing is read back from the prompt text.
    async fn lookup_by_prompt(&self, message: &str, responder: u64) -> Result<Lookup, ConsentError> {
        let prompt = ConsentPrompt::parse(message)?;

        if responder != prompt.prey_user_id {
            return Ok(Lookup::Done(ConsentOutcome::NotYourChoice));
        }
        let Some(prey) = self.store.participant_by_name(&prompt.prey_name).await? else {
            return Ok(Lookup::Done(ConsentOutcome::Stale));
        };
        if !prey.is_controlled_by(responder) {
            debug!(prey = %prey.id, "Prey record changed hands; ignoring stale answer");
            return Ok(Lookup::Done(ConsentOutcome::Stale));
        }

        Ok(Lookup::Found(Pairing {
            prey,
            prey_name: prompt.prey_name,
            pred_user: prompt.pred_user_id,
            pred_name: prompt.pred_name,
            target: None,
        }))
    }

    /// Set every Active row of the prey back to Free.
    async fn reset_prey(&self, pairing: &Pairing) -> Result<usize, ConsentError> {
        let mut reset = 0;
        for rel in self.store.active_for_prey(pairing.prey.id).await? {
            if self
                .store
                .transition(rel.id, RelationshipStatus::Active, RelationshipStatus::Free)
                .await?
            {
                reset += 1;
            }
        }
        Ok(reset)
    }
}
