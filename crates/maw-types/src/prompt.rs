//! Consent prompt text.
//!
//! Gameplay commands post a prompt to the prey that embeds both participants
//! and their controlling users:
//!
//! ```text
//! *Psst!* <prey name> (<@PREY_USER_ID>), <anything> by <pred name> (<@PRED_USER_ID>)
//! ```
//!
//! Legacy consent buttons carry no relationship id, so the pairing is
//! recovered from this text. User ids must be at least 18 digits.

use std::sync::OnceLock;

use regex::Regex;

use crate::custom_id::{Answer, ButtonId};
use crate::relationship::RelationshipId;

const PROMPT_PATTERN: &str = r"\*Psst!\* ((?P<prey_name>.+) \(<@(?P<prey_user>[0-9]{18,})>\)), .+ by ((?P<pred_name>.+) \(<@(?P<pred_user>[0-9]{18,})>\))";

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(PROMPT_PATTERN).expect("prompt pattern is valid"))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PromptError {
    #[error("message does not contain a consent prompt")]
    NoMatch,
    #[error("user id '{0}' is zero or does not fit in 64 bits")]
    InvalidUserId(String),
}

/// Both sides of a pairing as written in a consent prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentPrompt {
    pub prey_name: String,
    pub prey_user_id: u64,
    pub pred_name: String,
    pub pred_user_id: u64,
}

impl ConsentPrompt {
    /// Recover the pairing from a prompt message
    pub fn parse(text: &str) -> Result<Self, PromptError> {
        let caps = pattern().captures(text).ok_or(PromptError::NoMatch)?;
        let user_id = |name: &str| {
            let raw = &caps[name];
            raw.parse::<u64>()
                .ok()
                .filter(|id| *id != 0)
                .ok_or_else(|| PromptError::InvalidUserId(raw.to_string()))
        };
        Ok(Self {
            prey_name: caps["prey_name"].to_string(),
            prey_user_id: user_id("prey_user")?,
            pred_name: caps["pred_name"].to_string(),
            pred_user_id: user_id("pred_user")?,
        })
    }

    /// Prompt text; `action` fills the free-form middle of the sentence
    pub fn render(&self, action: &str) -> String {
        format!(
            "*Psst!* {} (<@{}>), {} by {} (<@{}>). Do you accept?",
            self.prey_name, self.prey_user_id, action, self.pred_name, self.pred_user_id
        )
    }

    /// Yes / no buttons for a prompt about `relationship`
    pub fn buttons(category: &str, relationship: RelationshipId) -> [ButtonId; 2] {
        [
            ButtonId::new(category, Some(relationship), Answer::Yes),
            ButtonId::new(category, Some(relationship), Answer::No),
        ]
    }
}
