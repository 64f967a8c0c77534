//! Consent button identifiers.
//!
//! Two forms are understood:
//!
//! - `{category}_{answer}`: legacy buttons; the relationship is recovered from
//!   the prompt text (see [`crate::prompt`]).
//! - `{category}_{relationship_id}_{answer}`: the relationship is carried in
//!   the identifier itself.
//!
//! `answer` is `yes` or `no`. Anything not ending in `_yes` / `_no` is not a
//! consent button.

use std::fmt;

use crate::relationship::RelationshipId;

/// The prey's answer to a consent prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
}

impl Answer {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }
}

/// Parsed consent button identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonId {
    /// Narrative table key
    pub category: String,
    pub relationship: Option<RelationshipId>,
    pub answer: Answer,
}

impl ButtonId {
    pub fn new(category: impl Into<String>, relationship: Option<RelationshipId>, answer: Answer) -> Self {
        Self {
            category: category.into(),
            relationship,
            answer,
        }
    }

    /// Parse a custom id; `None` when it is not a consent button
    pub fn parse(custom_id: &str) -> Option<Self> {
        let (head, answer) = if let Some(head) = custom_id.strip_suffix("_yes") {
            (head, Answer::Yes)
        } else if let Some(head) = custom_id.strip_suffix("_no") {
            (head, Answer::No)
        } else {
            return None;
        };

        let mut parts = head.split('_');
        let category = parts.next().filter(|c| !c.is_empty())?;
        let relationship = match parts.next() {
            None => None,
            Some(id) => Some(id.parse::<RelationshipId>().ok()?),
        };
        if parts.next().is_some() {
            return None;
        }

        Some(Self::new(category, relationship, answer))
    }
}

impl fmt::Display for ButtonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.relationship {
            Some(id) => write!(f, "{}_{}_{}", self.category, id, self.answer.as_str()),
            None => write!(f, "{}_{}", self.category, self.answer.as_str()),
        }
    }
}
