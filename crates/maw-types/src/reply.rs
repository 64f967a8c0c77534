//! Replies sent back for an interaction

use serde::{Deserialize, Serialize};

use crate::types::Embed;

/// A message sent in response to an interaction
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Reply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub embeds: Vec<Embed>,
    /// Only visible to the invoking user
    #[serde(default)]
    pub ephemeral: bool,
    /// Remove buttons and other components from the edited message
    #[serde(default)]
    pub clear_components: bool,
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
            ..Self::default()
        }
    }

    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }

    pub fn clear_components(mut self) -> Self {
        self.clear_components = true;
        self
    }

    /// True when the user would see something: non-empty text or an embed
    pub fn is_visible(&self) -> bool {
        self.content.as_deref().is_some_and(|c| !c.is_empty()) || !self.embeds.is_empty()
    }
}

/// Notice severity, which picks the embed colour and title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Warning,
    Error,
    Information,
}

impl Severity {
    pub fn color(self) -> u32 {
        match self {
            Self::Success => 0x57f287,
            Self::Warning => 0xfee75c,
            Self::Error => 0xed4245,
            Self::Information => 0x5865f2,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Warning => "Warning",
            Self::Error => "Error",
            Self::Information => "Information",
        }
    }
}

/// A short embed-style status notice, e.g. `[ERR-UNK] timed out`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    /// Code such as `[WARN-NODM]`; may be empty
    pub code: &'static str,
    pub text: String,
}

impl Notice {
    pub fn new(severity: Severity, code: &'static str, text: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            text: text.into(),
        }
    }

    pub fn to_embed(&self) -> Embed {
        let description = match (self.code.is_empty(), self.text.is_empty()) {
            (true, _) => self.text.clone(),
            (false, true) => self.code.to_string(),
            (false, false) => format!("{} {}", self.code, self.text),
        };
        Embed::new()
            .title(self.severity.title())
            .description(description)
            .color(self.severity.color())
    }

    pub fn into_reply(self, ephemeral: bool) -> Reply {
        Reply {
            embeds: vec![self.to_embed()],
            ephemeral,
            ..Reply::default()
        }
    }
}
