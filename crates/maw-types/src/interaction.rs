//! Inbound interaction events routed by the dispatch engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{CommandOption, DiscordUser};

/// Base metadata attached to every inbound event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventMetadata {
    /// Unique event ID
    pub event_id: Uuid,
    /// When the gateway delivered the event
    pub received_at: DateTime<Utc>,
}

impl EventMetadata {
    pub fn new() -> Self {
        Self {
            event_id: Uuid::new_v4(),
            received_at: Utc::now(),
        }
    }
}

impl Default for EventMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// One submitted modal text field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModalField {
    pub custom_id: String,
    pub value: String,
}

/// What kind of interaction arrived, with its payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InteractionKind {
    /// Slash command invocation
    Command {
        name: String,
        #[serde(default)]
        options: Vec<CommandOption>,
        /// Whether `@everyone` may use external emojis in the channel;
        /// `None` when the permissions could not be resolved
        #[serde(skip_serializing_if = "Option::is_none")]
        everyone_external_emojis: Option<bool>,
    },
    /// Modal form submission
    ModalSubmit {
        custom_id: String,
        #[serde(default)]
        fields: Vec<ModalField>,
    },
    /// Button press on a bot message
    Button {
        custom_id: String,
        message_id: u64,
        /// Text of the message the button is attached to
        message_content: String,
    },
}

impl InteractionKind {
    /// Short label used in logs and notices
    pub fn label(&self) -> &'static str {
        match self {
            Self::Command { .. } => "command",
            Self::ModalSubmit { .. } => "modal",
            Self::Button { .. } => "button",
        }
    }

    /// Registry key: command name, modal id or button id
    pub fn identifier(&self) -> &str {
        match self {
            Self::Command { name, .. } => name,
            Self::ModalSubmit { custom_id, .. } | Self::Button { custom_id, .. } => custom_id,
        }
    }
}

/// An interaction delivered by the gateway
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InteractionEvent {
    pub metadata: EventMetadata,
    pub interaction_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<u64>,
    pub channel_id: u64,
    pub user: DiscordUser,
    pub kind: InteractionKind,
}

impl InteractionEvent {
    pub fn in_guild(&self) -> bool {
        self.guild_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> DiscordUser {
        DiscordUser {
            id: 42,
            username: "tester".to_string(),
            global_name: None,
            bot: false,
        }
    }

    #[test]
    fn test_identifier_per_kind() {
        let cmd = InteractionKind::Command {
            name: "stats".to_string(),
            options: vec![],
            everyone_external_emojis: Some(true),
        };
        let modal = InteractionKind::ModalSubmit {
            custom_id: "create".to_string(),
            fields: vec![],
        };
        let button = InteractionKind::Button {
            custom_id: "vore_yes".to_string(),
            message_id: 1,
            message_content: String::new(),
        };
        assert_eq!(cmd.identifier(), "stats");
        assert_eq!(modal.identifier(), "create");
        assert_eq!(button.identifier(), "vore_yes");
        assert_eq!(button.label(), "button");
    }

    #[test]
    fn test_event_kind_tagged_json() {
        let event = InteractionEvent {
            metadata: EventMetadata::new(),
            interaction_id: 9,
            guild_id: None,
            channel_id: 5,
            user: user(),
            kind: InteractionKind::ModalSubmit {
                custom_id: "create".to_string(),
                fields: vec![ModalField {
                    custom_id: "name".to_string(),
                    value: "Mira".to_string(),
                }],
            },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"]["kind"], "modal_submit");
        assert!(json.get("guild_id").is_none());
        assert!(!event.in_guild());
    }
}
