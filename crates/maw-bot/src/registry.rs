//! Handler registry.
//!
//! Populated once at startup through [`RegistryBuilder`] and immutable
//! afterwards. Commands and modals are keyed by a validated [`HandlerName`];
//! buttons are matched by predicate because their ids carry data.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use maw_types::{InteractionEvent, InteractionKind};

use crate::reply::ReplyHandle;

/// Command name or modal id: 1-32 characters of `[a-z0-9_-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerName(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid handler name '{0}': expected 1-32 characters of [a-z0-9_-]")]
pub struct InvalidHandlerName(pub String);

impl HandlerName {
    pub fn parse(name: &str) -> Result<Self, InvalidHandlerName> {
        let valid = (1..=32).contains(&name.len())
            && name
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-');
        if valid {
            Ok(Self(name.to_string()))
        } else {
            Err(InvalidHandlerName(name.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HandlerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Runs one interaction. Errors are turned into a generic reply and reported
/// by the engine.
#[async_trait]
pub trait InteractionHandler: Send + Sync + 'static {
    async fn run(&self, event: &InteractionEvent, reply: &ReplyHandle) -> Result<()>;
}

type ButtonMatcher = fn(&str) -> bool;

pub struct Registry {
    commands: HashMap<HandlerName, Arc<dyn InteractionHandler>>,
    modals: HashMap<HandlerName, Arc<dyn InteractionHandler>>,
    buttons: Vec<(ButtonMatcher, Arc<dyn InteractionHandler>)>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Handler for an event, if any is registered.
    pub fn resolve(&self, kind: &InteractionKind) -> Option<Arc<dyn InteractionHandler>> {
        match kind {
            InteractionKind::Command { name, .. } => {
                let name = HandlerName::parse(name).ok()?;
                self.commands.get(&name).cloned()
            }
            InteractionKind::ModalSubmit { custom_id, .. } => {
                let name = HandlerName::parse(custom_id).ok()?;
                self.modals.get(&name).cloned()
            }
            InteractionKind::Button { custom_id, .. } => self
                .buttons
                .iter()
                .find(|(matches, _)| matches(custom_id))
                .map(|(_, handler)| handler.clone()),
        }
    }

    pub fn command_names(&self) -> impl Iterator<Item = &HandlerName> {
        self.commands.keys()
    }
}

#[derive(Default)]
pub struct RegistryBuilder {
    commands: HashMap<HandlerName, Arc<dyn InteractionHandler>>,
    modals: HashMap<HandlerName, Arc<dyn InteractionHandler>>,
    buttons: Vec<(ButtonMatcher, Arc<dyn InteractionHandler>)>,
}

impl RegistryBuilder {
    pub fn command(
        mut self,
        name: &str,
        handler: Arc<dyn InteractionHandler>,
    ) -> Result<Self, InvalidHandlerName> {
        self.commands.insert(HandlerName::parse(name)?, handler);
        Ok(self)
    }

    pub fn modal(
        mut self,
        custom_id: &str,
        handler: Arc<dyn InteractionHandler>,
    ) -> Result<Self, InvalidHandlerName> {
        self.modals.insert(HandlerName::parse(custom_id)?, handler);
        Ok(self)
    }

    /// Buttons are tried in registration order; the first match wins.
    pub fn button(mut self, matches: ButtonMatcher, handler: Arc<dyn InteractionHandler>) -> Self {
        self.buttons.push((matches, handler));
        self
    }

    pub fn build(self) -> Registry {
        Registry {
            commands: self.commands,
            modals: self.modals,
            buttons: self.buttons,
        }
    }
}
