//! `/stats character:<name>`: show a participant's stats.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use maw_store::EntityStore;
use maw_types::{string_option, Embed, InteractionEvent, InteractionKind, Notice, Reply, Severity};

use crate::registry::InteractionHandler;
use crate::reply::ReplyHandle;

pub const NAME: &str = "stats";

pub struct StatsCommand<S: EntityStore> {
    store: Arc<S>,
}

impl<S: EntityStore> StatsCommand<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: EntityStore> InteractionHandler for StatsCommand<S> {
    async fn run(&self, event: &InteractionEvent, reply: &ReplyHandle) -> Result<()> {
        let InteractionKind::Command { options, .. } = &event.kind else {
            return Ok(());
        };
        let Some(name) = string_option(options, "character") else {
            let notice = Notice::new(Severity::Warning, "", "Name a character to look up");
            return reply.send(notice.into_reply(true)).await;
        };

        reply.defer(false).await?;

        let Some(participant) = self.store.participant_by_name(name).await? else {
            let notice = Notice::new(Severity::Warning, "", format!("No character named **{name}**"));
            return reply.send(notice.into_reply(false)).await;
        };
        let Some(stats) = self.store.stats(participant.id).await? else {
            let notice = Notice::new(Severity::Information, "", format!("**{name}** has no stats yet"));
            return reply.send(notice.into_reply(false)).await;
        };

        let embed = Embed::new()
            .title(format!("{} ({})", participant.name, participant.role.as_str()))
            .color(Severity::Information.color())
            .field("Health", stats.health.to_string(), true)
            .field("Arousal", stats.arousal.to_string(), true)
            .field("Digestion", stats.digestion.to_string(), true)
            .field("Defiance", stats.defiance.to_string(), true)
            .field("Euphoria", stats.euphoria.to_string(), true)
            .field("Resistance", stats.resistance.to_string(), true)
            .field("Acids", stats.acids.to_string(), true)
            .field("Strength", stats.strength.to_string(), true)
            .footer(format!("Controlled by <@{}>", participant.user_id));
        reply.send(Reply::embed(embed)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use maw_store::MemoryStore;
    use maw_types::{
        CommandOption, CommandOptionValue, DiscordUser, EventMetadata, Participant, ParticipantId,
        ParticipantStats, Role,
    };

    use crate::reply::InteractionRef;
    use crate::testing::{Call, RecordingResponder};

    fn event(character: Option<&str>) -> InteractionEvent {
        InteractionEvent {
            metadata: EventMetadata::new(),
            interaction_id: 1,
            guild_id: Some(2),
            channel_id: 3,
            user: DiscordUser {
                id: 4,
                username: "u".into(),
                global_name: None,
                bot: false,
            },
            kind: InteractionKind::Command {
                name: NAME.into(),
                options: character
                    .map(|c| CommandOption {
                        name: "character".into(),
                        value: CommandOptionValue::String(c.into()),
                    })
                    .into_iter()
                    .collect(),
                everyone_external_emojis: Some(true),
            },
        }
    }

    async fn store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .put_participant(&Participant {
                id: ParticipantId(1),
                user_id: 222222222222222222,
                active: true,
                busy: false,
                name: "Mira".into(),
                role: Role::Prey,
                description: String::new(),
                gender: String::new(),
                species: String::new(),
                weight: 0,
                height: 0,
                whitelist: vec![],
                blacklist: vec![],
                autodigest: false,
            })
            .await
            .unwrap();
        store
            .put_stats(&ParticipantStats {
                participant: ParticipantId(1),
                health: 87,
                arousal: 3,
                digestion: 2,
                defiance: 9,
                euphoria: 1,
                resistance: 20,
                acids: 4,
                strength: 50,
            })
            .await
            .unwrap();
        store
    }

    async fn run(character: Option<&str>) -> Vec<Call> {
        let responder = RecordingResponder::new();
        let reply = ReplyHandle::new(
            InteractionRef {
                id: 1,
                token: "t".into(),
            },
            Arc::new(responder.clone()),
        );
        StatsCommand::new(store().await)
            .run(&event(character), &reply)
            .await
            .unwrap();
        responder.calls()
    }

    #[tokio::test]
    async fn test_shows_stats_embed() {
        let calls = run(Some("Mira")).await;
        let reply = calls[1].reply().unwrap();
        let embed = &reply.embeds[0];
        assert_eq!(embed.title.as_deref(), Some("Mira (Prey)"));
        let health = embed.fields.iter().find(|f| f.name == "Health").unwrap();
        assert_eq!(health.value, "87");
    }

    #[tokio::test]
    async fn test_unknown_character() {
        let calls = run(Some("Ghost")).await;
        let reply = calls[1].reply().unwrap();
        assert!(reply.embeds[0]
            .description
            .as_deref()
            .unwrap()
            .contains("No character named **Ghost**"));
    }

    #[tokio::test]
    async fn test_missing_option_is_ephemeral() {
        let calls = run(None).await;
        assert_eq!(calls.len(), 1);
        assert!(matches!(&calls[0], Call::Respond(r) if r.ephemeral));
    }
}
