//! Conversion from serenity interactions to routed events.

#[path = "bridge_tests.rs"]
mod bridge_tests;

use maw_types::{
    CommandOption, CommandOptionValue, DiscordUser, EventMetadata, InteractionEvent, InteractionKind,
    ModalField,
};
use serenity::cache::Cache;
use serenity::model::application::{
    ActionRowComponent, CommandInteraction, ComponentInteraction, ComponentInteractionDataKind,
    Interaction, ModalInteraction, ResolvedValue,
};
use serenity::model::channel::{PermissionOverwrite, PermissionOverwriteType};
use serenity::model::id::{ChannelId, GuildId, RoleId};
use serenity::model::permissions::Permissions;
use serenity::model::user::User as SerenityUser;

use crate::reply::InteractionRef;

/// An event ready for the engine, plus what is needed to answer it
#[derive(Debug, Clone)]
pub struct Routed {
    pub event: InteractionEvent,
    pub target: InteractionRef,
}

/// Convert a gateway interaction. Autocomplete, pings and non-button
/// components yield `None`.
///
/// `everyone_external_emojis` is only attached to commands.
pub fn convert_interaction(interaction: &Interaction, everyone_external_emojis: Option<bool>) -> Option<Routed> {
    match interaction {
        Interaction::Command(cmd) => Some(convert_command(cmd, everyone_external_emojis)),
        Interaction::Modal(modal) => Some(convert_modal(modal)),
        Interaction::Component(comp) => convert_button(comp),
        _ => None,
    }
}

pub fn convert_user(user: &SerenityUser) -> DiscordUser {
    DiscordUser {
        id: user.id.get(),
        username: user.name.clone(),
        global_name: user.global_name.as_deref().map(String::from),
        bot: user.bot,
    }
}

fn routed(
    id: u64,
    token: &str,
    guild_id: Option<GuildId>,
    channel_id: ChannelId,
    user: &SerenityUser,
    kind: InteractionKind,
) -> Routed {
    Routed {
        event: InteractionEvent {
            metadata: EventMetadata::new(),
            interaction_id: id,
            guild_id: guild_id.map(|g| g.get()),
            channel_id: channel_id.get(),
            user: convert_user(user),
            kind,
        },
        target: InteractionRef {
            id,
            token: token.to_string(),
        },
    }
}

fn convert_command(cmd: &CommandInteraction, everyone_external_emojis: Option<bool>) -> Routed {
    let options = cmd
        .data
        .options()
        .iter()
        .filter_map(|opt| {
            let value = match &opt.value {
                ResolvedValue::Boolean(b) => CommandOptionValue::Boolean(*b),
                ResolvedValue::Integer(i) => CommandOptionValue::Integer(*i),
                ResolvedValue::Number(n) => CommandOptionValue::Number(*n),
                ResolvedValue::String(s) => CommandOptionValue::String(s.to_string()),
                ResolvedValue::User(u, _) => CommandOptionValue::User(u.id.get()),
                ResolvedValue::Channel(c) => CommandOptionValue::Channel(c.id.get()),
                ResolvedValue::Role(r) => CommandOptionValue::Role(r.id.get()),
                _ => return None,
            };
            Some(CommandOption {
                name: opt.name.to_string(),
                value,
            })
        })
        .collect();

    routed(
        cmd.id.get(),
        &cmd.token,
        cmd.guild_id,
        cmd.channel_id,
        &cmd.user,
        InteractionKind::Command {
            name: cmd.data.name.clone(),
            options,
            everyone_external_emojis,
        },
    )
}

fn convert_modal(modal: &ModalInteraction) -> Routed {
    let fields = modal
        .data
        .components
        .iter()
        .flat_map(|row| row.components.iter())
        .filter_map(|component| match component {
            ActionRowComponent::InputText(input) => Some(ModalField {
                custom_id: input.custom_id.clone(),
                value: input.value.clone().unwrap_or_default(),
            }),
            _ => None,
        })
        .collect();

    routed(
        modal.id.get(),
        &modal.token,
        modal.guild_id,
        modal.channel_id,
        &modal.user,
        InteractionKind::ModalSubmit {
            custom_id: modal.data.custom_id.clone(),
            fields,
        },
    )
}

fn convert_button(comp: &ComponentInteraction) -> Option<Routed> {
    if !matches!(comp.data.kind, ComponentInteractionDataKind::Button) {
        return None;
    }
    Some(routed(
        comp.id.get(),
        &comp.token,
        comp.guild_id,
        comp.channel_id,
        &comp.user,
        InteractionKind::Button {
            custom_id: comp.data.custom_id.clone(),
            message_id: comp.message.id.get(),
            message_content: comp.message.content.clone(),
        },
    ))
}

/// Whether `@everyone` may use external emojis in a channel, from the guild
/// cache. `None` when the guild, role or channel is not cached (threads).
pub fn everyone_external_emojis(cache: &Cache, guild_id: GuildId, channel_id: ChannelId) -> Option<bool> {
    let guild = cache.guild(guild_id)?;
    let everyone = RoleId::new(guild_id.get());
    let base = guild.roles.get(&everyone)?.permissions;
    let channel = guild.channels.get(&channel_id)?;
    Some(everyone_can_use_external_emojis(
        base,
        &channel.permission_overwrites,
        everyone,
    ))
}

/// Apply the channel's `@everyone` overwrite to the role's base permissions.
pub fn everyone_can_use_external_emojis(
    base: Permissions,
    overwrites: &[PermissionOverwrite],
    everyone: RoleId,
) -> bool {
    if base.contains(Permissions::ADMINISTRATOR) {
        return true;
    }
    let effective = overwrites
        .iter()
        .find(|o| o.kind == PermissionOverwriteType::Role(everyone))
        .map_or(base, |o| (base & !o.deny) | o.allow);
    effective.contains(Permissions::USE_EXTERNAL_EMOJIS)
}
