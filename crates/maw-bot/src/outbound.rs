//! Serenity-backed implementations of the reply, membership and reporting
//! seams.

#[path = "outbound_tests.rs"]
mod outbound_tests;

use std::sync::Arc;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use maw_types::{Embed, Reply};
use serenity::builder::{
    CreateEmbed, CreateEmbedFooter, CreateInteractionResponse, CreateInteractionResponseFollowup,
    CreateInteractionResponseMessage, CreateMessage, EditInteractionResponse,
};
use serenity::http::Http;
use serenity::model::id::{ChannelId, GuildId, InteractionId, UserId};
use tracing::debug;

use crate::consent::MemberDirectory;
use crate::errors::{classify, log_outcome};
use crate::reply::{Ack, InteractionRef, Responder};
use crate::report::{ErrorSink, LogSink, Report, ReportSeverity};

pub fn build_embed(embed: &Embed) -> CreateEmbed {
    let mut builder = CreateEmbed::new();
    if let Some(title) = &embed.title {
        builder = builder.title(title);
    }
    if let Some(description) = &embed.description {
        builder = builder.description(description);
    }
    if let Some(color) = embed.color {
        builder = builder.colour(color);
    }
    for field in &embed.fields {
        builder = builder.field(&field.name, &field.value, field.inline);
    }
    if let Some(footer) = &embed.footer {
        builder = builder.footer(CreateEmbedFooter::new(&footer.text));
    }
    builder
}

fn build_embeds(reply: &Reply) -> Vec<CreateEmbed> {
    reply.embeds.iter().map(build_embed).collect()
}

pub fn build_response_message(reply: &Reply) -> CreateInteractionResponseMessage {
    let mut msg = CreateInteractionResponseMessage::new().embeds(build_embeds(reply));
    if let Some(content) = &reply.content {
        msg = msg.content(content);
    }
    if reply.ephemeral {
        msg = msg.ephemeral(true);
    }
    if reply.clear_components {
        msg = msg.components(Vec::new());
    }
    msg
}

pub fn build_edit(reply: &Reply) -> EditInteractionResponse {
    let mut edit = EditInteractionResponse::new().embeds(build_embeds(reply));
    if let Some(content) = &reply.content {
        edit = edit.content(content);
    }
    if reply.clear_components {
        edit = edit.components(Vec::new());
    }
    edit
}

pub fn build_followup(reply: &Reply) -> CreateInteractionResponseFollowup {
    let mut builder = CreateInteractionResponseFollowup::new().embeds(build_embeds(reply));
    if let Some(content) = &reply.content {
        builder = builder.content(content);
    }
    if reply.ephemeral {
        builder = builder.ephemeral(true);
    }
    builder
}

/// Sends interaction responses through the Discord REST API
pub struct SerenityResponder {
    http: Arc<Http>,
}

impl SerenityResponder {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    async fn create_response(&self, target: &InteractionRef, response: CreateInteractionResponse) -> Result<()> {
        self.http
            .create_interaction_response(InteractionId::new(target.id), &target.token, &response, Vec::new())
            .await
            .with_context(|| format!("Failed to respond to interaction {}", target.id))
    }
}

#[async_trait]
impl Responder for SerenityResponder {
    async fn acknowledge(&self, target: &InteractionRef, ack: Ack) -> Result<()> {
        let response = match ack {
            Ack::Defer { ephemeral } => {
                CreateInteractionResponse::Defer(CreateInteractionResponseMessage::new().ephemeral(ephemeral))
            }
            Ack::DeferUpdate => CreateInteractionResponse::Acknowledge,
        };
        self.create_response(target, response).await
    }

    async fn respond(&self, target: &InteractionRef, reply: &Reply) -> Result<()> {
        self.create_response(target, CreateInteractionResponse::Message(build_response_message(reply)))
            .await
    }

    async fn edit(&self, target: &InteractionRef, reply: &Reply) -> Result<()> {
        self.http
            .edit_original_interaction_response(&target.token, &build_edit(reply), Vec::new())
            .await
            .with_context(|| format!("Failed to edit response for interaction {}", target.id))?;
        Ok(())
    }

    async fn followup(&self, target: &InteractionRef, reply: &Reply) -> Result<()> {
        self.http
            .create_followup_message(&target.token, &build_followup(reply), Vec::new())
            .await
            .with_context(|| format!("Failed to send followup for interaction {}", target.id))?;
        Ok(())
    }
}

/// Guild membership checked with a REST member lookup
pub struct SerenityMembers {
    http: Arc<Http>,
}

impl SerenityMembers {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl MemberDirectory for SerenityMembers {
    async fn is_member(&self, guild_id: u64, user_id: u64) -> bool {
        if guild_id == 0 || user_id == 0 {
            return false;
        }
        match self.http.get_member(GuildId::new(guild_id), UserId::new(user_id)).await {
            Ok(_) => true,
            Err(e) => {
                debug!(guild_id, user_id, "Member lookup failed: {}", e);
                false
            }
        }
    }
}

/// Logs every report and posts it to the configured report channel.
/// Suppressed reports go to their own channel when one is set.
pub struct ChannelSink {
    http: Arc<Http>,
    report_channel: Option<u64>,
    suppress_channel: Option<u64>,
}

impl ChannelSink {
    pub fn new(http: Arc<Http>, report_channel: Option<u64>, suppress_channel: Option<u64>) -> Self {
        Self {
            http,
            report_channel,
            suppress_channel,
        }
    }

    fn channel_for(&self, severity: ReportSeverity) -> Option<u64> {
        route_report(severity, self.report_channel, self.suppress_channel)
    }
}

/// Channel a report is posted to; suppressed reports never go to the main
/// report channel.
pub fn route_report(severity: ReportSeverity, report: Option<u64>, suppress: Option<u64>) -> Option<u64> {
    match severity {
        ReportSeverity::Suppressed => suppress,
        ReportSeverity::Failure | ReportSeverity::Timeout => report,
    }
}

#[async_trait]
impl ErrorSink for ChannelSink {
    async fn report(&self, report: Report) {
        LogSink::log(&report);
        let Some(channel) = self.channel_for(report.severity) else {
            return;
        };
        let message = CreateMessage::new().content(report.render());
        if let Err(e) = ChannelId::new(channel).send_message(&*self.http, message).await {
            let context = format!("posting {} report to channel {}", report.severity, channel);
            log_outcome(&context, &classify(&context, &e));
        }
    }
}
