//! Recording doubles shared by the unit tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use maw_types::Reply;

use crate::consent::MemberDirectory;
use crate::reply::{Ack, InteractionRef, Responder};
use crate::report::{ErrorSink, Report};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Acknowledge(Ack),
    Respond(Reply),
    Edit(Reply),
    Followup(Reply),
}

impl Call {
    pub fn reply(&self) -> Option<&Reply> {
        match self {
            Call::Acknowledge(_) => None,
            Call::Respond(r) | Call::Edit(r) | Call::Followup(r) => Some(r),
        }
    }
}

/// Records every transport call. Clones share the same log.
#[derive(Clone, Default)]
pub struct RecordingResponder {
    calls: Arc<Mutex<Vec<Call>>>,
    failing: bool,
}

impl RecordingResponder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails after being recorded
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Text or first embed description of every reply sent
    pub fn texts(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(Call::reply)
            .map(|r| match &r.content {
                Some(c) => c.clone(),
                None => r
                    .embeds
                    .first()
                    .and_then(|e| e.description.clone())
                    .unwrap_or_default(),
            })
            .collect()
    }

    fn record(&self, call: Call) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if self.failing {
            anyhow::bail!("transport unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl Responder for RecordingResponder {
    async fn acknowledge(&self, _target: &InteractionRef, ack: Ack) -> Result<()> {
        self.record(Call::Acknowledge(ack))
    }

    async fn respond(&self, _target: &InteractionRef, reply: &Reply) -> Result<()> {
        self.record(Call::Respond(reply.clone()))
    }

    async fn edit(&self, _target: &InteractionRef, reply: &Reply) -> Result<()> {
        self.record(Call::Edit(reply.clone()))
    }

    async fn followup(&self, _target: &InteractionRef, reply: &Reply) -> Result<()> {
        self.record(Call::Followup(reply.clone()))
    }
}

#[derive(Clone, Default)]
pub struct RecordingSink {
    reports: Arc<Mutex<Vec<Report>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<Report> {
        self.reports.lock().unwrap().clone()
    }
}

#[async_trait]
impl ErrorSink for RecordingSink {
    async fn report(&self, report: Report) {
        self.reports.lock().unwrap().push(report);
    }
}

/// Guild membership backed by a set of user ids
#[derive(Clone, Default)]
pub struct FakeMembers {
    present: Arc<Mutex<HashSet<u64>>>,
}

impl FakeMembers {
    pub fn with(users: &[u64]) -> Self {
        Self {
            present: Arc::new(Mutex::new(users.iter().copied().collect())),
        }
    }

    pub fn remove(&self, user: u64) {
        self.present.lock().unwrap().remove(&user);
    }
}

#[async_trait]
impl MemberDirectory for FakeMembers {
    async fn is_member(&self, _guild_id: u64, user_id: u64) -> bool {
        self.present.lock().unwrap().contains(&user_id)
    }
}
