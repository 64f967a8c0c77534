//! [`EntityStore`] backed by NATS JetStream KV.
//!
//! One bucket per entity, JSON values, keyed by id. Conditional writes use
//! KV revisions: a write only lands if nobody else wrote the key since we
//! read it.

use async_nats::jetstream::{self, kv};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use maw_types::{
    Participant, ParticipantId, ParticipantStats, Relationship, RelationshipId,
    RelationshipStatus,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::clock::{SystemClock, WallClock};
use crate::config::NatsConfig;
use crate::error::{Error, Result};
use crate::traits::EntityStore;

pub const PARTICIPANTS: &str = "participants";
pub const STATS: &str = "stats";
pub const RELATIONSHIPS: &str = "relationships";

/// Attempts for a conditional write before giving up with [`Error::Conflict`].
const CAS_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct KvEntityStore<C: WallClock = SystemClock> {
    participants: kv::Store,
    stats: kv::Store,
    relationships: kv::Store,
    clock: C,
}

impl KvEntityStore<SystemClock> {
    /// Open (creating if needed) the entity buckets.
    pub async fn open(js: &jetstream::Context, config: &NatsConfig) -> Result<Self> {
        Self::open_with_clock(js, config, SystemClock).await
    }
}

impl<C: WallClock> KvEntityStore<C> {
    pub async fn open_with_clock(
        js: &jetstream::Context,
        config: &NatsConfig,
        clock: C,
    ) -> Result<Self> {
        let participants = get_or_create(js, config.bucket(PARTICIPANTS), 1).await?;
        let stats = get_or_create(js, config.bucket(STATS), 1).await?;
        let relationships = get_or_create(js, config.bucket(RELATIONSHIPS), 5).await?;
        debug!(prefix = %config.prefix, "Entity buckets ready");
        Ok(Self {
            participants,
            stats,
            relationships,
            clock,
        })
    }
}

async fn get_or_create(js: &jetstream::Context, bucket: String, history: i64) -> Result<kv::Store> {
    let config = kv::Config {
        bucket: bucket.clone(),
        history,
        ..Default::default()
    };
    match js.create_key_value(config).await {
        Ok(store) => Ok(store),
        Err(_) => js
            .get_key_value(&bucket)
            .await
            .map_err(|e| Error::Kv(format!("{bucket}: {e}"))),
    }
}

fn kv_err(e: impl std::fmt::Display) -> Error {
    Error::Kv(e.to_string())
}

fn encode<T: Serialize>(value: &T) -> Result<Bytes> {
    Ok(Bytes::from(serde_json::to_vec(value)?))
}

/// Current value and revision of a key; `None` when absent or deleted.
async fn load<T: DeserializeOwned>(store: &kv::Store, key: &str) -> Result<Option<(T, u64)>> {
    match store.entry(key).await.map_err(kv_err)? {
        Some(entry) if entry.operation == kv::Operation::Put => {
            let value = serde_json::from_slice(&entry.value)?;
            Ok(Some((value, entry.revision)))
        }
        _ => Ok(None),
    }
}

/// Every live value in a bucket. Undecodable entries are skipped with a warning.
async fn scan<T: DeserializeOwned>(store: &kv::Store) -> Result<Vec<T>> {
    let keys: Vec<String> = store
        .keys()
        .await
        .map_err(kv_err)?
        .try_collect()
        .await
        .map_err(kv_err)?;

    let mut values = Vec::with_capacity(keys.len());
    for key in keys {
        let Some(bytes) = store.get(&key).await.map_err(kv_err)? else {
            continue;
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => values.push(value),
            Err(e) => warn!(key = %key, error = %e, "Skipping undecodable entry"),
        }
    }
    Ok(values)
}

impl<C: WallClock> EntityStore for KvEntityStore<C> {
    async fn participant(&self, id: ParticipantId) -> Result<Option<Participant>> {
        Ok(load(&self.participants, &id.to_string()).await?.map(|(p, _)| p))
    }

    async fn participant_by_name(&self, name: &str) -> Result<Option<Participant>> {
        let all: Vec<Participant> = scan(&self.participants).await?;
        Ok(all.into_iter().find(|p| p.name == name))
    }

    async fn put_participant(&self, participant: &Participant) -> Result<()> {
        self.participants
            .put(participant.id.to_string(), encode(participant)?)
            .await
            .map_err(kv_err)?;
        Ok(())
    }

    async fn stats(&self, id: ParticipantId) -> Result<Option<ParticipantStats>> {
        Ok(load(&self.stats, &id.to_string()).await?.map(|(s, _)| s))
    }

    async fn put_stats(&self, stats: &ParticipantStats) -> Result<()> {
        stats.validate()?;
        self.stats
            .put(stats.participant.to_string(), encode(stats)?)
            .await
            .map_err(kv_err)?;
        Ok(())
    }

    async fn set_health(&self, id: ParticipantId, health: i32) -> Result<bool> {
        let key = id.to_string();
        for _ in 0..CAS_ATTEMPTS {
            let Some((mut stats, revision)) = load::<ParticipantStats>(&self.stats, &key).await?
            else {
                return Ok(false);
            };
            stats.health = health;
            stats.validate()?;
            match self.stats.update(&key, encode(&stats)?, revision).await {
                Ok(_) => return Ok(true),
                Err(e) => debug!(key = %key, error = %e, "Stats write raced, retrying"),
            }
        }
        Err(Error::Conflict(key))
    }

    async fn relationship(&self, id: RelationshipId) -> Result<Option<Relationship>> {
        Ok(load(&self.relationships, &id.to_string()).await?.map(|(r, _)| r))
    }

    async fn insert_relationship(
        &self,
        predator: ParticipantId,
        prey: ParticipantId,
    ) -> Result<Relationship> {
        let relationship = Relationship::begin(predator, prey, self.clock.now());
        self.relationships
            .create(relationship.id.to_string(), encode(&relationship)?)
            .await
            .map_err(kv_err)?;
        Ok(relationship)
    }

    async fn active_for_prey(&self, prey: ParticipantId) -> Result<Vec<Relationship>> {
        let all: Vec<Relationship> = scan(&self.relationships).await?;
        Ok(all
            .into_iter()
            .filter(|r| r.prey == prey && r.status == RelationshipStatus::Active)
            .collect())
    }

    async fn idle_active(&self, cutoff: DateTime<Utc>) -> Result<Vec<Relationship>> {
        let all: Vec<Relationship> = scan(&self.relationships).await?;
        Ok(all.into_iter().filter(|r| r.is_idle_since(cutoff)).collect())
    }

    async fn transition(
        &self,
        id: RelationshipId,
        expected: RelationshipStatus,
        next: RelationshipStatus,
    ) -> Result<bool> {
        let key = id.to_string();
        for _ in 0..CAS_ATTEMPTS {
            let Some((mut rel, revision)) = load::<Relationship>(&self.relationships, &key).await?
            else {
                return Ok(false);
            };
            if rel.status != expected {
                return Ok(false);
            }
            rel.status = next;
            rel.updated_at = self.clock.now();
            match self.relationships.update(&key, encode(&rel)?, revision).await {
                Ok(_) => return Ok(true),
                Err(e) => debug!(key = %key, error = %e, "Relationship write raced, re-reading"),
            }
        }
        Err(Error::Conflict(key))
    }

    async fn delete_if(&self, id: RelationshipId, expected: RelationshipStatus) -> Result<bool> {
        let key = id.to_string();
        for _ in 0..CAS_ATTEMPTS {
            let Some((rel, revision)) = load::<Relationship>(&self.relationships, &key).await?
            else {
                return Ok(false);
            };
            if rel.status != expected {
                return Ok(false);
            }
            match self
                .relationships
                .delete_expect_revision(&key, Some(revision))
                .await
            {
                Ok(()) => return Ok(true),
                Err(e) => debug!(key = %key, error = %e, "Relationship delete raced, re-reading"),
            }
        }
        Err(Error::Conflict(key))
    }
}
