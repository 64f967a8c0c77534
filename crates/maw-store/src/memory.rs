//! In-memory [`EntityStore`] for unit testing without a NATS server.
//!
//! Enabled with the `test-support` feature:
//!
//! ```toml
//! [dev-dependencies]
//! maw-store = { path = "...", features = ["test-support"] }
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use maw_types::{
    Participant, ParticipantId, ParticipantStats, Relationship, RelationshipId,
    RelationshipStatus,
};

use crate::clock::{MockClock, WallClock};
use crate::error::{Error, Result};
use crate::traits::EntityStore;

#[derive(Default)]
struct Tables {
    participants: HashMap<ParticipantId, Participant>,
    stats: HashMap<ParticipantId, ParticipantStats>,
    relationships: HashMap<RelationshipId, Relationship>,
    /// Participants whose stats reads fail, to exercise error paths.
    failing_stats: HashSet<ParticipantId>,
}

/// Records every row in memory. Clones share the same tables.
#[derive(Clone)]
pub struct MemoryStore<C: WallClock + Clone = MockClock> {
    tables: Arc<Mutex<Tables>>,
    clock: C,
}

impl MemoryStore<MockClock> {
    pub fn new() -> Self {
        Self::with_clock(MockClock::new())
    }
}

impl Default for MemoryStore<MockClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: WallClock + Clone> MemoryStore<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
            clock,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Insert a relationship row as-is (status and timestamp untouched).
    pub fn seed_relationship(&self, relationship: Relationship) {
        self.tables
            .lock()
            .unwrap()
            .relationships
            .insert(relationship.id, relationship);
    }

    /// Snapshot of every relationship row.
    pub fn relationships(&self) -> Vec<Relationship> {
        self.tables
            .lock()
            .unwrap()
            .relationships
            .values()
            .cloned()
            .collect()
    }

    /// Make every `stats()` read for `id` fail.
    pub fn fail_stats_for(&self, id: ParticipantId) {
        self.tables.lock().unwrap().failing_stats.insert(id);
    }
}

impl<C: WallClock + Clone> EntityStore for MemoryStore<C> {
    async fn participant(&self, id: ParticipantId) -> Result<Option<Participant>> {
        Ok(self.tables.lock().unwrap().participants.get(&id).cloned())
    }

    async fn participant_by_name(&self, name: &str) -> Result<Option<Participant>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .participants
            .values()
            .find(|p| p.name == name)
            .cloned())
    }

    async fn put_participant(&self, participant: &Participant) -> Result<()> {
        self.tables
            .lock()
            .unwrap()
            .participants
            .insert(participant.id, participant.clone());
        Ok(())
    }

    async fn stats(&self, id: ParticipantId) -> Result<Option<ParticipantStats>> {
        let tables = self.tables.lock().unwrap();
        if tables.failing_stats.contains(&id) {
            return Err(Error::Kv(format!("injected stats failure for {id}")));
        }
        Ok(tables.stats.get(&id).cloned())
    }

    async fn put_stats(&self, stats: &ParticipantStats) -> Result<()> {
        stats.validate()?;
        self.tables
            .lock()
            .unwrap()
            .stats
            .insert(stats.participant, stats.clone());
        Ok(())
    }

    async fn set_health(&self, id: ParticipantId, health: i32) -> Result<bool> {
        let mut tables = self.tables.lock().unwrap();
        let Some(stats) = tables.stats.get_mut(&id) else {
            return Ok(false);
        };
        let mut updated = stats.clone();
        updated.health = health;
        updated.validate()?;
        *stats = updated;
        Ok(true)
    }

    async fn relationship(&self, id: RelationshipId) -> Result<Option<Relationship>> {
        Ok(self.tables.lock().unwrap().relationships.get(&id).cloned())
    }

    async fn insert_relationship(
        &self,
        predator: ParticipantId,
        prey: ParticipantId,
    ) -> Result<Relationship> {
        let relationship = Relationship::begin(predator, prey, self.clock.now());
        self.seed_relationship(relationship.clone());
        Ok(relationship)
    }

    async fn active_for_prey(&self, prey: ParticipantId) -> Result<Vec<Relationship>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .relationships
            .values()
            .filter(|r| r.prey == prey && r.status == RelationshipStatus::Active)
            .cloned()
            .collect())
    }

    async fn idle_active(&self, cutoff: DateTime<Utc>) -> Result<Vec<Relationship>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .relationships
            .values()
            .filter(|r| r.is_idle_since(cutoff))
            .cloned()
            .collect())
    }

    async fn transition(
        &self,
        id: RelationshipId,
        expected: RelationshipStatus,
        next: RelationshipStatus,
    ) -> Result<bool> {
        let now = self.clock.now();
        let mut tables = self.tables.lock().unwrap();
        match tables.relationships.get_mut(&id) {
            Some(rel) if rel.status == expected => {
                rel.status = next;
                rel.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_if(&self, id: RelationshipId, expected: RelationshipStatus) -> Result<bool> {
        let mut tables = self.tables.lock().unwrap();
        match tables.relationships.get(&id) {
            Some(rel) if rel.status == expected => {
                tables.relationships.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
