use std::future::Future;

use chrono::{DateTime, Utc};
use maw_types::{
    Participant, ParticipantId, ParticipantStats, Relationship, RelationshipId,
    RelationshipStatus,
};

use crate::error::Result;

/// Persistent records for participants, their stats and relationships.
///
/// Relationship status changes go through [`EntityStore::transition`] and
/// [`EntityStore::delete_if`], which only act when the row still has the
/// expected status. Callers treat `Ok(false)` as "someone else got there
/// first", not as an error.
pub trait EntityStore: Send + Sync + 'static {
    fn participant(
        &self,
        id: ParticipantId,
    ) -> impl Future<Output = Result<Option<Participant>>> + Send;

    /// Look up a participant by its exact display name.
    fn participant_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Participant>>> + Send;

    fn put_participant(&self, participant: &Participant) -> impl Future<Output = Result<()>> + Send;

    fn stats(
        &self,
        id: ParticipantId,
    ) -> impl Future<Output = Result<Option<ParticipantStats>>> + Send;

    /// Insert or replace a stats row. Rejects out-of-range values.
    fn put_stats(&self, stats: &ParticipantStats) -> impl Future<Output = Result<()>> + Send;

    /// Overwrite the health stat. Returns false when the participant has no stats row.
    fn set_health(
        &self,
        id: ParticipantId,
        health: i32,
    ) -> impl Future<Output = Result<bool>> + Send;

    fn relationship(
        &self,
        id: RelationshipId,
    ) -> impl Future<Output = Result<Option<Relationship>>> + Send;

    /// Start an Active pairing stamped with the current time.
    fn insert_relationship(
        &self,
        predator: ParticipantId,
        prey: ParticipantId,
    ) -> impl Future<Output = Result<Relationship>> + Send;

    /// Active relationships in which `prey` is the prey.
    fn active_for_prey(
        &self,
        prey: ParticipantId,
    ) -> impl Future<Output = Result<Vec<Relationship>>> + Send;

    /// Active relationships last updated at or before `cutoff`.
    fn idle_active(
        &self,
        cutoff: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<Relationship>>> + Send;

    /// Compare-and-swap the status of one relationship and stamp `updated_at`.
    /// Returns false when the row is gone or no longer has `expected` status.
    fn transition(
        &self,
        id: RelationshipId,
        expected: RelationshipStatus,
        next: RelationshipStatus,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Delete one relationship if it still has `expected` status.
    fn delete_if(
        &self,
        id: RelationshipId,
        expected: RelationshipStatus,
    ) -> impl Future<Output = Result<bool>> + Send;
}
