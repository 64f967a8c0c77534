//! The predator/prey pairing record ("digestion")

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::participant::ParticipantId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationshipId(pub Uuid);

impl RelationshipId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RelationshipId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RelationshipId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Lifecycle of a relationship.
///
/// Stored as `Free` / `Voring` / `Vored` so existing rows keep their meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipStatus {
    Free,
    #[serde(rename = "Voring")]
    Active,
    #[serde(rename = "Vored")]
    Resolved,
}

impl fmt::Display for RelationshipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Free => "free",
            Self::Active => "active",
            Self::Resolved => "resolved",
        })
    }
}

/// Directional pairing of a predator and a prey participant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Relationship {
    pub id: RelationshipId,
    pub predator: ParticipantId,
    pub prey: ParticipantId,
    pub status: RelationshipStatus,
    pub updated_at: DateTime<Utc>,
}

impl Relationship {
    /// A new Active pairing stamped at `now`
    pub fn begin(predator: ParticipantId, prey: ParticipantId, now: DateTime<Utc>) -> Self {
        Self {
            id: RelationshipId::new(),
            predator,
            prey,
            status: RelationshipStatus::Active,
            updated_at: now,
        }
    }

    /// True when the row is Active and was last touched at or before `cutoff`
    pub fn is_idle_since(&self, cutoff: DateTime<Utc>) -> bool {
        self.status == RelationshipStatus::Active && self.updated_at <= cutoff
    }
}
