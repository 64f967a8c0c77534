//! Shared domain types for the maw bot
//!
//! Participants and their stats, the predator/prey relationship record, the
//! inbound interaction events the dispatch engine routes, and the replies
//! handlers send back.

pub mod custom_id;
pub mod errors;
pub mod interaction;
pub mod participant;
pub mod prompt;
pub mod relationship;
pub mod reply;
pub mod stats;
pub mod types;

pub use custom_id::{Answer, ButtonId};
pub use interaction::{EventMetadata, InteractionEvent, InteractionKind, ModalField};
pub use participant::{Leaning, Participant, ParticipantId, Role};
pub use prompt::ConsentPrompt;
pub use relationship::{Relationship, RelationshipId, RelationshipStatus};
pub use reply::{Notice, Reply, Severity};
pub use stats::{ParticipantStats, StatsError};
pub use types::*;
