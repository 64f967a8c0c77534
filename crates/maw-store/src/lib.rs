//! Entity store for the maw bot
//!
//! Participants, their stats and relationships live in NATS JetStream KV
//! buckets. Everything above this crate talks to the [`EntityStore`] trait.

pub mod clock;
pub mod config;
pub mod error;
pub mod kv;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod nats;
pub mod traits;

pub use clock::{SystemClock, WallClock};
#[cfg(any(test, feature = "test-support"))]
pub use clock::MockClock;
pub use config::{NatsAuth, NatsConfig};
pub use error::{Error, Result};
pub use kv::KvEntityStore;
#[cfg(any(test, feature = "test-support"))]
pub use memory::MemoryStore;
pub use nats::connect;
pub use traits::EntityStore;
