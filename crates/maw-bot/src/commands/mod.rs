//! Slash command handlers

pub mod stats;

pub use stats::StatsCommand;
