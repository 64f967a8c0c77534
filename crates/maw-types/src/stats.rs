//! Participant stats and their value ranges

use serde::{Deserialize, Serialize};

use crate::participant::ParticipantId;

pub const HEALTH_MIN: i32 = -1;
pub const HEALTH_MAX: i32 = 115;
pub const RESISTANCE_MAX: i32 = 50;
pub const ACIDS_MAX: i32 = 10;
pub const STRENGTH_MAX: i32 = 100;

/// A stat value outside its allowed range
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{stat} = {value} is outside [{min}, {max}]")]
pub struct StatsError {
    pub stat: &'static str,
    pub value: i32,
    pub min: i32,
    pub max: i32,
}

/// Numeric stats of a participant (one row per participant)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParticipantStats {
    pub participant: ParticipantId,
    pub health: i32,
    pub arousal: i32,
    pub digestion: i32,
    pub defiance: i32,
    pub euphoria: i32,
    pub resistance: i32,
    pub acids: i32,
    pub strength: i32,
}

impl ParticipantStats {
    /// Check every stat against its range
    pub fn validate(&self) -> Result<(), StatsError> {
        check("health", self.health, HEALTH_MIN, HEALTH_MAX)?;
        check("arousal", self.arousal, -1, i32::MAX)?;
        check("digestion", self.digestion, -1, i32::MAX)?;
        check("defiance", self.defiance, -1, i32::MAX)?;
        check("euphoria", self.euphoria, -1, i32::MAX)?;
        check("resistance", self.resistance, -1, RESISTANCE_MAX)?;
        check("acids", self.acids, 0, ACIDS_MAX)?;
        check("strength", self.strength, 0, STRENGTH_MAX)?;
        Ok(())
    }
}

fn check(stat: &'static str, value: i32, min: i32, max: i32) -> Result<(), StatsError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(StatsError {
            stat,
            value,
            min,
            max,
        })
    }
}
