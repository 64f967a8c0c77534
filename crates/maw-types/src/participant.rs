//! Role-play characters ("participants") owned by a Discord user

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Store identifier of a participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub u64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of a pairing a role leans towards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Leaning {
    Predator,
    Switch,
    Prey,
}

/// Character role.
///
/// Accepted spellings (case-insensitive): `Pred`, `Predator`, `Apex Pred`,
/// `Apex Predator`, `Pred Switch`, `Predator Switch`, `Switch`, `Prey`,
/// `Prey Switch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    ApexPredator,
    Predator,
    PredatorSwitch,
    Switch,
    PreySwitch,
    Prey,
}

impl Role {
    pub fn leaning(self) -> Leaning {
        match self {
            Self::ApexPredator | Self::Predator | Self::PredatorSwitch => Leaning::Predator,
            Self::Switch => Leaning::Switch,
            Self::PreySwitch | Self::Prey => Leaning::Prey,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ApexPredator => "Apex Predator",
            Self::Predator => "Predator",
            Self::PredatorSwitch => "Predator Switch",
            Self::Switch => "Switch",
            Self::PreySwitch => "Prey Switch",
            Self::Prey => "Prey",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role text that matches none of the accepted spellings
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid role '{0}'")]
pub struct InvalidRole(pub String);

impl FromStr for Role {
    type Err = InvalidRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        match normalized.as_str() {
            "apex pred" | "apex predator" => Ok(Self::ApexPredator),
            "pred" | "predator" => Ok(Self::Predator),
            "pred switch" | "predator switch" => Ok(Self::PredatorSwitch),
            "switch" => Ok(Self::Switch),
            "prey switch" => Ok(Self::PreySwitch),
            "prey" => Ok(Self::Prey),
            _ => Err(InvalidRole(s.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = InvalidRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

/// A role-play character
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Participant {
    pub id: ParticipantId,
    /// Discord user that controls this character
    pub user_id: u64,
    pub active: bool,
    pub busy: bool,
    pub name: String,
    pub role: Role,
    pub description: String,
    pub gender: String,
    pub species: String,
    pub weight: i32,
    pub height: i32,
    /// Partner traits this character accepts
    #[serde(default)]
    pub whitelist: Vec<String>,
    /// Partner traits this character refuses
    #[serde(default)]
    pub blacklist: Vec<String>,
    pub autodigest: bool,
}

impl Participant {
    /// True when `user_id` controls this character
    pub fn is_controlled_by(&self, user_id: u64) -> bool {
        self.user_id == user_id
    }
}
