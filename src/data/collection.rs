//! Collection catalog: named crew groups with tiered milestone rewards.
//! Canonical schema (CRYODEX) written by the normalizer, loaded at runtime.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const DEFAULT_COLLECTIONS_PATH: &str = "data/collections/collections.canonical.json";

/// Milestone goal: a fully-fused member count, or not applicable once every
/// tier of the collection has been claimed. Round-trips as a bare number or
/// the literal string "n/a" in game data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MilestoneGoal {
    NotApplicable,
    Goal(u32),
}

impl MilestoneGoal {
    pub fn count(self) -> Option<u32> {
        match self {
            Self::Goal(n) => Some(n),
            Self::NotApplicable => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Goal(_))
    }

    /// Numeric and greater than zero: the collection can still advance.
    pub fn is_positive(self) -> bool {
        matches!(self, Self::Goal(n) if n > 0)
    }
}

impl Default for MilestoneGoal {
    fn default() -> Self {
        MilestoneGoal::Goal(0)
    }
}

impl fmt::Display for MilestoneGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Goal(n) => write!(f, "{n}"),
            Self::NotApplicable => write!(f, "n/a"),
        }
    }
}

impl Serialize for MilestoneGoal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Goal(n) => serializer.serialize_u32(*n),
            Self::NotApplicable => serializer.serialize_str("n/a"),
        }
    }
}

impl<'de> Deserialize<'de> for MilestoneGoal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct GoalVisitor;

        impl Visitor<'_> for GoalVisitor {
            type Value = MilestoneGoal;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer or the string \"n/a\"")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<MilestoneGoal, E> {
                u32::try_from(value)
                    .map(MilestoneGoal::Goal)
                    .map_err(|_| E::custom(format!("goal {value} out of range")))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<MilestoneGoal, E> {
                if value < 0 {
                    return Err(E::custom(format!("goal {value} is negative")));
                }
                self.visit_u64(value as u64)
            }

            fn visit_f64<E: de::Error>(self, value: f64) -> Result<MilestoneGoal, E> {
                if value < 0.0 || value.fract() != 0.0 {
                    return Err(E::custom(format!("goal {value} is not a whole count")));
                }
                self.visit_u64(value as u64)
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<MilestoneGoal, E> {
                if value.eq_ignore_ascii_case("n/a") {
                    return Ok(MilestoneGoal::NotApplicable);
                }
                value
                    .trim()
                    .parse::<u32>()
                    .map(MilestoneGoal::Goal)
                    .map_err(|_| E::custom(format!("goal '{value}' is neither a count nor n/a")))
            }
        }

        deserializer.deserialize_any(GoalVisitor)
    }
}

/// One reward (or buff) line attached to a milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub id: u32,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rarity: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub goal: MilestoneGoal,
    #[serde(default)]
    pub rewards: Vec<Reward>,
    #[serde(default)]
    pub buffs: Vec<Reward>,
}

/// Static collection definition. Loaded once per session, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionDefinition {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    /// Symbols of every crew member counting toward this collection.
    #[serde(default)]
    pub crew: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CollectionsFile {
    collections: Vec<CollectionDefinition>,
}

pub fn load_collections(path: impl AsRef<Path>) -> Result<Vec<CollectionDefinition>, std::io::Error> {
    let raw = fs::read_to_string(path)?;
    let parsed: CollectionsFile = serde_json::from_str(&raw).map_err(std::io::Error::other)?;
    Ok(parsed.collections)
}
