//! Player snapshot: owned crew copies plus live cryo-collection progress.
//! Written by the importer and the sync ingress; loaded by every engine surface.

use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::collection::{Milestone, MilestoneGoal};

pub const DEFAULT_PLAYER_SNAPSHOT_PATH: &str = "data/player/player.imported.json";

/// One owned in-game copy of a crew symbol. A player can hold several copies
/// of the same symbol at different rarities and levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedCopy {
    pub symbol: String,
    pub rarity: u8,
    #[serde(default)]
    pub level: u16,
    /// Equipped item count, 0..=4.
    #[serde(default)]
    pub equipped: u8,
    #[serde(default)]
    pub favorite: bool,
}

/// The game's live progress record for one collection. Ids can be stale
/// across game-data versions; the state builder reconciles them by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryoCollectionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    pub name: String,
    #[serde(default)]
    pub progress: MilestoneGoal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone: Option<Milestone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimable_milestone_index: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    #[serde(default)]
    pub crew: Vec<OwnedCopy>,
    #[serde(default)]
    pub cryo_collections: Vec<CryoCollectionRecord>,
}

/// Load the player snapshot. A missing file means "nothing imported yet" and
/// returns the empty default; an unreadable or malformed file warns and does
/// the same so read-only surfaces keep working.
pub fn load_player_snapshot(path: impl AsRef<Path>) -> PlayerSnapshot {
    let path = path.as_ref();
    if !path.exists() {
        return PlayerSnapshot::default();
    }
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            eprintln!("unable to read player snapshot '{}': {err}", path.display());
            return PlayerSnapshot::default();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            eprintln!("malformed player snapshot '{}': {err}", path.display());
            PlayerSnapshot::default()
        }
    }
}

/// Pick the single copy that represents a symbol for the engine: highest
/// rarity, then highest level, then most equipped items. The first copy wins
/// a full tie, so the result is stable for identical inputs.
pub fn select_best_owned_copy(copies: &[OwnedCopy]) -> Option<&OwnedCopy> {
    copies.iter().reduce(|best, copy| {
        let ord = copy
            .rarity
            .cmp(&best.rarity)
            .then_with(|| copy.level.cmp(&best.level))
            .then_with(|| copy.equipped.cmp(&best.equipped));
        if ord == Ordering::Greater {
            copy
        } else {
            best
        }
    })
}
