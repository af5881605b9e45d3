//! Crew catalog: every crew member that exists in the game (CRYODEX schema).
//! Collection membership lives on the collection side; see data/collection.rs.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CREW_PATH: &str = "data/crew/crew.canonical.json";

/// One catalog row. `retrievable` marks crew obtainable through the game's
/// targeted-acquisition system; the view filters on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewEntry {
    pub symbol: String,
    pub name: String,
    pub max_rarity: u8,
    #[serde(default)]
    pub retrievable: bool,
}

#[derive(Debug, Deserialize)]
struct CrewFile {
    crew: Vec<CrewEntry>,
}

pub fn load_crew_catalog(path: impl AsRef<Path>) -> Result<Vec<CrewEntry>, std::io::Error> {
    let raw = fs::read_to_string(path)?;
    let parsed: CrewFile = serde_json::from_str(&raw).map_err(std::io::Error::other)?;
    Ok(parsed.crew)
}
