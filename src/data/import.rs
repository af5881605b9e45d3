//! Roster import: turn a game player-data export (JSON) or a spreadsheet
//! export (CSV) into the canonical player snapshot. Rows resolve against the
//! crew catalog by symbol or name; unresolved rows are reported, never fatal.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::collection::{Milestone, MilestoneGoal};
use crate::data::crew::{load_crew_catalog, CrewEntry, DEFAULT_CREW_PATH};
use crate::data::player::{CryoCollectionRecord, OwnedCopy, PlayerSnapshot};

pub const DEFAULT_IMPORT_OUTPUT_PATH: &str = "data/player/player.imported.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedEntry {
    pub record_index: usize,
    pub input_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub source_path: String,
    pub output_path: String,
    pub imported_at: String,
    pub total_records: usize,
    pub matched_records: usize,
    pub unmatched_records: usize,
    pub ambiguous_records: usize,
    /// Symbols the player owns more than one copy of. Copies are kept in the
    /// snapshot; the engine projects the best copy per symbol.
    pub duplicate_symbols: usize,
    pub collection_records: usize,
    pub unresolved: Vec<UnresolvedEntry>,
}

impl ImportReport {
    pub fn has_unresolved(&self) -> bool {
        !self.unresolved.is_empty()
    }
}

#[derive(Debug)]
pub enum ImportError {
    Read(std::io::Error),
    Parse(serde_json::Error),
    Csv(csv::Error),
    Write(std::io::Error),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(err) => write!(f, "failed to read import file: {err}"),
            Self::Parse(err) => write!(f, "failed to parse import JSON: {err}"),
            Self::Csv(err) => write!(f, "failed to parse roster CSV: {err}"),
            Self::Write(err) => write!(f, "failed to persist import output: {err}"),
        }
    }
}

impl std::error::Error for ImportError {}

// ----- Game export shapes (tolerant: exports differ by app version) -----

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PlayerExport {
    Nested { player: ExportPlayer },
    Character { character: ExportCharacter },
    Flat(ExportCharacter),
    Rows(Vec<ExportCrewRow>),
}

#[derive(Debug, Deserialize)]
struct ExportPlayer {
    character: ExportCharacter,
}

#[derive(Debug, Default, Deserialize)]
struct ExportCharacter {
    #[serde(default)]
    crew: Vec<ExportCrewRow>,
    #[serde(default)]
    cryo_collections: Vec<ExportCollectionRow>,
}

#[derive(Debug, Clone, Deserialize)]
struct ExportCrewRow {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default, alias = "short_name")]
    name: Option<String>,
    #[serde(default)]
    rarity: Option<u8>,
    #[serde(default)]
    level: Option<u16>,
    #[serde(default, alias = "equipment_count")]
    equipped: Option<u8>,
    #[serde(default)]
    favorite: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct ExportCollectionRow {
    #[serde(default, alias = "type_id")]
    id: Option<u32>,
    name: String,
    #[serde(default)]
    progress: MilestoneGoal,
    #[serde(default)]
    milestone: Option<Milestone>,
    #[serde(default, alias = "claimable_milestone_index")]
    claimable: Option<usize>,
}

// ----- Spreadsheet export row -----

#[derive(Debug, Deserialize)]
struct CsvRosterRow {
    name: String,
    rarity: u8,
    #[serde(default)]
    level: u16,
    #[serde(default)]
    equipped: u8,
    #[serde(default)]
    favorite: bool,
}

/// Name lookup over the crew catalog: exact (normalized) match first, then a
/// unique-substring fallback. Ambiguity is surfaced to the caller.
pub struct CrewNameIndex {
    by_name: HashMap<String, Vec<String>>,
    by_symbol: HashMap<String, String>,
    names: Vec<(String, String)>,
}

pub enum NameResolution {
    Match(String),
    Ambiguous(usize),
    Unknown,
}

impl CrewNameIndex {
    pub fn build(catalog: &[CrewEntry]) -> Self {
        let mut by_name: HashMap<String, Vec<String>> = HashMap::new();
        let mut by_symbol = HashMap::new();
        let mut names = Vec::with_capacity(catalog.len());
        for entry in catalog {
            by_name
                .entry(normalize_key(&entry.name))
                .or_default()
                .push(entry.symbol.clone());
            by_symbol.insert(entry.symbol.clone(), entry.name.clone());
            names.push((normalize_key(&entry.name), entry.symbol.clone()));
        }
        Self {
            by_name,
            by_symbol,
            names,
        }
    }

    pub fn contains_symbol(&self, symbol: &str) -> bool {
        self.by_symbol.contains_key(symbol)
    }

    pub fn resolve(&self, raw_name: &str) -> NameResolution {
        let normalized = normalize_key(raw_name);
        if normalized.is_empty() {
            return NameResolution::Unknown;
        }
        if let Some(symbols) = self.by_name.get(&normalized) {
            return match symbols.len() {
                1 => NameResolution::Match(symbols[0].clone()),
                n => NameResolution::Ambiguous(n),
            };
        }
        let substring_hits: Vec<&str> = self
            .names
            .iter()
            .filter(|(name, _)| name.contains(&normalized))
            .map(|(_, symbol)| symbol.as_str())
            .collect();
        match substring_hits.len() {
            0 => NameResolution::Unknown,
            1 => NameResolution::Match(substring_hits[0].to_string()),
            n => NameResolution::Ambiguous(n),
        }
    }
}

fn normalize_key(value: &str) -> String {
    value
        .trim()
        .replace('\u{2019}', "'")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Import a game player-data export. Writes the snapshot to `output_path`.
pub fn import_player_export(path: &str, output_path: &str) -> Result<ImportReport, ImportError> {
    let raw = fs::read_to_string(path).map_err(ImportError::Read)?;
    let export: PlayerExport = serde_json::from_str(&raw).map_err(ImportError::Parse)?;
    let character = flatten_export(export);

    let catalog = load_crew_catalog(DEFAULT_CREW_PATH).map_err(ImportError::Read)?;
    let index = CrewNameIndex::build(&catalog);

    let mut copies = Vec::new();
    let mut unresolved = Vec::new();
    let mut ambiguous_records = 0usize;
    let mut matched_records = 0usize;

    for (record_index, row) in character.crew.iter().enumerate() {
        let symbol = match resolve_row(&index, row) {
            RowResolution::Symbol(symbol) => symbol,
            RowResolution::Ambiguous(input, count) => {
                ambiguous_records += 1;
                unresolved.push(UnresolvedEntry {
                    record_index,
                    input_name: input,
                    reason: format!("ambiguous crew name ({count} catalog matches)"),
                });
                continue;
            }
            RowResolution::Unknown(input) => {
                unresolved.push(UnresolvedEntry {
                    record_index,
                    input_name: input,
                    reason: "no catalog match".to_string(),
                });
                continue;
            }
        };

        matched_records += 1;
        copies.push(OwnedCopy {
            symbol,
            rarity: row.rarity.unwrap_or(1),
            level: row.level.unwrap_or(0),
            equipped: row.equipped.unwrap_or(0),
            favorite: row.favorite,
        });
    }

    let mut collections: Vec<CryoCollectionRecord> = character
        .cryo_collections
        .iter()
        .map(|row| CryoCollectionRecord {
            id: row.id,
            name: row.name.clone(),
            progress: row.progress,
            milestone: row.milestone.clone(),
            claimable_milestone_index: row.claimable,
        })
        .collect();
    collections.sort_by(|a, b| a.name.cmp(&b.name));

    finish_import(
        path,
        output_path,
        character.crew.len(),
        matched_records,
        ambiguous_records,
        copies,
        collections,
        unresolved,
    )
}

/// Import a spreadsheet roster export (headered CSV: name, rarity, level,
/// equipped, favorite). Collection progress is not part of spreadsheet
/// exports; an existing snapshot's progress records are preserved.
pub fn import_roster_csv(path: &str, output_path: &str) -> Result<ImportReport, ImportError> {
    let mut reader = csv::Reader::from_path(path).map_err(ImportError::Csv)?;

    let catalog = load_crew_catalog(DEFAULT_CREW_PATH).map_err(ImportError::Read)?;
    let index = CrewNameIndex::build(&catalog);

    let mut copies = Vec::new();
    let mut unresolved = Vec::new();
    let mut ambiguous_records = 0usize;
    let mut matched_records = 0usize;
    let mut total_records = 0usize;

    for (record_index, row) in reader.deserialize::<CsvRosterRow>().enumerate() {
        total_records += 1;
        let row = match row {
            Ok(row) => row,
            Err(err) => {
                unresolved.push(UnresolvedEntry {
                    record_index,
                    input_name: String::new(),
                    reason: format!("unreadable row: {err}"),
                });
                continue;
            }
        };

        match index.resolve(&row.name) {
            NameResolution::Match(symbol) => {
                matched_records += 1;
                copies.push(OwnedCopy {
                    symbol,
                    rarity: row.rarity,
                    level: row.level,
                    equipped: row.equipped,
                    favorite: row.favorite,
                });
            }
            NameResolution::Ambiguous(count) => {
                ambiguous_records += 1;
                unresolved.push(UnresolvedEntry {
                    record_index,
                    input_name: row.name,
                    reason: format!("ambiguous crew name ({count} catalog matches)"),
                });
            }
            NameResolution::Unknown => {
                unresolved.push(UnresolvedEntry {
                    record_index,
                    input_name: row.name,
                    reason: "no catalog match".to_string(),
                });
            }
        }
    }

    let previous = crate::data::player::load_player_snapshot(output_path);

    finish_import(
        path,
        output_path,
        total_records,
        matched_records,
        ambiguous_records,
        copies,
        previous.cryo_collections,
        unresolved,
    )
}

enum RowResolution {
    Symbol(String),
    Ambiguous(String, usize),
    Unknown(String),
}

fn resolve_row(index: &CrewNameIndex, row: &ExportCrewRow) -> RowResolution {
    if let Some(symbol) = &row.symbol {
        if index.contains_symbol(symbol) {
            return RowResolution::Symbol(symbol.clone());
        }
    }
    let input = row
        .name
        .clone()
        .or_else(|| row.symbol.clone())
        .unwrap_or_default();
    match index.resolve(&input) {
        NameResolution::Match(symbol) => RowResolution::Symbol(symbol),
        NameResolution::Ambiguous(count) => RowResolution::Ambiguous(input, count),
        NameResolution::Unknown => RowResolution::Unknown(input),
    }
}

fn flatten_export(export: PlayerExport) -> ExportCharacter {
    match export {
        PlayerExport::Nested { player } => player.character,
        PlayerExport::Character { character } => character,
        PlayerExport::Flat(character) => character,
        PlayerExport::Rows(crew) => ExportCharacter {
            crew,
            cryo_collections: Vec::new(),
        },
    }
}

#[allow(clippy::too_many_arguments)]
fn finish_import(
    source_path: &str,
    output_path: &str,
    total_records: usize,
    matched_records: usize,
    ambiguous_records: usize,
    mut copies: Vec<OwnedCopy>,
    collections: Vec<CryoCollectionRecord>,
    unresolved: Vec<UnresolvedEntry>,
) -> Result<ImportReport, ImportError> {
    copies.sort_by(|a, b| {
        a.symbol
            .cmp(&b.symbol)
            .then_with(|| b.rarity.cmp(&a.rarity))
            .then_with(|| b.level.cmp(&a.level))
    });

    let mut copies_per_symbol: HashMap<&str, usize> = HashMap::new();
    for copy in &copies {
        *copies_per_symbol.entry(copy.symbol.as_str()).or_insert(0) += 1;
    }
    let duplicate_symbols = copies_per_symbol.values().filter(|&&n| n > 1).count();

    let collection_records = collections.len();
    let snapshot = PlayerSnapshot {
        crew: copies,
        cryo_collections: collections,
    };

    if let Some(parent) = Path::new(output_path).parent() {
        fs::create_dir_all(parent).map_err(ImportError::Write)?;
    }
    let serialized = serde_json::to_string_pretty(&snapshot).map_err(ImportError::Parse)?;
    fs::write(output_path, serialized).map_err(ImportError::Write)?;

    Ok(ImportReport {
        source_path: source_path.to_string(),
        output_path: output_path.to_string(),
        imported_at: chrono::Utc::now().to_rfc3339(),
        total_records,
        matched_records,
        unmatched_records: unresolved.len().saturating_sub(ambiguous_records),
        ambiguous_records,
        duplicate_symbols,
        collection_records,
        unresolved,
    })
}

/// Pick the importer by file extension: `.csv` goes through the spreadsheet
/// path, everything else is treated as a game JSON export.
pub fn import_roster(path: &str, output_path: &str) -> Result<ImportReport, ImportError> {
    if path.to_ascii_lowercase().ends_with(".csv") {
        import_roster_csv(path, output_path)
    } else {
        import_player_export(path, output_path)
    }
}
