//! Normalize a raw datacore export into the canonical cryodex catalogs.
//! Reads data/upstream/datacore/ (collections.json and crew.json), writes
//! data/collections/ and data/crew/ and refreshes the registry entries with
//! data_version/source. Run after fetching a fresh export.

use std::fs;

use serde::Deserialize;

use cryodex::data::collection::{CollectionDefinition, Milestone, DEFAULT_COLLECTIONS_PATH};
use cryodex::data::crew::{CrewEntry, DEFAULT_CREW_PATH};
use cryodex::data::registry::{load_registry, save_registry, DataSetEntry, DEFAULT_REGISTRY_PATH};
use cryodex::data::validate::validate_catalogs;

const UPSTREAM_COLLECTIONS_SUFFIX: &str = "data/upstream/datacore/collections.json";
const UPSTREAM_CREW_SUFFIX: &str = "data/upstream/datacore/crew.json";
const SOURCE_NOTE: &str = "datacore export";

/// Resolve path relative to repo root (CARGO_MANIFEST_DIR when run via cargo).
fn repo_data_path(suffix: &str) -> std::path::PathBuf {
    if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
        return std::path::PathBuf::from(manifest_dir).join(suffix);
    }
    std::path::PathBuf::from(suffix)
}

// ----- Raw datacore collection (partial) -----
#[derive(Debug, Deserialize)]
struct RawCollection {
    #[serde(default)]
    id: Option<u32>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    milestones: Vec<Milestone>,
    #[serde(default)]
    crew: Vec<String>,
}

// ----- Raw datacore crew (partial) -----
#[derive(Debug, Deserialize)]
struct RawCrew {
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    max_rarity: u8,
    /// Datacore calls portal-retrievable crew "in_portal".
    #[serde(default)]
    in_portal: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let data_version =
        std::env::var("CRYODEX_DATA_VERSION").unwrap_or_else(|_| "datacore-main".to_string());

    let upstream_collections = repo_data_path(UPSTREAM_COLLECTIONS_SUFFIX);
    let upstream_crew = repo_data_path(UPSTREAM_CREW_SUFFIX);
    let out_collections = repo_data_path(DEFAULT_COLLECTIONS_PATH);
    let out_crew = repo_data_path(DEFAULT_CREW_PATH);
    let registry_path = repo_data_path(DEFAULT_REGISTRY_PATH);

    if !upstream_collections.is_file() {
        eprintln!(
            "error: upstream collections export not found: {}",
            upstream_collections.display()
        );
        eprintln!("Fetch a datacore export into data/upstream/datacore/ first.");
        std::process::exit(1);
    }
    if !upstream_crew.is_file() {
        eprintln!(
            "error: upstream crew export not found: {}",
            upstream_crew.display()
        );
        eprintln!("Fetch a datacore export into data/upstream/datacore/ first.");
        std::process::exit(1);
    }

    // ----- Collections -----
    let raw_collections: Vec<RawCollection> =
        serde_json::from_str(&fs::read_to_string(&upstream_collections)?)?;
    let mut skipped_collections = 0usize;
    let mut collections: Vec<CollectionDefinition> = Vec::new();
    for raw in raw_collections {
        let Some(id) = raw.id else {
            skipped_collections += 1;
            continue;
        };
        if raw.name.trim().is_empty() {
            skipped_collections += 1;
            continue;
        }
        collections.push(CollectionDefinition {
            id,
            name: raw.name,
            description: raw.description,
            milestones: raw.milestones,
            crew: raw.crew,
        });
    }
    collections.sort_by_key(|definition| definition.id);
    collections.dedup_by_key(|definition| definition.id);
    if skipped_collections > 0 {
        eprintln!("warning: skipped {skipped_collections} collection(s) without id or name");
    }

    // ----- Crew -----
    let raw_crew: Vec<RawCrew> = serde_json::from_str(&fs::read_to_string(&upstream_crew)?)?;
    let mut skipped_crew = 0usize;
    let mut crew: Vec<CrewEntry> = Vec::new();
    for raw in raw_crew {
        if raw.symbol.trim().is_empty() || raw.name.trim().is_empty() {
            skipped_crew += 1;
            continue;
        }
        crew.push(CrewEntry {
            symbol: raw.symbol,
            name: raw.name,
            max_rarity: raw.max_rarity.clamp(1, 5),
            retrievable: raw.in_portal,
        });
    }
    crew.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    crew.dedup_by(|a, b| a.symbol == b.symbol);
    if skipped_crew > 0 {
        eprintln!("warning: skipped {skipped_crew} crew without symbol or name");
    }

    if let Some(parent) = out_collections.parent() {
        fs::create_dir_all(parent)?;
    }
    if let Some(parent) = out_crew.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(
        &out_collections,
        serde_json::to_string_pretty(&serde_json::json!({ "collections": collections }))?,
    )?;
    fs::write(
        &out_crew,
        serde_json::to_string_pretty(&serde_json::json!({ "crew": crew }))?,
    )?;

    // ----- Registry -----
    let now = chrono::Utc::now().to_rfc3339();
    let mut registry = load_registry(&registry_path);
    registry.insert(
        "collections".to_string(),
        DataSetEntry {
            source: SOURCE_NOTE.to_string(),
            data_version: Some(data_version.clone()),
            last_updated: Some(now.clone()),
            path: "collections/collections.canonical.json".to_string(),
        },
    );
    registry.insert(
        "crew".to_string(),
        DataSetEntry {
            source: SOURCE_NOTE.to_string(),
            data_version: Some(data_version.clone()),
            last_updated: Some(now),
            path: "crew/crew.canonical.json".to_string(),
        },
    );
    save_registry(&registry_path, &registry)?;

    // Re-validate what was just written so a bad export fails loudly here
    // instead of at serve time.
    let report = validate_catalogs(
        &out_collections.to_string_lossy(),
        &out_crew.to_string_lossy(),
    )
    .map_err(std::io::Error::other)?;
    for diagnostic in &report.diagnostics {
        eprintln!("{diagnostic}");
    }
    if report.has_errors() {
        eprintln!("error: normalized catalogs failed validation");
        std::process::exit(1);
    }

    println!(
        "Normalized {} collections and {} crew. data_version={data_version} source={SOURCE_NOTE}",
        collections.len(),
        crew.len()
    );
    Ok(())
}
