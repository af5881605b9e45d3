//! Provenance and integrity of the shipped datasets: the registry names a
//! source and version for everything under data/, and the canonical catalogs
//! hold together under the full validation pass.

use std::collections::HashSet;
use std::path::Path;

use cryodex::data::collection::{load_collections, DEFAULT_COLLECTIONS_PATH};
use cryodex::data::crew::{load_crew_catalog, DEFAULT_CREW_PATH};
use cryodex::data::player::PlayerSnapshot;
use cryodex::data::registry::{load_registry, DEFAULT_REGISTRY_PATH};
use cryodex::data::validate::validate_catalogs;
use cryodex::engine::evaluate_player;

#[test]
fn registry_carries_provenance_for_every_dataset() {
    let registry = load_registry(DEFAULT_REGISTRY_PATH);
    assert!(!registry.is_empty(), "registry should have entries");

    for key in ["collections", "crew"] {
        let entry = registry
            .get(key)
            .unwrap_or_else(|| panic!("registry should track the {key} dataset"));
        assert!(!entry.source.is_empty(), "{key} needs a source note");
        assert!(entry.data_version.is_some(), "{key} needs a data version");
        assert!(entry.last_updated.is_some(), "{key} needs a timestamp");

        let dataset = Path::new("data").join(&entry.path);
        assert!(dataset.exists(), "{} should exist", dataset.display());
    }
}

#[test]
fn canonical_catalogs_validate_cleanly() {
    let report = validate_catalogs(DEFAULT_COLLECTIONS_PATH, DEFAULT_CREW_PATH)
        .expect("both catalogs should parse");
    for diagnostic in &report.diagnostics {
        eprintln!("{diagnostic}");
    }
    assert!(!report.has_errors(), "shipped catalogs must be error-free");
}

#[test]
fn collection_members_resolve_against_the_crew_catalog() {
    let definitions = load_collections(DEFAULT_COLLECTIONS_PATH).expect("read collections");
    let catalog = load_crew_catalog(DEFAULT_CREW_PATH).expect("read crew catalog");
    let symbols: HashSet<&str> = catalog.iter().map(|entry| entry.symbol.as_str()).collect();

    let mut ids = HashSet::new();
    for definition in &definitions {
        assert!(ids.insert(definition.id), "duplicate id {}", definition.id);
        assert!(!definition.crew.is_empty(), "{} has no members", definition.name);
        for member in &definition.crew {
            assert!(
                symbols.contains(member.as_str()),
                "{} references unknown crew {member}",
                definition.name
            );
        }

        // Tier goals climb and never overshoot the roster.
        let goals: Vec<u32> = definition
            .milestones
            .iter()
            .filter_map(|milestone| milestone.goal.count())
            .collect();
        assert!(
            goals.windows(2).all(|pair| pair[0] < pair[1]),
            "{} goals should be strictly ascending",
            definition.name
        );
        assert!(
            goals.last().copied().unwrap_or(0) <= definition.crew.len() as u32,
            "{} asks for more fusions than it has members",
            definition.name
        );
    }
}

#[test]
fn crew_catalog_rarities_stay_in_range() {
    let catalog = load_crew_catalog(DEFAULT_CREW_PATH).expect("read crew catalog");
    let mut symbols = HashSet::new();
    for entry in &catalog {
        assert!(symbols.insert(entry.symbol.as_str()), "duplicate {}", entry.symbol);
        assert!(
            (1..=5).contains(&entry.max_rarity),
            "{} has rarity ceiling {}",
            entry.symbol,
            entry.max_rarity
        );
    }
}

#[test]
fn shipped_descriptions_render_without_markup() {
    let definitions = load_collections(DEFAULT_COLLECTIONS_PATH).expect("read collections");
    let catalog = load_crew_catalog(DEFAULT_CREW_PATH).expect("read crew catalog");
    let view = evaluate_player(&definitions, &catalog, &PlayerSnapshot::default());

    for state in &view.collections {
        assert!(!state.description.contains('<'), "{}: {}", state.name, state.description);
        assert!(!state.description.contains("&#"), "{}: {}", state.name, state.description);
        assert!(!state.description.contains("&amp;"), "{}: {}", state.name, state.description);
    }

    let paradox = view
        .collections
        .iter()
        .find(|state| state.name == "Twin Paradox")
        .expect("Twin Paradox state");
    assert_eq!(
        paradox.description,
        "Two Vales 'who met themselves' coming back through the anomaly"
    );
}
