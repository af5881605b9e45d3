//! Command line dispatch: `cryodex <command> [args]`.
//!
//! Exit codes: 0 success, 1 runtime failure, 2 usage error. Malformed
//! numeric arguments and unknown option values warn and fall back to their
//! defaults instead of aborting.

use crate::data::collection::{load_collections, CollectionDefinition, DEFAULT_COLLECTIONS_PATH};
use crate::data::crew::{load_crew_catalog, CrewEntry, DEFAULT_CREW_PATH};
use crate::data::import::{import_roster, DEFAULT_IMPORT_OUTPUT_PATH};
use crate::data::player::{load_player_snapshot, PlayerSnapshot, DEFAULT_PLAYER_SNAPSHOT_PATH};
use crate::data::validate::validate_catalogs;
use crate::engine::combo::{discover_combos, ComboOptions, MatchMode};
use crate::engine::evaluate_player;
use crate::engine::filter::{CrewFilter, OwnershipFilter};
use crate::engine::score::{compare_by_star_score, StarScore};
use crate::engine::state::find_collection_id;
use crate::engine::tiers::merge_tier_range;
use crate::parallel::{run_scoring_pass, WorkerPool};
use crate::server;

const BIND_ENV: &str = "CRYODEX_BIND";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_SCORE_LIMIT: u32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Serve,
    Score,
    Optimize,
    Merge,
    Import,
    Validate,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("serve") => Some(Command::Serve),
        Some("score") => Some(Command::Score),
        Some("optimize") => Some(Command::Optimize),
        Some("merge") => Some(Command::Merge),
        Some("import") => Some(Command::Import),
        Some("validate") => Some(Command::Validate),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    match parse_command(args) {
        Some(Command::Serve) => handle_serve(),
        Some(Command::Score) => handle_score(args),
        Some(Command::Optimize) => handle_optimize(args),
        Some(Command::Merge) => handle_merge(args),
        Some(Command::Import) => handle_import(args),
        Some(Command::Validate) => handle_validate(args),
        None => {
            print_usage();
            2
        }
    }
}

fn print_usage() {
    eprintln!("usage: cryodex <command> [args]");
    eprintln!();
    eprintln!("commands:");
    eprintln!("  serve                            start the HTTP server ({BIND_ENV} overrides {DEFAULT_BIND_ADDR})");
    eprintln!("  score [--limit N] [--owned-only] [--sale] [--table] [--workers N]");
    eprintln!("                                   rank crew by citation value");
    eprintln!("  optimize <collection> [--mode MODE] [--sale]");
    eprintln!("                                   discover combo groups for one collection");
    eprintln!("  merge <collection> [end-tier]    collapse claimable tiers into one view");
    eprintln!("  import <file>                    import a player export (.json or .csv)");
    eprintln!("  validate [collections] [crew]    check the canonical catalogs");
}

/// Catalogs plus snapshot, the inputs every engine command starts from.
fn load_world() -> (Vec<CollectionDefinition>, Vec<CrewEntry>, PlayerSnapshot) {
    let definitions = load_collections(DEFAULT_COLLECTIONS_PATH).unwrap_or_else(|err| {
        eprintln!("warning: could not load {DEFAULT_COLLECTIONS_PATH}: {err}");
        Vec::new()
    });
    let catalog = load_crew_catalog(DEFAULT_CREW_PATH).unwrap_or_else(|err| {
        eprintln!("warning: could not load {DEFAULT_CREW_PATH}: {err}");
        Vec::new()
    });
    let player = load_player_snapshot(DEFAULT_PLAYER_SNAPSHOT_PATH);
    (definitions, catalog, player)
}

fn handle_serve() -> i32 {
    let bind_addr = std::env::var(BIND_ENV).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    match server::run_server(&bind_addr) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("server error: {err}");
            1
        }
    }
}

fn handle_score(args: &[String]) -> i32 {
    let limit = parse_u32_flag(args, "--limit", DEFAULT_SCORE_LIMIT) as usize;
    let owned_only = args.iter().any(|arg| arg == "--owned-only");
    let sale = args.iter().any(|arg| arg == "--sale");
    let pool = WorkerPool::with_workers(parse_u32_flag(args, "--workers", 0) as usize);

    let (definitions, catalog, player) = load_world();
    let mut view = evaluate_player(&definitions, &catalog, &player);
    let filter = CrewFilter {
        ownership: if owned_only {
            OwnershipFilter::OwnedOnly
        } else {
            OwnershipFilter::Any
        },
        ..CrewFilter::default()
    };
    let summary = run_scoring_pass(&mut view.crew, &view.collections, &filter, sale, &pool);

    let mut crew: Vec<_> = view
        .crew
        .into_iter()
        .filter(|record| filter.matches_with_search(record))
        .collect();
    crew.sort_by(|a, b| compare_by_star_score(b, a).then_with(|| a.symbol.cmp(&b.symbol)));
    crew.truncate(limit);

    if args.iter().any(|arg| arg == "--table") {
        println!("symbol\tname\trarity\tcollection_score\tstar_score");
        for record in &crew {
            let stars = match record.star_score {
                StarScore::Capped => "capped".to_string(),
                StarScore::Value(value) => value.to_string(),
            };
            println!(
                "{}\t{}\t{}/{}\t{}\t{}",
                record.symbol,
                record.name,
                record.rarity,
                record.max_rarity,
                record.collection_score,
                stars
            );
        }
        eprintln!(
            "scored {} crew (sale={}), top collection score {}, top star score {}",
            summary.scored_crew, sale, summary.top_collection_score, summary.top_star_score
        );
        return 0;
    }

    let payload = serde_json::json!({ "summary": summary, "crew": crew });
    match serde_json::to_string_pretty(&payload) {
        Ok(rendered) => {
            println!("{rendered}");
            0
        }
        Err(err) => {
            eprintln!("failed to render scores: {err}");
            1
        }
    }
}

fn handle_optimize(args: &[String]) -> i32 {
    let Some(reference) = args.get(2).filter(|arg| !arg.starts_with("--")) else {
        eprintln!("usage: cryodex optimize <collection> [--mode MODE] [--sale]");
        return 2;
    };
    let sale = args.iter().any(|arg| arg == "--sale");
    let match_mode = parse_mode_flag(args);

    let (definitions, catalog, player) = load_world();
    let view = evaluate_player(&definitions, &catalog, &player);
    let Some(focal_id) = find_collection_id(&view.collections, reference) else {
        eprintln!("no collection matches '{reference}'");
        return 1;
    };

    let options = ComboOptions {
        sale,
        match_mode,
        ..ComboOptions::default()
    };
    let Some(report) = discover_combos(focal_id, &view.collections, &view.crew, &options) else {
        eprintln!("no collection matches '{reference}'");
        return 1;
    };

    match serde_json::to_string_pretty(&report) {
        Ok(rendered) => {
            println!("{rendered}");
            0
        }
        Err(err) => {
            eprintln!("failed to render combos: {err}");
            1
        }
    }
}

fn handle_merge(args: &[String]) -> i32 {
    let Some(reference) = args.get(2).filter(|arg| !arg.starts_with("--")) else {
        eprintln!("usage: cryodex merge <collection> [end-tier]");
        return 2;
    };

    let (definitions, catalog, player) = load_world();
    let view = evaluate_player(&definitions, &catalog, &player);
    let Some(focal_id) = find_collection_id(&view.collections, reference) else {
        eprintln!("no collection matches '{reference}'");
        return 1;
    };
    let Some(state) = view.collections.iter().find(|state| state.id == focal_id) else {
        eprintln!("no collection matches '{reference}'");
        return 1;
    };
    let Some(definition) = definitions.iter().find(|definition| definition.id == focal_id)
    else {
        eprintln!("collection {focal_id} has no catalog definition");
        return 1;
    };

    let last_tier = definition.milestones.len().saturating_sub(1) as u32;
    let end = parse_u32_arg(args.get(3), "end-tier", last_tier).min(last_tier) as usize;
    let start = player
        .cryo_collections
        .iter()
        .find(|record| record.name == state.name)
        .and_then(|record| record.claimable_milestone_index)
        .unwrap_or(0);

    let merged = merge_tier_range(state, &definition.milestones, start, end);
    match serde_json::to_string_pretty(&merged) {
        Ok(rendered) => {
            println!("{rendered}");
            0
        }
        Err(err) => {
            eprintln!("failed to render merged tier: {err}");
            1
        }
    }
}

fn handle_import(args: &[String]) -> i32 {
    let Some(path) = args.get(2) else {
        eprintln!("usage: cryodex import <file>");
        return 2;
    };
    match import_roster(path, DEFAULT_IMPORT_OUTPUT_PATH) {
        Ok(report) => {
            println!(
                "import complete: matched={}/{} collections={} output='{}'",
                report.matched_records,
                report.total_records,
                report.collection_records,
                report.output_path
            );
            for entry in &report.unresolved {
                eprintln!(
                    "unresolved record {}: '{}' ({})",
                    entry.record_index, entry.input_name, entry.reason
                );
            }
            0
        }
        Err(err) => {
            eprintln!("import failed: {err}");
            1
        }
    }
}

fn handle_validate(args: &[String]) -> i32 {
    let collections_path = args
        .get(2)
        .map(String::as_str)
        .unwrap_or(DEFAULT_COLLECTIONS_PATH);
    let crew_path = args.get(3).map(String::as_str).unwrap_or(DEFAULT_CREW_PATH);

    match validate_catalogs(collections_path, crew_path) {
        Ok(report) => {
            for diagnostic in &report.diagnostics {
                eprintln!("{diagnostic}");
            }
            if report.has_errors() {
                eprintln!("validation failed: {} diagnostic(s)", report.diagnostics.len());
                1
            } else {
                println!(
                    "validation passed: {} diagnostic(s), no errors",
                    report.diagnostics.len()
                );
                0
            }
        }
        Err(err) => {
            eprintln!("validation failed: {err}");
            1
        }
    }
}

/// Lenient numeric argument: a missing value means the default, a malformed
/// one warns and falls back.
fn parse_u32_arg(raw: Option<&String>, name: &str, default: u32) -> u32 {
    match raw {
        None => default,
        Some(value) => value.parse().unwrap_or_else(|_| {
            eprintln!("warning: invalid {name} '{value}', using {default}");
            default
        }),
    }
}

fn parse_u32_flag(args: &[String], flag: &str, default: u32) -> u32 {
    match args.iter().position(|arg| arg == flag) {
        None => default,
        Some(position) => parse_u32_arg(args.get(position + 1), flag, default),
    }
}

fn parse_mode_flag(args: &[String]) -> MatchMode {
    let Some(position) = args.iter().position(|arg| arg == "--mode") else {
        return MatchMode::default();
    };
    match args.get(position + 1) {
        Some(raw) => MatchMode::parse(raw).unwrap_or_else(|| {
            eprintln!(
                "warning: unknown match mode '{raw}', using '{}'",
                MatchMode::default().as_str()
            );
            MatchMode::default()
        }),
        None => {
            eprintln!(
                "warning: --mode given without a value, using '{}'",
                MatchMode::default().as_str()
            );
            MatchMode::default()
        }
    }
}
