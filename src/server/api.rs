//! JSON payload builders behind the HTTP routes.
//!
//! Every function here loads what it needs from disk, computes, and returns
//! a rendered body. The handlers in [`super`] only translate these results
//! into responses, so each payload can be exercised directly in tests.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::data::collection::{load_collections, CollectionDefinition, DEFAULT_COLLECTIONS_PATH};
use crate::data::crew::{load_crew_catalog, CrewEntry, DEFAULT_CREW_PATH};
use crate::data::player::{load_player_snapshot, PlayerSnapshot, DEFAULT_PLAYER_SNAPSHOT_PATH};
use crate::data::registry::{load_registry, DEFAULT_REGISTRY_PATH};
use crate::engine::combo::{discover_combos, ComboOptions, ComboReport, ComboStrategy, MatchMode};
use crate::engine::evaluate_player;
use crate::engine::filter::{CrewFilter, OwnershipFilter, RetrievabilityFilter};
use crate::engine::score::{compare_by_star_score, score_crew_pool, ScoreSummary};
use crate::engine::state::{find_collection_id, CrewRecord, PlayerCollectionState};
use crate::engine::tiers::merge_tier_range;

const VALIDATION_ERROR: &str = "validation failed";

/// One invalid request field and everything wrong with it.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub messages: Vec<String>,
}

/// Body of a 400 response: a stable error string plus per-field issues.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationErrorResponse {
    pub error: &'static str,
    pub issues: Vec<ValidationIssue>,
}

#[derive(Debug)]
pub enum PayloadError {
    Parse(serde_json::Error),
    Validation(ValidationErrorResponse),
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadError::Parse(err) => write!(f, "invalid request body: {err}"),
            PayloadError::Validation(response) => write!(
                f,
                "request failed validation with {} issue(s)",
                response.issues.len()
            ),
        }
    }
}

impl std::error::Error for PayloadError {}

fn issue(field: &'static str, message: impl Into<String>) -> ValidationIssue {
    ValidationIssue {
        field,
        messages: vec![message.into()],
    }
}

fn validation_error(single: ValidationIssue) -> PayloadError {
    PayloadError::Validation(ValidationErrorResponse {
        error: VALIDATION_ERROR,
        issues: vec![single],
    })
}

fn ensure_valid(issues: Vec<ValidationIssue>) -> Result<(), PayloadError> {
    if issues.is_empty() {
        Ok(())
    } else {
        Err(PayloadError::Validation(ValidationErrorResponse {
            error: VALIDATION_ERROR,
            issues,
        }))
    }
}

/// Query-flag convention shared by the routes: `1` or `true` switches a flag
/// on, anything else leaves it off.
pub fn flag_is_set(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some(raw) if raw == "1" || raw.eq_ignore_ascii_case("true"))
}

/// Load both catalogs. Missing or unreadable files degrade to empty lists so
/// the read-only surfaces keep answering.
fn load_catalogs() -> (Vec<CollectionDefinition>, Vec<CrewEntry>) {
    let definitions = load_collections(DEFAULT_COLLECTIONS_PATH).unwrap_or_default();
    let catalog = load_crew_catalog(DEFAULT_CREW_PATH).unwrap_or_default();
    (definitions, catalog)
}

/// Assemble a [`CrewFilter`] from raw request fields, collecting one issue
/// per field that fails to parse. Fields that fail fall back to defaults, so
/// lenient callers can keep the filter and log the issues.
pub(crate) fn build_filter(
    ownership: Option<&str>,
    rarity: Option<u8>,
    retrievability: Option<&str>,
    search: Option<&str>,
) -> (CrewFilter, Vec<ValidationIssue>) {
    let mut issues = Vec::new();

    let ownership = match normalize(ownership) {
        None => OwnershipFilter::default(),
        Some(raw) => OwnershipFilter::parse(raw).unwrap_or_else(|| {
            issues.push(issue("ownership", format!("unknown ownership filter '{raw}'")));
            OwnershipFilter::default()
        }),
    };
    let retrievability = match normalize(retrievability) {
        None => RetrievabilityFilter::default(),
        Some(raw) => RetrievabilityFilter::parse(raw).unwrap_or_else(|| {
            issues.push(issue(
                "retrievability",
                format!("unknown retrievability filter '{raw}'"),
            ));
            RetrievabilityFilter::default()
        }),
    };
    if let Some(rarity) = rarity {
        if !(1..=5).contains(&rarity) {
            issues.push(issue("rarity", format!("rarity {rarity} is outside 1-5")));
        }
    }
    let search = normalize(search).map(str::to_string);

    (
        CrewFilter {
            ownership,
            rarity,
            retrievability,
            search,
        },
        issues,
    )
}

fn normalize(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}

pub fn health_payload() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&serde_json::json!({
        "status": "ok",
        "service": "cryodex-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionsResponse {
    pub status: &'static str,
    pub collections: Vec<PlayerCollectionState>,
}

/// Every collection with the player's progress folded in.
pub fn collections_payload() -> Result<String, serde_json::Error> {
    let (definitions, catalog) = load_catalogs();
    let player = load_player_snapshot(DEFAULT_PLAYER_SNAPSHOT_PATH);
    let view = evaluate_player(&definitions, &catalog, &player);
    serde_json::to_string_pretty(&CollectionsResponse {
        status: "ok",
        collections: view.collections,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct CrewResponse {
    pub status: &'static str,
    pub owned_only: bool,
    pub crew: Vec<CrewRecord>,
}

/// The annotated crew pool, optionally narrowed to owned crew. Scores are
/// zero here; a score pass is a separate request.
pub fn crew_payload(owned_only: bool) -> Result<String, serde_json::Error> {
    let (definitions, catalog) = load_catalogs();
    let player = load_player_snapshot(DEFAULT_PLAYER_SNAPSHOT_PATH);
    let mut view = evaluate_player(&definitions, &catalog, &player);
    if owned_only {
        view.crew.retain(CrewRecord::owned);
    }
    serde_json::to_string_pretty(&CrewResponse {
        status: "ok",
        owned_only,
        crew: view.crew,
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoreRequest {
    #[serde(default)]
    pub ownership: Option<String>,
    #[serde(default)]
    pub rarity: Option<u8>,
    #[serde(default)]
    pub retrievability: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sale: bool,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreResponse {
    pub status: &'static str,
    pub request_id: String,
    pub sale: bool,
    pub summary: ScoreSummary,
    /// Crew passing the filter, best star score first.
    pub crew: Vec<CrewRecord>,
}

/// Run a full scoring pass and return the ranked crew plus pool maxima.
pub fn score_payload(body: &str) -> Result<String, PayloadError> {
    let request: ScoreRequest = serde_json::from_str(body).map_err(PayloadError::Parse)?;
    let (filter, issues) = build_filter(
        request.ownership.as_deref(),
        request.rarity,
        request.retrievability.as_deref(),
        request.search.as_deref(),
    );
    ensure_valid(issues)?;

    let (definitions, catalog) = load_catalogs();
    let player = load_player_snapshot(DEFAULT_PLAYER_SNAPSHOT_PATH);
    let mut view = evaluate_player(&definitions, &catalog, &player);
    let summary = score_crew_pool(&mut view.crew, &view.collections, &filter, request.sale);

    let mut crew: Vec<CrewRecord> = view
        .crew
        .into_iter()
        .filter(|record| filter.matches_with_search(record))
        .collect();
    crew.sort_by(|a, b| compare_by_star_score(b, a).then_with(|| a.symbol.cmp(&b.symbol)));
    if let Some(limit) = request.limit {
        crew.truncate(limit);
    }

    let response = ScoreResponse {
        status: "ok",
        request_id: Uuid::new_v4().to_string(),
        sale: request.sale,
        summary,
        crew,
    };
    serde_json::to_string_pretty(&response).map_err(PayloadError::Parse)
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptimizeRequest {
    /// Numeric id, exact name, or unique name fragment.
    #[serde(default)]
    pub collection: String,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub sale: bool,
    #[serde(default)]
    pub favor_favorites: Option<bool>,
    #[serde(default)]
    pub ownership: Option<String>,
    #[serde(default)]
    pub rarity: Option<u8>,
    #[serde(default)]
    pub retrievability: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizeResponse {
    pub status: &'static str,
    pub request_id: String,
    pub mode: &'static str,
    pub sale: bool,
    pub report: ComboReport,
}

/// Discover combo groups for one focal collection.
pub fn optimize_payload(body: &str) -> Result<String, PayloadError> {
    let request: OptimizeRequest = serde_json::from_str(body).map_err(PayloadError::Parse)?;

    let (filter, mut issues) = build_filter(
        request.ownership.as_deref(),
        request.rarity,
        request.retrievability.as_deref(),
        request.search.as_deref(),
    );
    if request.collection.trim().is_empty() {
        issues.push(issue("collection", "must not be empty"));
    }
    let match_mode = match request.mode.as_deref() {
        None => MatchMode::default(),
        Some(raw) => MatchMode::parse(raw).unwrap_or_else(|| {
            issues.push(issue("mode", format!("unknown match mode '{raw}'")));
            MatchMode::default()
        }),
    };
    ensure_valid(issues)?;

    let (definitions, catalog) = load_catalogs();
    let player = load_player_snapshot(DEFAULT_PLAYER_SNAPSHOT_PATH);
    let view = evaluate_player(&definitions, &catalog, &player);

    let Some(focal_id) = find_collection_id(&view.collections, &request.collection) else {
        return Err(validation_error(issue(
            "collection",
            format!("no collection matches '{}'", request.collection.trim()),
        )));
    };

    let options = ComboOptions {
        filter,
        sale: request.sale,
        favor_favorites: request.favor_favorites.unwrap_or(true),
        match_mode,
        strategy: ComboStrategy::default(),
    };
    let Some(report) = discover_combos(focal_id, &view.collections, &view.crew, &options) else {
        return Err(validation_error(issue(
            "collection",
            format!("collection {focal_id} vanished during evaluation"),
        )));
    };

    let response = OptimizeResponse {
        status: "ok",
        request_id: Uuid::new_v4().to_string(),
        mode: match_mode.as_str(),
        sale: request.sale,
        report,
    };
    serde_json::to_string_pretty(&response).map_err(PayloadError::Parse)
}

#[derive(Debug, Clone, Deserialize)]
pub struct MergeTiersRequest {
    #[serde(default)]
    pub collection: String,
    /// Defaults to the player's first claimable tier.
    #[serde(default)]
    pub start: Option<usize>,
    /// Defaults to the collection's last tier.
    #[serde(default)]
    pub end: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MergeTiersResponse {
    pub status: &'static str,
    pub collection_id: u32,
    pub start: usize,
    pub end: usize,
    pub merged: PlayerCollectionState,
}

/// Collapse a run of milestone tiers into one synthetic view.
pub fn merge_tiers_payload(body: &str) -> Result<String, PayloadError> {
    let request: MergeTiersRequest = serde_json::from_str(body).map_err(PayloadError::Parse)?;
    if request.collection.trim().is_empty() {
        return Err(validation_error(issue("collection", "must not be empty")));
    }

    let (definitions, catalog) = load_catalogs();
    let player = load_player_snapshot(DEFAULT_PLAYER_SNAPSHOT_PATH);
    let view = evaluate_player(&definitions, &catalog, &player);

    let Some(focal_id) = find_collection_id(&view.collections, &request.collection) else {
        return Err(validation_error(issue(
            "collection",
            format!("no collection matches '{}'", request.collection.trim()),
        )));
    };
    let Some(state) = view.collections.iter().find(|state| state.id == focal_id) else {
        return Err(validation_error(issue(
            "collection",
            format!("collection {focal_id} vanished during evaluation"),
        )));
    };
    let Some(definition) = definitions.iter().find(|definition| definition.id == focal_id)
    else {
        return Err(validation_error(issue(
            "collection",
            format!("collection {focal_id} has no catalog definition"),
        )));
    };

    let last_tier = definition.milestones.len().saturating_sub(1);
    let start = request
        .start
        .unwrap_or_else(|| claimable_index(&player, &state.name));
    let end = request.end.unwrap_or(last_tier).min(last_tier);
    if start > end {
        return Err(validation_error(issue(
            "start",
            format!("start tier {start} is past end tier {end}"),
        )));
    }

    let merged = merge_tier_range(state, &definition.milestones, start, end);
    let response = MergeTiersResponse {
        status: "ok",
        collection_id: focal_id,
        start,
        end,
        merged,
    };
    serde_json::to_string_pretty(&response).map_err(PayloadError::Parse)
}

/// First unclaimed milestone index from the player's own record; tier zero
/// when the record is missing.
fn claimable_index(player: &PlayerSnapshot, collection_name: &str) -> usize {
    player
        .cryo_collections
        .iter()
        .find(|record| record.name == collection_name)
        .and_then(|record| record.claimable_milestone_index)
        .unwrap_or(0)
}

/// Dataset provenance straight from the registry, for the console footer.
pub fn data_version_payload() -> Result<String, serde_json::Error> {
    let datasets = load_registry(DEFAULT_REGISTRY_PATH);
    serde_json::to_string_pretty(&serde_json::json!({
        "status": "ok",
        "datasets": datasets,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_payload_reports_service_and_version() {
        let body = health_payload().unwrap();
        let payload: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["service"], "cryodex-api");
        assert_eq!(payload["version"], env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn flag_parsing_accepts_one_and_true() {
        assert!(flag_is_set(Some("1")));
        assert!(flag_is_set(Some("true")));
        assert!(flag_is_set(Some("TRUE")));
        assert!(flag_is_set(Some(" true ")));
        assert!(!flag_is_set(Some("0")));
        assert!(!flag_is_set(Some("yes")));
        assert!(!flag_is_set(None));
    }

    #[test]
    fn filter_assembly_collects_one_issue_per_bad_field() {
        let (_, issues) = build_filter(Some("bogus"), Some(9), Some("nope"), Some("vale"));
        let fields: Vec<&str> = issues.iter().map(|issue| issue.field).collect();
        assert_eq!(fields, vec!["ownership", "retrievability", "rarity"]);
    }

    #[test]
    fn filter_assembly_treats_blank_fields_as_absent() {
        let (filter, issues) = build_filter(Some("  "), None, Some(""), Some("  ryx "));
        assert!(issues.is_empty());
        assert_eq!(filter.ownership, OwnershipFilter::default());
        assert_eq!(filter.search.as_deref(), Some("ryx"));
    }

    #[test]
    fn score_request_defaults_from_empty_object() {
        let request: ScoreRequest = serde_json::from_str("{}").unwrap();
        assert!(!request.sale);
        assert!(request.limit.is_none());
        assert!(request.ownership.is_none());
    }

    #[test]
    fn optimize_payload_rejects_malformed_body() {
        let err = optimize_payload("not json").unwrap_err();
        assert!(matches!(err, PayloadError::Parse(_)));
    }

    #[test]
    fn optimize_payload_requires_a_collection() {
        let err = optimize_payload("{}").unwrap_err();
        match err {
            PayloadError::Validation(response) => {
                assert_eq!(response.error, VALIDATION_ERROR);
                assert!(response.issues.iter().any(|issue| issue.field == "collection"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn merge_payload_requires_a_collection() {
        let err = merge_tiers_payload("{}").unwrap_err();
        assert!(matches!(err, PayloadError::Validation(_)));
    }
}
