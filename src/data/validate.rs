//! Catalog validation: schema and cross-reference checks over the canonical
//! collection and crew files. Value-based so malformed files still produce a
//! readable report instead of a deserialization abort.

use std::collections::HashSet;
use std::fmt;
use std::fs;

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.context, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.diagnostics.extend(other.diagnostics);
    }
}

const MAX_RARITY_CEILING: u64 = 5;

fn read_entries<'a>(payload: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    payload
        .get(key)
        .and_then(Value::as_array)
        .or_else(|| payload.as_array())
}

fn goal_is_valid(goal: &Value) -> bool {
    match goal {
        Value::Number(n) => n.as_u64().is_some(),
        Value::String(s) => s.eq_ignore_ascii_case("n/a"),
        _ => false,
    }
}

/// Validate the collection catalog file on its own.
pub fn validate_collections_dataset(path: &str) -> Result<ValidationReport, String> {
    let raw = fs::read_to_string(path).map_err(|err| format!("unable to read '{path}': {err}"))?;
    let payload: Value = serde_json::from_str(&raw)
        .map_err(|err| format!("unable to parse json '{path}': {err}"))?;

    let entries = read_entries(&payload, "collections")
        .ok_or_else(|| "expected top-level JSON array or { collections: [...] }".to_string())?;

    let mut report = ValidationReport::default();
    let mut seen_ids = HashSet::new();

    for (index, entry) in entries.iter().enumerate() {
        let base_context = format!("collection[{index}]");
        let Some(object) = entry.as_object() else {
            report.push(
                ValidationSeverity::Error,
                base_context,
                "entry is not an object",
            );
            continue;
        };

        match object.get("id").and_then(Value::as_u64) {
            Some(id) => {
                if !seen_ids.insert(id) {
                    report.push(
                        ValidationSeverity::Error,
                        format!("{base_context}.id"),
                        format!("duplicate id {id}"),
                    );
                }
            }
            None => report.push(
                ValidationSeverity::Error,
                format!("{base_context}.id"),
                "missing numeric 'id'",
            ),
        }

        match object.get("name").and_then(Value::as_str) {
            Some(name) if !name.trim().is_empty() => {}
            _ => report.push(
                ValidationSeverity::Error,
                format!("{base_context}.name"),
                "missing non-empty 'name'",
            ),
        }

        validate_milestones(&mut report, object.get("milestones"), &base_context);

        match object.get("crew").and_then(Value::as_array) {
            Some(crew) if !crew.is_empty() => {
                let mut seen_symbols = HashSet::new();
                for (crew_index, symbol) in crew.iter().enumerate() {
                    match symbol.as_str() {
                        Some(symbol) if !symbol.trim().is_empty() => {
                            if !seen_symbols.insert(symbol) {
                                report.push(
                                    ValidationSeverity::Warning,
                                    format!("{base_context}.crew[{crew_index}]"),
                                    format!("symbol '{symbol}' listed twice"),
                                );
                            }
                        }
                        _ => report.push(
                            ValidationSeverity::Error,
                            format!("{base_context}.crew[{crew_index}]"),
                            "expected non-empty string symbol",
                        ),
                    }
                }
            }
            Some(_) => report.push(
                ValidationSeverity::Warning,
                format!("{base_context}.crew"),
                "collection has no member crew",
            ),
            None => report.push(
                ValidationSeverity::Error,
                format!("{base_context}.crew"),
                "missing 'crew' array",
            ),
        }
    }

    Ok(report)
}

fn validate_milestones(report: &mut ValidationReport, milestones: Option<&Value>, context: &str) {
    let context = format!("{context}.milestones");
    let Some(milestones) = milestones else {
        report.push(ValidationSeverity::Error, context, "missing 'milestones'");
        return;
    };
    let Some(milestones) = milestones.as_array() else {
        report.push(ValidationSeverity::Error, context, "expected array");
        return;
    };
    if milestones.is_empty() {
        report.push(ValidationSeverity::Warning, context, "no milestone tiers");
        return;
    }

    let mut previous_goal: Option<u64> = None;
    for (tier, milestone) in milestones.iter().enumerate() {
        let tier_context = format!("{context}[{tier}]");
        let Some(object) = milestone.as_object() else {
            report.push(
                ValidationSeverity::Error,
                tier_context,
                "milestone is not an object",
            );
            continue;
        };

        let Some(goal) = object.get("goal") else {
            report.push(
                ValidationSeverity::Error,
                format!("{tier_context}.goal"),
                "missing 'goal'",
            );
            continue;
        };
        if !goal_is_valid(goal) {
            report.push(
                ValidationSeverity::Error,
                format!("{tier_context}.goal"),
                format!("expected a count or \"n/a\", found {goal}"),
            );
            continue;
        }

        // Tier goals are cumulative in game data; a drop means a bad export.
        if let Some(value) = goal.as_u64() {
            if let Some(previous) = previous_goal {
                if value < previous {
                    report.push(
                        ValidationSeverity::Warning,
                        format!("{tier_context}.goal"),
                        format!("goal {value} is below the previous tier's {previous}"),
                    );
                }
            }
            previous_goal = Some(value);
        }

        for list_key in ["rewards", "buffs"] {
            if let Some(items) = object.get(list_key).and_then(Value::as_array) {
                for (item_index, item) in items.iter().enumerate() {
                    let item_context = format!("{tier_context}.{list_key}[{item_index}]");
                    let Some(item) = item.as_object() else {
                        report.push(ValidationSeverity::Error, item_context, "not an object");
                        continue;
                    };
                    if item.get("id").and_then(Value::as_u64).is_none() {
                        report.push(
                            ValidationSeverity::Error,
                            format!("{item_context}.id"),
                            "missing numeric 'id'",
                        );
                    }
                    match item.get("symbol").and_then(Value::as_str) {
                        Some(symbol) if !symbol.trim().is_empty() => {}
                        _ => report.push(
                            ValidationSeverity::Error,
                            format!("{item_context}.symbol"),
                            "missing non-empty 'symbol'",
                        ),
                    }
                }
            }
        }
    }
}

/// Validate the crew catalog file on its own.
pub fn validate_crew_dataset(path: &str) -> Result<ValidationReport, String> {
    let raw = fs::read_to_string(path).map_err(|err| format!("unable to read '{path}': {err}"))?;
    let payload: Value = serde_json::from_str(&raw)
        .map_err(|err| format!("unable to parse json '{path}': {err}"))?;

    let entries = read_entries(&payload, "crew")
        .ok_or_else(|| "expected top-level JSON array or { crew: [...] }".to_string())?;

    let mut report = ValidationReport::default();
    let mut seen_symbols = HashSet::new();

    for (index, entry) in entries.iter().enumerate() {
        let base_context = format!("crew[{index}]");
        let Some(object) = entry.as_object() else {
            report.push(
                ValidationSeverity::Error,
                base_context,
                "entry is not an object",
            );
            continue;
        };

        match object.get("symbol").and_then(Value::as_str) {
            Some(symbol) if !symbol.trim().is_empty() => {
                if !seen_symbols.insert(symbol.to_string()) {
                    report.push(
                        ValidationSeverity::Error,
                        format!("{base_context}.symbol"),
                        format!("duplicate symbol '{symbol}'"),
                    );
                }
            }
            _ => report.push(
                ValidationSeverity::Error,
                format!("{base_context}.symbol"),
                "missing non-empty 'symbol'",
            ),
        }

        match object.get("name").and_then(Value::as_str) {
            Some(name) if !name.trim().is_empty() => {}
            _ => report.push(
                ValidationSeverity::Error,
                format!("{base_context}.name"),
                "missing non-empty 'name'",
            ),
        }

        match object.get("max_rarity").and_then(Value::as_u64) {
            Some(rarity) if (1..=MAX_RARITY_CEILING).contains(&rarity) => {}
            Some(rarity) => report.push(
                ValidationSeverity::Error,
                format!("{base_context}.max_rarity"),
                format!("max_rarity {rarity} outside 1..={MAX_RARITY_CEILING}"),
            ),
            None => report.push(
                ValidationSeverity::Error,
                format!("{base_context}.max_rarity"),
                "missing numeric 'max_rarity'",
            ),
        }
    }

    Ok(report)
}

/// Validate both catalogs and cross-reference collection membership against
/// crew symbols. Unknown symbols are warnings: the engine skips them at
/// runtime, but they usually mean the catalogs are from different versions.
pub fn validate_catalogs(
    collections_path: &str,
    crew_path: &str,
) -> Result<ValidationReport, String> {
    let mut report = validate_collections_dataset(collections_path)?;
    report.merge(validate_crew_dataset(crew_path)?);

    let crew_raw =
        fs::read_to_string(crew_path).map_err(|err| format!("unable to read '{crew_path}': {err}"))?;
    let crew_payload: Value = serde_json::from_str(&crew_raw)
        .map_err(|err| format!("unable to parse json '{crew_path}': {err}"))?;
    let known_symbols: HashSet<&str> = read_entries(&crew_payload, "crew")
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.get("symbol").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    let collections_raw = fs::read_to_string(collections_path)
        .map_err(|err| format!("unable to read '{collections_path}': {err}"))?;
    let collections_payload: Value = serde_json::from_str(&collections_raw)
        .map_err(|err| format!("unable to parse json '{collections_path}': {err}"))?;

    if let Some(entries) = read_entries(&collections_payload, "collections") {
        for (index, entry) in entries.iter().enumerate() {
            let name = entry
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("<unnamed>");
            if let Some(members) = entry.get("crew").and_then(Value::as_array) {
                for symbol in members.iter().filter_map(Value::as_str) {
                    if !known_symbols.contains(symbol) {
                        report.push(
                            ValidationSeverity::Warning,
                            format!("collection[{index}] '{name}'"),
                            format!("member '{symbol}' not in crew catalog"),
                        );
                    }
                }
            }
        }
    }

    Ok(report)
}
