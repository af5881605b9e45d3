//! Dispatch the compiled binary the way a shell would: argument parsing, exit
//! codes, and the JSON each command prints. Runs against the shipped catalogs
//! from the package root; the import test gets its own scratch workspace so
//! nothing under data/ is ever written.

use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_cryodex")
}

fn unique_temp_dir(name: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("cryodex-{name}-{stamp}"))
}

fn stdout_json(output: &std::process::Output) -> Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout)
        .unwrap_or_else(|err| panic!("expected JSON on stdout ({err}): {stdout}"))
}

#[test]
fn score_command_emits_ranked_json() {
    let output = Command::new(bin())
        .args(["score", "--limit", "3"])
        .output()
        .expect("score should run");

    assert_eq!(output.status.code(), Some(0));
    let payload = stdout_json(&output);
    assert_eq!(payload["summary"]["scored_crew"], 26);
    let crew = payload["crew"].as_array().expect("crew array");
    assert_eq!(crew.len(), 3);
    assert_eq!(crew[0]["symbol"], "hollis_archivist_crew");
}

#[test]
fn score_table_mode_prints_tab_rows() {
    let output = Command::new(bin())
        .args(["score", "--table", "--limit", "2"])
        .output()
        .expect("score should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines.first().copied(),
        Some("symbol\tname\trarity\tcollection_score\tstar_score")
    );
    assert_eq!(lines.len(), 3, "header plus the two requested rows");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("scored 26 crew"));
}

#[test]
fn optimize_command_requires_a_collection() {
    for extra in [&[][..], &["--sale"][..]] {
        let output = Command::new(bin())
            .arg("optimize")
            .args(extra)
            .output()
            .expect("optimize should run");

        assert_eq!(output.status.code(), Some(2));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("usage: cryodex optimize"));
    }
}

#[test]
fn optimize_command_resolves_names_case_insensitively() {
    let output = Command::new(bin())
        .args(["optimize", "twin paradox"])
        .output()
        .expect("optimize should run");

    assert_eq!(output.status.code(), Some(0));
    let payload = stdout_json(&output);
    assert_eq!(payload["focal"]["name"], "Twin Paradox");
    assert_eq!(payload["groups"][0]["name"], "Twin Paradox");
    assert_eq!(payload["groups"][0]["crew"][0]["symbol"], "vale_ensign_crew");
}

#[test]
fn optimize_command_fails_cleanly_on_unknown_collections() {
    let output = Command::new(bin())
        .args(["optimize", "Galactic Zoo"])
        .output()
        .expect("optimize should run");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no collection matches 'Galactic Zoo'"));
}

#[test]
fn merge_command_honors_the_end_tier_argument() {
    let full = Command::new(bin())
        .args(["merge", "3"])
        .output()
        .expect("merge should run");
    assert_eq!(full.status.code(), Some(0));
    let payload = stdout_json(&full);
    assert_eq!(payload["milestone"]["goal"], 2);
    assert_eq!(
        payload["milestone"]["rewards"].as_array().map(Vec::len),
        Some(2)
    );

    let first_tier = Command::new(bin())
        .args(["merge", "Twin Paradox", "0"])
        .output()
        .expect("merge should run");
    assert_eq!(first_tier.status.code(), Some(0));
    let payload = stdout_json(&first_tier);
    assert_eq!(payload["milestone"]["goal"], 1);
    assert_eq!(
        payload["milestone"]["rewards"].as_array().map(Vec::len),
        Some(1)
    );
}

#[test]
fn merge_command_requires_a_collection() {
    let output = Command::new(bin())
        .arg("merge")
        .output()
        .expect("merge should run");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("usage: cryodex merge"));
}

#[test]
fn import_command_requires_a_path() {
    let output = Command::new(bin())
        .arg("import")
        .output()
        .expect("import should run");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("usage: cryodex import"));
}

#[test]
fn import_command_writes_the_snapshot_in_its_working_directory() {
    // Scratch workspace holding just the crew catalog, so the repository's
    // own data/ tree stays untouched.
    let workspace = unique_temp_dir("import-workspace");
    fs::create_dir_all(workspace.join("data/crew")).expect("create scratch tree");
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    fs::copy(
        manifest_dir.join("data/crew/crew.canonical.json"),
        workspace.join("data/crew/crew.canonical.json"),
    )
    .expect("copy crew catalog");

    let export = workspace.join("export.json");
    fs::write(&export, r#"[ { "name": "Commander Ryx", "rarity": 3 } ]"#)
        .expect("write export");

    let output = Command::new(bin())
        .current_dir(&workspace)
        .args(["import", "export.json"])
        .output()
        .expect("import should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("import complete: matched=1/1"));
    assert!(workspace.join("data/player/player.imported.json").exists());

    fs::remove_dir_all(&workspace).expect("clean scratch tree");
}

#[test]
fn validate_command_passes_on_shipped_catalogs() {
    let output = Command::new(bin())
        .arg("validate")
        .output()
        .expect("validate should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("validation passed"));
}

#[test]
fn unknown_commands_print_usage() {
    let output = Command::new(bin())
        .arg("frobnicate")
        .output()
        .expect("binary should run");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("usage: cryodex <command>"));
}
