//! Integration tests for the roster CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

const ISOLATED_VARS: &[&str] = &[
    "ROSTER_PASSKEY",
    "ROSTER_LOG",
    "RUST_LOG",
    "ROSTER_REMOTE_ENABLED",
    "ROSTER_REMOTE_API_KEY",
    "ROSTER_REMOTE_DATABASE_URL",
    "ROSTER_REMOTE_PROJECT_ID",
    "ROSTER_REMOTE_AUTH_DOMAIN",
    "ROSTER_REMOTE_STORAGE_BUCKET",
    "ROSTER_REMOTE_MESSAGING_SENDER_ID",
    "ROSTER_REMOTE_APP_ID",
];

/// Helper to get a roster command isolated from the user's environment
fn roster(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("roster").unwrap();
    cmd.current_dir(tmp.path())
        .env("HOME", tmp.path())
        .env("XDG_CONFIG_HOME", tmp.path().join(".config"));
    for var in ISOLATED_VARS {
        cmd.env_remove(var);
    }
    cmd
}

/// Helper to create a workspace in a temp directory
fn setup_workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    roster(&tmp).arg("init").assert().success();
    tmp
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}

fn json_of(cmd: &mut Command) -> Value {
    serde_json::from_str(&stdout_of(cmd)).unwrap()
}

/// Add a personnel record and return its id
fn add_person(tmp: &TempDir, name: &str, extra: &[&str]) -> String {
    let mut args = vec!["person", "add", name, "-q"];
    args.extend_from_slice(extra);
    stdout_of(roster(tmp).args(&args)).trim().to_string()
}

fn add_unit(tmp: &TempDir, args: &[&str]) {
    let mut all = vec!["unit", "add"];
    all.extend_from_slice(args);
    roster(tmp).args(&all).assert().success();
}

/// Names in the NAME column of a TSV person listing
fn listed_names(tsv: &str) -> Vec<String> {
    tsv.lines()
        .skip(1)
        .filter_map(|line| line.split('\t').nth(1))
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Init / workspace
// ============================================================================

#[test]
fn test_init_creates_workspace() {
    let tmp = TempDir::new().unwrap();
    roster(&tmp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized roster workspace"));

    assert!(tmp.path().join(".roster/config.yaml").exists());
    let store = fs::read_to_string(tmp.path().join(".roster/store.json")).unwrap();
    let store: Value = serde_json::from_str(&store).unwrap();
    assert_eq!(store["units"][0]["id"], "unassigned");
    assert_eq!(store["currentUnitId"], "unassigned");
}

#[test]
fn test_init_twice_reports_existing() {
    let tmp = setup_workspace();
    roster(&tmp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn test_commands_outside_workspace_fail() {
    let tmp = TempDir::new().unwrap();
    roster(&tmp)
        .args(["unit", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("workspace"));
}

#[test]
fn test_workspace_flag_from_elsewhere() {
    let tmp = setup_workspace();
    let elsewhere = TempDir::new().unwrap();
    let count = stdout_of(
        roster(&elsewhere)
            .args(["unit", "list", "--count", "--workspace"])
            .arg(tmp.path()),
    );
    assert_eq!(count.trim(), "1");
}

// ============================================================================
// Units
// ============================================================================

#[test]
fn test_unit_add_and_list_tree() {
    let tmp = setup_workspace();
    add_unit(&tmp, &["1st Platoon"]);
    add_unit(&tmp, &["Alpha Squad", "--parent", "1st Platoon"]);

    let tsv = stdout_of(roster(&tmp).args(["unit", "list", "--format", "tsv"]));
    let lines: Vec<&str> = tsv.lines().collect();
    assert_eq!(lines[0], "id\tname\tparent\torder\tdirect\ttotal\tcurrent");
    assert!(lines[1].starts_with("1st-platoon\t1st Platoon\t\t"));
    assert!(lines[2].starts_with("alpha-squad\tAlpha Squad\t1st Platoon\t"));
    assert!(lines[3].starts_with("unassigned\tUnassigned\t"));
    assert!(lines[3].ends_with("\tyes"));
}

#[test]
fn test_unit_duplicate_name_rejected() {
    let tmp = setup_workspace();
    add_unit(&tmp, &["1st Platoon"]);
    roster(&tmp)
        .args(["unit", "add", "1ST PLATOON"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already"));
}

#[test]
fn test_unit_cycle_rejected() {
    let tmp = setup_workspace();
    add_unit(&tmp, &["HQ"]);
    add_unit(&tmp, &["Squad", "--parent", "hq"]);

    roster(&tmp)
        .args(["unit", "edit", "HQ", "--parent", "Squad"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("circular"));

    let json = json_of(roster(&tmp).args(["unit", "show", "hq", "--format", "json"]));
    assert!(json["unit"].get("parentId").is_none());
}

#[test]
fn test_unit_edit_is_all_or_nothing() {
    let tmp = setup_workspace();
    add_unit(&tmp, &["HQ"]);
    add_unit(&tmp, &["Squad", "--parent", "HQ"]);

    roster(&tmp)
        .args(["unit", "edit", "HQ", "--name", "Command", "--parent", "Squad"])
        .assert()
        .failure();

    let json = json_of(roster(&tmp).args(["unit", "show", "hq", "--format", "json"]));
    assert_eq!(json["unit"]["name"], "HQ");
}

#[test]
fn test_unit_rename_cascades_to_personnel() {
    let tmp = setup_workspace();
    add_unit(&tmp, &["Bravo"]);
    let id = add_person(&tmp, "Ann", &["--unit", "Bravo"]);
    let other = add_person(&tmp, "Bob", &["--secondment", "bravo"]);

    roster(&tmp)
        .args(["unit", "edit", "bravo", "--name", "Bravo Company"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 personnel record(s)"));

    let ann = json_of(roster(&tmp).args(["person", "show", &id, "--format", "json"]));
    assert_eq!(ann["assignedUnit"], "Bravo Company");
    assert_eq!(ann["unitId"], "bravo");
    let bob = json_of(roster(&tmp).args(["person", "show", &other, "--format", "json"]));
    assert_eq!(bob["secondment"], "Bravo Company");
}

#[test]
fn test_unit_delete_moves_personnel_and_children() {
    let tmp = setup_workspace();
    add_unit(&tmp, &["HQ"]);
    add_unit(&tmp, &["Squad", "--parent", "HQ"]);
    add_unit(&tmp, &["Fireteam", "--parent", "Squad"]);
    let id = add_person(&tmp, "Ann", &["--unit", "squad"]);

    roster(&tmp)
        .args(["unit", "delete", "squad", "--reassign-to", "HQ", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted unit"));

    let person = json_of(roster(&tmp).args(["person", "show", &id, "--format", "json"]));
    assert_eq!(person["unitId"], "hq");
    assert_eq!(person["assignedUnit"], "HQ");

    let fireteam = json_of(roster(&tmp).args(["unit", "show", "fireteam", "--format", "json"]));
    assert_eq!(fireteam["unit"]["parentId"], "hq");
}

#[test]
fn test_unit_delete_into_own_subtree_rejected() {
    let tmp = setup_workspace();
    add_unit(&tmp, &["HQ"]);
    add_unit(&tmp, &["Squad", "--parent", "HQ"]);
    add_person(&tmp, "Ann", &["--unit", "HQ"]);

    roster(&tmp)
        .args(["unit", "delete", "HQ", "--reassign-to", "Squad", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("reassign"));
}

#[test]
fn test_unassigned_unit_is_protected() {
    let tmp = setup_workspace();
    roster(&tmp)
        .args(["unit", "delete", "unassigned", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("deleted"));
}

#[test]
fn test_unit_delete_needs_confirmation_when_piped() {
    let tmp = setup_workspace();
    add_unit(&tmp, &["HQ"]);
    roster(&tmp)
        .args(["unit", "delete", "HQ"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));
}

#[test]
fn test_unit_order_and_use() {
    let tmp = setup_workspace();
    add_unit(&tmp, &["Alpha"]);
    add_unit(&tmp, &["Zulu"]);
    roster(&tmp).args(["unit", "order", "zulu", "1"]).assert().success();
    roster(&tmp).args(["unit", "use", "Alpha"]).assert().success();

    let ids = stdout_of(roster(&tmp).args(["unit", "list", "--format", "id"]));
    let ids: Vec<&str> = ids.lines().collect();
    assert_eq!(ids, ["zulu", "alpha", "unassigned"]);

    let id = add_person(&tmp, "Ann", &[]);
    let person = json_of(roster(&tmp).args(["person", "show", &id, "--format", "json"]));
    assert_eq!(person["assignedUnit"], "Alpha");

    roster(&tmp).args(["unit", "order", "zulu", "--clear"]).assert().success();
    let ids = stdout_of(roster(&tmp).args(["unit", "list", "--format", "id"]));
    assert_eq!(ids.lines().next(), Some("alpha"));
}

// ============================================================================
// Personnel
// ============================================================================

#[test]
fn test_person_add_defaults_to_current_unit() {
    let tmp = setup_workspace();
    let id = add_person(&tmp, "Ann", &["--grade", "5", "--specialty", "Medic"]);
    assert_eq!(id.len(), 26);

    let person = json_of(roster(&tmp).args(["person", "show", &id, "--format", "json"]));
    assert_eq!(person["assignedUnit"], "Unassigned");
    assert_eq!(person["status"], "available");
    assert_eq!(person["characterType"], "pc");
    assert_eq!(person["specialty"], "Medic");
}

#[test]
fn test_person_list_sorted_by_rank() {
    let tmp = setup_workspace();
    add_person(&tmp, "Cara", &["--grade", "2"]);
    add_person(&tmp, "Bob", &["--grade", "10"]);
    add_person(&tmp, "Ann", &["--grade", "5"]);
    add_person(&tmp, "Dan", &["--grade", "n/a"]);

    let tsv = stdout_of(roster(&tmp).args(["person", "list", "--all", "--format", "tsv"]));
    assert_eq!(listed_names(&tsv), ["Bob", "Ann", "Cara", "Dan"]);

    let tsv = stdout_of(roster(&tmp).args([
        "person", "list", "--all", "--sort", "name", "--format", "tsv",
    ]));
    assert_eq!(listed_names(&tsv), ["Ann", "Bob", "Cara", "Dan"]);
}

#[test]
fn test_person_list_filters() {
    let tmp = setup_workspace();
    add_unit(&tmp, &["HQ"]);
    add_person(&tmp, "Ann", &["--grade", "5", "--specialty", "Medic", "--unit", "HQ"]);
    add_person(&tmp, "Bob", &["--grade", "12", "--character-type", "npc"]);
    add_person(&tmp, "Cara", &["--grade", "2", "--status", "wia", "--callsign", "Ghost"]);
    add_person(&tmp, "Dan", &["--status", "inactive"]);

    let names = |args: &[&str]| {
        let mut all = vec!["person", "list", "--all", "--format", "tsv"];
        all.extend_from_slice(args);
        listed_names(&stdout_of(roster(&tmp).args(&all)))
    };

    assert_eq!(names(&[]), ["Bob", "Ann", "Cara"]);
    assert_eq!(names(&["--show-inactive"]).len(), 4);
    assert_eq!(names(&["--rank-category", "nco"]), ["Ann"]);
    assert_eq!(names(&["--rank-category", "nco,officer"]), ["Bob", "Ann"]);
    assert_eq!(names(&["--status", "wia"]), ["Cara"]);
    assert_eq!(names(&["--specialty", "Medic"]), ["Ann"]);
    assert_eq!(names(&["--character-type", "npc"]), ["Bob"]);
    assert_eq!(names(&["--assigned-unit", "hq"]), ["Ann"]);
    assert_eq!(names(&["--search", "ghost"]), ["Cara"]);
    assert_eq!(
        names(&["--rank-category", "nco", "--status", "wia"]),
        Vec::<String>::new()
    );
}

#[test]
fn test_person_list_subtree_includes_secondments() {
    let tmp = setup_workspace();
    add_unit(&tmp, &["HQ"]);
    add_unit(&tmp, &["Squad", "--parent", "HQ"]);
    add_person(&tmp, "Ann", &["--unit", "HQ"]);
    add_person(&tmp, "Bob", &["--unit", "Squad"]);
    add_person(&tmp, "Cara", &["--secondment", "Squad"]);

    let hq = stdout_of(roster(&tmp).args(["person", "list", "hq", "--sort", "name", "--format", "tsv"]));
    assert_eq!(listed_names(&hq), ["Ann", "Bob"]);

    let squad = stdout_of(roster(&tmp).args(["person", "list", "squad", "--sort", "name", "--format", "tsv"]));
    assert_eq!(listed_names(&squad), ["Bob", "Cara"]);

    let count = stdout_of(roster(&tmp).args(["person", "list", "--count"]));
    assert_eq!(count.trim(), "1");
}

#[test]
fn test_person_edit_move_delete() {
    let tmp = setup_workspace();
    add_unit(&tmp, &["HQ"]);
    let id = add_person(&tmp, "Ann", &[]);
    let prefix = &id[..12];

    roster(&tmp)
        .args(["person", "edit", prefix, "--status", "deployed", "--callsign", "Doc"])
        .assert()
        .success();
    roster(&tmp)
        .args(["person", "edit", &id, "--assigned-unit", "hq"])
        .assert()
        .success();

    let person = json_of(roster(&tmp).args(["person", "show", &id, "--format", "json"]));
    assert_eq!(person["status"], "deployed");
    assert_eq!(person["callsign"], "Doc");
    assert_eq!(person["unitId"], "hq");

    roster(&tmp)
        .args(["person", "move", &id, "unassigned"])
        .assert()
        .success();
    let person = json_of(roster(&tmp).args(["person", "show", &id, "--format", "json"]));
    assert_eq!(person["assignedUnit"], "Unassigned");

    roster(&tmp)
        .args(["person", "edit", &id, "--assigned-unit", "Nowhere"])
        .assert()
        .failure();
    roster(&tmp)
        .args(["person", "edit", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing"));

    roster(&tmp)
        .args(["person", "delete", &id, "--yes"])
        .assert()
        .success();
    roster(&tmp)
        .args(["person", "show", &id])
        .assert()
        .failure();
}

#[test]
fn test_person_specialties() {
    let tmp = setup_workspace();
    add_person(&tmp, "Ann", &["--specialty", "Medic"]);
    add_person(&tmp, "Bob", &["--specialty", "Engineer"]);
    add_person(&tmp, "Cara", &["--specialty", "Medic"]);
    add_person(&tmp, "Dan", &[]);

    let out = stdout_of(roster(&tmp).args(["person", "specialties"]));
    assert_eq!(out.lines().collect::<Vec<_>>(), ["Engineer", "Medic"]);
}

// ============================================================================
// Passkey
// ============================================================================

#[test]
fn test_passkey_guards_mutations() {
    let tmp = setup_workspace();
    roster(&tmp)
        .args(["passkey", "set", "--new", "secret123"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Passkey set"));

    let store = fs::read_to_string(tmp.path().join(".roster/store.json")).unwrap();
    let store: Value = serde_json::from_str(&store).unwrap();
    let stored = store["gmPasskey"].as_str().unwrap();
    assert_eq!(stored.len(), 64);
    assert_ne!(stored, "secret123");

    roster(&tmp)
        .args(["unit", "add", "HQ"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("passkey"));
    roster(&tmp)
        .args(["unit", "add", "HQ", "--passkey", "wrong"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("incorrect"));
    roster(&tmp)
        .args(["unit", "add", "HQ"])
        .env("ROSTER_PASSKEY", "secret123")
        .assert()
        .success();

    // reads stay open
    roster(&tmp).args(["unit", "list"]).assert().success();

    roster(&tmp)
        .args(["passkey", "verify", "--passkey", "secret123"])
        .assert()
        .success()
        .stdout(predicate::str::contains("accepted"));
    roster(&tmp)
        .args(["passkey", "verify", "--passkey", "nope"])
        .assert()
        .failure();
}

#[test]
fn test_passkey_change_requires_current() {
    let tmp = setup_workspace();
    roster(&tmp)
        .args(["passkey", "set", "--passkey", "first"])
        .assert()
        .success();
    roster(&tmp)
        .args(["passkey", "set", "--new", "second"])
        .assert()
        .failure();
    roster(&tmp)
        .args(["passkey", "set", "--new", "second", "--passkey", "first"])
        .assert()
        .success()
        .stdout(predicate::str::contains("changed"));
    roster(&tmp)
        .args(["passkey", "verify", "--passkey", "second"])
        .assert()
        .success();
}

#[test]
fn test_passkey_verify_without_passkey() {
    let tmp = setup_workspace();
    roster(&tmp)
        .args(["passkey", "verify", "--passkey", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no passkey"));
}

#[test]
fn test_legacy_plain_text_passkey_is_migrated() {
    let tmp = setup_workspace();
    let store_path = tmp.path().join(".roster/store.json");
    let mut store: Value = serde_json::from_str(&fs::read_to_string(&store_path).unwrap()).unwrap();
    store["gmPasskey"] = Value::String("hunter2".into());
    fs::write(&store_path, serde_json::to_string(&store).unwrap()).unwrap();

    roster(&tmp)
        .args(["unit", "add", "HQ", "--passkey", "hunter2"])
        .assert()
        .success();

    let store: Value = serde_json::from_str(&fs::read_to_string(&store_path).unwrap()).unwrap();
    assert_eq!(store["gmPasskey"].as_str().unwrap().len(), 64);
}

// ============================================================================
// Export / import
// ============================================================================

#[test]
fn test_export_import_round_trip() {
    let source = setup_workspace();
    add_unit(&source, &["HQ"]);
    add_unit(&source, &["Squad", "--parent", "HQ"]);
    let id = add_person(&source, "Ann", &["--unit", "Squad", "--grade", "5"]);

    let export = source.path().join("roster.json");
    roster(&source)
        .args(["export", "-o"])
        .arg(&export)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 3 unit(s)"));

    let doc: Value = serde_json::from_str(&fs::read_to_string(&export).unwrap()).unwrap();
    assert_eq!(doc["version"], "1.0");
    assert!(doc["exportDate"].as_str().unwrap().ends_with('Z'));
    assert_eq!(doc["personnelByUnit"]["squad"][0]["name"], "Ann");

    let target = setup_workspace();
    add_unit(&target, &["Other"]);
    roster(&target)
        .arg("import")
        .arg(&export)
        .arg("--yes")
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 3 unit(s) and 1 personnel"));

    let person = json_of(roster(&target).args(["person", "show", &id, "--format", "json"]));
    assert_eq!(person["unitId"], "squad");
    roster(&target).args(["unit", "show", "other"]).assert().failure();
}

#[test]
fn test_export_to_stdout() {
    let tmp = setup_workspace();
    let doc = json_of(roster(&tmp).arg("export"));
    assert_eq!(doc["units"][0]["id"], "unassigned");
    assert!(doc["personnelByUnit"].is_object());
}

#[test]
fn test_import_rejects_invalid_files() {
    let tmp = setup_workspace();
    let bad = tmp.path().join("bad.json");

    fs::write(&bad, r#"{"personnelByUnit": {}, "units": []}"#).unwrap();
    roster(&tmp)
        .arg("import")
        .arg(&bad)
        .arg("--yes")
        .assert()
        .failure()
        .stderr(predicate::str::contains("version"));

    fs::write(
        &bad,
        r#"{"version": "1.0", "personnelByUnit": {"hq": [{"id": "p1"}]}, "units": []}"#,
    )
    .unwrap();
    roster(&tmp)
        .arg("import")
        .arg(&bad)
        .arg("--yes")
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));

    let count = stdout_of(roster(&tmp).args(["unit", "list", "--count"]));
    assert_eq!(count.trim(), "1");
}

#[test]
fn test_import_needs_confirmation_when_piped() {
    let tmp = setup_workspace();
    let export = tmp.path().join("roster.json");
    roster(&tmp).args(["export", "-o"]).arg(&export).assert().success();
    roster(&tmp)
        .arg("import")
        .arg(&export)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));
}

// ============================================================================
// Config / status / completions
// ============================================================================

#[test]
fn test_config_default_format() {
    let tmp = setup_workspace();
    roster(&tmp)
        .args(["config", "set", "default_format", "json"])
        .assert()
        .success();

    let units = json_of(roster(&tmp).args(["unit", "list"]));
    assert_eq!(units[0]["id"], "unassigned");

    roster(&tmp)
        .args(["config", "show", "default_format"])
        .assert()
        .success()
        .stdout(predicate::str::contains("json"));

    roster(&tmp)
        .args(["config", "unset", "default_format"])
        .assert()
        .success();
    roster(&tmp)
        .args(["config", "show", "default_format"])
        .assert()
        .failure();
}

#[test]
fn test_config_rejects_unknown_keys_and_values() {
    let tmp = setup_workspace();
    roster(&tmp)
        .args(["config", "set", "editor", "vim"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown"));
    roster(&tmp)
        .args(["config", "set", "remote.enabled", "maybe"])
        .assert()
        .failure();
}

#[test]
fn test_config_show_masks_secrets() {
    let tmp = setup_workspace();
    roster(&tmp)
        .args(["config", "set", "remote.api_key", "super-secret-key"])
        .assert()
        .success()
        .stdout(predicate::str::contains("super-secret-key").not());

    roster(&tmp)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("***masked***"))
        .stdout(predicate::str::contains("super-secret-key").not());
}

#[test]
fn test_status_reports_local_backend() {
    let tmp = setup_workspace();
    add_person(&tmp, "Ann", &["--grade", "5"]);

    let status = json_of(roster(&tmp).args(["status", "--format", "json"]));
    assert_eq!(status["backend"], "local");
    assert_eq!(status["personnel"], 1);
    assert_eq!(status["units"], 1);
    assert_eq!(status["passkey_set"], false);
    assert_eq!(status["by_rank_category"]["nco"], 1);
}

#[test]
fn test_remote_without_transport_falls_back_to_local() {
    let tmp = setup_workspace();
    for (key, value) in [
        ("remote.enabled", "true"),
        ("remote.api_key", "k"),
        ("remote.database_url", "https://db.example"),
        ("remote.project_id", "p"),
    ] {
        roster(&tmp).args(["config", "set", key, value]).assert().success();
    }

    let status = json_of(roster(&tmp).args(["status", "--format", "json"]));
    assert_eq!(status["backend"], "local (remote unavailable)");
    assert_eq!(status["remote_attempts"], 1);

    add_unit(&tmp, &["HQ"]);
    let count = stdout_of(roster(&tmp).args(["unit", "list", "--count"]));
    assert_eq!(count.trim(), "2");
}

#[test]
fn test_incomplete_remote_config_stays_local() {
    let tmp = setup_workspace();
    let status = json_of(
        roster(&tmp)
            .args(["status", "--format", "json"])
            .env("ROSTER_REMOTE_ENABLED", "true")
            .env("ROSTER_REMOTE_API_KEY", "k"),
    );
    assert_eq!(status["backend"], "local");
    assert_eq!(status["remote_attempts"], 0);
}

#[test]
fn test_completions() {
    let tmp = TempDir::new().unwrap();
    roster(&tmp)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("roster"));
}
