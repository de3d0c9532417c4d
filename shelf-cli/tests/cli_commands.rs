use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use chrono::{TimeZone, Utc};
use predicates::str::contains;
use tempfile::TempDir;

use shelf_core::{
    config, JsonRecordStore, LayoutMode, Record, RecordId, RecordStore, SyncConfig,
};

fn shelf_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("shelf"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

fn configure(home: &Path, vault: &Path, backup: bool) {
    let mut cfg = SyncConfig::new(vault).expect("config");
    cfg.layout = LayoutMode::Flat;
    cfg.backup_before_sync = backup;
    config::save_at(home, &cfg).expect("save config");
}

fn seed(home: &Path, titles: &[&str]) {
    let mut store = JsonRecordStore::open_at(home).expect("store");
    let saved = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
    for (i, title) in titles.iter().enumerate() {
        let id = (i + 1).to_string();
        let mut record = Record::new(id.as_str(), format!("https://example.com/{id}"), *title);
        record.created_at = saved;
        record.updated_at = saved;
        store.insert(record).expect("insert");
    }
}

fn document(vault: &Path, title: &str) -> std::path::PathBuf {
    vault.join("Reading List").join(format!("{title}.md"))
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

#[test]
fn config_set_then_show_round_trips() {
    let home = TempDir::new().expect("home");
    let vault = TempDir::new().expect("vault");

    shelf_cmd(home.path())
        .args(["config", "set", "--layout", "by-domain", "--policy", "merge", "--vault-root"])
        .arg(vault.path())
        .assert()
        .success()
        .stdout(contains("Saved"));

    shelf_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(contains("layout: by-domain"))
        .stdout(contains("conflict_policy: merge"))
        .stdout(contains(vault.path().display().to_string()));
}

#[test]
fn templates_dir_from_config_is_used_by_export() {
    let home = TempDir::new().expect("home");
    let vault = TempDir::new().expect("vault");
    let templates = TempDir::new().expect("templates");
    fs::write(
        templates.path().join("default.md.tera"),
        "{% include \"shared/_frontmatter.tera\" %}\n# {{ record.title }} (custom)\n",
    )
    .expect("template");
    configure(home.path(), vault.path(), false);
    seed(home.path(), &["Alpha"]);

    shelf_cmd(home.path())
        .args(["config", "set", "--templates-dir"])
        .arg(templates.path())
        .assert()
        .success()
        .stdout(contains("templates:"));
    shelf_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(contains("templates_dir:"));

    shelf_cmd(home.path()).arg("export").assert().success();
    let doc = fs::read_to_string(document(vault.path(), "Alpha")).expect("document");
    assert!(doc.contains("# Alpha (custom)"), "{doc}");
}

#[test]
fn first_config_set_requires_vault_root() {
    let home = TempDir::new().expect("home");
    shelf_cmd(home.path())
        .args(["config", "set", "--layout", "flat"])
        .assert()
        .failure()
        .stderr(contains("--vault-root"));
}

#[test]
fn commands_without_config_explain_setup() {
    let home = TempDir::new().expect("home");
    shelf_cmd(home.path())
        .arg("export")
        .assert()
        .failure()
        .stderr(contains("shelf config set"));

    shelf_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(contains("No sync configuration."));
}

#[test]
fn unknown_direction_is_rejected() {
    let home = TempDir::new().expect("home");
    let vault = TempDir::new().expect("vault");
    configure(home.path(), vault.path(), false);
    shelf_cmd(home.path())
        .args(["sync", "--direction", "sideways"])
        .assert()
        .failure();
}

// ---------------------------------------------------------------------------
// export / status / diff
// ---------------------------------------------------------------------------

#[test]
fn export_writes_one_document_per_record() {
    let home = TempDir::new().expect("home");
    let vault = TempDir::new().expect("vault");
    configure(home.path(), vault.path(), false);
    seed(home.path(), &["One", "Two"]);

    shelf_cmd(home.path())
        .arg("export")
        .assert()
        .success()
        .stdout(contains("2 written"));

    let one = fs::read_to_string(document(vault.path(), "One")).expect("One.md");
    assert!(one.starts_with("---\nrecord_id: 1\n"));
    assert!(document(vault.path(), "Two").is_file());

    shelf_cmd(home.path())
        .arg("export")
        .assert()
        .success()
        .stdout(contains("0 written"));
}

#[test]
fn status_json_reports_counts() {
    let home = TempDir::new().expect("home");
    let vault = TempDir::new().expect("vault");
    configure(home.path(), vault.path(), false);
    seed(home.path(), &["One", "Two"]);

    let output = shelf_cmd(home.path())
        .args(["status", "--json"])
        .output()
        .expect("status");
    assert!(output.status.success());
    let status: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(status["total_records"], 2);
    assert_eq!(status["unsynced_records"], 2);
    assert_eq!(status["layout"], "flat");
    assert!(status["last_synced_at"].is_null());

    shelf_cmd(home.path())
        .arg("status")
        .assert()
        .success()
        .stdout(contains("2 records"))
        .stdout(contains("never"));
}

#[test]
fn diff_previews_without_writing() {
    let home = TempDir::new().expect("home");
    let vault = TempDir::new().expect("vault");
    configure(home.path(), vault.path(), false);
    seed(home.path(), &["One"]);

    let assert = shelf_cmd(home.path())
        .args(["diff", "1"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    assert!(stdout.lines().any(|l| l == "+record_id: 1"), "{stdout}");
    assert!(!document(vault.path(), "One").exists());

    shelf_cmd(home.path())
        .args(["diff", "404"])
        .assert()
        .failure()
        .stderr(contains("404"));
}

// ---------------------------------------------------------------------------
// sync / conflicts / resolve
// ---------------------------------------------------------------------------

#[test]
fn full_sync_writes_backup_first() {
    let home = TempDir::new().expect("home");
    let vault = TempDir::new().expect("vault");
    configure(home.path(), vault.path(), true);
    seed(home.path(), &["One"]);

    shelf_cmd(home.path())
        .arg("sync")
        .assert()
        .success()
        .stdout(contains("backup:"))
        .stdout(contains("1 written"));

    let backups: Vec<_> = fs::read_dir(vault.path().join(".shelf-backups"))
        .expect("backup dir")
        .collect();
    assert_eq!(backups.len(), 1);
}

#[test]
fn queued_conflict_survives_between_runs_until_resolved() {
    let home = TempDir::new().expect("home");
    let vault = TempDir::new().expect("vault");
    configure(home.path(), vault.path(), false);
    seed(home.path(), &["One"]);

    shelf_cmd(home.path()).arg("export").assert().success();
    let path = document(vault.path(), "One");
    let text = fs::read_to_string(&path).expect("doc");
    fs::write(&path, text.replace("read: false", "read: true")).expect("edit");

    shelf_cmd(home.path())
        .args(["sync", "--policy", "manual"])
        .assert()
        .success()
        .stdout(contains("1 conflict(s)"))
        .stdout(contains("manual resolution required"));

    let output = shelf_cmd(home.path())
        .args(["conflicts", "--json"])
        .output()
        .expect("conflicts");
    let queued: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(queued.as_array().map(Vec::len), Some(1));
    assert_eq!(queued[0]["record_id"], "1");
    assert_eq!(queued[0]["divergences"][0]["field"], "is_read");

    shelf_cmd(home.path())
        .arg("conflicts")
        .assert()
        .success()
        .stdout(contains("1 pending conflict(s)"))
        .stdout(contains("is_read"));

    shelf_cmd(home.path())
        .args(["resolve", "1", "--policy", "vault-wins"])
        .assert()
        .success()
        .stdout(contains("resolved with vault-wins"));

    shelf_cmd(home.path())
        .arg("conflicts")
        .assert()
        .success()
        .stdout(contains("No pending conflicts."));

    let store = JsonRecordStore::open_at(home.path()).expect("store");
    let record = store.fetch_by_id(&RecordId::from("1")).unwrap().unwrap();
    assert!(record.is_read);
}

#[test]
fn resolving_unknown_record_fails() {
    let home = TempDir::new().expect("home");
    let vault = TempDir::new().expect("vault");
    configure(home.path(), vault.path(), false);

    shelf_cmd(home.path())
        .args(["resolve", "99", "--policy", "merge"])
        .assert()
        .failure()
        .stderr(contains("cannot resolve '99'"));

    shelf_cmd(home.path())
        .arg("resolve")
        .assert()
        .success()
        .stdout(contains("No pending conflicts."));
}
