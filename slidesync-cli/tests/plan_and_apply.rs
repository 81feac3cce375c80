use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn slidesync_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("slidesync"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env("NO_COLOR", "1")
        .env("RUST_LOG", "warn");
    cmd
}

fn write_deck(dir: &Path, name: &str, titles: &[&str]) -> PathBuf {
    let mut yaml = String::from("pages:\n");
    for title in titles {
        yaml.push_str(&format!(
            "  - layout: body\n    titles: [\"{title}\"]\n    bodies:\n      - runs:\n          - text: \"{title} body\"\n"
        ));
    }
    let path = dir.join(name);
    fs::write(&path, yaml).expect("write deck");
    path
}

#[test]
fn plan_prints_a_table_of_actions() {
    let home = TempDir::new().expect("home");
    let work = TempDir::new().expect("work");
    let current = write_deck(work.path(), "current.yaml", &["A", "B", "C"]);
    let desired = write_deck(work.path(), "desired.yaml", &["A", "D"]);

    slidesync_cmd(home.path())
        .arg("plan")
        .arg(&current)
        .arg(&desired)
        .assert()
        .success()
        .stdout(contains("2 action(s): 0 append, 1 update, 1 delete, 0 move"))
        .stdout(contains("UPDATE"))
        .stdout(contains("DELETE"));
}

#[test]
fn plan_json_lists_actions_in_execution_order() {
    let home = TempDir::new().expect("home");
    let work = TempDir::new().expect("work");
    let current = write_deck(work.path(), "current.yaml", &["A", "B"]);
    let desired = write_deck(work.path(), "desired.yaml", &["B", "A", "C"]);

    let output = slidesync_cmd(home.path())
        .args(["plan", "--json"])
        .arg(&current)
        .arg(&desired)
        .output()
        .expect("run slidesync plan --json");
    assert!(
        output.status.success(),
        "stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let payload: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(payload["summary"]["appends"], 1);
    assert_eq!(payload["summary"]["deletes"], 0);
    assert_eq!(payload["summary"]["optimal"], true);

    let kinds: Vec<&str> = payload["actions"]
        .as_array()
        .expect("actions")
        .iter()
        .map(|a| a["kind"].as_str().expect("kind"))
        .collect();
    assert_eq!(kinds.first(), Some(&"append"));
    assert!(kinds.iter().skip(1).all(|k| *k != "append"));
}

#[test]
fn plan_for_identical_decks_is_empty() {
    let home = TempDir::new().expect("home");
    let work = TempDir::new().expect("work");
    let deck = write_deck(work.path(), "deck.yaml", &["A", "B"]);

    slidesync_cmd(home.path())
        .arg("plan")
        .arg(&deck)
        .arg(&deck)
        .assert()
        .success()
        .stdout(contains("decks already match"));
}

#[test]
fn plan_reports_missing_decks() {
    let home = TempDir::new().expect("home");
    let work = TempDir::new().expect("work");
    let desired = write_deck(work.path(), "desired.yaml", &["A"]);

    slidesync_cmd(home.path())
        .arg("plan")
        .arg(work.path().join("nope.yaml"))
        .arg(&desired)
        .assert()
        .failure()
        .stderr(contains("failed to load deck"));
}

#[test]
fn invalid_config_is_reported() {
    let home = TempDir::new().expect("home");
    let work = TempDir::new().expect("work");
    let deck = write_deck(work.path(), "deck.yaml", &["A"]);
    fs::create_dir_all(home.path().join(".slidesync")).unwrap();
    fs::write(home.path().join(".slidesync/config.yaml"), "upload_workers: many\n").unwrap();

    slidesync_cmd(home.path())
        .arg("plan")
        .arg(&deck)
        .arg(&deck)
        .assert()
        .failure()
        .stderr(contains("config.yaml"));
}

#[test]
fn apply_writes_the_deck_and_uploads_images_once() {
    let home = TempDir::new().expect("home");
    let work = TempDir::new().expect("work");
    fs::write(work.path().join("chart.png"), b"chart pixels").unwrap();
    let desired = work.path().join("desired.yaml");
    fs::write(
        &desired,
        "pages:\n  - layout: title\n    titles: [Welcome]\n  - layout: body\n    titles: [Chart]\n    images:\n      - path: chart.png\n",
    )
    .unwrap();
    let live = work.path().join("live.yaml");

    slidesync_cmd(home.path())
        .arg("apply")
        .arg(&live)
        .arg(&desired)
        .assert()
        .success()
        .stdout(contains("applied 2 action(s)"))
        .stdout(contains("1 image(s) uploaded"));

    let written = fs::read_to_string(&live).expect("live deck");
    assert!(written.contains("Welcome"));
    assert!(written.contains("file://"));
    assert_eq!(fs::read_dir(work.path().join("assets")).unwrap().count(), 1);

    slidesync_cmd(home.path())
        .arg("apply")
        .arg(&live)
        .arg(&desired)
        .assert()
        .success()
        .stdout(contains("decks already match"));
}

#[test]
fn apply_dry_run_changes_nothing() {
    let home = TempDir::new().expect("home");
    let work = TempDir::new().expect("work");
    let live = write_deck(work.path(), "live.yaml", &["A", "B"]);
    let desired = write_deck(work.path(), "desired.yaml", &["B", "A"]);
    let before = fs::read_to_string(&live).unwrap();

    slidesync_cmd(home.path())
        .args(["apply", "--dry-run"])
        .arg(&live)
        .arg(&desired)
        .assert()
        .success()
        .stdout(contains("[dry-run]"))
        .stdout(contains("1 move"));

    assert_eq!(fs::read_to_string(&live).unwrap(), before);
    assert!(!work.path().join("assets").exists());
}

#[test]
fn apply_reorders_an_existing_deck() {
    let home = TempDir::new().expect("home");
    let work = TempDir::new().expect("work");
    let live = write_deck(work.path(), "live.yaml", &["A", "B", "C"]);
    let desired = write_deck(work.path(), "desired.yaml", &["C", "A", "B"]);

    slidesync_cmd(home.path())
        .arg("apply")
        .arg(&live)
        .arg(&desired)
        .assert()
        .success()
        .stdout(contains("applied 1 action(s)"));

    slidesync_cmd(home.path())
        .arg("plan")
        .arg(&live)
        .arg(&desired)
        .assert()
        .success()
        .stdout(contains("decks already match"));
}
