use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use iconsweep_core::db::{ProjectDb, ProjectLayout};
use predicates::prelude::*;
use tempfile::tempdir;

const DOCUMENT: &str = r##"{
  "name": "App",
  "pages": [
    {
      "id": "p1", "name": "Home", "type": "PAGE",
      "children": [
        { "id": "a", "name": "bell", "type": "FRAME", "width": 24, "height": 24,
          "children": [{ "id": "a:v", "name": "Vector", "type": "VECTOR", "width": 18, "height": 18,
                         "fills": [{ "type": "SOLID", "color": "#000000" }] }] },
        { "id": "b", "name": "bell copy", "type": "FRAME", "width": 24, "height": 24, "x": 40,
          "children": [{ "id": "b:v", "name": "Vector", "type": "VECTOR", "width": 18, "height": 18,
                         "fills": [{ "type": "SOLID", "color": "#000000" }] }] }
      ]
    },
    {
      "id": "p2", "name": "Settings", "type": "PAGE",
      "children": [
        { "id": "c", "name": "gear", "type": "FRAME", "width": 24, "height": 24,
          "children": [{ "id": "c:v", "name": "Vector", "type": "VECTOR", "width": 20, "height": 20 }] }
      ]
    }
  ]
}"##;

fn init_project(root: &Path) {
    fs::write(root.join("design.json"), DOCUMENT).expect("write document");
    cargo_bin_cmd!("iconsweep")
        .arg("init-project")
        .arg("--root")
        .arg(root)
        .arg("--name")
        .arg("Demo")
        .arg("--document")
        .arg("design.json")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized iconsweep project"));
}

/// init-project without an explicit --root should use the current directory.
#[test]
fn init_project_uses_default_root_when_not_provided() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();

    cargo_bin_cmd!("iconsweep")
        .current_dir(root)
        .arg("init-project")
        .arg("--name")
        .arg("TestProject")
        .assert()
        .success();

    let layout = ProjectLayout::new(root);
    assert!(layout.project_config_path.exists());
    assert!(layout.db_path.exists());
    assert!(layout.reports_dir.is_dir());
}

#[test]
fn project_info_fails_when_config_missing() {
    let dir = tempdir().expect("tempdir");
    cargo_bin_cmd!("iconsweep")
        .arg("project-info")
        .arg("--root")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read project config"));
}

#[test]
fn project_info_json_reports_name_and_default_document() {
    let dir = tempdir().expect("tempdir");
    init_project(dir.path());

    let output = cargo_bin_cmd!("iconsweep")
        .arg("project-info")
        .arg("--root")
        .arg(dir.path())
        .arg("--json")
        .output()
        .expect("run project-info");
    assert!(output.status.success());
    let info: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(info["name"], "Demo");
    assert_eq!(info["default_document"], "design.json");
    assert_eq!(info["scan_runs"], 0);
}

#[test]
fn scan_prints_json_and_records_the_run() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    init_project(root);

    let output = cargo_bin_cmd!("iconsweep")
        .arg("scan")
        .arg("--root")
        .arg(root)
        .arg("--json")
        .output()
        .expect("run scan");
    assert!(output.status.success());
    let result: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(result["totalIcons"], 3);
    assert_eq!(result["ignoredCount"], 0);

    let layout = ProjectLayout::new(root);
    assert!(layout.report_path("design.json", "scan").exists());
    let db = ProjectDb::open(&layout.db_path).expect("open db");
    let runs = db.list_scan_runs(Some("design.json")).expect("runs");
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].total_icons, 3);
    assert_eq!(runs[0].document_hash.as_deref().map(str::len), Some(64));
}

#[test]
fn consolidate_rewrites_the_document_in_place() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    init_project(root);

    cargo_bin_cmd!("iconsweep")
        .arg("consolidate")
        .arg("--root")
        .arg(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created 2 components and replaced 3 icons"));

    let body = fs::read_to_string(root.join("design.json")).expect("read document");
    let doc: serde_json::Value = serde_json::from_str(&body).expect("json");
    let pages: Vec<&str> =
        doc["pages"].as_array().unwrap().iter().map(|p| p["name"].as_str().unwrap()).collect();
    assert_eq!(pages, vec!["Home", "Settings", "Icon Library"]);
    // The representative ("bell copy") became the master; "bell" is now an instance of it.
    let home = doc["pages"][0]["children"].as_array().unwrap();
    assert_eq!(home.len(), 1);
    assert_eq!(home[0]["type"], "INSTANCE");
    let library = doc["pages"][2]["children"].as_array().unwrap();
    assert_eq!(library.len(), 2);
    assert!(library.iter().all(|n| n["type"] == "COMPONENT"));
    assert_eq!(home[0]["mainComponentId"], library[0]["id"]);

    let layout = ProjectLayout::new(root);
    let db = ProjectDb::open(&layout.db_path).expect("open db");
    let runs = db.list_consolidation_runs(None).expect("runs");
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].scope, "all-pages");
    assert_eq!(runs[0].components_created, 2);
    assert_eq!(runs[0].icons_replaced, 3);
    assert_eq!(runs[0].pages_affected, 2);
}

#[test]
fn consolidate_current_page_without_page_fails() {
    let dir = tempdir().expect("tempdir");
    init_project(dir.path());

    cargo_bin_cmd!("iconsweep")
        .arg("consolidate")
        .arg("--root")
        .arg(dir.path())
        .arg("--scope")
        .arg("current-page")
        .assert()
        .failure()
        .stderr(predicate::str::contains("current page"));
}

#[test]
fn consolidate_rejects_unknown_scope() {
    let dir = tempdir().expect("tempdir");
    init_project(dir.path());

    cargo_bin_cmd!("iconsweep")
        .arg("consolidate")
        .arg("--root")
        .arg(dir.path())
        .arg("--scope")
        .arg("everything")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid scope"));
}

#[test]
fn ignored_marking_is_honoured_by_scan() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    init_project(root);

    cargo_bin_cmd!("iconsweep")
        .arg("mark")
        .arg("--root")
        .arg(root)
        .arg("--node-id")
        .arg("c")
        .arg("--ignore")
        .arg("true")
        .assert()
        .success();

    cargo_bin_cmd!("iconsweep")
        .arg("list-markings")
        .arg("--root")
        .arg(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("- c [ignored]"));

    let output = cargo_bin_cmd!("iconsweep")
        .arg("scan")
        .arg("--root")
        .arg(root)
        .arg("--json")
        .output()
        .expect("run scan");
    let result: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(result["totalIcons"], 2);
    assert_eq!(result["ignoredCount"], 1);
}

#[test]
fn mark_without_flags_fails() {
    let dir = tempdir().expect("tempdir");
    init_project(dir.path());

    cargo_bin_cmd!("iconsweep")
        .arg("mark")
        .arg("--root")
        .arg(dir.path())
        .arg("--node-id")
        .arg("a")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to mark"));
}

#[test]
fn preview_prints_svg() {
    let dir = tempdir().expect("tempdir");
    init_project(dir.path());

    cargo_bin_cmd!("iconsweep")
        .arg("preview")
        .arg("--root")
        .arg(dir.path())
        .arg("--node-id")
        .arg("a")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<svg"));
}

#[test]
fn preview_of_page_fails_without_bounds() {
    let dir = tempdir().expect("tempdir");
    init_project(dir.path());

    cargo_bin_cmd!("iconsweep")
        .arg("preview")
        .arg("--root")
        .arg(dir.path())
        .arg("--node-id")
        .arg("p1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no bounding box"));
}

#[test]
fn handle_reads_request_from_stdin() {
    let dir = tempdir().expect("tempdir");
    init_project(dir.path());

    cargo_bin_cmd!("iconsweep")
        .arg("handle")
        .arg("--root")
        .arg(dir.path())
        .write_stdin(r#"{"type":"scan"}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""type":"scan-result""#))
        .stdout(predicate::str::contains(r#""totalIcons":3"#));
}

#[test]
fn list_runs_without_history_says_so() {
    let dir = tempdir().expect("tempdir");
    init_project(dir.path());

    cargo_bin_cmd!("iconsweep")
        .arg("list-runs")
        .arg("--root")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No runs recorded."));
}

#[test]
fn show_config_prints_engine_defaults() {
    let dir = tempdir().expect("tempdir");
    init_project(dir.path());

    cargo_bin_cmd!("iconsweep")
        .arg("show-config")
        .arg("--root")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Icon Library"))
        .stdout(predicate::str::contains("merge_threshold"));
}

#[test]
fn show_config_yaml_can_seed_a_new_project() {
    let dir = tempdir().expect("tempdir");
    init_project(dir.path());

    let output = cargo_bin_cmd!("iconsweep")
        .arg("show-config")
        .arg("--root")
        .arg(dir.path())
        .arg("--yaml")
        .output()
        .expect("run show-config");
    assert!(output.status.success());
    let engine = dir.path().join("engine.yaml");
    fs::write(&engine, &output.stdout).expect("write engine yaml");

    let other = tempdir().expect("tempdir");
    cargo_bin_cmd!("iconsweep")
        .arg("init-project")
        .arg("--root")
        .arg(other.path())
        .arg("--engine-config")
        .arg(&engine)
        .assert()
        .success();
}
