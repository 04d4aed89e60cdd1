//! Integration tests for the kioskctl binary
//!
//! Each test runs against its own temporary store and checks both output
//! and exit codes.

use assert_cmd::Command;
use kiosk_test_helpers::prelude::*;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::path::PathBuf;
use tempfile::TempDir;

/// Output is a single JSON document
fn is_json() -> impl predicates::Predicate<[u8]> {
    predicates::function::function(|s: &[u8]| {
        std::str::from_utf8(s)
            .ok()
            .and_then(|text| serde_json::from_str::<Value>(text).ok())
            .is_some()
    })
}

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> TestResult<Self> {
        let dir = TempDir::new()?;
        write_json(&dir.path().join("profile.json"), &sample_profile_json())?;
        Ok(Self { dir })
    }

    fn file(&self, name: &str, doc: &Value) -> TestResult<PathBuf> {
        let path = self.dir.path().join(name);
        write_json(&path, doc)?;
        Ok(path)
    }

    fn kioskctl(&self) -> TestResult<Command> {
        let mut cmd = Command::cargo_bin("kioskctl")?;
        cmd.current_dir(self.dir.path())
            .env_remove("KIOSKCTL_CONFIG")
            .env_remove("KIOSKCTL_AUTHOR")
            .env_remove("RUST_LOG")
            .env("KIOSKCTL_STORE", self.dir.path().join("store"))
            .env("KIOSKCTL_SOURCE", self.dir.path().join("profile.json"));
        Ok(cmd)
    }

    fn json(&self, args: &[&str]) -> TestResult<Value> {
        let output = self.kioskctl()?.arg("--json").args(args).output()?;
        if !output.status.success() {
            return Err(format!("kioskctl {args:?} failed: {output:?}").into());
        }
        Ok(serde_json::from_slice(&output.stdout)?)
    }

    fn commit_ids(&self) -> TestResult<Vec<String>> {
        let log = self.json(&["log"])?;
        let commits = log["commits"].as_array().ok_or("commits array")?;
        Ok(commits
            .iter()
            .filter_map(|commit| commit["id"].as_str().map(str::to_string))
            .collect())
    }
}

mod help {
    use super::*;

    #[test]
    fn test_help_lists_commands() -> TestResult {
        Command::cargo_bin("kioskctl")?
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("rollback"))
            .stdout(predicate::str::contains("validate"));
        Ok(())
    }

    #[test]
    fn test_completion_bash() -> TestResult {
        Command::cargo_bin("kioskctl")?
            .args(["completion", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("kioskctl"));
        Ok(())
    }
}

mod validate {
    use super::*;

    #[test]
    fn test_valid_profile_passes() -> TestResult {
        let ws = Workspace::new()?;
        ws.kioskctl()?
            .args(["validate", "profile.json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("is a valid profile"));
        Ok(())
    }

    #[test]
    fn test_invalid_profile_exits_with_validation_code() -> TestResult {
        let ws = Workspace::new()?;
        let mut doc = sample_profile_json();
        doc["storeInfo"]["taxRate"] = json!(7);
        ws.file("bad.json", &doc)?;

        ws.kioskctl()?
            .args(["validate", "bad.json"])
            .assert()
            .code(4)
            .stderr(predicate::str::contains("taxRate"));
        Ok(())
    }

    #[test]
    fn test_json_error_lists_issues() -> TestResult {
        let ws = Workspace::new()?;
        ws.file("empty.json", &json!({}))?;

        let output = ws
            .kioskctl()?
            .args(["--json", "validate", "empty.json"])
            .output()?;
        assert_eq!(output.status.code(), Some(4));
        let body: Value = serde_json::from_slice(&output.stdout)?;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["type"], "Validation");
        assert!(body["error"]["issues"].as_array().is_some_and(|i| !i.is_empty()));
        Ok(())
    }

    #[test]
    fn test_partial_update_validates_alone() -> TestResult {
        let ws = Workspace::new()?;
        ws.file("patch.json", &json!({"storeInfo": {"name": "Y"}}))?;
        ws.kioskctl()?
            .args(["validate", "--partial", "patch.json"])
            .assert()
            .success();
        ws.kioskctl()?
            .args(["validate", "patch.json"])
            .assert()
            .code(4);
        Ok(())
    }

    #[test]
    fn test_missing_file_fails() -> TestResult {
        let ws = Workspace::new()?;
        ws.kioskctl()?
            .args(["validate", "nope.json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("nope.json"));
        Ok(())
    }
}

mod editing {
    use super::*;

    #[test]
    fn test_show_loads_source_into_empty_store() -> TestResult {
        let ws = Workspace::new()?;
        ws.kioskctl()?
            .arg("show")
            .assert()
            .success()
            .stdout(predicate::str::contains("X"));

        let log = ws.json(&["log"])?;
        assert_eq!(log["total"], 1);
        assert_eq!(log["commits"][0]["message"], "Initial profile");
        Ok(())
    }

    #[test]
    fn test_apply_commits_and_persists() -> TestResult {
        let ws = Workspace::new()?;
        ws.file("rename.json", &json!({"storeInfo": {"name": "Y"}}))?;

        ws.kioskctl()?
            .args(["--json", "apply", "rename.json", "-m", "Rename store", "--author", "staff"])
            .assert()
            .success()
            .stdout(is_json());

        let shown = ws.json(&["show"])?;
        assert_eq!(shown["profile"]["storeName"], "Y");

        let log = ws.json(&["log"])?;
        assert_eq!(log["total"], 2);
        assert_eq!(log["commits"][0]["message"], "Rename store");
        assert_eq!(log["commits"][0]["author"], "staff");
        Ok(())
    }

    #[test]
    fn test_apply_without_changes_is_a_noop_error() -> TestResult {
        let ws = Workspace::new()?;
        ws.file("same.json", &json!({"storeInfo": {"name": "X"}}))?;
        ws.kioskctl()?
            .args(["apply", "same.json", "-m", "Nothing"])
            .assert()
            .code(2);
        Ok(())
    }

    #[test]
    fn test_invalid_patch_is_rejected() -> TestResult {
        let ws = Workspace::new()?;
        ws.file("bad.json", &json!({"storeInfo": {"taxRate": 7}}))?;
        ws.kioskctl()?
            .args(["apply", "bad.json", "-m", "Bad"])
            .assert()
            .code(4);
        assert_eq!(ws.json(&["log"])?["total"], 1);
        Ok(())
    }

    #[test]
    fn test_import_and_export() -> TestResult {
        let ws = Workspace::new()?;
        let replacement = ProfileFixture::new().with_store_name("Imported").build();
        ws.file("next.json", &replacement)?;

        ws.kioskctl()?
            .args(["import", "next.json", "-m", "Swap profile"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Swap profile"));

        ws.kioskctl()?
            .args(["export", "-o", "out.json"])
            .assert()
            .success();
        let exported: Value = serde_json::from_str(&std::fs::read_to_string(
            ws.dir.path().join("out.json"),
        )?)?;
        assert_eq!(exported["storeInfo"]["name"], "Imported");
        Ok(())
    }

    #[test]
    fn test_import_empty_object_fails() -> TestResult {
        let ws = Workspace::new()?;
        ws.file("empty.json", &json!({}))?;
        ws.kioskctl()?
            .args(["import", "empty.json"])
            .assert()
            .code(4);
        Ok(())
    }
}

mod history {
    use super::*;

    #[test]
    fn test_rollback_restores_earlier_profile() -> TestResult {
        let ws = Workspace::new()?;
        ws.file("rename.json", &json!({"storeInfo": {"name": "Y"}}))?;
        ws.kioskctl()?
            .args(["apply", "rename.json", "-m", "Rename"])
            .assert()
            .success();

        let ids = ws.commit_ids()?;
        let root = ids.last().ok_or("root commit")?;
        let prefix: String = root.chars().take(8).collect();

        ws.kioskctl()?
            .args(["rollback", &prefix])
            .assert()
            .success()
            .stdout(predicate::str::contains("Rollback to"));

        assert_eq!(ws.json(&["show"])?["profile"]["storeName"], "X");
        assert_eq!(ws.json(&["log"])?["total"], 3);
        Ok(())
    }

    #[test]
    fn test_diff_and_summary() -> TestResult {
        let ws = Workspace::new()?;
        ws.file("rename.json", &json!({"storeInfo": {"name": "Y"}}))?;
        ws.kioskctl()?
            .args(["apply", "rename.json", "-m", "Rename"])
            .assert()
            .success();

        let ids = ws.commit_ids()?;
        let (newest, root) = match ids.as_slice() {
            [newest, root] => (newest.clone(), root.clone()),
            _ => return Err(format!("expected two commits, got {ids:?}").into()),
        };

        let diff = ws.json(&["diff", &root, &newest])?;
        let changes = diff["changes"].as_array().ok_or("changes")?;
        assert!(changes
            .iter()
            .any(|line| line.as_str().is_some_and(|l| l.contains("/storeInfo/name"))));

        let summary = ws.json(&["summary", &root])?;
        assert_eq!(summary["changes"][0], "Initial snapshot");
        Ok(())
    }

    #[test]
    fn test_unknown_commit_is_not_found() -> TestResult {
        let ws = Workspace::new()?;
        ws.kioskctl()?
            .args(["rollback", "zzzzzzzz"])
            .assert()
            .code(3);
        Ok(())
    }

    #[test]
    fn test_prune_reports_count() -> TestResult {
        let ws = Workspace::new()?;
        ws.kioskctl()?
            .args(["--json", "prune"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Pruned 0 commits"));
        Ok(())
    }
}

mod menu {
    use super::*;

    #[test]
    fn test_menu_json_lists_orderable_items() -> TestResult {
        let ws = Workspace::new()?;
        let menu = ws.json(&["menu"])?;
        assert_eq!(menu["menu"]["storeName"], "X");
        let categories = menu["menu"]["categories"].as_array().ok_or("categories")?;
        assert_eq!(categories.len(), 2);
        Ok(())
    }

    #[test]
    fn test_menu_human_output() -> TestResult {
        let ws = Workspace::new()?;
        ws.kioskctl()?
            .arg("menu")
            .assert()
            .success()
            .stdout(predicate::str::contains("5500"));
        Ok(())
    }
}

mod store {
    use super::*;

    #[test]
    fn test_missing_source_on_empty_store_fails() -> TestResult {
        let ws = Workspace::new()?;
        ws.kioskctl()?
            .env_remove("KIOSKCTL_SOURCE")
            .arg("show")
            .assert()
            .failure()
            .stderr(predicate::str::contains("profile store"));
        Ok(())
    }

    #[test]
    fn test_store_survives_source_removal() -> TestResult {
        let ws = Workspace::new()?;
        ws.kioskctl()?.arg("show").assert().success();
        std::fs::remove_file(ws.dir.path().join("profile.json"))?;
        ws.kioskctl()?
            .arg("show")
            .assert()
            .success()
            .stdout(predicate::str::contains("X"));
        Ok(())
    }
}
