use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn scout_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_scout"))
}

const RECORDS_DAY_0: &str = r#"{"owner":"acme","name":"vectordb","description":"Embedding vector search for LLM apps","language":"Rust","stars":1000,"forks":40,"contributors":12,"downloads":5000,"download_source":"crates.io","commits_3mo":120,"prs":25}
{"owner":"someone","name":"awesome-tools","description":"A curated list of awesome tools","stars":5000,"forks":300,"contributors":1,"commits":5}
{"owner":"google","name":"bigthing","description":"Kubernetes deployment automation","language":"Go","stars":20000,"forks":2000,"contributors":300,"prs":200}
"#;

const RECORDS_DAY_30: &str = r#"[{"owner":"acme","name":"vectordb","description":"Embedding vector search for LLM apps","language":"Rust","stars":1500,"forks":60,"contributors":14,"downloads":9000,"download_source":"crates.io","commits_3mo":150,"prs":30}]"#;

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let data_dir = root.join("data");
    fs::create_dir_all(&data_dir).unwrap();

    fs::write(data_dir.join("day0.jsonl"), RECORDS_DAY_0).unwrap();
    fs::write(data_dir.join("day30.json"), RECORDS_DAY_30).unwrap();

    let config_content = format!(
        r#"[db]
path = "{root}/data/scout.sqlite"

[server]
bind = "127.0.0.1:0"

[source]
path = "{root}/data/day0.jsonl"
max_fork_ratio = 5.0

[history]
days = 36500
"#,
        root = root.display()
    );

    let config_path = config_dir.join("scout.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_scout(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = scout_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run scout binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn data_file(config_path: &Path, name: &str) -> String {
    config_path
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("data")
        .join(name)
        .display()
        .to_string()
}

#[test]
fn test_init_is_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_scout(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));

    let (_, _, success) = run_scout(&config_path, &["init"]);
    assert!(success, "second init failed");
}

#[test]
fn test_ingest_then_top_excludes_big_tech_and_lists() {
    let (_tmp, config_path) = setup_test_env();
    run_scout(&config_path, &["init"]);

    let day0 = data_file(&config_path, "day0.jsonl");
    let (stdout, stderr, success) =
        run_scout(&config_path, &["ingest", &day0, "--date", "2026-01-01"]);
    assert!(success, "ingest failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Ingested 3 records"));

    let (stdout, _, success) = run_scout(&config_path, &["top", "--json"]);
    assert!(success);
    let records: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let names: Vec<&str> = records
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["vectordb"]);
    assert_eq!(records[0]["category"], "ai-ml");

    let (stdout, _, success) =
        run_scout(&config_path, &["top", "--json", "--include-big-tech", "--include-non-investable"]);
    assert!(success);
    let records: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(records.as_array().unwrap().len(), 3);
    let awesome = records
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["name"] == "awesome-tools")
        .unwrap();
    assert_eq!(awesome["is_non_investable"], true);
    assert!(awesome["investability_score"].as_u64().unwrap() < 30);
}

#[test]
fn test_history_shows_growth_after_second_ingest() {
    let (_tmp, config_path) = setup_test_env();
    run_scout(&config_path, &["init"]);

    let day0 = data_file(&config_path, "day0.jsonl");
    let day30 = data_file(&config_path, "day30.json");
    assert!(run_scout(&config_path, &["ingest", &day0, "--date", "2026-01-01"]).2);
    assert!(run_scout(&config_path, &["ingest", &day30, "--date", "2026-01-31"]).2);

    let (stdout, stderr, success) =
        run_scout(&config_path, &["history", "acme/vectordb", "--json"]);
    assert!(success, "history failed: stdout={}, stderr={}", stdout, stderr);
    let history: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(history["snapshots"].as_array().unwrap().len(), 2);
    let latest = history["growth"].as_array().unwrap().last().unwrap().clone();
    assert_eq!(latest["stars_mom"], 50.0);
    assert!(latest["investability_score"].is_u64());
}

#[test]
fn test_history_rejects_bad_entity() {
    let (_tmp, config_path) = setup_test_env();
    run_scout(&config_path, &["init"]);
    let (_, stderr, success) = run_scout(&config_path, &["history", "no-slash"]);
    assert!(!success);
    assert!(stderr.contains("owner"));
}

#[test]
fn test_refresh_and_stats() {
    let (_tmp, config_path) = setup_test_env();
    run_scout(&config_path, &["init"]);

    let (stdout, stderr, success) =
        run_scout(&config_path, &["refresh", "--progress", "json"]);
    assert!(success, "refresh failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("3 analyzed"));
    assert!(stderr.contains("\"phase\":\"complete\""));

    let (stdout, _, success) = run_scout(&config_path, &["stats"]);
    assert!(success);
    assert!(stdout.contains("Snapshots:   3"));
    assert!(stdout.contains("ai-ml"));
}

#[test]
fn test_completions_without_config() {
    let output = Command::new(scout_binary())
        .args(["--config", "/nonexistent/scout.toml", "completions", "bash"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("scout"));
}

#[test]
fn test_missing_config_fails() {
    let output = Command::new(scout_binary())
        .args(["--config", "/nonexistent/scout.toml", "stats"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to read config file"));
}
