use assert_cmd::Command;
use httpmock::prelude::*;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;

const API_KEY: &str = "0123456789abcdef";

/// The binary with HOME and the config file inside `home`, and no API key
/// leaking in from the environment.
fn r7(home: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_r7"));
    cmd.env("HOME", home.path())
        .env_remove("R7_API_KEY")
        .env_remove("R7_LOG_SEARCH_URL")
        .env_remove("R7_QUERY_URL")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(home.path().join("config.json"));
    cmd
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_r7"));
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("LEQL"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_r7"));
    let expected = format!("r7 {}", env!("CARGO_PKG_VERSION"));
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(expected));
}

#[test]
fn test_logs_query_help() {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_r7"));
    cmd.args(["logs", "query", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--max-result-pages"))
        .stdout(predicate::str::contains("single log"));
}

#[test]
fn test_zero_page_budget_is_rejected() {
    let home = TempDir::new().unwrap();
    r7(&home)
        .args(["logs", "query", "Auth", "--max-result-pages", "0"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_missing_api_key_exits_with_auth_code() {
    let home = TempDir::new().unwrap();
    r7(&home)
        .args(["logs", "list"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("API key is required"));
}

#[test]
fn test_invalid_region_exits_with_config_code() {
    let home = TempDir::new().unwrap();
    r7(&home)
        .args(["--region", "mars", "config", "show"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid region"));
}

#[test]
fn test_config_set_persists_and_validates() {
    let home = TempDir::new().unwrap();
    r7(&home)
        .args(["config", "set", "region", "eu"])
        .assert()
        .success();

    let saved = std::fs::read_to_string(home.path().join("config.json")).unwrap();
    assert!(saved.contains("\"region\": \"eu\""));

    r7(&home)
        .args(["config", "set", "query_timeout", "5"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("at least 30 seconds"));

    r7(&home)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("eu"));
}

#[test]
fn test_config_path_prints_override() {
    let home = TempDir::new().unwrap();
    r7(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.json"));
}

#[test]
fn test_query_prints_event_messages_as_json() {
    let home = TempDir::new().unwrap();
    let server = MockServer::start();
    let listing = server.mock(|when, then| {
        when.method(GET).path("/management/logs").header("x-api-key", API_KEY);
        then.status(200)
            .json_body(json!({"logs": [{"id": "A1", "name": "Auth"}]}));
    });
    let query = server.mock(|when, then| {
        when.method(GET)
            .path("/query/logs/A1")
            .query_param("time_range", "Last 1 day");
        then.status(200).json_body(json!({
            "events": [
                {"timestamp": 1700000000000i64, "message": "{\"user\": \"bob\"}"},
                {"timestamp": 1700000001000i64, "message": "plain"}
            ]
        }));
    });

    r7(&home)
        .args(["--api-key", API_KEY])
        .args(["--log-search-url", &server.base_url()])
        .args(["--query-url", &server.base_url()])
        .args(["logs", "query", "auth", "--time-range", "Last 1 day"])
        .args(["--output", "json", "--no-cache"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"[{"user":"bob"},"plain"]"#));

    listing.assert();
    query.assert();
}

#[test]
fn test_unauthorized_listing_exits_with_auth_code() {
    let home = TempDir::new().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/management/logs");
        then.status(401);
    });

    r7(&home)
        .args(["--api-key", API_KEY])
        .args(["--log-search-url", &server.base_url()])
        .args(["logs", "logsets", "--output", "json"])
        .assert()
        .code(5);
}

#[test]
fn test_ambiguous_log_name_exits_with_query_code() {
    let home = TempDir::new().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/management/logs");
        then.status(200).json_body(json!({"logs": [
            {"id": "A1", "name": "Auth"},
            {"id": "A2", "name": "auth"}
        ]}));
    });

    r7(&home)
        .args(["--api-key", API_KEY])
        .args(["--log-search-url", &server.base_url()])
        .args(["--query-url", &server.base_url()])
        .args(["logs", "query", "Auth", "--output", "json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("use UUID instead"));
}
