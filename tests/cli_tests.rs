//! CLI integration tests.
//!
//! Network-facing commands point at a closed local port or at an in-process
//! WebSocket server, so nothing here touches the real backend.

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use futures_util::SinkExt;
use predicates::prelude::*;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

use coopdash::testkit::config::config_toml;
use coopdash::testkit::http::{MockApi, MockResponse};
use serde_json::{json, Value};

fn coopdash() -> Command {
    let mut cmd = cargo_bin_cmd!("coopdash");
    cmd.env_remove("COOPDASH_TOKEN").env_remove("RUST_LOG");
    cmd
}

/// Config pointing at `host`, with the session file inside `dir`.
fn write_config(dir: &TempDir, host: &str) -> PathBuf {
    let session = dir.path().join("session.json");
    let contents = format!(
        "{}\n[session]\npath = {:?}\n",
        config_toml(host),
        session.display().to_string()
    );
    let path = dir.path().join("config.toml");
    std::fs::write(&path, contents).unwrap();
    path
}

/// An address nothing listens on.
fn closed_addr() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr.to_string()
}

fn session_path(dir: &TempDir) -> PathBuf {
    dir.path().join("session.json")
}

fn write_session(path: &Path) {
    std::fs::write(
        path,
        r#"{"access_token": "tok", "user_info": {"username": "admin"}}"#,
    )
    .unwrap();
}

/// Run the binary off the async runtime so in-process servers keep serving.
async fn run(mut cmd: Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

/// The JSON document a command printed for itself.
fn command_output(output: &std::process::Output, command: &str) -> Value {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .find(|value| value["command"] == command)
        .unwrap_or_else(|| panic!("no {command} output"))
}

#[test]
fn test_help() {
    coopdash()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("coopdash"))
        .stdout(predicate::str::contains("watch"))
        .stdout(predicate::str::contains("overview"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("delete"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn test_version() {
    coopdash()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("coopdash"));
}

#[test]
fn test_unknown_record_kind_is_rejected() {
    coopdash()
        .args(["list", "dividends"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_check_config_reports_endpoints() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "127.0.0.1:8000");

    coopdash()
        .args(["check", "config", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("ws://127.0.0.1:8000/ws/stats"))
        .stdout(predicate::str::contains("Not logged in"));
}

#[test]
fn test_check_config_json_lines() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "127.0.0.1:8000");

    let output = coopdash()
        .args(["--json", "check", "config", "--config"])
        .arg(&config)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for line in stdout.lines() {
        let value: Value = serde_json::from_str(line).unwrap();
        assert!(value.get("type").is_some(), "untyped line: {line}");
    }
    assert!(stdout.contains(r#""type":"success""#));
}

#[test]
fn test_quiet_keeps_only_warnings() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "127.0.0.1:8000");

    coopdash()
        .args(["--quiet", "check", "config", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid").not())
        .stdout(predicate::str::contains("ws://127.0.0.1:8000").not())
        .stdout(predicate::str::contains("Not logged in"));
}

#[test]
fn test_invalid_config_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[reconnection]\nbackoff_multiplier = 0.5\n").unwrap();

    coopdash()
        .args(["check", "config", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("backoff_multiplier"));
}

#[test]
fn test_missing_explicit_config_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();

    coopdash()
        .args(["check", "config", "--config"])
        .arg(dir.path().join("absent.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read config file"));
}

#[test]
fn test_logout_without_session() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "127.0.0.1:8000");

    coopdash()
        .args(["logout", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("No stored session"));
}

#[test]
fn test_logout_removes_session() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "127.0.0.1:8000");
    write_session(&session_path(&dir));

    coopdash()
        .args(["logout", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out"));

    assert!(!session_path(&dir).exists());
}

#[test]
fn test_list_against_unreachable_api_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, &closed_addr());

    coopdash()
        .args(["list", "users", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("HTTP error"));
}

#[test]
fn test_overview_times_out_with_placeholders() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, &closed_addr());

    coopdash()
        .args(["overview", "--timeout", "1", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Total Savings"))
        .stdout(predicate::str::contains("loading..."));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_overview_renders_live_snapshot() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
        ws.send(Message::Text(
            r#"{"total_savings": 8500, "user_count": 12, "sum_latest_saving": 0}"#.into(),
        ))
        .await
        .unwrap();
        // hold the connection until the client closes it
        while let Some(Ok(frame)) = futures_util::StreamExt::next(&mut ws).await {
            if frame.is_close() {
                break;
            }
        }
    });

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, &addr.to_string());

    let output = tokio::task::spawn_blocking(move || {
        coopdash()
            .args(["--json", "overview", "--timeout", "10", "--config"])
            .arg(&config)
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success());
    let overview = command_output(&output, "overview");

    assert_eq!(overview["overview"]["is_loading"], false);
    assert_eq!(overview["overview"]["cards"][0]["value"], "8,500");
    assert_eq!(overview["overview"]["cards"][1]["value"], Value::Null);
    assert_eq!(overview["overview"]["cards"][3]["value"], "12");
    assert_eq!(overview["overview"]["panels"][0]["state"], "no_activity");

    server.await.unwrap();
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_watch_closes_stream_on_interrupt() {
    use std::io::{BufRead, BufReader};
    use std::process::Stdio;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
        ws.send(Message::Text(r#"{"total_savings": 8500}"#.into()))
            .await
            .unwrap();
        while let Some(Ok(frame)) = futures_util::StreamExt::next(&mut ws).await {
            if frame.is_close() {
                return true;
            }
        }
        false
    });

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, &addr.to_string());

    let status = tokio::task::spawn_blocking(move || {
        let mut child = std::process::Command::new(env!("CARGO_BIN_EXE_coopdash"))
            .args(["--json", "watch", "--config"])
            .arg(&config)
            .env_remove("COOPDASH_TOKEN")
            .env_remove("RUST_LOG")
            .stdout(Stdio::piped())
            .spawn()
            .unwrap();
        let mut lines = BufReader::new(child.stdout.take().unwrap()).lines();

        for line in lines.by_ref() {
            let line = line.unwrap();
            let Ok(value) = serde_json::from_str::<Value>(&line) else {
                continue;
            };
            if value["overview"]["is_loading"] == false {
                break;
            }
        }

        std::process::Command::new("kill")
            .args(["-INT", &child.id().to_string()])
            .status()
            .unwrap();
        for _ in lines {}
        child.wait().unwrap()
    })
    .await
    .unwrap();

    assert!(status.success());
    assert!(server.await.unwrap(), "watch exited without closing the stream");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_login_then_list_savings_uses_stored_token() {
    let api = MockApi::start([
        (
            "POST",
            "/login",
            MockResponse::ok(json!({
                "access_token": "tok-123",
                "user_info": { "username": "admin" }
            })),
        ),
        (
            "GET",
            "/api/savings",
            MockResponse::ok(json!({
                "total_amount": 12000,
                "total_saving": 2,
                "savings": [
                    {"id": 1, "user_id": 7, "username": "Amina", "phone_number": "0700", "amount": 8000, "created_at": "2024-11-01T00:00:00"},
                    {"id": 2, "user_id": 8, "username": "Baraka", "amount": 4000}
                ]
            })),
        ),
    ])
    .await
    .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, &api.host());

    let mut login = coopdash();
    login
        .args(["--json", "login", "--email", "admin@coop.test", "--password", "pw"])
        .arg("--config")
        .arg(&config);
    let output = run(login).await;
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("Logged in as admin"));
    let stored = std::fs::read_to_string(session_path(&dir)).unwrap();
    assert!(stored.contains("tok-123"));

    let mut list = coopdash();
    list.args(["--json", "list", "savings", "--config"]).arg(&config);
    let output = run(list).await;
    assert!(output.status.success());

    let listing = command_output(&output, "list.savings");
    assert_eq!(listing["records"].as_array().unwrap().len(), 2);
    assert_eq!(listing["records"][0]["id"], "1");
    assert_eq!(listing["records"][0]["username"], "Amina");
    assert_eq!(listing["totals"]["Total amount"], "12,000");
    assert_eq!(listing["totals"]["Deposits"], "2");

    assert_eq!(
        api.last("POST", "/login").unwrap().json()["email"],
        "admin@coop.test"
    );
    assert_eq!(
        api.last("GET", "/api/savings").unwrap().authorization.as_deref(),
        Some("Bearer tok-123")
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_rejected_token_points_at_login() {
    let api = MockApi::start([(
        "GET",
        "/api/loans",
        MockResponse::json(401, json!({"detail": "Could not validate credentials"})),
    )])
    .await
    .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, &api.host());
    write_session(&session_path(&dir));

    let mut list = coopdash();
    list.args(["list", "loans", "--config"]).arg(&config);
    let output = run(list).await;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("API error (401): Could not validate credentials"), "{stderr}");
    assert!(String::from_utf8_lossy(&output.stdout).contains("coopdash login"));
    assert_eq!(
        api.last("GET", "/api/loans").unwrap().authorization.as_deref(),
        Some("Bearer tok")
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_add_commands_post_records() {
    let api = MockApi::start([
        (
            "POST",
            "/api/saving",
            MockResponse::ok(json!({"id": 31, "user_id": 7, "amount": 1500.5})),
        ),
        (
            "POST",
            "/api/loan",
            MockResponse::ok(json!({"id": 9, "user_id": 7, "amount": 5000, "deadline": "2025-03-01T00:00:00"})),
        ),
        (
            "POST",
            "/api/penalty",
            MockResponse::ok(json!({"message": "Penalty added"})),
        ),
    ])
    .await
    .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, &api.host());
    write_session(&session_path(&dir));

    let mut add = coopdash();
    add.args(["add", "saving", "7", "1500.5", "--config"]).arg(&config);
    let output = run(add).await;
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Saving recorded"));
    let body = api.last("POST", "/api/saving").unwrap().json();
    assert_eq!(body["user_id"], "7");
    assert_eq!(body["amount"], 1500.5);

    let mut add = coopdash();
    add.args([
        "add", "loan", "7", "5000", "--deadline", "2025-03-01", "--issued", "2024-12-01",
    ])
    .arg("--config")
    .arg(&config);
    assert!(run(add).await.status.success());
    let body = api.last("POST", "/api/loan").unwrap().json();
    assert_eq!(body["issued_date"], "2024-12-01T00:00:00Z");
    assert_eq!(body["deadline"], "2025-03-01T00:00:00Z");

    let mut add = coopdash();
    add.args(["add", "penalty", "7", "50", "--reason", "late", "--config"])
        .arg(&config);
    let output = run(add).await;
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Penalty added"));
    let body = api.last("POST", "/api/penalty").unwrap().json();
    assert_eq!(body["reason"], "late");
    assert_eq!(body["status"], "unpaid");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_delete_with_yes_skips_prompt() {
    let api = MockApi::start([("DELETE", "/api/loan/9", MockResponse::ok(json!({})))])
        .await
        .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, &api.host());
    write_session(&session_path(&dir));

    let mut delete = coopdash();
    delete
        .args(["--json", "delete", "loan", "9", "--yes", "--config"])
        .arg(&config);
    let output = run(delete).await;

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Deleted loan 9"));
    assert_eq!(
        api.last("DELETE", "/api/loan/9").unwrap().authorization.as_deref(),
        Some("Bearer tok")
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_signup_reports_validation_errors() {
    let api = MockApi::start([(
        "POST",
        "/api/signup",
        MockResponse::json(
            422,
            json!({"detail": [{"loc": ["body", "email"], "msg": "value is not a valid email address"}]}),
        ),
    )])
    .await
    .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, &api.host());

    let mut signup = coopdash();
    signup
        .args([
            "signup", "--username", "Amina", "--email", "nope", "--phone", "0700", "--password",
            "pw",
        ])
        .arg("--config")
        .arg(&config);
    let output = run(signup).await;

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr)
        .contains("API error (422): value is not a valid email address"));
    let body = api.last("POST", "/api/signup").unwrap().json();
    assert_eq!(body["confirm_password"], "pw");
    assert_eq!(body["phone_number"], "0700");
}
