// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests driving the compiled `courier` binary.
//!
//! Each test gets its own temp directory, SQLite database, and mock send
//! endpoint. Tests are independent and order-insensitive.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use courier_config::CourierConfig;

fn courier() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_courier"));
    for (key, _) in std::env::vars() {
        if key.starts_with("COURIER_") {
            cmd.env_remove(key);
        }
    }
    cmd.env_remove("RUST_LOG").env("NO_COLOR", "1");
    cmd
}

fn write_config(dir: &Path, database_path: &str, base_url: &str, token: Option<&str>) -> PathBuf {
    let mut config = CourierConfig::default();
    config.storage.database_path = database_path.to_string();
    config.dispatch.interval_secs = 1;
    config.sender.base_url = base_url.to_string();
    config.sender.auth_token = token.map(str::to_string);
    config.sender.timeout_secs = 2;

    let path = dir.join("courier.toml");
    std::fs::write(&path, toml::to_string(&config).unwrap()).unwrap();
    path
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ---- check-config ----

#[test]
fn check_config_prints_summary_without_secrets() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("courier.db");
    let path = write_config(
        dir.path(),
        &db.to_string_lossy(),
        "http://127.0.0.1:9",
        Some("s3cret-token"),
    );

    let output = courier()
        .arg("--config")
        .arg(&path)
        .arg("check-config")
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("configuration is valid"));
    assert!(out.contains("<set>"));
    assert!(!out.contains("s3cret-token"));
}

#[test]
fn check_config_rejects_unknown_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("courier.toml");
    std::fs::write(&path, "[dispatch]\nintervl_secs = 5\n").unwrap();

    let output = courier()
        .arg("--config")
        .arg(&path)
        .arg("check-config")
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(stderr(&output).contains("intervl_secs"));
}

#[test]
fn missing_config_file_fails() {
    let output = courier()
        .args(["--config", "/nonexistent/courier.toml", "check-config"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(stderr(&output).contains("does not exist"));
}

// ---- serve ----

#[test]
fn serve_requires_auth_token() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("courier.db");
    let path = write_config(dir.path(), &db.to_string_lossy(), "http://127.0.0.1:9", None);

    let output = courier()
        .arg("--config")
        .arg(&path)
        .arg("serve")
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(stderr(&output).contains("auth_token"));
    assert!(!db.exists(), "serve must fail before opening the store");
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread")]
async fn serve_delivers_then_stops_on_sigterm() {
    use std::process::Stdio;
    use std::time::Duration;

    use chrono::{Duration as ChronoDuration, Utc};
    use courier_core::SendStatus;
    use courier_test_utils::TestHarness;
    use wiremock::matchers::{body_partial_json, header, method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let harness = TestHarness::new().await.unwrap();
    let now = Utc::now();
    let d = harness
        .add_distribution(now - ChronoDuration::minutes(1), now + ChronoDuration::hours(1), "flash sale", "vip")
        .await
        .unwrap();
    let reachable = harness.add_client("79001234567", "vip").await.unwrap();
    let broken = harness.add_client("not-a-number", "vip").await.unwrap();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/send/\d+$"))
        .and(header("authorization", "test-token"))
        .and(body_partial_json(serde_json::json!({"phone": "79001234567"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 0,
            "message": "OK"
        })))
        .expect(1)
        .mount(&server)
        .await;
    // The endpoint, not the worker, decides the number is unusable. FAIL rows
    // are retried each cycle, so this one may be hit more than once.
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({"phone": "not-a-number"})))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "code": 1,
            "message": "invalid phone"
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(
        dir.path(),
        &harness.storage_config().database_path,
        &server.uri(),
        Some("test-token"),
    );

    let mut child = courier()
        .arg("--config")
        .arg(&config_path)
        .arg("serve")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let mut recorded = Vec::new();
    for _ in 0..100 {
        recorded = harness.messages(d.id).await.unwrap();
        if recorded.len() == 2 && recorded.iter().all(|m| m.send_status != SendStatus::NotSent) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    // SAFETY: plain kill(2) on the pid of a child we spawned.
    let rc = unsafe { libc::kill(child.id() as libc::pid_t, libc::SIGTERM) };
    assert_eq!(rc, 0);
    let mut exit = None;
    for _ in 0..100 {
        if let Some(status) = child.try_wait().unwrap() {
            exit = Some(status);
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    let exit = match exit {
        Some(status) => status,
        None => {
            child.kill().unwrap();
            panic!("courier serve did not stop after SIGTERM");
        }
    };
    assert!(exit.success(), "serve exited with {exit}");

    let ok = recorded.iter().find(|m| m.client_id == reachable.id).unwrap();
    let failed = recorded.iter().find(|m| m.client_id == broken.id).unwrap();
    assert_eq!(ok.send_status, SendStatus::Sent);
    assert!(ok.send_date.is_some());
    assert_eq!(failed.send_status, SendStatus::Fail);
    assert!(failed.send_date.is_none());

    let bodies: Vec<serde_json::Value> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect();
    let sent: Vec<_> = bodies.iter().filter(|b| b["phone"] == "79001234567").collect();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["id"], ok.id.0);
    assert_eq!(sent[0]["text"], "flash sale");
    assert!(bodies.iter().any(|b| b["phone"] == "not-a-number" && b["id"] == failed.id.0));

    // ---- status reads the same database ----
    let output = courier()
        .arg("--config")
        .arg(&config_path)
        .args(["status", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let status: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let row = &status["distributions"][0];
    assert_eq!(row["distribution_id"], d.id.0);
    assert_eq!(row["total"], 2);
    assert_eq!(row["sent"], 1);
    assert_eq!(row["failed"], 1);
    assert_eq!(row["not_sent"], 0);
}
