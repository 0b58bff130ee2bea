//! End-to-end tests: spawn the agent binary and exercise the HTTP API
//! over a raw socket.

use assert_cmd::prelude::*;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::process::{Child, Command};
use std::time::{Duration, Instant};

struct Agent {
    child: Child,
    port: u16,
}

impl Drop for Agent {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn spawn_agent(port: u16) -> Agent {
    let mut cmd = Command::cargo_bin("sysmon_agent").expect("binary exists");
    cmd.arg("-p")
        .arg(port.to_string())
        // Short quantum so /schedule tests do not sit through 2s sleeps.
        .env("SYSMON_AGENT_QUANTUM_MS", "50");
    let child = cmd.spawn().expect("spawn agent");
    let agent = Agent { child, port };

    // Poll until the listener is up to avoid timing flakes.
    let start = Instant::now();
    while start.elapsed() < Duration::from_millis(5000) {
        if TcpStream::connect(("127.0.0.1", port)).is_ok() {
            return agent;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    panic!("agent did not start listening on port {port}");
}

fn raw_request(port: u16, method: &str, path: &str, extra_headers: &str, body: &str) -> String {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).expect("connect");
    stream
        .set_read_timeout(Some(Duration::from_secs(10)))
        .expect("read timeout");

    let raw = format!(
        "{method} {path} HTTP/1.1\r\nHost: 127.0.0.1\r\nConnection: close\r\nContent-Type: application/json\r\nContent-Length: {}\r\n{extra_headers}\r\n{body}",
        body.len()
    );
    stream.write_all(raw.as_bytes()).expect("write request");

    let mut response = String::new();
    stream.read_to_string(&mut response).expect("read response");
    response
}

fn request(port: u16, method: &str, path: &str, json_body: Option<&str>) -> (u16, String) {
    let response = raw_request(port, method, path, "", json_body.unwrap_or(""));

    let status: u16 = response
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .expect("status line");
    let body = response
        .split_once("\r\n\r\n")
        .map(|(_, b)| b.to_string())
        .unwrap_or_default();
    (status, body)
}

#[test]
fn index_returns_liveness_string() {
    let agent = spawn_agent(9671);
    let (status, body) = request(agent.port, "GET", "/", None);
    assert_eq!(status, 200);
    assert_eq!(body, "System Monitor Backend is Live!");
}

#[test]
fn metrics_percentages_and_process_list_are_consistent() {
    let agent = spawn_agent(9672);
    let (status, body) = request(agent.port, "GET", "/metrics", None);
    assert_eq!(status, 200);

    let v: serde_json::Value = serde_json::from_str(&body).expect("metrics json");
    for field in ["cpu_percent", "memory_percent", "disk_percent"] {
        let p = v[field].as_f64().unwrap_or(-1.0);
        assert!((0.0..=100.0).contains(&p), "{field} out of range: {p}");
    }
    let count = v["process_count"].as_u64().expect("process_count") as usize;
    let processes = v["processes"].as_array().expect("processes");
    assert_eq!(processes.len(), count);
    assert!(count > 0, "agent should at least see itself");
}

#[test]
fn kill_process_without_pid_is_400() {
    let agent = spawn_agent(9673);

    let (status, body) = request(agent.port, "POST", "/kill_process", Some("{}"));
    assert_eq!(status, 400);
    let v: serde_json::Value = serde_json::from_str(&body).expect("error json");
    assert!(v["error"].as_str().unwrap_or("").contains("missing pid"));

    // Missing body entirely is the same caller error.
    let (status, body) = request(agent.port, "POST", "/kill_process", None);
    assert_eq!(status, 400);
    assert!(body.contains("error"));
}

#[test]
fn kill_process_with_unknown_pid_is_500() {
    let agent = spawn_agent(9674);
    let (status, body) = request(
        agent.port,
        "POST",
        "/kill_process",
        Some(r#"{"pid": 3999999}"#),
    );
    assert_eq!(status, 500);
    let v: serde_json::Value = serde_json::from_str(&body).expect("error json");
    assert!(v["error"].as_str().unwrap_or("").contains("no such process"));
}

#[test]
fn kill_process_terminates_live_child() {
    let agent = spawn_agent(9675);
    let mut child = Command::new("sleep").arg("30").spawn().expect("spawn sleep");

    let payload = format!(r#"{{"pid": {}}}"#, child.id());
    let (status, body) = request(agent.port, "POST", "/kill_process", Some(&payload));
    assert_eq!(status, 200, "unexpected body: {body}");
    assert!(body.contains("terminated"));

    let exit = child.wait().expect("wait child");
    assert!(!exit.success(), "child should die from SIGTERM");
}

#[test]
fn cross_origin_requests_are_allowed() {
    let agent = spawn_agent(9677);
    let response = raw_request(
        agent.port,
        "GET",
        "/metrics",
        "Origin: http://example.com\r\n",
        "",
    );
    let headers = response
        .split_once("\r\n\r\n")
        .map(|(h, _)| h.to_ascii_lowercase())
        .unwrap_or_default();
    assert!(
        headers.contains("access-control-allow-origin: *"),
        "missing permissive CORS header in: {headers}"
    );
}

#[test]
fn schedule_returns_confirmation_message() {
    let agent = spawn_agent(9676);
    let (status, body) = request(agent.port, "POST", "/schedule", None);
    assert_eq!(status, 200);
    let v: serde_json::Value = serde_json::from_str(&body).expect("schedule json");
    assert!(v["message"].as_str().is_some_and(|m| !m.is_empty()));
}
