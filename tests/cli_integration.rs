// CLI integration tests for the wikiquery binary.
use std::process::Command;

use axum::Router;
use axum::extract::Query;
use axum::routing::get;
use serde_json::{Value, json};
use std::collections::BTreeMap;

fn cmd() -> Command {
    let exe = env!("CARGO_BIN_EXE_wikiquery");
    let mut command = Command::new(exe);
    command.env_remove("WIKIQUERY_API").env("RUST_LOG", "off");
    command
}

fn parse_json(output: &[u8]) -> Value {
    let text = String::from_utf8_lossy(output);
    serde_json::from_str(text.trim()).expect("valid json")
}

async fn allcategories(Query(params): Query<BTreeMap<String, String>>) -> axum::Json<Value> {
    let page = match params.get("accontinue").map(String::as_str) {
        None => json!({
            "continue": {"accontinue": "Beta", "continue": "-||"},
            "query": {"allcategories": [{"category": "Alpha"}]}
        }),
        Some(_) => json!({
            "batchcomplete": true,
            "query": {"allcategories": [{"category": "Beta"}]}
        }),
    };
    axum::Json(page)
}

fn spawn_wiki() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.set_nonblocking(true).expect("nonblocking");
    let addr = listener.local_addr().expect("addr");
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");
        runtime.block_on(async move {
            let app = Router::new().route("/w/api.php", get(allcategories));
            let listener = tokio::net::TcpListener::from_std(listener).expect("listener");
            let _ = axum::serve(listener, app).await;
        });
    });
    format!("http://{addr}/w/api.php")
}

#[test]
fn classify_reports_bad_token() {
    let output = cmd()
        .args(["classify", "badtoken", "Invalid CSRF token.", "--token-type", "csrf"])
        .output()
        .expect("classify");
    assert!(output.status.success());
    let value = parse_json(&output.stdout);
    assert_eq!(value["code"], "badtoken");
    assert_eq!(value["error"]["kind"], "bad_token");
    assert_eq!(value["error"]["info"], "Invalid CSRF token.");
}

#[test]
fn classify_keeps_unknown_codes() {
    let output = cmd()
        .args(["classify", "some-unmapped-code", "x"])
        .output()
        .expect("classify");
    assert!(output.status.success());
    let value = parse_json(&output.stdout);
    assert_eq!(value["code"], "some-unmapped-code");
    assert_eq!(value["error"]["kind"], "unrecognized");
}

#[test]
fn missing_endpoint_is_usage_error() {
    let output = cmd().args(["list", "allpages"]).output().expect("list");
    assert_eq!(output.status.code(), Some(2));
    let err = parse_json(&output.stderr);
    assert_eq!(err["error"]["kind"], "Usage");
    assert!(err["error"]["hint"].as_str().unwrap_or_default().contains("WIKIQUERY_API"));
}

#[test]
fn unreachable_endpoint_is_transport_error() {
    let output = cmd()
        .args(["--api", "http://127.0.0.1:9/w/api.php", "--timeout-ms", "2000"])
        .args(["list", "allpages"])
        .output()
        .expect("list");
    assert_eq!(output.status.code(), Some(5));
    let err = parse_json(&output.stderr);
    assert_eq!(err["error"]["kind"], "Transport");
}

#[test]
fn list_single_page_then_drain() {
    let api = spawn_wiki();

    let single = cmd()
        .args(["--api", &api, "list", "allcategories"])
        .output()
        .expect("single page");
    assert!(single.status.success(), "{}", String::from_utf8_lossy(&single.stderr));
    let page = parse_json(&single.stdout);
    assert_eq!(page["items"][0]["category"], "Alpha");
    assert_eq!(page["continue"]["token"], "Beta");

    let drained = cmd()
        .args(["--api", &api, "list", "allcategories", "--drain"])
        .output()
        .expect("drain");
    assert!(drained.status.success(), "{}", String::from_utf8_lossy(&drained.stderr));
    let all = parse_json(&drained.stdout);
    let names: Vec<&str> = all["items"]
        .as_array()
        .expect("items")
        .iter()
        .filter_map(|item| item["category"].as_str())
        .collect();
    assert_eq!(names, vec!["Alpha", "Beta"]);
}

#[test]
fn completion_generates_script() {
    let output = cmd().args(["completion", "bash"]).output().expect("completion");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("wikiquery"));
}
