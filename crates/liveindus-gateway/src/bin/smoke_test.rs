//! Smoke test: one chat round-trip against a running relay.
//! Run with the gateway up: cargo run --bin smoke_test
//! Target defaults to http://127.0.0.1:8080; override with LIVEINDUS_BASE_URL.

use reqwest::Client;
use serde_json::{json, Value};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

#[tokio::main]
async fn main() {
    let base = std::env::var("LIVEINDUS_BASE_URL")
        .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let base = base.trim_end_matches('/');
    let url = format!("{}/api/chat", base);

    println!("[SMOKE TEST] Target: {}", url);

    let body = json!({
        "message": "Hi",
        "conversationHistory": [],
        "sessionId": "test_session_123",
    });

    let res = match Client::new().post(&url).json(&body).send().await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("[SMOKE TEST] Request failed: {}", e);
            std::process::exit(1);
        }
    };

    println!("[SMOKE TEST] Status: {}", res.status());
    for (name, value) in res.headers() {
        println!("[SMOKE TEST] Header {}: {}", name, value.to_str().unwrap_or("<binary>"));
    }

    let text = match res.text().await {
        Ok(t) => t,
        Err(e) => {
            eprintln!("[SMOKE TEST] Could not read body: {}", e);
            std::process::exit(1);
        }
    };
    println!("[SMOKE TEST] Body: {}", text);

    match serde_json::from_str::<Value>(&text) {
        Ok(v) if v.get("response").is_some() => {
            println!("[SMOKE TEST] Success: reply received");
            if let Some(session) = v.get("sessionId") {
                println!("[SMOKE TEST] Session: {}", session);
            }
        }
        Ok(_) => {
            eprintln!("[SMOKE TEST] No response field in reply");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("[SMOKE TEST] Reply is not JSON: {}", e);
            std::process::exit(1);
        }
    }
}
