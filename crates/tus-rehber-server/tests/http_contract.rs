// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;
use tempfile::tempdir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tus_rehber_ingest::{open_database, replace_dataset};
use tus_rehber_model::{Institution, PlacementRecord};
use tus_rehber_server::{build_router, ApiConfig, AppState, RateLimitConfig};

fn institution(code: i64, name: &str, ownership: &str, kind: &str, city: &str) -> Institution {
    Institution {
        institution_code: code,
        name: name.to_string(),
        ownership_type: ownership.to_string(),
        institution_kind: kind.to_string(),
        city: city.to_string(),
    }
}

fn placement(code: i64, branch: &str, period: &str, quota: i64, min_score: Option<f64>) -> PlacementRecord {
    PlacementRecord {
        institution_code: code,
        level_short_name: "S".to_string(),
        level: "Specialty".to_string(),
        branch: branch.to_string(),
        period: period.to_string(),
        period_date: format!("{period} placement"),
        quota,
        filled: min_score.map(|_| quota),
        unfilled_quota: None,
        min_score,
        max_score: min_score.map(|s| s + 10.0),
        min_score_rank: min_score.map(|_| 1000),
    }
}

fn seed_db(path: &PathBuf) {
    let mut conn = open_database(path).expect("open database");
    let institutions = vec![
        institution(100, "City Hospital", "state", "hospital", "Ankara"),
        institution(200, "Anatolia Medical School", "state", "medical school", "Istanbul"),
    ];
    let placements = vec![
        placement(100, "Cardiology", "2024/1", 4, Some(78.5)),
        placement(100, "Cardiology", "2023/2", 4, Some(77.0)),
        placement(100, "Radiology", "2024/2", 2, Some(81.2)),
        placement(200, "Cardiology", "2024/2", 6, None),
    ];
    replace_dataset(&mut conn, &institutions, &placements).expect("seed dataset");
}

async fn spawn_server(state: AppState) -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    let app = build_router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    addr
}

async fn send_raw(addr: std::net::SocketAddr, path: &str) -> (u16, String, String) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let req = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream
        .write_all(req.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("status");
    (status, head.to_string(), body.to_string())
}

fn seeded_state(dir: &tempfile::TempDir) -> AppState {
    let db_path = dir.path().join("rehber.sqlite");
    seed_db(&db_path);
    AppState::new(db_path, ApiConfig::default())
}

#[tokio::test]
async fn healthz_responds_ok() {
    let dir = tempdir().expect("tempdir");
    let addr = spawn_server(seeded_state(&dir)).await;
    let (status, _, body) = send_raw(addr, "/healthz").await;
    assert_eq!(status, 200);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn facets_return_summary_with_cache_headers() {
    let dir = tempdir().expect("tempdir");
    let addr = spawn_server(seeded_state(&dir)).await;
    let (status, head, body) = send_raw(addr, "/facets").await;
    assert_eq!(status, 200);
    assert!(head.to_ascii_lowercase().contains("cache-control: public, max-age=3600"));

    let facets: serde_json::Value = serde_json::from_str(&body).expect("facets json");
    assert_eq!(facets["city"], serde_json::json!(["Ankara", "Istanbul"]));
    assert_eq!(facets["ranges"]["quota"]["max"], serde_json::json!(6.0));
    // min_score range spans only non-null values.
    assert_eq!(facets["ranges"]["min_score"]["min"], serde_json::json!(77.0));
}

#[tokio::test]
async fn search_returns_aligned_period_columns() {
    let dir = tempdir().expect("tempdir");
    let addr = spawn_server(seeded_state(&dir)).await;
    let (status, head, body) = send_raw(addr, "/search?city=Ankara&page_size=10").await;
    assert_eq!(status, 200);

    let result: serde_json::Value = serde_json::from_str(&body).expect("search json");
    assert_eq!(result["total"], serde_json::json!(2));
    assert!(head.to_ascii_lowercase().contains("x-total-count: 2"));

    let periods: Vec<String> = result["periods"]
        .as_array()
        .expect("periods array")
        .iter()
        .map(|p| p.as_str().expect("period token").to_string())
        .collect();
    assert_eq!(periods, vec!["2024/2", "2024/1", "2023/2"]);
    for row in result["rows"].as_array().expect("rows") {
        let keys: Vec<&String> = row["periods"]
            .as_object()
            .expect("periods map")
            .keys()
            .collect();
        assert_eq!(keys.len(), periods.len());
    }
    // (100, Cardiology) has no latest-period record: explicit all-null cell.
    let cardiology = result["rows"]
        .as_array()
        .expect("rows")
        .iter()
        .find(|r| r["branch"] == "Cardiology")
        .expect("cardiology row");
    assert!(cardiology["periods"]["2024/2"]["min_score"].is_null());
    assert_eq!(
        cardiology["periods"]["2024/1"]["min_score"],
        serde_json::json!(78.5)
    );
}

#[tokio::test]
async fn repeated_set_params_accumulate() {
    let dir = tempdir().expect("tempdir");
    let addr = spawn_server(seeded_state(&dir)).await;
    let (_, _, ankara_only) = send_raw(addr, "/search?city=Ankara").await;
    let (_, _, both) = send_raw(addr, "/search?city=Ankara&city=Istanbul").await;
    let ankara_only: serde_json::Value = serde_json::from_str(&ankara_only).expect("json");
    let both: serde_json::Value = serde_json::from_str(&both).expect("json");
    assert_eq!(ankara_only["total"], serde_json::json!(2));
    assert_eq!(both["total"], serde_json::json!(3));
}

#[tokio::test]
async fn invalid_params_are_400_even_without_a_database() {
    let dir = tempdir().expect("tempdir");
    // Nonexistent database: validation must reject before any data access.
    let state = AppState::new(dir.path().join("missing.sqlite"), ApiConfig::default());
    let addr = spawn_server(state).await;

    for path in ["/search?page_size=0", "/search?page_size=101", "/search?quota_floor=abc"] {
        let (status, _, body) = send_raw(addr, path).await;
        assert_eq!(status, 400, "path {path}");
        let err: serde_json::Value = serde_json::from_str(&body).expect("error json");
        assert_eq!(err["error"]["code"], serde_json::json!("InvalidQueryParameter"));
    }
}

#[tokio::test]
async fn data_access_failure_is_an_opaque_500() {
    let dir = tempdir().expect("tempdir");
    let state = AppState::new(dir.path().join("missing.sqlite"), ApiConfig::default());
    let addr = spawn_server(state).await;

    for path in ["/search?city=Ankara", "/facets"] {
        let (status, _, body) = send_raw(addr, path).await;
        assert_eq!(status, 500, "path {path}");
        let err: serde_json::Value = serde_json::from_str(&body).expect("error json");
        assert_eq!(err["error"]["code"], serde_json::json!("Internal"));
        assert_eq!(err["error"]["message"], serde_json::json!("internal error"));
    }
}

#[tokio::test]
async fn exhausted_rate_limit_returns_429() {
    let dir = tempdir().expect("tempdir");
    let db_path = dir.path().join("rehber.sqlite");
    seed_db(&db_path);
    let state = AppState::new(
        db_path,
        ApiConfig {
            rate_limit_per_ip: RateLimitConfig {
                capacity: 2.0,
                refill_per_sec: 0.0,
            },
            ..ApiConfig::default()
        },
    );
    let addr = spawn_server(state).await;

    let (first, _, _) = send_raw(addr, "/search").await;
    let (second, _, _) = send_raw(addr, "/search").await;
    let (third, _, body) = send_raw(addr, "/search").await;
    assert_eq!(first, 200);
    assert_eq!(second, 200);
    assert_eq!(third, 429);
    let err: serde_json::Value = serde_json::from_str(&body).expect("error json");
    assert_eq!(err["error"]["code"], serde_json::json!("RateLimited"));
}
