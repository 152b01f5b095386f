use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use storebench::api::BenchApi;
use storebench::core::EMPTY_DATASET_MESSAGE;
use storebench::service::BenchService;
use storebench::testutil::{MemoryConnector, fast_config};

fn setup() -> Router {
    let service = BenchService::with_connector(fast_config(), Arc::new(MemoryConnector::new()));
    BenchApi::new(service).router()
}

async fn body_bytes(router: Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, bytes)
}

async fn body_json(router: Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = body_bytes(router, req).await;
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

fn run_test_request(database: &str, operation: &str) -> Request<Body> {
    Request::post("/api/test")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"database": database, "operation": operation}).to_string(),
        ))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let router = setup();
    let req = Request::get("/health").body(Body::empty()).unwrap();
    let (status, json) = body_json(router, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"status": "healthy", "connected": []}));
}

#[tokio::test]
async fn test_single_write_then_read() {
    let router = setup();

    let (status, json) = body_json(router.clone(), run_test_request("cassandra", "write")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["database"], "cassandra");
    assert_eq!(json["operation"], "write");
    assert_eq!(json["recordCount"], 250);
    assert_eq!(json["dataIntegrity"], true);
    assert!(json.get("error").is_none());

    let (status, json) = body_json(router.clone(), run_test_request("cassandra", "read")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["recordCount"], 100);
    assert_eq!(json["dataIntegrity"], true);

    let req = Request::get("/health").body(Body::empty()).unwrap();
    let (_, json) = body_json(router, req).await;
    assert_eq!(json["connected"], json!(["cassandra"]));
}

#[tokio::test]
async fn test_read_on_empty_backend() {
    let router = setup();
    let (status, json) = body_json(router, run_test_request("mongodb", "read")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["recordCount"], 0);
    assert_eq!(json["dataIntegrity"], false);
    assert_eq!(json["error"], EMPTY_DATASET_MESSAGE);
}

#[tokio::test]
async fn test_unknown_database_is_bad_request() {
    let router = setup();
    let (status, json) = body_json(router, run_test_request("oracle", "write")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Unsupported database: oracle");
}

#[tokio::test]
async fn test_unknown_operation_is_bad_request() {
    let router = setup();
    let (status, json) = body_json(router, run_test_request("mongodb", "truncate")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Unsupported operation: truncate");
}

#[tokio::test]
async fn test_run_all() {
    let router = setup();
    let req = Request::post("/api/test/all").body(Body::empty()).unwrap();
    let (status, json) = body_json(router, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"].as_array().unwrap().len(), 9);
    assert_eq!(json["summary"]["totalTests"], 9);
    assert_eq!(json["summary"]["successfulTests"], 9);
    assert_eq!(json["summary"]["failedTests"], 0);
    assert!(json["summary"]["totalTime"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn test_stream_all_is_ndjson() {
    let router = setup();
    let req = Request::get("/api/test/all/stream").body(Body::empty()).unwrap();
    let response = router.oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/x-ndjson"
    );

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    let events: Vec<Value> = text
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(events.len(), 9 * 4 + 1);
    assert!(events[..events.len() - 1]
        .iter()
        .all(|e| e.get("type").is_none() && e.get("status").is_some()));
    assert_eq!(events[0]["status"], "starting");
    assert_eq!(events[0]["currentDatabase"], "cassandra");

    let last = events.last().unwrap();
    assert_eq!(last["type"], "complete");
    assert_eq!(last["results"].as_array().unwrap().len(), 9);
}

#[tokio::test]
async fn test_stream_repeated_ends_with_statistics() {
    let router = setup();
    let req = Request::get("/api/test/repeat/stream")
        .body(Body::empty())
        .unwrap();
    let (status, bytes) = body_bytes(router, req).await;
    assert_eq!(status, StatusCode::OK);

    let text = String::from_utf8(bytes).unwrap();
    let last: Value = serde_json::from_str(text.lines().last().unwrap()).unwrap();
    assert_eq!(last["type"], "complete");

    let results = last["results"].as_array().unwrap();
    assert_eq!(results.len(), 9);
    for result in results {
        assert_eq!(result["times"].as_array().unwrap().len(), 3);
        let min = result["min"].as_f64().unwrap();
        let avg = result["average"].as_f64().unwrap();
        let max = result["max"].as_f64().unwrap();
        assert!(min <= avg && avg <= max);
    }
}

#[tokio::test]
async fn test_close_connections() {
    let router = setup();
    body_json(router.clone(), run_test_request("cockroachdb", "write")).await;

    let req = Request::post("/api/connections/close")
        .body(Body::empty())
        .unwrap();
    let (status, _) = body_bytes(router.clone(), req).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let req = Request::get("/health").body(Body::empty()).unwrap();
    let (_, json) = body_json(router, req).await;
    assert_eq!(json["connected"], json!([]));
}
