use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use docsearch_core::config::ChunkingConfig;
use docsearch_core::SharedIndex;
use http_body_util::BodyExt;
use serde_json::Value;
use server::{build_app, ServerConfig};
use tower::ServiceExt;

fn app() -> Router {
    build_app(SharedIndex::default(), &ServerConfig::default()).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn upload(app: &Router, filename: &str, content: &[u8]) -> (StatusCode, Value) {
    let req = Request::post(format!("/upload?filename={filename}"))
        .body(Body::from(content.to_vec()))
        .unwrap();
    send(app, req).await
}

async fn seed(app: &Router) -> String {
    let (status, json) = upload(app, "rust.txt", b"Rust ownership and borrowing keep memory safe").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["chunks"], 1);
    upload(app, "garden.txt", b"Tomatoes need sun water and patience").await;
    upload(app, "bread.txt", b"Bread needs flour water salt yeast").await;
    json["document_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let app = app();
    let rust_id = seed(&app).await;

    let (status, json) = get(&app, "/search?q=ownership%20rust&k=3").await;
    assert_eq!(status, StatusCode::OK);
    let arr = json["results"].as_array().unwrap();
    assert_eq!(arr.len(), 1);
    assert_eq!(arr[0]["document_id"], rust_id.as_str());
    assert_eq!(arr[0]["filename"], "rust.txt");
    assert!(arr[0]["score"].as_f64().unwrap() > 0.0);
    assert_eq!(
        arr[0]["snippet"],
        "<mark>Rust</mark> <mark>ownership</mark> and borrowing keep memory safe"
    );
    assert_eq!(json["total_hits"], 1);
}

#[tokio::test]
async fn search_accepts_form_posts() {
    let app = app();
    seed(&app).await;

    let req = Request::post("/search")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("query=flour+yeast"))
        .unwrap();
    let (status, json) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    let arr = json["results"].as_array().unwrap();
    assert_eq!(arr.len(), 1);
    assert_eq!(arr[0]["filename"], "bread.txt");
}

#[tokio::test]
async fn empty_index_and_zero_k_return_nothing() {
    let app = app();
    let (status, json) = get(&app, "/search?q=anything").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"].as_array().unwrap().len(), 0);

    seed(&app).await;
    let (_, json) = get(&app, "/search?q=rust&k=0").await;
    assert_eq!(json["results"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn upload_rejects_bad_input() {
    let app = app();
    let (status, _) = upload(&app, "report.pdf", b"%PDF-1.4 binary").await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let (status, json) = upload(&app, "notes.txt", &[0xff, 0xfe, 0xfd]).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["message"].as_str().unwrap().starts_with("Error uploading file"));

    let req = Request::post("/upload").body(Body::from("text")).unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, stats) = get(&app, "/stats").await;
    assert_eq!(stats["chunks"], 0);
}

#[tokio::test]
async fn documents_and_stats() {
    let config = ServerConfig { chunking: ChunkingConfig::new(3, 1).unwrap(), ..ServerConfig::default() };
    let app = build_app(SharedIndex::default(), &config).unwrap();

    let (status, json) = upload(&app, "letters.txt", b"a b c d e f g").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["chunks"], 3);
    let id = json["document_id"].as_str().unwrap().to_string();

    let (status, doc) = get(&app, &format!("/documents/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["filename"], "letters.txt");
    assert_eq!(doc["chunks"], serde_json::json!(["a b c", "c d e", "e f g"]));

    let (status, _) = get(&app, "/documents/unknown").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, stats) = get(&app, "/stats").await;
    assert_eq!(stats, serde_json::json!({ "documents": 1, "chunks": 3, "vocabulary": 7 }));
}

#[test]
fn invalid_chunking_is_rejected_at_startup() {
    let config = ServerConfig { chunking: ChunkingConfig { chunk_size: 10, overlap: 10 }, ..ServerConfig::default() };
    assert!(build_app(SharedIndex::default(), &config).is_err());
}

#[tokio::test(flavor = "current_thread")]
async fn concurrent_uploads_and_searches_on_single_thread_runtime() {
    let app = app();
    seed(&app).await;

    let (a, b, c) = tokio::join!(
        upload(&app, "owls.txt", b"Owls hunt mice at night"),
        get(&app, "/search?q=flour"),
        get(&app, "/search?q=rust%20memory"),
    );
    assert_eq!(a.0, StatusCode::OK);
    assert_eq!(b.0, StatusCode::OK);
    assert_eq!(b.1["results"][0]["filename"], "bread.txt");
    assert_eq!(c.1["results"][0]["filename"], "rust.txt");

    let (_, stats) = get(&app, "/stats").await;
    assert_eq!(stats["documents"], 4);
}
