use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with_db, seeded_db, TokenResponse, CLIENT_ID, CLIENT_SECRET};
use serde_json::Value;
use tower::ServiceExt;

const ACCEPT: &str = "application/vnd.sweepbright.v20191125+json";

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn token_request(client_id: &str, client_secret: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri("/oauth/token")
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(format!(
            "grant_type=client_credentials&client_id={client_id}&client_secret={client_secret}"
        ))
        .unwrap()
}

fn api_request(method: &str, uri: &str, token: &str, body: Option<&str>) -> Request<String> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::ACCEPT, ACCEPT)
        .header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    match body {
        Some(body) => builder
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .unwrap(),
        None => builder.body(String::new()).unwrap(),
    }
}

async fn issue_token(app: &axum::Router) -> String {
    let resp = app.clone().oneshot(token_request(CLIENT_ID, CLIENT_SECRET)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let token: TokenResponse = body_json(resp).await;
    token.access_token
}

// --- token ---

#[tokio::test]
async fn token_is_issued_for_known_credentials() {
    let resp = app().oneshot(token_request(CLIENT_ID, CLIENT_SECRET)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let token: TokenResponse = body_json(resp).await;
    assert_eq!(token.token_type, "Bearer");
    assert!(token.expires_in > 0);
    assert!(!token.access_token.is_empty());
}

#[tokio::test]
async fn token_is_refused_for_unknown_credentials() {
    let resp = app().oneshot(token_request(CLIENT_ID, "wrong")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = body_json(resp).await;
    assert_eq!(body["error"], "invalid_client");
}

// --- auth ---

#[tokio::test]
async fn api_requires_a_bearer_token() {
    let resp = app().oneshot(api_request("GET", "/estates/test", "forged", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn api_requires_a_versioned_accept_header() {
    let app = app();
    let token = issue_token(&app).await;
    let req = Request::builder()
        .uri("/estates/test")
        .header(http::header::ACCEPT, "application/json")
        .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
        .body(String::new())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_ACCEPTABLE);
}

// --- estates ---

#[tokio::test]
async fn get_seeded_estate() {
    let app = app();
    let token = issue_token(&app).await;

    let resp = app.oneshot(api_request("GET", "/estates/test", &token, None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let estate: Value = body_json(resp).await;
    assert_eq!(estate["id"], "test");
    assert_eq!(estate["created_at"], "2023-03-15T10:30:00Z");
}

#[tokio::test]
async fn get_unknown_estate_returns_404() {
    let app = app();
    let token = issue_token(&app).await;

    let resp = app.oneshot(api_request("GET", "/estates/missing", &token, None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn set_estate_url_is_recorded() {
    let db = seeded_db();
    let app = app_with_db(db.clone());
    let token = issue_token(&app).await;

    let resp = app
        .oneshot(api_request(
            "PUT",
            "/estates/test/url",
            &token,
            Some(r#"{"url":"https://agency.example/estates/test"}"#),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());
    assert_eq!(
        db.read().await.estate_urls.get("test").map(String::as_str),
        Some("https://agency.example/estates/test")
    );
}

// --- contacts ---

#[tokio::test]
async fn save_contact_stores_payload() {
    let db = seeded_db();
    let app = app_with_db(db.clone());
    let token = issue_token(&app).await;

    let resp = app
        .oneshot(api_request(
            "POST",
            "/contacts",
            &token,
            Some(r#"{"first_name":"Jane","email":"jane@example.com"}"#),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let store = db.read().await;
    assert_eq!(store.contacts.len(), 1);
    assert_eq!(store.contacts[0].estate_id, None);
    assert_eq!(store.contacts[0].payload["first_name"], "Jane");
}

#[tokio::test]
async fn save_contact_with_invalid_email_returns_422() {
    let db = seeded_db();
    let app = app_with_db(db.clone());
    let token = issue_token(&app).await;

    let resp = app
        .oneshot(api_request("POST", "/contacts", &token, Some(r#"{"email":"not-an-email"}"#)))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = body_json(resp).await;
    assert_eq!(body["errors"]["email"], serde_json::json!(["invalid"]));
    assert!(db.read().await.contacts.is_empty());
}

#[tokio::test]
async fn save_estate_contact_links_the_estate() {
    let db = seeded_db();
    let app = app_with_db(db.clone());
    let token = issue_token(&app).await;

    let resp = app
        .oneshot(api_request("POST", "/estates/test/contacts", &token, Some(r#"{"last_name":"Doe"}"#)))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(db.read().await.contacts[0].estate_id.as_deref(), Some("test"));
}

#[tokio::test]
async fn save_estate_contact_for_unknown_estate_returns_404() {
    let app = app();
    let token = issue_token(&app).await;

    let resp = app
        .oneshot(api_request("POST", "/estates/missing/contacts", &token, Some("{}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
