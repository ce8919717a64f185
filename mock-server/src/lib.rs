//! In-memory stand-in for the SweepBright estate API.
//!
//! Issues client-credentials tokens, serves one seeded estate and records
//! published estate URLs and submitted contacts so tests can inspect them.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post, put},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{info, warn};
use uuid::Uuid;

pub const CLIENT_ID: &str = "test-client";
pub const CLIENT_SECRET: &str = "test-secret";
pub const TOKEN_LIFETIME_SECS: i64 = 3600;

const SEED_ESTATE: &str = include_str!("../../test-vectors/get_estate.json");
const ACCEPT_PREFIX: &str = "application/vnd.sweepbright.v";
const ACCEPT_SUFFIX: &str = "+json";

/// A contact stored by `POST /contacts` or `POST /estates/{id}/contacts`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub estate_id: Option<String>,
    pub payload: Value,
}

#[derive(Debug, Default)]
pub struct Store {
    pub estates: HashMap<String, Value>,
    pub estate_urls: HashMap<String, String>,
    pub contacts: Vec<Contact>,
    pub tokens: HashSet<String>,
}

#[derive(Deserialize)]
pub struct TokenRequest {
    pub grant_type: String,
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Deserialize)]
pub struct SetUrl {
    pub url: String,
}

pub type Db = Arc<RwLock<Store>>;

type Failure = (StatusCode, Json<Value>);

/// Store holding the `test` estate from the shared fixtures.
pub fn seeded_db() -> Db {
    let mut store = Store::default();
    if let Ok(estate) = serde_json::from_str::<Value>(SEED_ESTATE) {
        if let Some(id) = estate["id"].as_str() {
            store.estates.insert(id.to_string(), estate.clone());
        }
    }
    Arc::new(RwLock::new(store))
}

pub fn app() -> Router {
    app_with_db(seeded_db())
}

pub fn app_with_db(db: Db) -> Router {
    Router::new()
        .route("/oauth/token", post(issue_token))
        .route("/estates/{id}", get(get_estate))
        .route("/estates/{id}/url", put(set_estate_url))
        .route("/estates/{id}/contacts", post(save_estate_contact))
        .route("/contacts", post(save_contact))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_db(listener, seeded_db()).await
}

pub async fn run_with_db(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_db(db)).await
}

fn failure(status: StatusCode, message: &str) -> Failure {
    (status, Json(json!({ "message": message })))
}

async fn authorize(db: &Db, headers: &HeaderMap) -> Result<(), Failure> {
    let accept = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()).unwrap_or_default();
    let versioned = accept
        .strip_prefix(ACCEPT_PREFIX)
        .and_then(|rest| rest.strip_suffix(ACCEPT_SUFFIX))
        .is_some_and(|version| !version.is_empty() && version.bytes().all(|b| b.is_ascii_digit()));
    if !versioned {
        return Err(failure(StatusCode::NOT_ACCEPTABLE, "unsupported Accept header"));
    }

    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    match token {
        Some(token) if db.read().await.tokens.contains(token) => Ok(()),
        _ => Err(failure(StatusCode::UNAUTHORIZED, "Unauthenticated.")),
    }
}

fn validate_contact(payload: &Value) -> Result<(), Failure> {
    let Some(fields) = payload.as_object() else {
        return Err(failure(StatusCode::BAD_REQUEST, "contact must be a JSON object"));
    };

    let email_ok = match fields.get("email") {
        None | Some(Value::Null) => true,
        Some(Value::String(email)) => email.contains('@'),
        Some(_) => false,
    };
    if email_ok {
        return Ok(());
    }

    warn!("rejecting contact with invalid email");
    Err((
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
            "message": "The given data was invalid.",
            "errors": { "email": ["invalid"] },
        })),
    ))
}

async fn issue_token(State(db): State<Db>, Form(input): Form<TokenRequest>) -> Result<Json<TokenResponse>, Failure> {
    if input.grant_type != "client_credentials" {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "unsupported_grant_type", "error_description": "The authorization grant type is not supported." })),
        ));
    }
    if input.client_id != CLIENT_ID || input.client_secret != CLIENT_SECRET {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid_client", "error_description": "Client authentication failed" })),
        ));
    }

    let token = Uuid::new_v4().simple().to_string();
    db.write().await.tokens.insert(token.clone());
    info!(client_id = %input.client_id, "issued access token");

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: TOKEN_LIFETIME_SECS,
    }))
}

async fn get_estate(State(db): State<Db>, headers: HeaderMap, Path(id): Path<String>) -> Result<Json<Value>, Failure> {
    authorize(&db, &headers).await?;
    let store = db.read().await;
    store
        .estates
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "estate not found"))
}

async fn set_estate_url(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<SetUrl>,
) -> Result<StatusCode, Failure> {
    authorize(&db, &headers).await?;
    let mut store = db.write().await;
    if !store.estates.contains_key(&id) {
        return Err(failure(StatusCode::NOT_FOUND, "estate not found"));
    }
    info!(estate_id = %id, url = %input.url, "estate url published");
    store.estate_urls.insert(id, input.url);
    Ok(StatusCode::NO_CONTENT)
}

async fn save_contact(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<StatusCode, Failure> {
    authorize(&db, &headers).await?;
    validate_contact(&payload)?;
    db.write().await.contacts.push(Contact {
        estate_id: None,
        payload,
    });
    Ok(StatusCode::CREATED)
}

async fn save_estate_contact(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<StatusCode, Failure> {
    authorize(&db, &headers).await?;
    validate_contact(&payload)?;
    let mut store = db.write().await;
    if !store.estates.contains_key(&id) {
        return Err(failure(StatusCode::NOT_FOUND, "estate not found"));
    }
    store.contacts.push(Contact {
        estate_id: Some(id),
        payload,
    });
    Ok(StatusCode::CREATED)
}
