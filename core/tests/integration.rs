//! Full client lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port and drives every facade operation
//! through `HttpApiAdapter` over real HTTP, so header construction, token
//! exchange and status mapping are checked end-to-end.

use std::net::SocketAddr;

use chrono::Datelike;
use mock_server::{seeded_db, Db, CLIENT_ID, CLIENT_SECRET};
use serde_json::json;
use sweepbright_core::{ApiError, ClientConfig, Properties, ResponseValue, SweepBright};

fn start_server() -> (SocketAddr, Db) {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    let db = seeded_db();
    let server_db = db.clone();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_with_db(listener, server_db).await
        })
        .unwrap();
    });

    (addr, db)
}

fn client_for(addr: SocketAddr) -> SweepBright {
    SweepBright::new(ClientConfig::default().with_base_url(&format!("http://{addr}")))
}

#[test]
fn client_lifecycle() {
    let (addr, db) = start_server();
    let client = client_for(addr);

    // Step 1: calls without a token fail locally.
    let err = client.get_estate("test").unwrap_err();
    assert!(matches!(err, ApiError::Authentication(_)), "got {err:?}");

    // Step 2: exchange credentials, then reuse the cached token.
    let token = client.request_access_token(CLIENT_ID, CLIENT_SECRET).unwrap();
    assert!(!token.has_expired());
    let again = client.request_access_token(CLIENT_ID, CLIENT_SECRET).unwrap();
    assert_eq!(again, token);

    // Step 3: fetch the seeded estate.
    let estate = client.get_estate("test").unwrap().expect("seeded estate");
    assert_eq!(estate.get("subType").unwrap().and_then(ResponseValue::as_str), Some("apartment"));
    let created = estate.get("created_at").unwrap().and_then(ResponseValue::as_datetime).unwrap();
    assert_eq!(created.year(), 2023);

    // Step 4: unknown estates are absent, not errors.
    assert!(client.get_estate("missing").unwrap().is_none());

    // Step 5: publish the estate URL.
    client
        .set_estate_url("test", "https://agency.example/estates/test")
        .unwrap();

    // Step 6: submit contacts.
    client
        .save_contact(
            json!({ "firstName": "Jane", "email": "jane@example.com" }),
            Some(json!({ "minPrice": "100000", "types": ["apartment"] }).into()),
            Some(json!({ "postalCodes": [1000] }).into()),
        )
        .unwrap();
    client
        .save_estate_contact("test", json!({ "lastName": "Doe", "message": "Still available?" }))
        .unwrap();

    // Step 7: server-side validation comes back as field errors.
    let err = client
        .save_contact(json!({ "email": "not-an-email" }), None, None)
        .unwrap_err();
    match err {
        ApiError::ServerValidation(e) => assert_eq!(e.field("email"), Some(&["invalid".to_string()][..])),
        other => panic!("expected server validation error, got {other:?}"),
    }

    // Step 8: the server saw exactly the accepted payloads.
    let store = db.blocking_read();
    assert_eq!(
        store.estate_urls.get("test").map(String::as_str),
        Some("https://agency.example/estates/test")
    );
    assert_eq!(store.contacts.len(), 2);
    assert_eq!(
        store.contacts[0].payload,
        json!({
            "first_name": "Jane",
            "email": "jane@example.com",
            "preferences": { "types": ["apartment"], "min_price": 100000 },
            "location_preference": { "postal_codes": ["1000"] },
        })
    );
    assert_eq!(store.contacts[1].estate_id.as_deref(), Some("test"));
}

#[test]
fn rejected_credentials_are_an_authentication_error() {
    let (addr, _db) = start_server();
    let client = client_for(addr);

    let err = client.request_access_token(CLIENT_ID, "wrong").unwrap_err();
    assert!(matches!(err, ApiError::Authentication(ref msg) if msg == "Client authentication failed"));
}

#[test]
fn unreachable_server_is_a_transport_error() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let client = client_for(addr);

    let err = client.request_access_token(CLIENT_ID, CLIENT_SECRET).unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "got {err:?}");
}

#[test]
fn concurrent_token_requests_share_one_exchange() {
    let (addr, db) = start_server();
    let client = &client_for(addr);

    let tokens: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(move || client.request_access_token(CLIENT_ID, CLIENT_SECRET).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(tokens.iter().all(|t| *t == tokens[0]));
    assert_eq!(db.blocking_read().tokens.len(), 1);
}
