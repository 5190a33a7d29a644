//! Integration tests for the HTTP surface: routing, person lookup and
//! partial update, skill listing with frequency filters, and the error
//! envelope.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use rusqlite::Connection;
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot`

use talent_directory_api::{
    api, config::Config, db, loader,
    models::{SeedRecord, SkillEntry},
    store::Store,
    AppState,
};

fn setup_app() -> (axum::Router, Store) {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .expect("enable foreign keys");
    db::init_schema(&conn).expect("create schema");

    let store = Store::new(conn);
    let state = AppState {
        config: Config::from_env().expect("config"),
        store: store.clone(),
    };
    (api::router(state), store)
}

fn seed_people(store: &Store) {
    let records = vec![
        SeedRecord {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: Some("555-0100".to_string()),
            company: "Analytical".to_string(),
            skills: vec![SkillEntry {
                skill: "Rust".to_string(),
                rating: 4,
            }],
        },
        SeedRecord {
            name: "Grace Hopper".to_string(),
            email: "grace@example.com".to_string(),
            phone: None,
            company: "Navy".to_string(),
            skills: vec![
                SkillEntry {
                    skill: "Rust".to_string(),
                    rating: 3,
                },
                SkillEntry {
                    skill: "COBOL".to_string(),
                    rating: 5,
                },
            ],
        },
    ];
    loader::load_records(store, &records).expect("seed batch");
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn put_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse JSON")
}

#[tokio::test]
async fn liveness_check_returns_static_text() {
    let (app, _store) = setup_app();

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    assert_eq!(&bytes[..], b"<p>Connected!</p>");
}

#[tokio::test]
async fn list_people_returns_all_representations() {
    let (app, store) = setup_app();
    seed_people(&store);

    let response = app.oneshot(get("/users/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let people = body.as_array().expect("array body");
    assert_eq!(people.len(), 2);
    assert_eq!(people[0]["name"], "Ada Lovelace");
    assert_eq!(people[0]["company"], "Analytical");
    assert_eq!(people[1]["phone"], Value::Null);
}

#[tokio::test]
async fn person_is_addressable_by_id_and_email() {
    let (app, store) = setup_app();
    seed_people(&store);

    let response = app
        .clone()
        .oneshot(get("/users/1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let by_id = extract_json(response.into_body()).await;
    assert_eq!(by_id["email"], "ada@example.com");

    let response = app.oneshot(get("/users/grace@example.com")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let by_email = extract_json(response.into_body()).await;
    assert_eq!(by_email["name"], "Grace Hopper");
}

#[tokio::test]
async fn unknown_person_returns_404() {
    let (app, store) = setup_app();
    seed_people(&store);

    let response = app.clone().oneshot(get("/users/999")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let response = app
        .oneshot(put_json("/users/nobody@example.com", json!({"phone": "1"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn partial_update_applies_only_present_fields() {
    let (app, store) = setup_app();
    seed_people(&store);

    let response = app
        .clone()
        .oneshot(put_json(
            "/users/1",
            json!({"company": "Acme", "skills": [{"skill": "Go", "rating": 5}]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let updated = extract_json(response.into_body()).await;
    assert_eq!(updated["name"], "Ada Lovelace");
    assert_eq!(updated["company"], "Acme");
    assert_eq!(updated["email"], "ada@example.com");
    assert_eq!(updated["skills"], json!([{"skill": "Go", "rating": 5}]));

    // The replaced rating set is visible to subsequent readers, and the
    // frequency counters moved with it.
    let response = app.clone().oneshot(get("/users/1")).await.unwrap();
    let fetched = extract_json(response.into_body()).await;
    assert_eq!(fetched["skills"], json!([{"skill": "Go", "rating": 5}]));

    let response = app.oneshot(get("/skills/")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    let skills = body["skills"].as_array().expect("skills array");
    let go = skills
        .iter()
        .find(|s| s["skill"] == "Go")
        .expect("Go listed");
    assert_eq!(go["frequency"], 1);
    let rust = skills
        .iter()
        .find(|s| s["skill"] == "Rust")
        .expect("Rust listed");
    assert_eq!(rust["frequency"], 1);
}

#[tokio::test]
async fn skill_listing_filters_by_frequency_range() {
    let (app, store) = setup_app();
    seed_people(&store);

    let response = app
        .clone()
        .oneshot(get("/skills/?min_frequency=2&max_frequency=5"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    let skills = body["skills"].as_array().expect("skills array");
    assert_eq!(skills.len(), 1);
    assert_eq!(skills[0]["skill"], "Rust");
    assert_eq!(skills[0]["frequency"], 2);

    let response = app
        .oneshot(get("/skills/?max_frequency=1"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    let skills = body["skills"].as_array().expect("skills array");
    assert_eq!(skills.len(), 1);
    assert_eq!(skills[0]["skill"], "COBOL");
}

#[tokio::test]
async fn non_integer_frequency_filter_returns_400() {
    let (app, _store) = setup_app();

    let response = app
        .oneshot(get("/skills/?min_frequency=abc"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert_eq!(body["error"]["message"], "min_frequency must be an integer");
}
