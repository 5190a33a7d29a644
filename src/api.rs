use axum::{
    extract::{Path, Query, State},
    response::Html,
    routing::get,
    Json, Router,
};
use tokio::task;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::error;

use crate::{
    error::ApiError,
    models::{
        PersonKey, PersonRepr, PersonUpdate, SkillListQuery, SkillListResponse,
    },
    store::StoreError,
    AppState,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/users/", get(list_people))
        .route("/users/{key}", get(get_person).put(update_person))
        .route("/skills/", get(list_skills))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Html<&'static str> {
    Html("<p>Connected!</p>")
}

async fn list_people(State(state): State<AppState>) -> Result<Json<Vec<PersonRepr>>, ApiError> {
    let store = state.store.clone();
    let people = run_blocking(move || store.list_people()).await?;
    Ok(Json(people))
}

async fn get_person(
    State(state): State<AppState>,
    Path(raw_key): Path<String>,
) -> Result<Json<PersonRepr>, ApiError> {
    let key = PersonKey::parse(&raw_key);
    let store = state.store.clone();
    let person = run_blocking(move || store.fetch_person(&key)).await?;
    Ok(Json(person))
}

async fn update_person(
    State(state): State<AppState>,
    Path(raw_key): Path<String>,
    Json(update): Json<PersonUpdate>,
) -> Result<Json<PersonRepr>, ApiError> {
    let key = PersonKey::parse(&raw_key);
    let store = state.store.clone();
    let person = run_blocking(move || store.update_person(&key, &update)).await?;
    Ok(Json(person))
}

async fn list_skills(
    State(state): State<AppState>,
    Query(query): Query<SkillListQuery>,
) -> Result<Json<SkillListResponse>, ApiError> {
    let min = parse_frequency_param("min_frequency", query.min_frequency.as_deref())?;
    let max = parse_frequency_param("max_frequency", query.max_frequency.as_deref())?;

    let store = state.store.clone();
    let skills = run_blocking(move || store.list_skills(min, max)).await?;
    Ok(Json(SkillListResponse { skills }))
}

fn parse_frequency_param(name: &str, value: Option<&str>) -> Result<Option<i64>, ApiError> {
    match value {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("{name} must be an integer"))),
    }
}

/// rusqlite work runs on the blocking pool so handlers never stall the
/// async runtime.
async fn run_blocking<T, F>(job: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    match task::spawn_blocking(job).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(err) => {
            error!("Blocking task join error: {err}");
            Err(ApiError::internal("Internal task failure."))
        }
    }
}
