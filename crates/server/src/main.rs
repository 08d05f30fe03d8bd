use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use server_api::{health, list_activities, signup, unregister, ApiContext};
use shared::{
    domain::ActivitySnapshot,
    error::ApiError,
    protocol::{activities_route, signup_route, unregister_route, EmailQuery, MessageResponse},
};
use storage::{MemoryRosterStore, RosterSeed, SqliteRosterStore};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod app_state;
mod settings;

use app_state::AppState;
use settings::{load_settings, normalize_database_url, Settings};

type ApiRejection = (StatusCode, Json<ApiError>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings()?;
    let api = open_roster(&settings).await?;
    let app = build_router(Arc::new(AppState { api }));

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(%addr, "roster server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn open_roster(settings: &Settings) -> anyhow::Result<ApiContext> {
    let seed = match &settings.seed_path {
        Some(path) => RosterSeed::load(path)?,
        None => RosterSeed::builtin()?,
    };

    let Some(raw_database_url) = settings.database_url() else {
        info!(
            activities = seed.activities.len(),
            "no database configured; serving in-memory roster"
        );
        return Ok(ApiContext::new(MemoryRosterStore::from_seed(&seed)));
    };

    let database_url = normalize_database_url(raw_database_url);
    let store = SqliteRosterStore::new(&database_url)
        .await
        .map_err(|error| {
            error!(
                %database_url,
                %error,
                "failed to open SQLite roster; verify parent directory exists and permissions are correct"
            );
            error
        })?;
    let created = store.provision(&seed).await?;
    info!(%database_url, created, "roster database ready");
    Ok(ApiContext::new(store))
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(activities_route(), get(http_list_activities))
        .route(signup_route(), post(http_signup))
        .route(unregister_route(), delete(http_unregister))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, ApiRejection> {
    health(&state.api).await.map_err(reject)?;
    Ok("ok")
}

async fn http_list_activities(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ActivitySnapshot>, ApiRejection> {
    let snapshot = list_activities(&state.api).await.map_err(reject)?;
    Ok(Json(snapshot))
}

async fn http_signup(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<EmailQuery>, QueryRejection>,
) -> Result<Json<MessageResponse>, ApiRejection> {
    let (activity_name, q) = membership_target(path, query)?;
    let response = signup(&state.api, &activity_name, q.email.as_deref())
        .await
        .map_err(reject)?;
    Ok(Json(response))
}

async fn http_unregister(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<EmailQuery>, QueryRejection>,
) -> Result<Json<MessageResponse>, ApiRejection> {
    let (activity_name, q) = membership_target(path, query)?;
    let response = unregister(&state.api, &activity_name, q.email.as_deref())
        .await
        .map_err(reject)?;
    Ok(Json(response))
}

/// Unwraps the activity name and email query, reporting malformed input as
/// a JSON validation error instead of the extractor's plain-text rejection.
fn membership_target(
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<EmailQuery>, QueryRejection>,
) -> Result<(String, EmailQuery), ApiRejection> {
    let Path(activity_name) =
        path.map_err(|rejection| reject(ApiError::validation(rejection.body_text())))?;
    let Query(q) =
        query.map_err(|rejection| reject(ApiError::validation(rejection.body_text())))?;
    Ok((activity_name, q))
}

fn reject(err: ApiError) -> ApiRejection {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(err))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
