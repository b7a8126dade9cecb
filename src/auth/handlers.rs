use anyhow::Context;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::instrument;

use crate::{
    auth::dto::{AuthResponse, CredentialsRequest},
    error::AppError,
    extract::ApiJson,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CredentialsRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let user = state
        .users
        .register(&payload.username, &payload.password)
        .await?;
    let token = state.jwt.issue(user.id).context("issue token")?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            username: user.username,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CredentialsRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = state
        .users
        .authenticate(&payload.username, &payload.password)
        .await?;
    let token = state.jwt.issue(user.id).context("issue token")?;

    Ok(Json(AuthResponse {
        token,
        username: user.username,
    }))
}
