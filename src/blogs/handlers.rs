use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    extract::{parse_id, ApiJson, ApiQuery},
    state::AppState,
};

use super::dto::{BlogRequest, MessageResponse, Pagination, SearchParams};
use super::repo_types::Blog;
use super::services::DEFAULT_PAGE_SIZE;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/blogs", get(list_blogs))
        .route("/blogs/create", post(create_blog))
        .route("/blogs/me", get(my_blogs))
        .route("/blogs/search", get(search_blogs))
        .route(
            "/blogs/:id",
            get(get_blog).put(update_blog).delete(delete_blog),
        )
        .route("/users/:id/blogs", get(user_blogs))
}

/// POST /blogs/create
#[instrument(skip(state, payload))]
pub async fn create_blog(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<BlogRequest>,
) -> Result<(StatusCode, Json<Blog>), AppError> {
    let blog = state
        .blogs
        .create(user_id, &payload.title, &payload.content)
        .await?;
    Ok((StatusCode::CREATED, Json(blog)))
}

/// GET /blogs/:id
#[instrument(skip(state))]
pub async fn get_blog(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Blog>, AppError> {
    let id = parse_id(&id, "blog")?;
    Ok(Json(state.blogs.get(id).await?))
}

/// PUT /blogs/:id
#[instrument(skip(state, payload))]
pub async fn update_blog(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<BlogRequest>,
) -> Result<Json<Blog>, AppError> {
    let id = parse_id(&id, "blog")?;
    let blog = state
        .blogs
        .update(id, user_id, &payload.title, &payload.content)
        .await?;
    Ok(Json(blog))
}

/// DELETE /blogs/:id
#[instrument(skip(state))]
pub async fn delete_blog(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id, "blog")?;
    state.blogs.delete(id, user_id).await?;
    Ok(Json(MessageResponse {
        message: "Blog deleted successfully",
    }))
}

/// GET /blogs/me
#[instrument(skip(state))]
pub async fn my_blogs(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Blog>>, AppError> {
    Ok(Json(state.blogs.list_by_user(user_id).await?))
}

/// GET /users/:id/blogs
#[instrument(skip(state))]
pub async fn user_blogs(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Blog>>, AppError> {
    let user_id = parse_id(&id, "user")?;
    Ok(Json(state.blogs.list_by_user(user_id).await?))
}

/// GET /blogs?limit=&offset=
#[instrument(skip(state))]
pub async fn list_blogs(
    State(state): State<AppState>,
    ApiQuery(p): ApiQuery<Pagination>,
) -> Result<Json<Vec<Blog>>, AppError> {
    let limit = parse_param(p.limit.as_deref(), "limit")?.unwrap_or(DEFAULT_PAGE_SIZE);
    let offset = parse_param(p.offset.as_deref(), "offset")?.unwrap_or(0);
    Ok(Json(state.blogs.list_all(limit, offset).await?))
}

/// GET /blogs/search?q=
#[instrument(skip(state))]
pub async fn search_blogs(
    State(state): State<AppState>,
    ApiQuery(p): ApiQuery<SearchParams>,
) -> Result<Json<Vec<Blog>>, AppError> {
    Ok(Json(state.blogs.search(&p.q).await?))
}

fn parse_param(raw: Option<&str>, name: &str) -> Result<Option<i64>, AppError> {
    match raw {
        None | Some("") => Ok(None),
        Some(v) => v
            .parse::<i64>()
            .map(Some)
            .map_err(|_| AppError::Validation(format!("Invalid {name} parameter"))),
    }
}
