use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use insta_shared::errors::{AppError, AppResult};
use insta_shared::middleware::OptionalAuthUser;
use insta_shared::types::auth::{AuthUser, Viewer};
use insta_shared::types::ApiResponse;

use crate::services::post_service::{self, CreatePost, PostDetail, PostSummary};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(max = 2200))]
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub hashtag: Option<String>,
    /// Media references, stored as given.
    #[serde(default)]
    #[validate(length(max = 10))]
    pub contents: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PostDeletedResponse {
    pub deleted: bool,
}

// --- GET /posts ---

pub async fn list_posts(
    auth: OptionalAuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<PostSummary>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let posts = post_service::list_posts(&mut conn, auth.viewer())?;
    Ok(Json(ApiResponse::ok(posts)))
}

// --- POST /posts ---

pub async fn create_post(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePostRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<PostDetail>>)> {
    req.validate()?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let post = post_service::create_post(
        &mut conn,
        user.id,
        CreatePost {
            description: req.description,
            hashtag: req.hashtag,
            contents: req.contents,
        },
    )?;
    let detail = post_service::post_detail(
        &mut conn,
        post.id,
        Viewer::from(&user),
        state.config.max_comment_depth,
    )?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(detail))))
}

// --- GET /posts/:id ---

pub async fn get_post(
    auth: OptionalAuthUser,
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i64>,
) -> AppResult<Json<ApiResponse<PostDetail>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let detail = post_service::post_detail(&mut conn, post_id, auth.viewer(), state.config.max_comment_depth)?;
    Ok(Json(ApiResponse::ok(detail)))
}

// --- DELETE /posts/:id ---

pub async fn delete_post(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i64>,
) -> AppResult<Json<ApiResponse<PostDeletedResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    post_service::delete_post(&mut conn, user.id, post_id)?;
    Ok(Json(ApiResponse::ok_with_message(PostDeletedResponse { deleted: true }, "post deleted")))
}
