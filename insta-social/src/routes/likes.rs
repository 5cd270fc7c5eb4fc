use axum::extract::{Path, State};
use axum::Json;
use std::sync::Arc;

use insta_shared::errors::{AppError, AppResult};
use insta_shared::types::auth::AuthUser;
use insta_shared::types::ApiResponse;

use crate::services::post_service::LikeState;
use crate::services::{comment_service, post_service};
use crate::AppState;

// --- POST /posts/:id/like ---

pub async fn toggle_post_like(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i64>,
) -> AppResult<Json<ApiResponse<LikeState>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let like = post_service::toggle_like(&mut conn, user.id, post_id)?;
    Ok(Json(ApiResponse::ok(like)))
}

// --- POST /comments/:id/like ---

pub async fn toggle_comment_like(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(comment_id): Path<i64>,
) -> AppResult<Json<ApiResponse<LikeState>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let like = comment_service::toggle_like(&mut conn, user.id, comment_id)?;
    Ok(Json(ApiResponse::ok(like)))
}
