use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use insta_shared::errors::{AppError, AppResult};
use insta_shared::middleware::OptionalAuthUser;
use insta_shared::types::auth::AuthUser;
use insta_shared::types::ApiResponse;

use crate::services::counters;
use crate::services::follow_service::{self, FollowListItem};
use crate::AppState;

/// Follow state of the target right after a follow or unfollow.
#[derive(Debug, Serialize)]
pub struct FollowStateResponse {
    pub user_id: i64,
    pub is_following: bool,
    pub followers_count: i64,
}

// --- POST /users/:id/follow ---

pub async fn follow_user(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(target_id): Path<i64>,
) -> AppResult<Json<ApiResponse<FollowStateResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    follow_service::follow(&mut conn, user.id, target_id)?;
    let counts = counters::user_counts(&mut conn, target_id)?;

    Ok(Json(ApiResponse::ok(FollowStateResponse {
        user_id: target_id,
        is_following: true,
        followers_count: counts.followers_count,
    })))
}

// --- DELETE /users/:id/follow ---

pub async fn unfollow_user(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(target_id): Path<i64>,
) -> AppResult<Json<ApiResponse<FollowStateResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    follow_service::unfollow(&mut conn, user.id, target_id)?;
    let counts = counters::user_counts(&mut conn, target_id)?;

    Ok(Json(ApiResponse::ok(FollowStateResponse {
        user_id: target_id,
        is_following: false,
        followers_count: counts.followers_count,
    })))
}

// --- GET /users/:id/followers ---

pub async fn list_followers(
    auth: OptionalAuthUser,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<ApiResponse<Vec<FollowListItem>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let followers = follow_service::followers(&mut conn, user_id, auth.viewer())?;
    Ok(Json(ApiResponse::ok(followers)))
}

// --- GET /users/:id/following ---

pub async fn list_following(
    auth: OptionalAuthUser,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<ApiResponse<Vec<FollowListItem>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let following = follow_service::following(&mut conn, user_id, auth.viewer())?;
    Ok(Json(ApiResponse::ok(following)))
}
