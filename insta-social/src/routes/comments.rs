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

use crate::services::comment_service::{self, CommentDetail, CommentListItem, CreateComment};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    pub post_id: i64,
    #[validate(length(max = 2200))]
    pub text: Option<String>,
    /// Id of the comment being replied to, if any.
    pub parent: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(length(max = 2200))]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CommentDeletedResponse {
    pub deleted: bool,
}

// --- GET /comments ---

pub async fn list_comments(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<CommentListItem>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let comments = comment_service::list_comments(&mut conn)?;
    Ok(Json(ApiResponse::ok(comments)))
}

// --- POST /comments ---

pub async fn create_comment(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCommentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CommentDetail>>)> {
    req.validate()?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let comment = comment_service::create_comment(
        &mut conn,
        user.id,
        CreateComment {
            post_id: req.post_id,
            text: req.text,
            parent_id: req.parent,
        },
    )?;
    let detail = comment_service::comment_detail(
        &mut conn,
        comment.id,
        Viewer::from(&user),
        state.config.max_comment_depth,
    )?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(detail))))
}

// --- GET /comments/:id ---

pub async fn get_comment(
    auth: OptionalAuthUser,
    State(state): State<Arc<AppState>>,
    Path(comment_id): Path<i64>,
) -> AppResult<Json<ApiResponse<CommentDetail>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let detail = comment_service::comment_detail(
        &mut conn,
        comment_id,
        auth.viewer(),
        state.config.max_comment_depth,
    )?;
    Ok(Json(ApiResponse::ok(detail)))
}

// --- PATCH /comments/:id ---

pub async fn update_comment(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(comment_id): Path<i64>,
    Json(req): Json<UpdateCommentRequest>,
) -> AppResult<Json<ApiResponse<CommentDetail>>> {
    req.validate()?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    comment_service::update_comment(&mut conn, user.id, comment_id, req.text)?;
    let detail = comment_service::comment_detail(
        &mut conn,
        comment_id,
        Viewer::from(&user),
        state.config.max_comment_depth,
    )?;

    Ok(Json(ApiResponse::ok(detail)))
}

// --- DELETE /comments/:id ---

pub async fn delete_comment(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(comment_id): Path<i64>,
) -> AppResult<Json<ApiResponse<CommentDeletedResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    comment_service::delete_comment(&mut conn, user.id, comment_id)?;
    Ok(Json(ApiResponse::ok_with_message(
        CommentDeletedResponse { deleted: true },
        "comment and replies deleted",
    )))
}
