use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde::Serialize;

use insta_shared::errors::{AppError, AppResult, ErrorCode};
use insta_shared::types::auth::Viewer;

use crate::models::{Comment, CommentLike, NewComment, NewCommentLike, UserSummary};
use crate::schema::{comment_likes, comments};
use crate::services::comment_tree::{self, CommentNode};
use crate::services::post_service::{self, LikeState};
use crate::services::{counters, engagement, user_service};

/// A comment with its replies, as requested directly by id.
#[derive(Debug, Serialize)]
pub struct CommentDetail {
    pub post_id: i64,
    #[serde(flatten)]
    pub node: CommentNode,
    pub is_liked: bool,
}

#[derive(Debug, Serialize)]
pub struct CommentListItem {
    pub id: i64,
    pub post_id: i64,
    pub user: UserSummary,
    pub text: Option<String>,
    pub parent: Option<i64>,
    pub created_date: DateTime<Utc>,
    pub likes_count: i64,
}

pub struct CreateComment {
    pub post_id: i64,
    pub text: Option<String>,
    pub parent_id: Option<i64>,
}

pub fn find_comment(conn: &mut PgConnection, comment_id: i64) -> AppResult<Comment> {
    comments::table
        .find(comment_id)
        .select(Comment::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::CommentNotFound, "comment not found"))
}

/// Creates a comment. A reply's parent must already exist on the same post,
/// which keeps parent chains acyclic.
pub fn create_comment(conn: &mut PgConnection, author_id: i64, input: CreateComment) -> AppResult<Comment> {
    post_service::find_post(conn, input.post_id)?;

    if let Some(parent_id) = input.parent_id {
        let parent = find_comment(conn, parent_id)?;
        if parent.post_id != input.post_id {
            return Err(AppError::new(
                ErrorCode::ParentCommentMismatch,
                "parent comment belongs to a different post",
            ));
        }
    }

    let comment = diesel::insert_into(comments::table)
        .values(&NewComment {
            post_id: input.post_id,
            user_id: author_id,
            text: input.text,
            parent_id: input.parent_id,
            created_date: Utc::now(),
        })
        .returning(Comment::as_returning())
        .get_result(conn)?;

    tracing::info!(
        comment_id = comment.id,
        post_id = comment.post_id,
        parent_id = ?comment.parent_id,
        "comment created"
    );

    Ok(comment)
}

pub fn comment_detail(conn: &mut PgConnection, comment_id: i64, viewer: Viewer, max_depth: usize) -> AppResult<CommentDetail> {
    let comment = find_comment(conn, comment_id)?;
    let rows = comment_tree::load_post_comments(conn, comment.post_id)?;
    let ids: Vec<i64> = rows.iter().map(|r| r.comment.id).collect();
    let likes = counters::comment_likes_counts(conn, &ids)?;

    let node = comment_tree::build_subtree(rows, comment_id, &likes, max_depth)
        .ok_or_else(|| AppError::new(ErrorCode::CommentNotFound, "comment not found"))?;
    let is_liked = engagement::is_comment_liked(conn, viewer, comment_id)?;

    Ok(CommentDetail {
        post_id: comment.post_id,
        node,
        is_liked,
    })
}

/// Every comment as a flat list, newest first.
pub fn list_comments(conn: &mut PgConnection) -> AppResult<Vec<CommentListItem>> {
    let rows = comments::table
        .order((comments::created_date.desc(), comments::id.desc()))
        .select(Comment::as_select())
        .load::<Comment>(conn)?;

    let ids: Vec<i64> = rows.iter().map(|c| c.id).collect();
    let author_ids: Vec<i64> = rows.iter().map(|c| c.user_id).collect();
    let authors = user_service::summaries_by_id(conn, &author_ids)?;
    let likes = counters::comment_likes_counts(conn, &ids)?;

    Ok(rows
        .into_iter()
        .filter_map(|c| {
            let user = authors.get(&c.user_id)?.clone();
            Some(CommentListItem {
                id: c.id,
                post_id: c.post_id,
                user,
                text: c.text,
                parent: c.parent_id,
                created_date: c.created_date,
                likes_count: likes.get(&c.id).copied().unwrap_or(0),
            })
        })
        .collect())
}

pub fn update_comment(conn: &mut PgConnection, requester_id: i64, comment_id: i64, text: Option<String>) -> AppResult<Comment> {
    let comment = find_comment(conn, comment_id)?;
    if comment.user_id != requester_id {
        return Err(AppError::new(ErrorCode::NotCommentAuthor, "only the author can edit this comment"));
    }

    let updated = diesel::update(comments::table.find(comment_id))
        .set(comments::text.eq(text))
        .returning(Comment::as_returning())
        .get_result(conn)?;

    tracing::info!(comment_id = comment_id, "comment updated");

    Ok(updated)
}

/// Deletes a comment and, through the parent foreign key, all its replies.
pub fn delete_comment(conn: &mut PgConnection, requester_id: i64, comment_id: i64) -> AppResult<()> {
    let comment = find_comment(conn, comment_id)?;
    if comment.user_id != requester_id {
        return Err(AppError::new(ErrorCode::NotCommentAuthor, "only the author can delete this comment"));
    }

    diesel::delete(comments::table.find(comment_id)).execute(conn)?;

    tracing::info!(comment_id = comment_id, post_id = comment.post_id, "comment deleted");

    Ok(())
}

/// Flips the requester's like on a comment, creating the row on first like.
pub fn toggle_like(conn: &mut PgConnection, user_id: i64, comment_id: i64) -> AppResult<LikeState> {
    find_comment(conn, comment_id)?;

    let like = diesel::insert_into(comment_likes::table)
        .values(&NewCommentLike { comment_id, user_id, liked: true })
        .on_conflict((comment_likes::comment_id, comment_likes::user_id))
        .do_update()
        .set(comment_likes::liked.eq(diesel::dsl::not(comment_likes::liked)))
        .returning(CommentLike::as_returning())
        .get_result(conn)?;

    let likes_count = counters::comment_likes_count(conn, comment_id)?;
    metrics::counter!("comment_like_toggles_total", "liked" => like.liked.to_string()).increment(1);
    tracing::info!(comment_id = comment_id, user_id = user_id, liked = like.liked, "comment like toggled");

    Ok(LikeState { is_liked: like.liked, likes_count })
}
