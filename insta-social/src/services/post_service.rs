use std::collections::HashMap;

use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde::Serialize;

use insta_shared::errors::{AppError, AppResult, ErrorCode};
use insta_shared::types::auth::Viewer;

use crate::models::{NewPost, NewPostContent, NewPostLike, Post, PostContent, PostLike, UserSummary};
use crate::schema::{post_contents, post_likes, posts};
use crate::services::comment_tree::{self, CommentNode};
use crate::services::{counters, engagement, user_service};

#[derive(Debug, Serialize)]
pub struct PostSummary {
    pub id: i64,
    pub user: Option<UserSummary>,
    pub description: Option<String>,
    pub hashtag: Option<String>,
    pub created_date: DateTime<Utc>,
    pub contents: Vec<PostContent>,
    pub likes_count: i64,
    pub is_liked: bool,
}

#[derive(Debug, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: PostSummary,
    pub comments: Vec<CommentNode>,
}

/// Result of a like toggle, as seen right after the write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeState {
    pub is_liked: bool,
    pub likes_count: i64,
}

pub struct CreatePost {
    pub description: Option<String>,
    pub hashtag: Option<String>,
    pub contents: Vec<String>,
}

pub fn find_post(conn: &mut PgConnection, post_id: i64) -> AppResult<Post> {
    posts::table
        .find(post_id)
        .select(Post::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::PostNotFound, "post not found"))
}

pub fn create_post(conn: &mut PgConnection, author_id: i64, input: CreatePost) -> AppResult<Post> {
    conn.transaction::<_, AppError, _>(|conn| {
        let post = diesel::insert_into(posts::table)
            .values(&NewPost {
                user_id: Some(author_id),
                description: input.description,
                hashtag: input.hashtag,
                created_date: Utc::now(),
            })
            .returning(Post::as_returning())
            .get_result(conn)?;

        let contents: Vec<NewPostContent> = input
            .contents
            .into_iter()
            .map(|content| NewPostContent { post_id: post.id, content })
            .collect();
        if !contents.is_empty() {
            diesel::insert_into(post_contents::table)
                .values(&contents)
                .execute(conn)?;
        }

        tracing::info!(post_id = post.id, author_id = author_id, media = contents.len(), "post created");

        Ok(post)
    })
}

/// Deletes a post owned by `requester_id`; contents, likes, and comments
/// go with it.
pub fn delete_post(conn: &mut PgConnection, requester_id: i64, post_id: i64) -> AppResult<()> {
    let post = find_post(conn, post_id)?;
    if post.user_id != Some(requester_id) {
        return Err(AppError::new(ErrorCode::NotPostOwner, "only the author can delete this post"));
    }

    diesel::delete(posts::table.find(post_id)).execute(conn)?;

    tracing::info!(post_id = post_id, "post deleted");

    Ok(())
}

/// Every post, newest first.
pub fn list_posts(conn: &mut PgConnection, viewer: Viewer) -> AppResult<Vec<PostSummary>> {
    let rows = posts::table
        .order((posts::created_date.desc(), posts::id.desc()))
        .select(Post::as_select())
        .load::<Post>(conn)?;
    summarize(conn, rows, viewer)
}

pub fn post_detail(conn: &mut PgConnection, post_id: i64, viewer: Viewer, max_depth: usize) -> AppResult<PostDetail> {
    let post = find_post(conn, post_id)?;
    let summary = summarize(conn, vec![post], viewer)?
        .pop()
        .ok_or_else(|| AppError::new(ErrorCode::PostNotFound, "post not found"))?;
    let comments = comment_tree::post_comment_tree(conn, post_id, max_depth)?;

    Ok(PostDetail { post: summary, comments })
}

/// Flips the requester's like on a post, creating the row on first like.
pub fn toggle_like(conn: &mut PgConnection, user_id: i64, post_id: i64) -> AppResult<LikeState> {
    find_post(conn, post_id)?;

    let like = diesel::insert_into(post_likes::table)
        .values(&NewPostLike { post_id, user_id, liked: true })
        .on_conflict((post_likes::post_id, post_likes::user_id))
        .do_update()
        .set(post_likes::liked.eq(diesel::dsl::not(post_likes::liked)))
        .returning(PostLike::as_returning())
        .get_result(conn)?;

    let likes_count = counters::post_likes_count(conn, post_id)?;
    metrics::counter!("post_like_toggles_total", "liked" => like.liked.to_string()).increment(1);
    tracing::info!(post_id = post_id, user_id = user_id, liked = like.liked, "post like toggled");

    Ok(LikeState { is_liked: like.liked, likes_count })
}

fn summarize(conn: &mut PgConnection, rows: Vec<Post>, viewer: Viewer) -> AppResult<Vec<PostSummary>> {
    let post_ids: Vec<i64> = rows.iter().map(|p| p.id).collect();
    let author_ids: Vec<i64> = rows.iter().filter_map(|p| p.user_id).collect();

    let authors = user_service::summaries_by_id(conn, &author_ids)?;
    let likes = counters::post_likes_counts(conn, &post_ids)?;
    let liked = engagement::liked_post_ids(conn, viewer, &post_ids)?;

    let mut contents: HashMap<i64, Vec<PostContent>> = HashMap::new();
    if !post_ids.is_empty() {
        let media = post_contents::table
            .filter(post_contents::post_id.eq_any(&post_ids))
            .order(post_contents::id.asc())
            .select(PostContent::as_select())
            .load::<PostContent>(conn)?;
        for item in media {
            contents.entry(item.post_id).or_default().push(item);
        }
    }

    Ok(rows
        .into_iter()
        .map(|post| PostSummary {
            id: post.id,
            user: post.user_id.and_then(|id| authors.get(&id).cloned()),
            description: post.description,
            hashtag: post.hashtag,
            created_date: post.created_date,
            contents: contents.remove(&post.id).unwrap_or_default(),
            likes_count: likes.get(&post.id).copied().unwrap_or(0),
            is_liked: liked.contains(&post.id),
        })
        .collect())
}
