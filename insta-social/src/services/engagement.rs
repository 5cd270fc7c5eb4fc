//! Per-request "is liked" / "is following" state for the current viewer.
//!
//! Anonymous viewers resolve to `false` without touching the database.

use std::collections::HashSet;

use diesel::dsl::exists;
use diesel::pg::PgConnection;
use diesel::prelude::*;

use insta_shared::types::auth::Viewer;

use crate::schema::{comment_likes, follows, post_likes};

pub fn is_post_liked(conn: &mut PgConnection, viewer: Viewer, post_id: i64) -> QueryResult<bool> {
    let Some(user_id) = viewer.user_id() else {
        return Ok(false);
    };
    diesel::select(exists(
        post_likes::table
            .filter(post_likes::post_id.eq(post_id))
            .filter(post_likes::user_id.eq(user_id))
            .filter(post_likes::liked.eq(true)),
    ))
    .get_result(conn)
}

/// The subset of `post_ids` the viewer currently likes.
pub fn liked_post_ids(conn: &mut PgConnection, viewer: Viewer, post_ids: &[i64]) -> QueryResult<HashSet<i64>> {
    let Some(user_id) = viewer.user_id() else {
        return Ok(HashSet::new());
    };
    if post_ids.is_empty() {
        return Ok(HashSet::new());
    }
    let liked: Vec<i64> = post_likes::table
        .filter(post_likes::post_id.eq_any(post_ids))
        .filter(post_likes::user_id.eq(user_id))
        .filter(post_likes::liked.eq(true))
        .select(post_likes::post_id)
        .load(conn)?;
    Ok(liked.into_iter().collect())
}

pub fn is_comment_liked(conn: &mut PgConnection, viewer: Viewer, comment_id: i64) -> QueryResult<bool> {
    let Some(user_id) = viewer.user_id() else {
        return Ok(false);
    };
    diesel::select(exists(
        comment_likes::table
            .filter(comment_likes::comment_id.eq(comment_id))
            .filter(comment_likes::user_id.eq(user_id))
            .filter(comment_likes::liked.eq(true)),
    ))
    .get_result(conn)
}

pub fn is_following(conn: &mut PgConnection, viewer: Viewer, user_id: i64) -> QueryResult<bool> {
    let Some(follower_id) = viewer.user_id() else {
        return Ok(false);
    };
    diesel::select(exists(
        follows::table
            .filter(follows::follower_id.eq(follower_id))
            .filter(follows::following_id.eq(user_id)),
    ))
    .get_result(conn)
}

/// The subset of `user_ids` the viewer follows.
pub fn followed_user_ids(conn: &mut PgConnection, viewer: Viewer, user_ids: &[i64]) -> QueryResult<HashSet<i64>> {
    let Some(follower_id) = viewer.user_id() else {
        return Ok(HashSet::new());
    };
    if user_ids.is_empty() {
        return Ok(HashSet::new());
    }
    let followed: Vec<i64> = follows::table
        .filter(follows::follower_id.eq(follower_id))
        .filter(follows::following_id.eq_any(user_ids))
        .select(follows::following_id)
        .load(conn)?;
    Ok(followed.into_iter().collect())
}
