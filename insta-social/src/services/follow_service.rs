use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde::Serialize;

use insta_shared::errors::{AppError, AppResult, ErrorCode};
use insta_shared::types::auth::Viewer;

use crate::models::{Follow, NewFollow, UserSummary};
use crate::schema::follows;
use crate::services::{engagement, user_service};

#[derive(Debug, Serialize)]
pub struct FollowListItem {
    #[serde(flatten)]
    pub user: UserSummary,
    pub followed_since: DateTime<Utc>,
    pub is_following: bool,
}

pub fn follow(conn: &mut PgConnection, follower_id: i64, target_id: i64) -> AppResult<Follow> {
    user_service::ensure_user_exists(conn, target_id)?;

    if follower_id == target_id {
        return Err(AppError::new(ErrorCode::CannotFollowSelf, "cannot follow yourself"));
    }

    let existing: bool = follows::table
        .filter(follows::follower_id.eq(follower_id))
        .filter(follows::following_id.eq(target_id))
        .count()
        .get_result::<i64>(conn)
        .map(|c| c > 0)?;

    if existing {
        return Err(AppError::new(ErrorCode::FollowAlreadyExists, "already following this user"));
    }

    let new_follow = NewFollow {
        follower_id,
        following_id: target_id,
        created_date: Utc::now(),
    };

    // A concurrent duplicate still trips the unique constraint and maps to 409.
    let follow = diesel::insert_into(follows::table)
        .values(&new_follow)
        .returning(Follow::as_returning())
        .get_result(conn)?;

    tracing::info!(follower_id = follower_id, following_id = target_id, "follow created");

    Ok(follow)
}

pub fn unfollow(conn: &mut PgConnection, follower_id: i64, target_id: i64) -> AppResult<()> {
    let removed = diesel::delete(
        follows::table
            .filter(follows::follower_id.eq(follower_id))
            .filter(follows::following_id.eq(target_id)),
    )
    .execute(conn)?;

    if removed == 0 {
        return Err(AppError::new(ErrorCode::FollowNotFound, "not following this user"));
    }

    tracing::info!(follower_id = follower_id, following_id = target_id, "follow removed");

    Ok(())
}

/// Users following `user_id`, most recent first.
pub fn followers(conn: &mut PgConnection, user_id: i64, viewer: Viewer) -> AppResult<Vec<FollowListItem>> {
    user_service::ensure_user_exists(conn, user_id)?;

    let edges: Vec<(i64, DateTime<Utc>)> = follows::table
        .filter(follows::following_id.eq(user_id))
        .order((follows::created_date.desc(), follows::id.desc()))
        .select((follows::follower_id, follows::created_date))
        .load(conn)?;

    list_items(conn, edges, viewer)
}

/// Users `user_id` follows, most recent first.
pub fn following(conn: &mut PgConnection, user_id: i64, viewer: Viewer) -> AppResult<Vec<FollowListItem>> {
    user_service::ensure_user_exists(conn, user_id)?;

    let edges: Vec<(i64, DateTime<Utc>)> = follows::table
        .filter(follows::follower_id.eq(user_id))
        .order((follows::created_date.desc(), follows::id.desc()))
        .select((follows::following_id, follows::created_date))
        .load(conn)?;

    list_items(conn, edges, viewer)
}

fn list_items(
    conn: &mut PgConnection,
    edges: Vec<(i64, DateTime<Utc>)>,
    viewer: Viewer,
) -> AppResult<Vec<FollowListItem>> {
    let ids: Vec<i64> = edges.iter().map(|(id, _)| *id).collect();
    let mut summaries = user_service::summaries_by_id(conn, &ids)?;
    let followed = engagement::followed_user_ids(conn, viewer, &ids)?;

    // Edge order is preserved; the summaries map is only a lookup.
    Ok(edges
        .into_iter()
        .filter_map(|(id, since)| {
            summaries.remove(&id).map(|user| FollowListItem {
                user,
                followed_since: since,
                is_following: followed.contains(&id),
            })
        })
        .collect())
}
