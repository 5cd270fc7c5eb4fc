//! Derived counts computed straight from the tables on every call.
//!
//! Nothing here is cached: a count always reflects rows committed before the
//! query ran. Callers resolve "entity not found" before asking for counts.

use std::collections::HashMap;

use diesel::dsl::count_star;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde::Serialize;

use crate::schema::{comment_likes, follows, post_likes, posts};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UserCounts {
    pub followers_count: i64,
    pub following_count: i64,
    pub posts_count: i64,
}

pub fn user_counts(conn: &mut PgConnection, user_id: i64) -> QueryResult<UserCounts> {
    let followers_count = follows::table
        .filter(follows::following_id.eq(user_id))
        .count()
        .get_result::<i64>(conn)?;

    let following_count = follows::table
        .filter(follows::follower_id.eq(user_id))
        .count()
        .get_result::<i64>(conn)?;

    let posts_count = posts::table
        .filter(posts::user_id.eq(user_id))
        .count()
        .get_result::<i64>(conn)?;

    Ok(UserCounts {
        followers_count,
        following_count,
        posts_count,
    })
}

/// Counts for many users in three grouped queries. Users without any rows
/// get zeroed counts.
pub fn user_counts_for(conn: &mut PgConnection, user_ids: &[i64]) -> QueryResult<HashMap<i64, UserCounts>> {
    let mut counts: HashMap<i64, UserCounts> =
        user_ids.iter().map(|id| (*id, UserCounts::default())).collect();
    if user_ids.is_empty() {
        return Ok(counts);
    }

    let followers: Vec<(i64, i64)> = follows::table
        .filter(follows::following_id.eq_any(user_ids))
        .group_by(follows::following_id)
        .select((follows::following_id, count_star()))
        .load(conn)?;
    for (id, n) in followers {
        counts.entry(id).or_default().followers_count = n;
    }

    let following: Vec<(i64, i64)> = follows::table
        .filter(follows::follower_id.eq_any(user_ids))
        .group_by(follows::follower_id)
        .select((follows::follower_id, count_star()))
        .load(conn)?;
    for (id, n) in following {
        counts.entry(id).or_default().following_count = n;
    }

    let authored: Vec<(Option<i64>, i64)> = posts::table
        .filter(posts::user_id.eq_any(user_ids))
        .group_by(posts::user_id)
        .select((posts::user_id, count_star()))
        .load(conn)?;
    for (id, n) in authored {
        if let Some(id) = id {
            counts.entry(id).or_default().posts_count = n;
        }
    }

    Ok(counts)
}

/// Number of `liked = true` rows for a post.
pub fn post_likes_count(conn: &mut PgConnection, post_id: i64) -> QueryResult<i64> {
    post_likes::table
        .filter(post_likes::post_id.eq(post_id))
        .filter(post_likes::liked.eq(true))
        .count()
        .get_result(conn)
}

/// Like counts keyed by post id. Posts without likes are absent.
pub fn post_likes_counts(conn: &mut PgConnection, post_ids: &[i64]) -> QueryResult<HashMap<i64, i64>> {
    if post_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(i64, i64)> = post_likes::table
        .filter(post_likes::post_id.eq_any(post_ids))
        .filter(post_likes::liked.eq(true))
        .group_by(post_likes::post_id)
        .select((post_likes::post_id, count_star()))
        .load(conn)?;
    Ok(rows.into_iter().collect())
}

pub fn comment_likes_count(conn: &mut PgConnection, comment_id: i64) -> QueryResult<i64> {
    comment_likes::table
        .filter(comment_likes::comment_id.eq(comment_id))
        .filter(comment_likes::liked.eq(true))
        .count()
        .get_result(conn)
}

/// Like counts keyed by comment id. Comments without likes are absent.
pub fn comment_likes_counts(conn: &mut PgConnection, comment_ids: &[i64]) -> QueryResult<HashMap<i64, i64>> {
    if comment_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(i64, i64)> = comment_likes::table
        .filter(comment_likes::comment_id.eq_any(comment_ids))
        .filter(comment_likes::liked.eq(true))
        .group_by(comment_likes::comment_id)
        .select((comment_likes::comment_id, count_star()))
        .load(conn)?;
    Ok(rows.into_iter().collect())
}
