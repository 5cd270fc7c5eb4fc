use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::schema::{comment_likes, comments, follows, post_contents, post_likes, posts, users};

// --- User ---

#[derive(Debug, Queryable, Selectable, Identifiable, Clone)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: i64,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub password_hash: String,
    pub bio: Option<String>,
    pub user_image: Option<String>,
    pub is_official: bool,
    pub user_link: Option<String>,
    pub date_registered: DateTime<Utc>,
}

/// Public author card embedded in posts, comments, and follow lists.
#[derive(Debug, Queryable, Selectable, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub user_image: Option<String>,
    pub is_official: bool,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub password_hash: String,
    pub bio: Option<String>,
    pub user_image: Option<String>,
    pub user_link: Option<String>,
    pub date_registered: DateTime<Utc>,
}

#[derive(Debug, AsChangeset, Deserialize, Validate, Default)]
#[diesel(table_name = users)]
pub struct UpdateUser {
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
    pub user_image: Option<String>,
    #[validate(url)]
    pub user_link: Option<String>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.bio.is_none()
            && self.user_image.is_none()
            && self.user_link.is_none()
    }
}

// --- Follow ---

#[derive(Debug, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = follows)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Follow {
    pub id: i64,
    pub follower_id: i64,
    pub following_id: i64,
    pub created_date: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = follows)]
pub struct NewFollow {
    pub follower_id: i64,
    pub following_id: i64,
    pub created_date: DateTime<Utc>,
}

// --- Post ---

#[derive(Debug, Queryable, Selectable, Identifiable, Serialize, Clone)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Post {
    pub id: i64,
    pub user_id: Option<i64>,
    pub description: Option<String>,
    pub hashtag: Option<String>,
    pub created_date: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = posts)]
pub struct NewPost {
    pub user_id: Option<i64>,
    pub description: Option<String>,
    pub hashtag: Option<String>,
    pub created_date: DateTime<Utc>,
}

#[derive(Debug, Queryable, Selectable, Identifiable, Serialize, Clone)]
#[diesel(table_name = post_contents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PostContent {
    pub id: i64,
    #[serde(skip_serializing)]
    pub post_id: i64,
    pub content: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = post_contents)]
pub struct NewPostContent {
    pub post_id: i64,
    pub content: String,
}

#[derive(Debug, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = post_likes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PostLike {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub liked: bool,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = post_likes)]
pub struct NewPostLike {
    pub post_id: i64,
    pub user_id: i64,
    pub liked: bool,
}

// --- Comment ---

#[derive(Debug, Queryable, Selectable, Identifiable, Serialize, Clone)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub text: Option<String>,
    pub parent_id: Option<i64>,
    pub created_date: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = comments)]
pub struct NewComment {
    pub post_id: i64,
    pub user_id: i64,
    pub text: Option<String>,
    pub parent_id: Option<i64>,
    pub created_date: DateTime<Utc>,
}

#[derive(Debug, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = comment_likes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CommentLike {
    pub id: i64,
    pub comment_id: i64,
    pub user_id: i64,
    pub liked: bool,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = comment_likes)]
pub struct NewCommentLike {
    pub comment_id: i64,
    pub user_id: i64,
    pub liked: bool,
}
