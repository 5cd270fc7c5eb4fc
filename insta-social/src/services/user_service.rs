use std::collections::HashMap;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde::Serialize;

use insta_shared::errors::{AppError, AppResult, ErrorCode};
use insta_shared::types::auth::Viewer;

use crate::models::{NewUser, UpdateUser, User, UserSummary};
use crate::schema::users;
use crate::services::counters::{self, UserCounts};
use crate::services::engagement;

/// Public profile with aggregate counts and the viewer's follow state.
#[derive(Debug, Serialize)]
pub struct UserDetail {
    pub id: i64,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub bio: Option<String>,
    pub user_image: Option<String>,
    pub is_official: bool,
    pub user_link: Option<String>,
    pub date_registered: DateTime<Utc>,
    #[serde(flatten)]
    pub counts: UserCounts,
    pub is_following: bool,
}

#[derive(Debug, Serialize)]
pub struct UserListItem {
    #[serde(flatten)]
    pub user: UserSummary,
    #[serde(flatten)]
    pub counts: UserCounts,
    pub is_following: bool,
}

pub struct CreateUser {
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub password: String,
    pub bio: Option<String>,
    pub user_image: Option<String>,
    pub user_link: Option<String>,
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::internal(format!("password hashing failed: {e}")))
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.len() < 8 {
        return Err(AppError::new(ErrorCode::ValidationError, "password must be at least 8 characters"));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::new(ErrorCode::ValidationError, "password must contain at least one number"));
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err(AppError::new(ErrorCode::ValidationError, "password must contain at least one letter"));
    }
    Ok(())
}

pub fn create_user(conn: &mut PgConnection, input: CreateUser) -> AppResult<User> {
    validate_password(&input.password)?;

    let taken: bool = users::table
        .filter(users::username.eq(&input.username))
        .count()
        .get_result::<i64>(conn)
        .map(|c| c > 0)?;

    if taken {
        return Err(AppError::new(ErrorCode::UsernameTaken, "username is already taken"));
    }

    let new_user = NewUser {
        username: input.username,
        first_name: input.first_name,
        last_name: input.last_name,
        email: input.email.to_lowercase(),
        password_hash: hash_password(&input.password)?,
        bio: input.bio,
        user_image: input.user_image,
        user_link: input.user_link,
        date_registered: Utc::now(),
    };

    let user = diesel::insert_into(users::table)
        .values(&new_user)
        .returning(User::as_returning())
        .get_result(conn)?;

    tracing::info!(user_id = user.id, username = %user.username, "user created");

    Ok(user)
}

pub fn find_user(conn: &mut PgConnection, user_id: i64) -> AppResult<User> {
    users::table
        .find(user_id)
        .select(User::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "user not found"))
}

pub fn ensure_user_exists(conn: &mut PgConnection, user_id: i64) -> AppResult<()> {
    let exists: bool = diesel::select(diesel::dsl::exists(users::table.find(user_id))).get_result(conn)?;
    if exists {
        Ok(())
    } else {
        Err(AppError::new(ErrorCode::UserNotFound, "user not found"))
    }
}

/// Author cards keyed by user id. Unknown ids are absent.
pub fn summaries_by_id(conn: &mut PgConnection, user_ids: &[i64]) -> QueryResult<HashMap<i64, UserSummary>> {
    if user_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let summaries = users::table
        .filter(users::id.eq_any(user_ids))
        .select(UserSummary::as_select())
        .load::<UserSummary>(conn)?;
    Ok(summaries.into_iter().map(|u| (u.id, u)).collect())
}

/// `include_email` is only set when the viewer is the user themself.
pub fn user_detail(conn: &mut PgConnection, user: User, viewer: Viewer, include_email: bool) -> AppResult<UserDetail> {
    let counts = counters::user_counts(conn, user.id)?;
    let is_following = engagement::is_following(conn, viewer, user.id)?;

    Ok(UserDetail {
        id: user.id,
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
        email: include_email.then_some(user.email),
        bio: user.bio,
        user_image: user.user_image,
        is_official: user.is_official,
        user_link: user.user_link,
        date_registered: user.date_registered,
        counts,
        is_following,
    })
}

/// Wraps already-ordered summaries with counts and follow state.
pub fn list_items(conn: &mut PgConnection, summaries: Vec<UserSummary>, viewer: Viewer) -> AppResult<Vec<UserListItem>> {
    let ids: Vec<i64> = summaries.iter().map(|u| u.id).collect();
    let counts = counters::user_counts_for(conn, &ids)?;
    let followed = engagement::followed_user_ids(conn, viewer, &ids)?;

    Ok(summaries
        .into_iter()
        .map(|user| UserListItem {
            counts: counts.get(&user.id).copied().unwrap_or_default(),
            is_following: followed.contains(&user.id),
            user,
        })
        .collect())
}

pub fn list_users(conn: &mut PgConnection, viewer: Viewer) -> AppResult<Vec<UserListItem>> {
    let summaries = users::table
        .order(users::date_registered.desc())
        .select(UserSummary::as_select())
        .load::<UserSummary>(conn)?;
    list_items(conn, summaries, viewer)
}

pub fn update_user(conn: &mut PgConnection, user_id: i64, changes: &UpdateUser) -> AppResult<User> {
    if changes.is_empty() {
        return find_user(conn, user_id);
    }

    let updated = diesel::update(users::table.find(user_id))
        .set(changes)
        .returning(User::as_returning())
        .get_result(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "user not found"))?;

    tracing::info!(user_id = user_id, "user updated");

    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_is_salted_and_verifiable() {
        use argon2::password_hash::{PasswordHash, PasswordVerifier};

        let first = hash_password("hunter2hunter2").unwrap();
        let second = hash_password("hunter2hunter2").unwrap();
        assert_ne!(first, second);

        let parsed = PasswordHash::new(&first).unwrap();
        assert!(Argon2::default().verify_password(b"hunter2hunter2", &parsed).is_ok());
        assert!(Argon2::default().verify_password(b"wrong-password1", &parsed).is_err());
    }

    #[test]
    fn weak_passwords_are_rejected() {
        assert!(validate_password("short1").is_err());
        assert!(validate_password("nodigitshere").is_err());
        assert!(validate_password("1234567890").is_err());
        assert!(validate_password("letters4nddigits").is_ok());
    }

    #[test]
    fn detail_serializes_counts_flat() {
        let detail = UserDetail {
            id: 1,
            username: "ada".into(),
            first_name: Some("Ada".into()),
            last_name: None,
            email: None,
            bio: None,
            user_image: None,
            is_official: true,
            user_link: None,
            date_registered: Utc::now(),
            counts: UserCounts { followers_count: 3, following_count: 5, posts_count: 0 },
            is_following: false,
        };
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["followers_count"], 3);
        assert_eq!(json["following_count"], 5);
        assert_eq!(json["posts_count"], 0);
        assert!(json.get("email").is_none());
    }
}
