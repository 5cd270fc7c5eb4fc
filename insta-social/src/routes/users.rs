use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use validator::{Validate, ValidationError};

use insta_shared::errors::{AppError, AppResult};
use insta_shared::middleware::OptionalAuthUser;
use insta_shared::types::auth::{AuthUser, Viewer};
use insta_shared::types::ApiResponse;

use crate::models::UpdateUser;
use crate::services::user_service::{self, CreateUser, UserDetail, UserListItem};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 150), custom = "validate_username")]
    pub username: String,
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    #[validate(email(message = "invalid email format"), length(max = 254))]
    pub email: String,
    pub password: String,
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
    pub user_image: Option<String>,
    #[validate(url(message = "invalid link"))]
    pub user_link: Option<String>,
}

/// Letters, digits and `@.+-_` only.
fn validate_username(username: &str) -> Result<(), ValidationError> {
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if username.chars().all(allowed) {
        Ok(())
    } else {
        Err(ValidationError::new("username_characters"))
    }
}

// --- POST /users ---

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<UserDetail>>)> {
    req.validate()?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let user = user_service::create_user(
        &mut conn,
        CreateUser {
            username: req.username,
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            password: req.password,
            bio: req.bio,
            user_image: req.user_image,
            user_link: req.user_link,
        },
    )?;
    let detail = user_service::user_detail(&mut conn, user, Viewer::Anonymous, true)?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(detail))))
}

// --- GET /users ---

pub async fn list_users(
    auth: OptionalAuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<UserListItem>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let users = user_service::list_users(&mut conn, auth.viewer())?;
    Ok(Json(ApiResponse::ok(users)))
}

// --- GET /users/me ---

pub async fn get_me(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<UserDetail>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let me = user_service::find_user(&mut conn, user.id)?;
    let detail = user_service::user_detail(&mut conn, me, Viewer::from(&user), true)?;

    Ok(Json(ApiResponse::ok(detail)))
}

// --- PATCH /users/me ---

pub async fn update_me(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(changes): Json<UpdateUser>,
) -> AppResult<Json<ApiResponse<UserDetail>>> {
    changes.validate()?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let updated = user_service::update_user(&mut conn, user.id, &changes)?;
    let detail = user_service::user_detail(&mut conn, updated, Viewer::from(&user), true)?;

    Ok(Json(ApiResponse::ok(detail)))
}

// --- GET /users/:id ---

pub async fn get_user(
    auth: OptionalAuthUser,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<ApiResponse<UserDetail>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let viewer = auth.viewer();
    let user = user_service::find_user(&mut conn, user_id)?;
    let detail = user_service::user_detail(&mut conn, user, viewer, viewer.user_id() == Some(user_id))?;

    Ok(Json(ApiResponse::ok(detail)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, email: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: username.into(),
            first_name: None,
            last_name: None,
            email: email.into(),
            password: "letters4nddigits".into(),
            bio: None,
            user_image: None,
            user_link: None,
        }
    }

    #[test]
    fn usernames_allow_the_usual_punctuation() {
        assert!(request("ada.lovelace+1@x_y-z", "ada@example.com").validate().is_ok());
        assert!(request("ada lovelace", "ada@example.com").validate().is_err());
        assert!(request("", "ada@example.com").validate().is_err());
    }

    #[test]
    fn email_and_link_are_checked() {
        assert!(request("ada", "nope").validate().is_err());

        let mut req = request("ada", "ada@example.com");
        req.user_link = Some("not a url".into());
        assert!(req.validate().is_err());

        req.user_link = Some("https://example.com/ada".into());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn email_must_fit_the_column() {
        // Syntactically valid, but longer than 254 characters.
        let label = "b".repeat(60);
        let long = format!("{}@{label}.{label}.{label}.{label}.com", "a".repeat(64));
        assert!(long.len() > 254);

        let errors = request("ada", &long).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));

        let fits = format!("{}@example.com", "a".repeat(64));
        assert!(request("ada", &fits).validate().is_ok());
    }

    #[test]
    fn display_names_are_bounded() {
        let mut req = request("ada", "ada@example.com");
        req.first_name = Some("Ada".into());
        req.last_name = Some("L".repeat(151));
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("last_name"));

        req.last_name = Some("Lovelace".into());
        assert!(req.validate().is_ok());

        let changes = UpdateUser { first_name: Some("x".repeat(151)), ..UpdateUser::default() };
        assert!(changes.validate().is_err());
        assert!(!changes.is_empty());
    }

    #[test]
    fn password_strength_is_checked_once_by_the_service() {
        // The request layer only checks shape; the service owns password rules.
        let mut req = request("ada", "ada@example.com");
        req.password = "short".into();
        assert!(req.validate().is_ok());
        assert!(user_service::validate_password(&req.password).is_err());
    }
}
