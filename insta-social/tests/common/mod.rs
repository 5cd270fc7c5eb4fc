//! Database fixtures for integration tests.
//!
//! Tests run against `TEST_DATABASE_URL` inside a transaction that is
//! never committed. Without the variable they are skipped.

#![allow(dead_code)]

use std::sync::OnceLock;

use diesel::pg::PgConnection;
use diesel::prelude::*;

use insta_social::models::{Comment, Post, User};
use insta_social::run_migrations;
use insta_social::services::comment_service::{self, CreateComment};
use insta_social::services::post_service::{self, CreatePost};
use insta_social::services::user_service::{self, CreateUser};

static MIGRATED: OnceLock<()> = OnceLock::new();

/// Opens a connection with an uncommitted test transaction, or `None` if no
/// test database is configured.
pub fn test_connection() -> Option<PgConnection> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return None;
    };

    MIGRATED.get_or_init(|| {
        let mut conn = PgConnection::establish(&url).expect("connect for migrations");
        run_migrations(&mut conn).expect("run migrations");
    });

    let mut conn = PgConnection::establish(&url).expect("connect to test database");
    conn.begin_test_transaction().expect("begin test transaction");
    Some(conn)
}

pub fn create_user(conn: &mut PgConnection, username: &str) -> User {
    user_service::create_user(
        conn,
        CreateUser {
            username: username.to_string(),
            first_name: None,
            last_name: None,
            email: format!("{username}@example.com"),
            password: "letters4nddigits".to_string(),
            bio: None,
            user_image: None,
            user_link: None,
        },
    )
    .expect("create user")
}

pub fn create_post(conn: &mut PgConnection, author: &User, description: &str) -> Post {
    post_service::create_post(
        conn,
        author.id,
        CreatePost {
            description: Some(description.to_string()),
            hashtag: None,
            contents: vec![format!("media/{description}.jpg")],
        },
    )
    .expect("create post")
}

pub fn comment(conn: &mut PgConnection, author: &User, post: &Post, text: &str, parent: Option<&Comment>) -> Comment {
    comment_service::create_comment(
        conn,
        author.id,
        CreateComment {
            post_id: post.id,
            text: Some(text.to_string()),
            parent_id: parent.map(|c| c.id),
        },
    )
    .expect("create comment")
}
