pub mod config;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;

use std::sync::Arc;

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use diesel::pg::PgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowHeaders, AllowMethods, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use insta_shared::clients::db::DbPool;
use insta_shared::middleware::{metrics_middleware, AuthState, JwtVerifier};

use config::AppConfig;
use routes::{comments, follows, health, likes, posts, users};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub jwt: JwtVerifier,
    /// `None` when no recorder is installed, e.g. in tests.
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(db: DbPool, config: AppConfig, metrics_handle: Option<PrometheusHandle>) -> Self {
        let jwt = JwtVerifier::new(&config.jwt_secret);
        Self { db, config, jwt, metrics_handle }
    }
}

impl AuthState for AppState {
    fn jwt_verifier(&self) -> &JwtVerifier {
        &self.jwt
    }
}

pub fn run_migrations(conn: &mut PgConnection) -> anyhow::Result<()> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("migration failed: {e}"))?;
    for version in &applied {
        tracing::info!(version = %version, "applied migration");
    }
    Ok(())
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))
        .route("/users", post(users::create_user).get(users::list_users))
        .route("/users/me", get(users::get_me).patch(users::update_me))
        .route("/users/:id", get(users::get_user))
        .route("/users/:id/follow", post(follows::follow_user).delete(follows::unfollow_user))
        .route("/users/:id/followers", get(follows::list_followers))
        .route("/users/:id/following", get(follows::list_following))
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route("/posts/:id", get(posts::get_post).delete(posts::delete_post))
        .route("/posts/:id/like", post(likes::toggle_post_like))
        .route("/comments", get(comments::list_comments).post(comments::create_comment))
        .route(
            "/comments/:id",
            get(comments::get_comment)
                .patch(comments::update_comment)
                .delete(comments::delete_comment),
        )
        .route("/comments/:id/like", post(likes::toggle_comment_like))
        .layer(axum::middleware::from_fn(metrics_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(AllowMethods::list([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ]))
                .allow_headers(AllowHeaders::list([
                    header::AUTHORIZATION,
                    header::CONTENT_TYPE,
                    header::ACCEPT,
                ])),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
