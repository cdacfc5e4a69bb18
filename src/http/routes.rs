use axum::{routing::get, routing::post, Router};

use crate::http::handlers;
use crate::AppState;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn auth() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/refresh", post(handlers::refresh_token))
        .route("/api/auth/logout", post(handlers::logout))
        .route("/api/auth/me", get(handlers::get_current_user))
        .route("/api/auth/imagekit-auth", get(handlers::imagekit_auth))
}

pub fn images() -> Router<AppState> {
    Router::new().route(
        "/api/image",
        get(handlers::list_images)
            .post(handlers::create_image)
            .put(handlers::update_image)
            .delete(handlers::delete_image),
    )
}

pub fn videos() -> Router<AppState> {
    Router::new().route(
        "/api/video",
        get(handlers::list_videos)
            .post(handlers::create_video)
            .put(handlers::update_video)
            .delete(handlers::delete_video),
    )
}
