use axum::extract::DefaultBodyLimit;
use axum::http::HeaderName;
use axum::middleware::from_fn_with_state;
use axum::Router;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::AppState;

pub mod auth;
mod error;
mod extract;
mod handlers;
pub mod middleware;
mod routes;

pub use auth::AuthUser;
pub use error::AppError;

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

pub fn router(state: AppState) -> Router {
    let router = Router::new()
        .merge(routes::health())
        .merge(routes::auth())
        .merge(routes::images())
        .merge(routes::videos());

    // Everything that is not an API route is a frontend page.
    let router = match &state.static_dir {
        Some(dir) => router.fallback_service(
            ServeDir::new(dir)
                .append_index_html_on_directories(true)
                .fallback(ServeFile::new(dir.join("index.html"))),
        ),
        None => router.fallback(handlers::not_found),
    };

    router
        .layer(from_fn_with_state(
            state.clone(),
            middleware::session_gate::session_gate,
        ))
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
        .with_state(state)
}
