use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use crate::http::auth::session_token;
use crate::AppState;

pub const LOGIN_PATH: &str = "/login";

const PUBLIC_PREFIXES: &[&str] = &["/login", "/register", "/api", "/health"];
const ASSET_PREFIXES: &[&str] = &["/_next/static", "/_next/image", "/public"];

/// Redirects page requests without a valid session to the login page.
/// API routes answer for themselves with a 401 body.
pub async fn session_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if is_public_path(path) {
        return next.run(request).await;
    }

    let authenticated = match session_token(request.headers()) {
        Ok(Some(token)) => matches!(
            state.auth_service().authenticate_access_token(&token),
            Ok(Some(_))
        ),
        _ => false,
    };

    if authenticated {
        next.run(request).await
    } else {
        tracing::debug!(path, "redirecting unauthenticated page request");
        Redirect::temporary(&login_redirect(path)).into_response()
    }
}

pub fn is_public_path(path: &str) -> bool {
    path == "/"
        || path == "/favicon.ico"
        || PUBLIC_PREFIXES
            .iter()
            .chain(ASSET_PREFIXES)
            .any(|prefix| has_segment_prefix(path, prefix))
}

fn has_segment_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

fn login_redirect(path: &str) -> String {
    let callback: String = url::form_urlencoded::byte_serialize(path.as_bytes()).collect();
    format!("{}?callbackUrl={}", LOGIN_PATH, callback)
}
