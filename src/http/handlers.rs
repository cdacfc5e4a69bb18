use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use url::Url;
use uuid::Uuid;

use crate::app::images::{ImageChanges, ImageService, NewImage};
use crate::app::videos::{NewVideo, VideoChanges, VideoService};
use crate::domain::transformation::{Transformation, TransformationInput, VideoTransformation};
use crate::http::auth::{expired_session_cookie, session_cookie};
use crate::http::extract::{ApiJson, ApiQuery};
use crate::http::{AppError, AuthUser};
use crate::infra::imagekit::UploadAuth;
use crate::AppState;

const MAX_PASSWORD_LEN: usize = 128;
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

#[derive(Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

fn parse_id(query: IdQuery, kind: &str) -> Result<Uuid, AppError> {
    let id = query
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::bad_request(format!("{} id is required", kind)))?;
    Uuid::parse_str(id.trim()).map_err(|_| AppError::bad_request(format!("invalid {} id", kind)))
}

fn require_url(field: &str, value: &str) -> Result<(), AppError> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(AppError::bad_request(format!(
            "{} must be an absolute http(s) URL",
            field
        ))),
    }
}

fn non_blank(value: Option<String>, field: &str) -> Result<Option<String>, AppError> {
    match value {
        Some(value) if value.trim().is_empty() => {
            Err(AppError::bad_request(format!("{} cannot be empty", field)))
        }
        other => Ok(other),
    }
}

fn validate_transformation(input: &Option<TransformationInput>) -> Result<(), AppError> {
    if let Some(input) = input {
        input.validate().map_err(AppError::bad_request)?;
    }
    Ok(())
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = match state.db.ping().await {
        Ok(()) => "ok",
        Err(err) => {
            tracing::warn!(error = ?err, "database ping failed");
            "degraded"
        }
    };

    Json(HealthResponse { status })
}

pub async fn not_found() -> AppError {
    AppError::not_found("not found")
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: crate::domain::user::User,
}

fn normalize_email(email: &str) -> Result<String, AppError> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.contains('@'),
        None => false,
    };
    if !valid {
        return Err(AppError::bad_request("invalid email address"));
    }
    Ok(email)
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request("email and password are required"));
    }
    let email = normalize_email(&payload.email)?;
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request("password must be at least 8 characters"));
    }
    if payload.password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::bad_request("password must be at most 128 characters"));
    }

    let user = state
        .auth_service()
        .register(&email, &payload.password)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to register user");
            AppError::internal("failed to register user")
        })?;

    match user {
        Some(user) => {
            tracing::info!(user_id = %user.id, "user registered");
            Ok((
                StatusCode::CREATED,
                Json(RegisterResponse {
                    message: "user registered successfully",
                    user,
                }),
            ))
        }
        None => Err(AppError::bad_request("user already exists")),
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub access_expires_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub refresh_expires_at: OffsetDateTime,
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<(CookieJar, Json<AuthTokenResponse>), AppError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request("email and password are required"));
    }
    if payload.password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::bad_request("password must be at most 128 characters"));
    }

    let service = state.auth_service();
    let email = payload.email.trim().to_lowercase();
    let tokens = service
        .login(&email, &payload.password)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to login");
            AppError::internal("failed to login")
        })?
        .ok_or_else(|| AppError::unauthorized("invalid credentials"))?;

    let cookie = session_cookie(
        tokens.access_token.clone(),
        service.access_ttl(),
        state.secure_cookies,
    );

    Ok((
        jar.add(cookie),
        Json(AuthTokenResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            access_expires_at: tokens.access_expires_at,
            refresh_expires_at: tokens.refresh_expires_at,
        }),
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> Result<(CookieJar, Json<AuthTokenResponse>), AppError> {
    if payload.refresh_token.trim().is_empty() {
        return Err(AppError::bad_request("refreshToken is required"));
    }

    let service = state.auth_service();
    let tokens = service
        .refresh(payload.refresh_token.trim())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to refresh token");
            AppError::internal("failed to refresh token")
        })?
        .ok_or_else(|| AppError::unauthorized("invalid refresh token"))?;

    let cookie = session_cookie(
        tokens.access_token.clone(),
        service.access_ttl(),
        state.secure_cookies,
    );

    Ok((
        jar.add(cookie),
        Json(AuthTokenResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            access_expires_at: tokens.access_expires_at,
            refresh_expires_at: tokens.refresh_expires_at,
        }),
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    pub refresh_token: Option<String>,
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Option<ApiJson<LogoutRequest>>,
) -> Result<(CookieJar, StatusCode), AppError> {
    let refresh_token = payload
        .and_then(|ApiJson(payload)| payload.refresh_token)
        .filter(|token| !token.trim().is_empty());

    if let Some(refresh_token) = refresh_token {
        let revoked = state
            .auth_service()
            .revoke_refresh_token(refresh_token.trim())
            .await
            .map_err(|err| {
                tracing::error!(error = ?err, "failed to revoke token");
                AppError::internal("failed to revoke token")
            })?;
        tracing::debug!(revoked, "refresh token revocation");
    }

    Ok((
        jar.add(expired_session_cookie(state.secure_cookies)),
        StatusCode::NO_CONTENT,
    ))
}

pub async fn get_current_user(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<crate::domain::user::User>, AppError> {
    let user = state
        .auth_service()
        .get_current_user(auth.user_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = %auth.user_id, "failed to fetch current user");
            AppError::internal("failed to fetch current user")
        })?;

    match user {
        Some(user) => Ok(Json(user)),
        None => Err(AppError::not_found("user not found")),
    }
}

pub async fn imagekit_auth(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UploadAuth>, AppError> {
    let signer = state.imagekit.as_ref().ok_or_else(|| {
        tracing::error!("missing ImageKit configuration");
        AppError::internal(
            "ImageKit configuration is missing. Please check your environment variables.",
        )
    })?;

    let params = signer.upload_auth().map_err(|err| {
        tracing::error!(error = ?err, user_id = %auth.user_id, "failed to sign upload");
        AppError::internal("authentication failed for ImageKit")
    })?;

    Ok(Json(params))
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateImageRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub thumbnail_url: String,
    pub transformation: Option<TransformationInput>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateImageRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub transformation: Option<TransformationInput>,
}

pub async fn list_images(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> Result<Response, AppError> {
    let service = ImageService::new(state.db.clone());

    if query.id.is_some() {
        let image_id = parse_id(query, "image")?;
        let image = service.get(image_id).await.map_err(|err| {
            tracing::error!(error = ?err, image_id = %image_id, "failed to fetch image");
            AppError::internal("failed to fetch image")
        })?;
        return match image {
            Some(image) => Ok(Json(image).into_response()),
            None => Err(AppError::not_found("image not found")),
        };
    }

    let images = service.list().await.map_err(|err| {
        tracing::error!(error = ?err, "failed to fetch images");
        AppError::internal("failed to fetch images")
    })?;

    Ok(Json(images).into_response())
}

pub async fn create_image(
    auth: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateImageRequest>,
) -> Result<Json<crate::domain::image::Image>, AppError> {
    if payload.title.trim().is_empty()
        || payload.description.trim().is_empty()
        || payload.image_url.trim().is_empty()
        || payload.thumbnail_url.trim().is_empty()
    {
        return Err(AppError::bad_request(
            "title, description, imageUrl and thumbnailUrl are required",
        ));
    }
    require_url("imageUrl", payload.image_url.trim())?;
    require_url("thumbnailUrl", payload.thumbnail_url.trim())?;
    validate_transformation(&payload.transformation)?;

    let transformation = payload
        .transformation
        .unwrap_or_default()
        .apply_to(&Transformation::default());

    let service = ImageService::new(state.db.clone());
    let image = service
        .create(
            auth.user_id,
            NewImage {
                title: payload.title,
                description: payload.description,
                image_url: payload.image_url.trim().to_string(),
                thumbnail_url: payload.thumbnail_url.trim().to_string(),
                transformation,
            },
        )
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, owner_id = %auth.user_id, "failed to create image");
            AppError::internal("failed to create image")
        })?;

    tracing::info!(image_id = %image.id, owner_id = %auth.user_id, "image created");
    Ok(Json(image))
}

pub async fn update_image(
    auth: AuthUser,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<IdQuery>,
    ApiJson(payload): ApiJson<UpdateImageRequest>,
) -> Result<Json<crate::domain::image::Image>, AppError> {
    let image_id = parse_id(query, "image")?;

    let changes = ImageChanges {
        title: non_blank(payload.title, "title")?,
        description: non_blank(payload.description, "description")?,
        image_url: non_blank(payload.image_url, "imageUrl")?,
        thumbnail_url: non_blank(payload.thumbnail_url, "thumbnailUrl")?,
        transformation: payload.transformation,
    };
    if let Some(image_url) = &changes.image_url {
        require_url("imageUrl", image_url)?;
    }
    if let Some(thumbnail_url) = &changes.thumbnail_url {
        require_url("thumbnailUrl", thumbnail_url)?;
    }
    validate_transformation(&changes.transformation)?;

    let service = ImageService::new(state.db.clone());
    let image = service
        .update(image_id, auth.user_id, changes)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, image_id = %image_id, "failed to update image");
            AppError::internal("failed to update image")
        })?;

    match image {
        Some(image) => Ok(Json(image)),
        None => Err(AppError::not_found("image not found or access denied")),
    }
}

pub async fn delete_image(
    auth: AuthUser,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> Result<StatusCode, AppError> {
    let image_id = parse_id(query, "image")?;

    let service = ImageService::new(state.db.clone());
    let deleted = service
        .delete(image_id, auth.user_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, image_id = %image_id, "failed to delete image");
            AppError::internal("failed to delete image")
        })?;

    if deleted {
        tracing::info!(image_id = %image_id, owner_id = %auth.user_id, "image deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("image not found or access denied"))
    }
}

// ---------------------------------------------------------------------------
// Videos
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVideoRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub video_url: String,
    #[serde(default)]
    pub thumbnail_url: String,
    pub controls: Option<bool>,
    pub transformation: Option<TransformationInput>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVideoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub controls: Option<bool>,
    pub transformation: Option<TransformationInput>,
}

pub async fn list_videos(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> Result<Response, AppError> {
    let service = VideoService::new(state.db.clone());

    if query.id.is_some() {
        let video_id = parse_id(query, "video")?;
        let video = service.get(video_id).await.map_err(|err| {
            tracing::error!(error = ?err, video_id = %video_id, "failed to fetch video");
            AppError::internal("failed to fetch video")
        })?;
        return match video {
            Some(video) => Ok(Json(video).into_response()),
            None => Err(AppError::not_found("video not found")),
        };
    }

    let videos = service.list().await.map_err(|err| {
        tracing::error!(error = ?err, "failed to fetch videos");
        AppError::internal("failed to fetch videos")
    })?;

    Ok(Json(videos).into_response())
}

pub async fn create_video(
    auth: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateVideoRequest>,
) -> Result<Json<crate::domain::video::Video>, AppError> {
    if payload.title.trim().is_empty()
        || payload.description.trim().is_empty()
        || payload.video_url.trim().is_empty()
        || payload.thumbnail_url.trim().is_empty()
    {
        return Err(AppError::bad_request(
            "title, description, videoUrl and thumbnailUrl are required",
        ));
    }
    require_url("videoUrl", payload.video_url.trim())?;
    require_url("thumbnailUrl", payload.thumbnail_url.trim())?;
    validate_transformation(&payload.transformation)?;

    let transformation = payload
        .transformation
        .unwrap_or_default()
        .apply_to_video(&VideoTransformation::default());

    let service = VideoService::new(state.db.clone());
    let video = service
        .create(
            auth.user_id,
            NewVideo {
                title: payload.title,
                description: payload.description,
                video_url: payload.video_url.trim().to_string(),
                thumbnail_url: payload.thumbnail_url.trim().to_string(),
                controls: payload.controls.unwrap_or(true),
                transformation,
            },
        )
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, owner_id = %auth.user_id, "failed to create video");
            AppError::internal("failed to create video")
        })?;

    tracing::info!(video_id = %video.id, owner_id = %auth.user_id, "video created");
    Ok(Json(video))
}

pub async fn update_video(
    auth: AuthUser,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<IdQuery>,
    ApiJson(payload): ApiJson<UpdateVideoRequest>,
) -> Result<Json<crate::domain::video::Video>, AppError> {
    let video_id = parse_id(query, "video")?;

    let changes = VideoChanges {
        title: non_blank(payload.title, "title")?,
        description: non_blank(payload.description, "description")?,
        video_url: non_blank(payload.video_url, "videoUrl")?,
        thumbnail_url: non_blank(payload.thumbnail_url, "thumbnailUrl")?,
        controls: payload.controls,
        transformation: payload.transformation,
    };
    if let Some(video_url) = &changes.video_url {
        require_url("videoUrl", video_url)?;
    }
    if let Some(thumbnail_url) = &changes.thumbnail_url {
        require_url("thumbnailUrl", thumbnail_url)?;
    }
    validate_transformation(&changes.transformation)?;

    let service = VideoService::new(state.db.clone());
    let video = service
        .update(video_id, auth.user_id, changes)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, video_id = %video_id, "failed to update video");
            AppError::internal("failed to update video")
        })?;

    match video {
        Some(video) => Ok(Json(video)),
        None => Err(AppError::not_found("video not found or access denied")),
    }
}

pub async fn delete_video(
    auth: AuthUser,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> Result<StatusCode, AppError> {
    let video_id = parse_id(query, "video")?;

    let service = VideoService::new(state.db.clone());
    let deleted = service
        .delete(video_id, auth.user_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, video_id = %video_id, "failed to delete video");
            AppError::internal("failed to delete video")
        })?;

    if deleted {
        tracing::info!(video_id = %video_id, owner_id = %auth.user_id, "video deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("video not found or access denied"))
    }
}
