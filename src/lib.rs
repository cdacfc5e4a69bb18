pub mod app;
pub mod config;
pub mod domain;
pub mod http;
pub mod infra;

use std::path::PathBuf;

use crate::app::auth::AuthService;
use crate::config::AppConfig;
use crate::infra::{db::Db, imagekit::ImageKitSigner};

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub paseto_access_key: [u8; 32],
    pub paseto_refresh_key: [u8; 32],
    pub access_ttl_minutes: u64,
    pub refresh_ttl_days: u64,
    pub imagekit: Option<ImageKitSigner>,
    pub secure_cookies: bool,
    pub static_dir: Option<PathBuf>,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(config: &AppConfig, db: Db) -> Self {
        Self {
            db,
            paseto_access_key: config.paseto_access_key,
            paseto_refresh_key: config.paseto_refresh_key,
            access_ttl_minutes: config.access_ttl_minutes,
            refresh_ttl_days: config.refresh_ttl_days,
            imagekit: config.imagekit.as_ref().map(ImageKitSigner::new),
            secure_cookies: config.secure_cookies,
            static_dir: config.static_dir.clone(),
            max_body_bytes: config.max_body_bytes,
        }
    }

    pub fn auth_service(&self) -> AuthService {
        AuthService::new(
            self.db.clone(),
            self.paseto_access_key,
            self.paseto_refresh_key,
            self.access_ttl_minutes,
            self.refresh_ttl_days,
        )
    }
}
