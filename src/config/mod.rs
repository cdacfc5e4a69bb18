use anyhow::{anyhow, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

/// Upload tokens signed for the CDN are rejected when they expire more than
/// an hour out.
const MAX_IMAGEKIT_AUTH_TTL_SECONDS: u64 = 3600;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub http_addr: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_connect_timeout_seconds: u64,
    pub db_idle_timeout_seconds: u64,
    pub db_max_lifetime_seconds: u64,
    pub run_migrations: bool,
    pub paseto_access_key: [u8; 32],
    pub paseto_refresh_key: [u8; 32],
    pub access_ttl_minutes: u64,
    pub refresh_ttl_days: u64,
    pub imagekit: Option<ImageKitConfig>,
    pub secure_cookies: bool,
    pub static_dir: Option<PathBuf>,
    pub max_body_bytes: usize,
}

#[derive(Clone, Debug)]
pub struct ImageKitConfig {
    pub public_key: String,
    pub private_key: String,
    pub auth_ttl_seconds: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let http_addr = env.or("HTTP_ADDR", "0.0.0.0:8080");
        SocketAddr::from_str(&http_addr).map_err(|err| anyhow!("invalid HTTP_ADDR: {}", err))?;

        Ok(Self {
            http_addr,
            database_url: env.required("DATABASE_URL")?,
            db_max_connections: env.parse_or("DB_MAX_CONNECTIONS", "10")?,
            db_connect_timeout_seconds: env.parse_or("DB_CONNECT_TIMEOUT_SECONDS", "5")?,
            db_idle_timeout_seconds: env.parse_or("DB_IDLE_TIMEOUT_SECONDS", "300")?,
            db_max_lifetime_seconds: env.parse_or("DB_MAX_LIFETIME_SECONDS", "1800")?,
            run_migrations: env.parse_or("RUN_MIGRATIONS", "true")?,
            paseto_access_key: decode_key_32(
                "PASETO_ACCESS_KEY",
                &env.required("PASETO_ACCESS_KEY")?,
            )?,
            paseto_refresh_key: decode_key_32(
                "PASETO_REFRESH_KEY",
                &env.required("PASETO_REFRESH_KEY")?,
            )?,
            access_ttl_minutes: env.parse_or("ACCESS_TTL_MINUTES", "60")?,
            refresh_ttl_days: env.parse_or("REFRESH_TTL_DAYS", "30")?,
            imagekit: imagekit_config(&env)?,
            secure_cookies: env.parse_or("SECURE_COOKIES", "true")?,
            static_dir: env.optional("STATIC_DIR").map(PathBuf::from),
            max_body_bytes: env.parse_or("MAX_BODY_BYTES", "1048576")?,
        })
    }
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|value| !value.trim().is_empty())
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn required(&self, key: &str) -> Result<String> {
        self.optional(key)
            .ok_or_else(|| anyhow!("missing required env var: {}", key))
    }

    fn parse_or<T>(&self, key: &str, default: &str) -> Result<T>
    where
        T: FromStr,
        <T as FromStr>::Err: std::fmt::Display,
    {
        self.or(key, default)
            .parse::<T>()
            .map_err(|err| anyhow!("invalid {}: {}", key, err))
    }
}

fn imagekit_config<F>(env: &Env<F>) -> Result<Option<ImageKitConfig>>
where
    F: Fn(&str) -> Option<String>,
{
    let auth_ttl_seconds: u64 = env.parse_or("IMAGEKIT_AUTH_TTL_SECONDS", "1800")?;
    if auth_ttl_seconds == 0 || auth_ttl_seconds > MAX_IMAGEKIT_AUTH_TTL_SECONDS {
        return Err(anyhow!(
            "invalid IMAGEKIT_AUTH_TTL_SECONDS: must be between 1 and {}",
            MAX_IMAGEKIT_AUTH_TTL_SECONDS
        ));
    }

    match (
        env.optional("IMAGEKIT_PUBLIC_KEY"),
        env.optional("IMAGEKIT_PRIVATE_KEY"),
    ) {
        (Some(public_key), Some(private_key)) => Ok(Some(ImageKitConfig {
            public_key,
            private_key,
            auth_ttl_seconds,
        })),
        _ => Ok(None),
    }
}

fn decode_key_32(key: &str, value: &str) -> Result<[u8; 32]> {
    let decoded = STANDARD
        .decode(value.trim().as_bytes())
        .map_err(|err| anyhow!("invalid {}: {}", key, err))?;
    if decoded.len() != 32 {
        return Err(anyhow!("invalid {}: expected 32 bytes", key));
    }
    let mut key_bytes = [0u8; 32];
    key_bytes.copy_from_slice(&decoded);
    Ok(key_bytes)
}
