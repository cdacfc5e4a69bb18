use anyhow::{anyhow, Result};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha1::Sha1;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::config::ImageKitConfig;

type HmacSha1 = Hmac<Sha1>;

/// Client-side upload credentials. The browser hands these to the CDN
/// alongside the file; the private key never leaves the server.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadAuth {
    pub token: String,
    pub expire: i64,
    pub signature: String,
    pub public_key: String,
}

#[derive(Clone)]
pub struct ImageKitSigner {
    public_key: String,
    private_key: String,
    ttl_seconds: i64,
}

impl ImageKitSigner {
    pub fn new(config: &ImageKitConfig) -> Self {
        Self {
            public_key: config.public_key.clone(),
            private_key: config.private_key.clone(),
            ttl_seconds: config.auth_ttl_seconds as i64,
        }
    }

    pub fn upload_auth(&self) -> Result<UploadAuth> {
        let token = Uuid::new_v4().to_string();
        let expire = OffsetDateTime::now_utc().unix_timestamp() + self.ttl_seconds;
        self.upload_auth_with(token, expire)
    }

    pub fn upload_auth_with(&self, token: String, expire: i64) -> Result<UploadAuth> {
        let signature = sign(&self.private_key, &format!("{}{}", token, expire))?;
        Ok(UploadAuth {
            token,
            expire,
            signature,
            public_key: self.public_key.clone(),
        })
    }
}

fn sign(private_key: &str, payload: &str) -> Result<String> {
    let mut mac = HmacSha1::new_from_slice(private_key.as_bytes())
        .map_err(|err| anyhow!("invalid signing key: {}", err))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer(ttl: u64) -> ImageKitSigner {
        ImageKitSigner::new(&ImageKitConfig {
            public_key: "public_test".to_string(),
            private_key: "private_test".to_string(),
            auth_ttl_seconds: ttl,
        })
    }

    #[test]
    fn hmac_sha1_matches_rfc2202_vector() {
        assert_eq!(
            sign("Jefe", "what do ya want for nothing?").unwrap(),
            "effcdf6ae5eb2fa2d27416d5f184df9c259a7c79"
        );
    }

    #[test]
    fn signature_covers_token_and_expire() {
        let auth = signer(1800)
            .upload_auth_with("abc".to_string(), 1_700_000_000)
            .unwrap();
        assert_eq!(auth.signature, sign("private_test", "abc1700000000").unwrap());
        assert_eq!(auth.public_key, "public_test");

        let other = signer(1800)
            .upload_auth_with("abc".to_string(), 1_700_000_001)
            .unwrap();
        assert_ne!(auth.signature, other.signature);
    }

    #[test]
    fn upload_auth_expires_after_ttl() {
        let before = OffsetDateTime::now_utc().unix_timestamp();
        let auth = signer(600).upload_auth().unwrap();
        let after = OffsetDateTime::now_utc().unix_timestamp();

        assert!(auth.expire >= before + 600 && auth.expire <= after + 600);
        assert!(Uuid::parse_str(&auth.token).is_ok());
        assert_eq!(auth.signature.len(), 40);
    }

    #[test]
    fn serializes_with_client_field_names() {
        let auth = signer(60).upload_auth_with("t".to_string(), 1).unwrap();
        let json = serde_json::to_value(&auth).unwrap();
        assert_eq!(json["publicKey"], "public_test");
        assert_eq!(json["expire"], 1);
        assert!(json["signature"].is_string());
    }
}
