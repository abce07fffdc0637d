use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use super::AuthError;
use crate::models::enums::Role;

type HmacSha256 = Hmac<Sha256>;

/// Bearer token payload: who the caller is and until when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: i64,
}

/// Issues and verifies HMAC-SHA256 signed bearer tokens.
///
/// Token format: `base64url(claims_json).base64url(mac)`.
pub struct TokenSigner {
    secret: Vec<u8>,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    pub fn issue(&self, user_id: Uuid, role: Role) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user_id,
            role,
            exp: (Utc::now() + self.ttl).timestamp(),
        };
        let payload = serde_json::to_vec(&claims).map_err(|e| AuthError::Hash(e.to_string()))?;
        let encoded = URL_SAFE_NO_PAD.encode(&payload);
        Ok(format!("{}.{}", encoded, self.sign(encoded.as_bytes())))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let (payload, mac) = token.split_once('.').ok_or(AuthError::TokenMalformed)?;

        let expected = URL_SAFE_NO_PAD
            .decode(mac)
            .map_err(|_| AuthError::TokenMalformed)?;
        let mut hasher = self.mac();
        hasher.update(payload.as_bytes());
        hasher
            .verify_slice(&expected)
            .map_err(|_| AuthError::BadSignature)?;

        let decoded = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::TokenMalformed)?;
        let claims: Claims =
            serde_json::from_slice(&decoded).map_err(|_| AuthError::TokenMalformed)?;

        if claims.exp < Utc::now().timestamp() {
            return Err(AuthError::TokenExpired);
        }
        Ok(claims)
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length
        HmacSha256::new_from_slice(&self.secret).expect("hmac key")
    }

    fn sign(&self, payload: &[u8]) -> String {
        let mut hasher = self.mac();
        hasher.update(payload);
        URL_SAFE_NO_PAD.encode(hasher.finalize().into_bytes())
    }
}
