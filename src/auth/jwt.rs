//! HS256 JWT encode/decode over a single shared secret.
//!
//! Header and payload must be JSON objects; segments are base64url without
//! padding.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("unsupported token header")]
    UnsupportedHeader,

    #[error("invalid token signature")]
    BadSignature,

    #[error("token expired")]
    Expired,

    #[error("invalid signing key")]
    InvalidKey,
}

#[derive(Debug, Serialize, Deserialize)]
struct JwtHeader {
    alg: String,
    typ: String,
}

/// Identity carried by every issued token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    #[serde(rename = "_id")]
    pub user_id: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: impl Into<String>, ttl_days: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Claims {
            user_id: user_id.into(),
            iat: now,
            exp: now + ttl_days * 24 * 60 * 60,
        }
    }
}

fn b64url_encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

fn b64url_decode(s: &str) -> Result<Vec<u8>, JwtError> {
    URL_SAFE_NO_PAD
        .decode(s.as_bytes())
        .map_err(|e| JwtError::Malformed(format!("invalid base64url: {e}")))
}

fn mac_for(secret: &[u8], signing_input: &str) -> Result<Hmac<Sha256>, JwtError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret).map_err(|_| JwtError::InvalidKey)?;
    mac.update(signing_input.as_bytes());
    Ok(mac)
}

pub fn encode_hs256<T: Serialize>(secret: &[u8], claims: &T) -> Result<String, JwtError> {
    let header = JwtHeader {
        alg: "HS256".to_string(),
        typ: "JWT".to_string(),
    };

    let header_json = serde_json::to_vec(&header).map_err(|e| JwtError::Malformed(e.to_string()))?;
    let claims_json = serde_json::to_vec(claims).map_err(|e| JwtError::Malformed(e.to_string()))?;

    let signing_input = format!("{}.{}", b64url_encode(&header_json), b64url_encode(&claims_json));
    let signature = mac_for(secret, &signing_input)?.finalize().into_bytes();

    Ok(format!("{signing_input}.{}", b64url_encode(&signature)))
}

/// Verifies the signature and returns the payload. Does not look at `exp`.
pub fn decode_hs256<T: DeserializeOwned>(secret: &[u8], token: &str) -> Result<T, JwtError> {
    let mut parts = token.trim().split('.');
    let (Some(header_b64), Some(payload_b64), Some(sig_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(JwtError::Malformed("expected three segments".to_string()));
    };

    let header: JwtHeader = serde_json::from_slice(&b64url_decode(header_b64)?)
        .map_err(|e| JwtError::Malformed(format!("invalid header: {e}")))?;
    if header.alg != "HS256" || !header.typ.eq_ignore_ascii_case("JWT") {
        return Err(JwtError::UnsupportedHeader);
    }

    let sig = b64url_decode(sig_b64)?;
    mac_for(secret, &format!("{header_b64}.{payload_b64}"))?
        .verify_slice(&sig)
        .map_err(|_| JwtError::BadSignature)?;

    serde_json::from_slice(&b64url_decode(payload_b64)?)
        .map_err(|e| JwtError::Malformed(format!("invalid payload: {e}")))
}

pub fn issue(secret: &[u8], user_id: &str, ttl_days: i64) -> Result<String, JwtError> {
    encode_hs256(secret, &Claims::new(user_id, ttl_days))
}

/// Decodes a token and rejects it once `exp` has passed.
pub fn verify(secret: &[u8], token: &str) -> Result<Claims, JwtError> {
    let claims: Claims = decode_hs256(secret, token)?;
    if claims.exp <= chrono::Utc::now().timestamp() {
        return Err(JwtError::Expired);
    }
    Ok(claims)
}
