//! Token issuing, token checking and password verification.
//!
//! Login hands out an HS256 token carrying the user id. Protected routes sit
//! behind [`require_auth`], which puts the decoded [`Claims`] into the
//! request extensions for handlers to pick up with `Extension<Claims>`.

pub mod jwt;
mod middleware;
pub mod password;

pub use jwt::{Claims, JwtError};
pub use middleware::require_auth;

use crate::config;

#[derive(Clone)]
pub struct AuthSettings {
    secret: Vec<u8>,
    pub token_ttl_days: i64,
}

impl AuthSettings {
    pub fn new(secret: impl AsRef<[u8]>, token_ttl_days: i64) -> Self {
        AuthSettings {
            secret: secret.as_ref().to_vec(),
            token_ttl_days,
        }
    }

    pub fn issue(&self, user_id: &str) -> Result<String, JwtError> {
        jwt::issue(&self.secret, user_id, self.token_ttl_days)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        jwt::verify(&self.secret, token)
    }
}

impl From<&config::Auth> for AuthSettings {
    fn from(cfg: &config::Auth) -> Self {
        AuthSettings::new(&cfg.jwt_secret, cfg.token_ttl_days)
    }
}
