use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::handler::AppState;

/// The header carries the bare token; a `Bearer ` prefix is tolerated.
fn token_from_header(value: &str) -> &str {
    let value = value.trim_start();
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .unwrap_or(value)
        .trim()
}

pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Result<Response, AppError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .map(|v| v.to_str().map_err(|_| AppError::AuthInvalid))
        .transpose()?;

    let token = match header.map(token_from_header) {
        Some(token) if !token.is_empty() => token,
        _ => return Err(AppError::AuthMissing),
    };

    let claims = state.auth.verify(token).map_err(|e| {
        tracing::debug!(error = %e, "rejected bearer token");
        AppError::AuthInvalid
    })?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
