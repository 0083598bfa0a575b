use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};

use tracing::info;

use crate::api::{AddSwipeRequest, LoginRequest, MessageResponse, TokenResponse, ValidJson};
use crate::auth::{AuthSettings, Claims, password};
use crate::config::Quotas;
use crate::db::Database;
use crate::error::AppError;
use crate::model::NewSwipe;
use crate::rate_limit::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub auth: Arc<AuthSettings>,
    pub limiter: Arc<RateLimiter>,
    pub quotas: Quotas,
}

impl AppState {
    /// Quotas for `user_id`: fields set on the user record win, the
    /// configured free-tier values fill the gaps.
    pub async fn quotas_for(&self, user_id: &str) -> Result<Quotas, AppError> {
        let user = self
            .db
            .find_user_by_id(user_id)
            .await
            .map_err(|e| AppError::persistence("Failed to load user", e))?;

        Ok(match user {
            Some(user) => Quotas {
                max_collections: user.max_collections.unwrap_or(self.quotas.max_collections),
                max_swipes_per_collection: user
                    .max_swipes_per_collection
                    .unwrap_or(self.quotas.max_swipes_per_collection),
            },
            None => self.quotas,
        })
    }
}

pub async fn healthcheck() -> impl IntoResponse {
    info!("got healthcheck request");
    "Hello, Creator Swipes!"
}

pub async fn login(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let user = state
        .db
        .find_user_by_username(&payload.username)
        .await
        .map_err(|e| AppError::persistence("Failed to log in", e))?;

    let Some(user) = user else {
        info!("login rejected: unknown username");
        return Err(AppError::InvalidCredentials);
    };

    let verified = password::verify_password(&payload.password, &user.password).unwrap_or_else(|e| {
        tracing::warn!(user_id = user.id, error = %e, "stored password hash unusable");
        false
    });
    if !verified {
        info!(user_id = user.id, "login rejected: wrong password");
        return Err(AppError::InvalidCredentials);
    }

    let token = state.auth.issue(&user.id.to_string()).map_err(|e| {
        tracing::error!(error = %e, "failed to sign token");
        AppError::Persistence("Failed to log in")
    })?;

    info!(user_id = user.id, "user logged in");
    Ok(Json(TokenResponse { token }))
}

// Open to anyone: neither the caller nor `userId` is checked.
pub async fn add_swipe(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<AddSwipeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let swipe = state
        .db
        .create_swipe(NewSwipe {
            user_id: payload.user_id,
            url: payload.url,
            platform: payload.platform,
            tags: payload.tags,
            notes: payload.notes,
        })
        .await
        .map_err(|e| AppError::persistence("Failed to add swipe", e))?;

    info!(swipe_id = %swipe.id, user_id = %swipe.user_id, platform = %swipe.platform, "swipe added");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::with_id("Swipe added successfully", swipe.id)),
    ))
}

pub async fn secure(Extension(claims): Extension<Claims>) -> impl IntoResponse {
    info!(user_id = %claims.user_id, "served secure data");
    "Secure data"
}
