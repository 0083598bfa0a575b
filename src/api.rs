//! Request and response bodies, and the extractor that validates them.

use axum::{
    Json,
    async_trait,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::AppError;

/// Checks a decoded body beyond what its type already guarantees.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

fn require_non_empty(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("`{field}` must not be empty"));
    }
    Ok(())
}

/// `Json<T>` that turns every decode or validation failure into
/// [`AppError::InvalidRequest`] before the handler runs.
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| AppError::InvalidRequest(rejection.body_text()))?;
        value.validate().map_err(AppError::InvalidRequest)?;
        Ok(ValidJson(value))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), String> {
        require_non_empty("username", &self.username)?;
        require_non_empty("password", &self.password)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct AddSwipeRequest {
    pub user_id: String,
    pub url: String,
    pub platform: String,
    pub tags: Vec<String>,
    pub notes: String,
}

impl Validate for AddSwipeRequest {
    fn validate(&self) -> Result<(), String> {
        require_non_empty("userId", &self.user_id)?;
        require_non_empty("url", &self.url)?;
        require_non_empty("platform", &self.platform)?;
        require_non_empty("notes", &self.notes)
    }
}

/// Body of both create and update.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectionRequest {
    pub name: String,
    pub description: String,
}

impl Validate for CollectionRequest {
    fn validate(&self) -> Result<(), String> {
        require_non_empty("name", &self.name)?;
        require_non_empty("description", &self.description)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct AddToCollectionRequest {
    pub swipe_id: String,
}

impl Validate for AddToCollectionRequest {
    fn validate(&self) -> Result<(), String> {
        require_non_empty("swipeId", &self.swipe_id)
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl MessageResponse {
    pub fn new(message: &'static str) -> Self {
        MessageResponse { message, id: None }
    }

    pub fn with_id(message: &'static str, id: String) -> Self {
        MessageResponse { message, id: Some(id) }
    }
}
