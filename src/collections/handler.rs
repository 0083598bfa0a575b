//! HTTP handlers for collections

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::api::{AddToCollectionRequest, CollectionRequest, MessageResponse, ValidJson};
use crate::auth::Claims;
use crate::db::now_timestamp;
use crate::error::AppError;
use crate::handler::AppState;
use crate::model::Collection;

const NOT_FOUND: AppError = AppError::NotFound("Collection");

async fn find_owned(state: &AppState, id: &str, owner: &str) -> Result<Collection, AppError> {
    state
        .db
        .find_collection(id, owner)
        .await
        .map_err(|e| AppError::persistence("Failed to load collection", e))?
        .ok_or(NOT_FOUND)
}

pub async fn create_collection(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ValidJson(payload): ValidJson<CollectionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let owner = claims.user_id.as_str();
    let quotas = state.quotas_for(owner).await?;

    let owned = state
        .db
        .count_collections_by_owner(owner)
        .await
        .map_err(|e| AppError::persistence("Failed to create collection", e))?;
    if owned >= quotas.max_collections {
        tracing::info!(user_id = %owner, owned, limit = quotas.max_collections, "collection limit reached");
        return Err(AppError::QuotaExceeded("Collection limit reached"));
    }

    let collection = state
        .db
        .create_collection(owner, &payload.name, &payload.description)
        .await
        .map_err(|e| AppError::persistence("Failed to create collection", e))?;

    tracing::info!(user_id = %owner, collection_id = %collection.id, "collection created");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Collection created successfully")),
    ))
}

pub async fn get_collections(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Collection>>, AppError> {
    let collections = state
        .db
        .list_collections_by_owner(&claims.user_id)
        .await
        .map_err(|e| AppError::persistence("Failed to get collections", e))?;

    Ok(Json(collections))
}

pub async fn update_collection(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<CollectionRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let mut collection = find_owned(&state, &id, &claims.user_id).await?;

    collection.name = payload.name;
    collection.description = payload.description;
    collection.updated_at = now_timestamp();
    state
        .db
        .save_collection(&collection)
        .await
        .map_err(|e| AppError::persistence("Failed to update collection", e))?;

    tracing::info!(user_id = %claims.user_id, collection_id = %id, "collection updated");
    Ok(Json(MessageResponse::new("Collection updated successfully")))
}

pub async fn delete_collection(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let collection = find_owned(&state, &id, &claims.user_id).await?;

    // Second round trip, by id alone. Referenced swipes are left alone.
    state
        .db
        .delete_collection(&collection.id)
        .await
        .map_err(|e| AppError::persistence("Failed to delete collection", e))?;

    tracing::info!(user_id = %claims.user_id, collection_id = %id, "collection deleted");
    Ok(Json(MessageResponse::new("Collection deleted successfully")))
}

pub async fn add_to_collection(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<AddToCollectionRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let mut collection = find_owned(&state, &id, &claims.user_id).await?;
    let quotas = state.quotas_for(&claims.user_id).await?;

    if collection.items.len() as i64 >= quotas.max_swipes_per_collection {
        tracing::info!(
            user_id = %claims.user_id,
            collection_id = %id,
            limit = quotas.max_swipes_per_collection,
            "swipe limit reached"
        );
        return Err(AppError::QuotaExceeded("Swipe limit reached for this collection"));
    }

    // The swipe id is stored as given; it may not exist or may belong to
    // someone else.
    collection.items.push(payload.swipe_id);
    state
        .db
        .save_collection(&collection)
        .await
        .map_err(|e| AppError::persistence("Failed to add swipe to collection", e))?;

    tracing::info!(user_id = %claims.user_id, collection_id = %id, items = collection.items.len(), "swipe added to collection");
    Ok(Json(MessageResponse::new("Swipe added to collection successfully")))
}
