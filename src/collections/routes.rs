use axum::{
    Router,
    routing::{delete, get, post, put},
};

use super::handler;
use crate::handler::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/createCollection", post(handler::create_collection))
        .route("/getCollections", get(handler::get_collections))
        .route("/updateCollection/:id", put(handler::update_collection))
        .route("/deleteCollection/:id", delete(handler::delete_collection))
        .route("/addToCollection/:id", post(handler::add_to_collection))
}
