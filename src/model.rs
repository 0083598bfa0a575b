use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub email: String,
    pub google_token: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub two_fa: TwoFactor,
    pub max_collections: Option<i64>,
    pub max_swipes_per_collection: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TwoFactor {
    pub enabled: bool,
    #[serde(skip_serializing)]
    pub secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub max_collections: Option<i64>,
    pub max_swipes_per_collection: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Swipe {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub url: String,
    pub platform: String,
    pub tags: Vec<String>,
    pub notes: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewSwipe {
    pub user_id: String,
    pub url: String,
    pub platform: String,
    pub tags: Vec<String>,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_by: String,
    pub items: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}
