use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Admin credential entity. Lives in its own collection, disjoint from users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    pub email: String,
    pub password_hash: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}
