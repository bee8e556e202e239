use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// An investor account. Email and username are stored lowercase and are
/// unique. `referral_code` is the user's own code; `referred_by_code` is the
/// code of whoever referred them, if anyone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub nationality: String,
    pub referral_code: String,
    pub referred_by_code: Option<String>,
    pub reset_token: String,
    pub reset_token_expiry: Option<bson::DateTime>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}
