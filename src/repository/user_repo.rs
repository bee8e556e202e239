use crate::model::user::User;
use crate::repository::repository_error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use chrono::Utc;
use futures::stream::StreamExt;
use tracing::{error, info};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: User) -> RepositoryResult<User>;
    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;
    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<User>>;
    async fn find_by_referral_code(&self, code: &str) -> RepositoryResult<Option<User>>;
    async fn find_by_reset_token(&self, token: &str) -> RepositoryResult<Option<User>>;
    async fn count_referred_by(&self, code: &str) -> RepositoryResult<u64>;
    async fn list_all(&self) -> RepositoryResult<Vec<User>>;
    async fn update_password(&self, id: &ObjectId, password_hash: &str) -> RepositoryResult<()>;
    async fn update_profile(
        &self,
        id: &ObjectId,
        full_name: &str,
        nationality: &str,
    ) -> RepositoryResult<()>;
    async fn update_reset_token(
        &self,
        id: &ObjectId,
        token: &str,
        expiry: bson::DateTime,
    ) -> RepositoryResult<()>;
    async fn delete(&self, id: &ObjectId) -> RepositoryResult<()>;
}

pub struct MongoUserRepository {
    collection: mongodb::Collection<User>,
}

impl MongoUserRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        MongoUserRepository { collection: db.collection::<User>("users") }
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn insert(&self, mut user: User) -> RepositoryResult<User> {
        user.id = Some(ObjectId::new());
        let now = Utc::now().to_rfc3339();
        user.created_at = Some(now.clone());
        user.updated_at = Some(now);
        match self.collection.insert_one(user.clone(), None).await {
            Ok(_) => {
                info!(username = %user.username, "User inserted");
                Ok(user)
            }
            Err(e) => {
                error!("Failed to insert user: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<User>> {
        let user = self
            .collection
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(|e| RepositoryError::database(format!("Failed to find user by id: {}", e)))?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let user = self
            .collection
            .find_one(doc! { "email": email }, None)
            .await
            .map_err(|e| {
                RepositoryError::database(format!("Failed to find user by email: {}", e))
            })?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<User>> {
        let user = self
            .collection
            .find_one(doc! { "username": username }, None)
            .await
            .map_err(|e| {
                RepositoryError::database(format!("Failed to find user by username: {}", e))
            })?;
        Ok(user)
    }

    async fn find_by_referral_code(&self, code: &str) -> RepositoryResult<Option<User>> {
        let user = self
            .collection
            .find_one(doc! { "referral_code": code }, None)
            .await
            .map_err(|e| {
                RepositoryError::database(format!("Failed to find user by referral code: {}", e))
            })?;
        Ok(user)
    }

    async fn find_by_reset_token(&self, token: &str) -> RepositoryResult<Option<User>> {
        let user = self
            .collection
            .find_one(doc! { "reset_token": token }, None)
            .await
            .map_err(|e| {
                RepositoryError::database(format!("Failed to find user by reset token: {}", e))
            })?;
        Ok(user)
    }

    async fn count_referred_by(&self, code: &str) -> RepositoryResult<u64> {
        let count = self
            .collection
            .count_documents(doc! { "referred_by_code": code }, None)
            .await
            .map_err(|e| RepositoryError::database(format!("Failed to count referrals: {}", e)))?;
        Ok(count)
    }

    async fn list_all(&self) -> RepositoryResult<Vec<User>> {
        let mut cursor = self
            .collection
            .find(None, None)
            .await
            .map_err(|e| RepositoryError::database(format!("Failed to list users: {}", e)))?;
        let mut users = Vec::new();
        while let Some(user) = cursor.next().await {
            match user {
                Ok(u) => users.push(u),
                Err(e) => {
                    error!("Failed to deserialize user: {}", e);
                    return Err(RepositoryError::serialization(format!(
                        "Failed to deserialize user: {}",
                        e
                    )));
                }
            }
        }
        Ok(users)
    }

    async fn update_password(&self, id: &ObjectId, password_hash: &str) -> RepositoryResult<()> {
        let update = doc! { "$set": {
            "password_hash": password_hash,
            "updated_at": Utc::now().to_rfc3339(),
        }};
        let result = self.collection.update_one(doc! { "_id": id }, update, None).await;
        match result {
            Ok(update_result) if update_result.matched_count > 0 => Ok(()),
            Ok(_) => Err(RepositoryError::not_found(format!("No user found for ID: {}", id))),
            Err(e) => Err(RepositoryError::database(format!("Failed to update password: {}", e))),
        }
    }

    async fn update_profile(
        &self,
        id: &ObjectId,
        full_name: &str,
        nationality: &str,
    ) -> RepositoryResult<()> {
        let update = doc! { "$set": {
            "full_name": full_name,
            "nationality": nationality,
            "updated_at": Utc::now().to_rfc3339(),
        }};
        let result = self.collection.update_one(doc! { "_id": id }, update, None).await;
        match result {
            Ok(update_result) if update_result.matched_count > 0 => Ok(()),
            Ok(_) => Err(RepositoryError::not_found(format!("No user found for ID: {}", id))),
            Err(e) => Err(RepositoryError::database(format!("Failed to update profile: {}", e))),
        }
    }

    async fn update_reset_token(
        &self,
        id: &ObjectId,
        token: &str,
        expiry: bson::DateTime,
    ) -> RepositoryResult<()> {
        let update = doc! { "$set": {
            "reset_token": token,
            "reset_token_expiry": expiry,
            "updated_at": Utc::now().to_rfc3339(),
        }};
        let result = self.collection.update_one(doc! { "_id": id }, update, None).await;
        match result {
            Ok(update_result) if update_result.matched_count > 0 => Ok(()),
            Ok(_) => Err(RepositoryError::not_found(format!("No user found for ID: {}", id))),
            Err(e) => {
                Err(RepositoryError::database(format!("Failed to update reset token: {}", e)))
            }
        }
    }

    async fn delete(&self, id: &ObjectId) -> RepositoryResult<()> {
        let result = self.collection.delete_one(doc! { "_id": id }, None).await;
        match result {
            Ok(delete_result) if delete_result.deleted_count > 0 => {
                info!("User deleted for ID: {}", id);
                Ok(())
            }
            Ok(_) => Err(RepositoryError::not_found(format!("No user found to delete: {}", id))),
            Err(e) => Err(RepositoryError::database(format!("Failed to delete user: {}", e))),
        }
    }
}
