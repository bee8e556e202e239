use crate::model::admin::Admin;
use crate::repository::repository_error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use chrono::Utc;
use tracing::{error, info};

#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn insert(&self, admin: Admin) -> RepositoryResult<Admin>;
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<Admin>>;
}

pub struct MongoAdminRepository {
    collection: mongodb::Collection<Admin>,
}

impl MongoAdminRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        MongoAdminRepository { collection: db.collection::<Admin>("admins") }
    }
}

#[async_trait]
impl AdminRepository for MongoAdminRepository {
    async fn insert(&self, mut admin: Admin) -> RepositoryResult<Admin> {
        admin.id = Some(ObjectId::new());
        let now = Utc::now().to_rfc3339();
        admin.created_at = Some(now.clone());
        admin.updated_at = Some(now);
        match self.collection.insert_one(admin.clone(), None).await {
            Ok(_) => {
                info!(email = %admin.email, "Admin inserted");
                Ok(admin)
            }
            Err(e) => {
                error!("Failed to insert admin: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<Admin>> {
        let admin = self
            .collection
            .find_one(doc! { "email": email }, None)
            .await
            .map_err(|e| {
                RepositoryError::database(format!("Failed to find admin by email: {}", e))
            })?;
        Ok(admin)
    }
}
