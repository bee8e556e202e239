use crate::model::withdrawal::Withdrawal;
use crate::repository::repository_error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use chrono::Utc;
use futures::stream::StreamExt;
use tracing::{error, info};

#[async_trait]
pub trait WithdrawalRepository: Send + Sync {
    async fn create(&self, withdrawal: Withdrawal) -> RepositoryResult<Withdrawal>;
    async fn find_by_investor(&self, investor: &ObjectId) -> RepositoryResult<Option<Withdrawal>>;
    /// All records with `pending_withdrawal > 0` — the settlement scan.
    async fn find_pending(&self) -> RepositoryResult<Vec<Withdrawal>>;
    /// Overwrite the pending request; the last request wins.
    async fn record_request(
        &self,
        investor: &ObjectId,
        amount: f64,
        coin: &str,
        wallet_address: &str,
    ) -> RepositoryResult<()>;
    /// Confirm a pending withdrawal into the cumulative total.
    async fn settle_pending(&self, id: &ObjectId, amount: f64) -> RepositoryResult<()>;
    async fn delete_by_investor(&self, investor: &ObjectId) -> RepositoryResult<()>;
}

pub struct MongoWithdrawalRepository {
    collection: mongodb::Collection<Withdrawal>,
}

impl MongoWithdrawalRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        MongoWithdrawalRepository { collection: db.collection::<Withdrawal>("withdrawals") }
    }
}

#[async_trait]
impl WithdrawalRepository for MongoWithdrawalRepository {
    async fn create(&self, mut withdrawal: Withdrawal) -> RepositoryResult<Withdrawal> {
        withdrawal.id = Some(ObjectId::new());
        let now = Utc::now().to_rfc3339();
        withdrawal.created_at = Some(now.clone());
        withdrawal.updated_at = Some(now);
        match self.collection.insert_one(withdrawal.clone(), None).await {
            Ok(_) => {
                info!(investor = %withdrawal.investor, "Withdrawal record created");
                Ok(withdrawal)
            }
            Err(e) => {
                error!("Failed to create withdrawal record: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    async fn find_by_investor(&self, investor: &ObjectId) -> RepositoryResult<Option<Withdrawal>> {
        let withdrawal = self
            .collection
            .find_one(doc! { "investor": investor }, None)
            .await
            .map_err(|e| {
                RepositoryError::database(format!("Failed to find withdrawal by investor: {}", e))
            })?;
        Ok(withdrawal)
    }

    async fn find_pending(&self) -> RepositoryResult<Vec<Withdrawal>> {
        let mut cursor = self
            .collection
            .find(doc! { "pending_withdrawal": { "$gt": 0.0 } }, None)
            .await
            .map_err(|e| {
                RepositoryError::database(format!("Failed to scan pending withdrawals: {}", e))
            })?;
        let mut withdrawals = Vec::new();
        while let Some(withdrawal) = cursor.next().await {
            match withdrawal {
                Ok(w) => withdrawals.push(w),
                Err(e) => {
                    error!("Failed to deserialize withdrawal: {}", e);
                    return Err(RepositoryError::serialization(format!(
                        "Failed to deserialize withdrawal: {}",
                        e
                    )));
                }
            }
        }
        Ok(withdrawals)
    }

    async fn record_request(
        &self,
        investor: &ObjectId,
        amount: f64,
        coin: &str,
        wallet_address: &str,
    ) -> RepositoryResult<()> {
        let update = doc! { "$set": {
            "pending_withdrawal": amount,
            "coin": coin,
            "wallet_address": wallet_address,
            "updated_at": Utc::now().to_rfc3339(),
        }};
        let result = self
            .collection
            .update_one(doc! { "investor": investor }, update, None)
            .await;
        match result {
            Ok(update_result) if update_result.matched_count > 0 => Ok(()),
            Ok(_) => Err(RepositoryError::not_found(format!(
                "No withdrawal record for investor: {}",
                investor
            ))),
            Err(e) => Err(RepositoryError::database(format!(
                "Failed to record withdrawal request: {}",
                e
            ))),
        }
    }

    async fn settle_pending(&self, id: &ObjectId, amount: f64) -> RepositoryResult<()> {
        let update = doc! {
            "$inc": { "withdrawal_amount": amount },
            "$set": {
                "pending_withdrawal": 0.0,
                "last_withdrawal": amount,
                "updated_at": Utc::now().to_rfc3339(),
            },
        };
        let result = self.collection.update_one(doc! { "_id": id }, update, None).await;
        match result {
            Ok(update_result) if update_result.matched_count > 0 => Ok(()),
            Ok(_) => {
                error!("No withdrawal record found to settle for ID: {}", id);
                Err(RepositoryError::not_found(format!("No withdrawal record for ID: {}", id)))
            }
            Err(e) => {
                error!("Failed to settle withdrawal: {}", e);
                Err(RepositoryError::database(format!("Failed to settle withdrawal: {}", e)))
            }
        }
    }

    async fn delete_by_investor(&self, investor: &ObjectId) -> RepositoryResult<()> {
        let result = self.collection.delete_one(doc! { "investor": investor }, None).await;
        match result {
            Ok(delete_result) if delete_result.deleted_count > 0 => Ok(()),
            Ok(_) => Err(RepositoryError::not_found(format!(
                "No withdrawal record for investor: {}",
                investor
            ))),
            Err(e) => Err(RepositoryError::database(format!(
                "Failed to delete withdrawal record: {}",
                e
            ))),
        }
    }
}
