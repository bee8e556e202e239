use crate::model::deposit::{Deposit, NO_PLAN};
use crate::repository::repository_error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Bson};
use chrono::Utc;
use futures::stream::StreamExt;
use tracing::{error, info};

/// Fields written onto a deposit record when an investor requests a deposit.
#[derive(Debug, Clone)]
pub struct DepositRequest {
    pub amount: f64,
    pub coin: String,
    pub plan: String,
    pub daily_return: f64,
    pub start_date: bson::DateTime,
    pub end_date: bson::DateTime,
}

/// Single-document reads and writes against the deposits collection. Every
/// mutation touches exactly one record; batch jobs fan out over these.
#[async_trait]
pub trait DepositRepository: Send + Sync {
    async fn create(&self, deposit: Deposit) -> RepositoryResult<Deposit>;
    async fn find_by_investor(&self, investor: &ObjectId) -> RepositoryResult<Option<Deposit>>;
    /// All records with `pending_deposit > 0` — the settlement scan.
    async fn find_pending(&self) -> RepositoryResult<Vec<Deposit>>;
    /// All records with `is_active = true` — the accrual scan.
    async fn find_active(&self) -> RepositoryResult<Vec<Deposit>>;
    /// Write the request fields as pending; does not touch balance.
    async fn record_request(
        &self,
        investor: &ObjectId,
        request: &DepositRequest,
    ) -> RepositoryResult<()>;
    /// Fold a pending amount into the balance and activate the plan.
    async fn settle_pending(&self, id: &ObjectId, amount: f64) -> RepositoryResult<()>;
    /// Add one day's return to the unrealized profit.
    async fn accrue(&self, id: &ObjectId, daily_return: f64) -> RepositoryResult<()>;
    /// Fold unrealized profit into the balance and reset the plan fields.
    async fn mature(&self, id: &ObjectId, total_return: f64) -> RepositoryResult<()>;
    async fn delete_by_investor(&self, investor: &ObjectId) -> RepositoryResult<()>;
}

pub struct MongoDepositRepository {
    collection: mongodb::Collection<Deposit>,
}

impl MongoDepositRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        MongoDepositRepository { collection: db.collection::<Deposit>("deposits") }
    }

    async fn collect(
        &self,
        filter: bson::Document,
        what: &str,
    ) -> RepositoryResult<Vec<Deposit>> {
        let mut cursor = self
            .collection
            .find(filter, None)
            .await
            .map_err(|e| RepositoryError::database(format!("Failed to scan {}: {}", what, e)))?;
        let mut deposits = Vec::new();
        while let Some(deposit) = cursor.next().await {
            match deposit {
                Ok(d) => deposits.push(d),
                Err(e) => {
                    error!("Failed to deserialize deposit: {}", e);
                    return Err(RepositoryError::serialization(format!(
                        "Failed to deserialize deposit: {}",
                        e
                    )));
                }
            }
        }
        Ok(deposits)
    }

    async fn update_by_id(
        &self,
        id: &ObjectId,
        update: bson::Document,
        what: &str,
    ) -> RepositoryResult<()> {
        let result = self.collection.update_one(doc! { "_id": id }, update, None).await;
        match result {
            Ok(update_result) if update_result.matched_count > 0 => Ok(()),
            Ok(_) => {
                error!("No deposit record found to {} for ID: {}", what, id);
                Err(RepositoryError::not_found(format!("No deposit record for ID: {}", id)))
            }
            Err(e) => {
                error!("Failed to {} deposit: {}", what, e);
                Err(RepositoryError::database(format!("Failed to {} deposit: {}", what, e)))
            }
        }
    }
}

#[async_trait]
impl DepositRepository for MongoDepositRepository {
    async fn create(&self, mut deposit: Deposit) -> RepositoryResult<Deposit> {
        deposit.id = Some(ObjectId::new());
        let now = Utc::now().to_rfc3339();
        deposit.created_at = Some(now.clone());
        deposit.updated_at = Some(now);
        match self.collection.insert_one(deposit.clone(), None).await {
            Ok(_) => {
                info!(investor = %deposit.investor, "Deposit record created");
                Ok(deposit)
            }
            Err(e) => {
                error!("Failed to create deposit record: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    async fn find_by_investor(&self, investor: &ObjectId) -> RepositoryResult<Option<Deposit>> {
        let deposit = self
            .collection
            .find_one(doc! { "investor": investor }, None)
            .await
            .map_err(|e| {
                RepositoryError::database(format!("Failed to find deposit by investor: {}", e))
            })?;
        Ok(deposit)
    }

    async fn find_pending(&self) -> RepositoryResult<Vec<Deposit>> {
        self.collect(doc! { "pending_deposit": { "$gt": 0.0 } }, "pending deposits").await
    }

    async fn find_active(&self) -> RepositoryResult<Vec<Deposit>> {
        self.collect(doc! { "is_active": true }, "active deposits").await
    }

    async fn record_request(
        &self,
        investor: &ObjectId,
        request: &DepositRequest,
    ) -> RepositoryResult<()> {
        let update = doc! { "$set": {
            "pending_deposit": request.amount,
            "coin": &request.coin,
            "plan": &request.plan,
            "daily_return": request.daily_return,
            "start_date": request.start_date,
            "end_date": request.end_date,
            "active_deposit": request.amount,
            "updated_at": Utc::now().to_rfc3339(),
        }};
        let result = self
            .collection
            .update_one(doc! { "investor": investor }, update, None)
            .await;
        match result {
            Ok(update_result) if update_result.matched_count > 0 => Ok(()),
            Ok(_) => Err(RepositoryError::not_found(format!(
                "No deposit record for investor: {}",
                investor
            ))),
            Err(e) => {
                Err(RepositoryError::database(format!("Failed to record deposit request: {}", e)))
            }
        }
    }

    async fn settle_pending(&self, id: &ObjectId, amount: f64) -> RepositoryResult<()> {
        let update = doc! {
            "$inc": { "balance": amount },
            "$set": {
                "pending_deposit": 0.0,
                "last_deposit": amount,
                "is_active": true,
                "updated_at": Utc::now().to_rfc3339(),
            },
        };
        self.update_by_id(id, update, "settle").await
    }

    async fn accrue(&self, id: &ObjectId, daily_return: f64) -> RepositoryResult<()> {
        let update = doc! {
            "$inc": { "total_return": daily_return },
            "$set": { "updated_at": Utc::now().to_rfc3339() },
        };
        self.update_by_id(id, update, "accrue").await
    }

    async fn mature(&self, id: &ObjectId, total_return: f64) -> RepositoryResult<()> {
        let update = doc! {
            "$inc": { "balance": total_return },
            "$set": {
                "total_return": 0.0,
                "active_deposit": 0.0,
                "is_active": false,
                "plan": NO_PLAN,
                "daily_return": 0.0,
                "start_date": Bson::Null,
                "end_date": Bson::Null,
                "updated_at": Utc::now().to_rfc3339(),
            },
        };
        self.update_by_id(id, update, "mature").await
    }

    async fn delete_by_investor(&self, investor: &ObjectId) -> RepositoryResult<()> {
        let result = self.collection.delete_one(doc! { "investor": investor }, None).await;
        match result {
            Ok(delete_result) if delete_result.deleted_count > 0 => Ok(()),
            Ok(_) => Err(RepositoryError::not_found(format!(
                "No deposit record for investor: {}",
                investor
            ))),
            Err(e) => {
                Err(RepositoryError::database(format!("Failed to delete deposit record: {}", e)))
            }
        }
    }
}
