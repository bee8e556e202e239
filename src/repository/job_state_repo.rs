use crate::repository::repository_error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use bson::doc;
use mongodb::options::UpdateOptions;
use serde::{Deserialize, Serialize};
use tracing::error;

/// Persisted watermark of a batch job's last completed run. The daily profit
/// job consults this to stay idempotent under scheduler double-fire or a
/// manual re-trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobState {
    pub job: String,
    pub last_run: bson::DateTime,
}

#[async_trait]
pub trait JobStateRepository: Send + Sync {
    async fn last_run(&self, job: &str) -> RepositoryResult<Option<bson::DateTime>>;
    async fn record_run(&self, job: &str, at: bson::DateTime) -> RepositoryResult<()>;
}

pub struct MongoJobStateRepository {
    collection: mongodb::Collection<JobState>,
}

impl MongoJobStateRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        MongoJobStateRepository { collection: db.collection::<JobState>("job_state") }
    }
}

#[async_trait]
impl JobStateRepository for MongoJobStateRepository {
    async fn last_run(&self, job: &str) -> RepositoryResult<Option<bson::DateTime>> {
        let state = self
            .collection
            .find_one(doc! { "job": job }, None)
            .await
            .map_err(|e| RepositoryError::database(format!("Failed to read job state: {}", e)))?;
        Ok(state.map(|s| s.last_run))
    }

    async fn record_run(&self, job: &str, at: bson::DateTime) -> RepositoryResult<()> {
        let options = UpdateOptions::builder().upsert(true).build();
        self.collection
            .update_one(
                doc! { "job": job },
                doc! { "$set": { "job": job, "last_run": at } },
                options,
            )
            .await
            .map_err(|e| {
                error!("Failed to record job run: {}", e);
                RepositoryError::database(format!("Failed to record job run: {}", e))
            })?;
        Ok(())
    }
}
