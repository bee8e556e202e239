use crate::model::deposit::Deposit;
use crate::repository::deposit_repo::DepositRepository;
use crate::repository::job_state_repo::JobStateRepository;
use crate::repository::user_repo::UserRepository;
use crate::repository::withdrawal_repo::WithdrawalRepository;
use crate::util::email::Notifier;
use crate::util::error::ServiceError;
use bson::oid::ObjectId;
use chrono::{Datelike, Utc};
use futures::StreamExt;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

pub const ACCRUE_PROFIT_JOB: &str = "accrue_profit";

/// Outcome tally of one batch run. Failures are per-record; one bad record
/// never aborts the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl std::fmt::Display for BatchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "processed={} succeeded={} failed={} skipped={}",
            self.processed, self.succeeded, self.failed, self.skipped
        )
    }
}

enum RecordOutcome {
    Succeeded,
    Failed,
    Skipped,
}

impl BatchReport {
    fn tally(outcomes: Vec<RecordOutcome>) -> Self {
        let mut report = BatchReport { processed: outcomes.len(), ..Default::default() };
        for outcome in outcomes {
            match outcome {
                RecordOutcome::Succeeded => report.succeeded += 1,
                RecordOutcome::Failed => report.failed += 1,
                RecordOutcome::Skipped => report.skipped += 1,
            }
        }
        report
    }
}

/// Batch engine behind the scheduler: confirms pending deposits and
/// withdrawals, and accrues daily profit on active plans.
pub struct SettlementService {
    user_repo: Arc<dyn UserRepository>,
    deposit_repo: Arc<dyn DepositRepository>,
    withdrawal_repo: Arc<dyn WithdrawalRepository>,
    job_state_repo: Arc<dyn JobStateRepository>,
    notifier: Arc<dyn Notifier>,
    concurrency: usize,
}

impl SettlementService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        deposit_repo: Arc<dyn DepositRepository>,
        withdrawal_repo: Arc<dyn WithdrawalRepository>,
        job_state_repo: Arc<dyn JobStateRepository>,
        notifier: Arc<dyn Notifier>,
        concurrency: usize,
    ) -> Self {
        Self {
            user_repo,
            deposit_repo,
            withdrawal_repo,
            job_state_repo,
            notifier,
            concurrency: concurrency.max(1),
        }
    }

    async fn investor_contact(&self, investor: &ObjectId) -> Option<(String, String)> {
        match self.user_repo.find_by_id(investor).await {
            Ok(Some(user)) => Some((user.email, user.full_name)),
            Ok(None) => {
                warn!(investor = %investor, "No user behind settled record");
                None
            }
            Err(e) => {
                warn!(investor = %investor, "Failed to load investor for notification: {}", e);
                None
            }
        }
    }

    /// Confirm every pending deposit into its balance and activate the plan.
    #[instrument(skip(self))]
    pub async fn settle_deposits(&self) -> Result<BatchReport, ServiceError> {
        let pending = self.deposit_repo.find_pending().await?;
        info!(count = pending.len(), "Settling pending deposits");

        let outcomes = futures::stream::iter(pending.into_iter().map(|deposit| async move {
            let id = match deposit.id {
                Some(id) => id,
                None => {
                    error!("Pending deposit without an ID, skipping");
                    return RecordOutcome::Skipped;
                }
            };
            let amount = deposit.pending_deposit;
            match self.deposit_repo.settle_pending(&id, amount).await {
                Ok(()) => {
                    if let Some((email, name)) = self.investor_contact(&deposit.investor).await {
                        if let Err(e) =
                            self.notifier.send_deposit_settled_email(&email, &name, amount).await
                        {
                            warn!(investor = %deposit.investor, "Deposit settled email failed: {}", e);
                        }
                    }
                    RecordOutcome::Succeeded
                }
                Err(e) => {
                    error!(deposit_id = %id, "Failed to settle deposit: {}", e);
                    RecordOutcome::Failed
                }
            }
        }))
        .buffer_unordered(self.concurrency)
        .collect::<Vec<_>>()
        .await;

        let report = BatchReport::tally(outcomes);
        info!(%report, "Deposit settlement complete");
        Ok(report)
    }

    /// Confirm every pending withdrawal into the cumulative total.
    #[instrument(skip(self))]
    pub async fn settle_withdrawals(&self) -> Result<BatchReport, ServiceError> {
        let pending = self.withdrawal_repo.find_pending().await?;
        info!(count = pending.len(), "Settling pending withdrawals");

        let outcomes = futures::stream::iter(pending.into_iter().map(|withdrawal| async move {
            let id = match withdrawal.id {
                Some(id) => id,
                None => {
                    error!("Pending withdrawal without an ID, skipping");
                    return RecordOutcome::Skipped;
                }
            };
            let amount = withdrawal.pending_withdrawal;
            match self.withdrawal_repo.settle_pending(&id, amount).await {
                Ok(()) => {
                    if let Some((email, name)) = self.investor_contact(&withdrawal.investor).await {
                        if let Err(e) = self
                            .notifier
                            .send_withdrawal_settled_email(&email, &name, amount)
                            .await
                        {
                            warn!(investor = %withdrawal.investor, "Withdrawal settled email failed: {}", e);
                        }
                    }
                    RecordOutcome::Succeeded
                }
                Err(e) => {
                    error!(withdrawal_id = %id, "Failed to settle withdrawal: {}", e);
                    RecordOutcome::Failed
                }
            }
        }))
        .buffer_unordered(self.concurrency)
        .collect::<Vec<_>>()
        .await;

        let report = BatchReport::tally(outcomes);
        info!(%report, "Withdrawal settlement complete");
        Ok(report)
    }

    /// Add one day's return to every active plan, folding matured plans back
    /// into the balance. Runs at most once per UTC day; the persisted
    /// watermark makes a re-trigger on the same day a no-op.
    #[instrument(skip(self))]
    pub async fn accrue_profit(&self) -> Result<BatchReport, ServiceError> {
        let now = Utc::now();
        if let Some(last_run) = self.job_state_repo.last_run(ACCRUE_PROFIT_JOB).await? {
            let last = last_run.to_chrono();
            if (last.year(), last.ordinal()) == (now.year(), now.ordinal()) {
                info!("Profit accrual already ran today, skipping");
                return Ok(BatchReport::default());
            }
        }

        let active = self.deposit_repo.find_active().await?;
        info!(count = active.len(), "Accruing daily profit");

        let now_bson = bson::DateTime::from_chrono(now);
        let outcomes = futures::stream::iter(active.into_iter().map(|deposit| async move {
            self.accrue_one(deposit, now_bson).await
        }))
        .buffer_unordered(self.concurrency)
        .collect::<Vec<_>>()
        .await;

        let report = BatchReport::tally(outcomes);
        self.job_state_repo
            .record_run(ACCRUE_PROFIT_JOB, bson::DateTime::from_chrono(now))
            .await?;
        info!(%report, "Profit accrual complete");
        Ok(report)
    }

    async fn accrue_one(&self, deposit: Deposit, now: bson::DateTime) -> RecordOutcome {
        let id = match deposit.id {
            Some(id) => id,
            None => {
                error!("Active deposit without an ID, skipping");
                return RecordOutcome::Skipped;
            }
        };

        // Plans whose window has not opened yet do not earn.
        if let Some(start) = deposit.start_date {
            if start > now {
                return RecordOutcome::Skipped;
            }
        }

        if deposit.is_matured(now) {
            match self.deposit_repo.mature(&id, deposit.total_return).await {
                Ok(()) => {
                    info!(deposit_id = %id, "Plan matured, profit folded into balance");
                    RecordOutcome::Succeeded
                }
                Err(e) => {
                    error!(deposit_id = %id, "Failed to mature plan: {}", e);
                    RecordOutcome::Failed
                }
            }
        } else {
            match self.deposit_repo.accrue(&id, deposit.daily_return).await {
                Ok(()) => RecordOutcome::Succeeded,
                Err(e) => {
                    error!(deposit_id = %id, "Failed to accrue profit: {}", e);
                    RecordOutcome::Failed
                }
            }
        }
    }
}
