//! Background job scheduling.
//!
//! Each job runs on its own tokio interval task. Settlement jobs fire every
//! half hour by default; profit accrual fires daily and is additionally
//! guarded by its persisted watermark, so an early or duplicate tick cannot
//! double-accrue.

use crate::config::SchedulerConfig;
use crate::service::settlement_service::{BatchReport, SettlementService};
use crate::util::error::ServiceError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument};

#[async_trait]
pub trait Job: Send + Sync + 'static {
    fn name(&self) -> &'static str;
    fn period(&self) -> Duration;
    async fn run(&self) -> Result<BatchReport, ServiceError>;
}

pub struct SettleDepositsJob {
    pub settlement: Arc<SettlementService>,
    pub period: Duration,
}

#[async_trait]
impl Job for SettleDepositsJob {
    fn name(&self) -> &'static str {
        "settle_deposits"
    }

    fn period(&self) -> Duration {
        self.period
    }

    async fn run(&self) -> Result<BatchReport, ServiceError> {
        self.settlement.settle_deposits().await
    }
}

pub struct SettleWithdrawalsJob {
    pub settlement: Arc<SettlementService>,
    pub period: Duration,
}

#[async_trait]
impl Job for SettleWithdrawalsJob {
    fn name(&self) -> &'static str {
        "settle_withdrawals"
    }

    fn period(&self) -> Duration {
        self.period
    }

    async fn run(&self) -> Result<BatchReport, ServiceError> {
        self.settlement.settle_withdrawals().await
    }
}

pub struct AccrueProfitJob {
    pub settlement: Arc<SettlementService>,
    pub period: Duration,
}

#[async_trait]
impl Job for AccrueProfitJob {
    fn name(&self) -> &'static str {
        "accrue_profit"
    }

    fn period(&self) -> Duration {
        self.period
    }

    async fn run(&self) -> Result<BatchReport, ServiceError> {
        self.settlement.accrue_profit().await
    }
}

pub struct Scheduler {
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    /// Spawn the interval task for every configured job. Returns a handle
    /// that stops all tasks on drop via `shutdown`.
    #[instrument(skip(config, settlement))]
    pub fn start(config: &SchedulerConfig, settlement: Arc<SettlementService>) -> Self {
        if !config.enabled {
            info!("Scheduler disabled by configuration");
            return Scheduler { handles: Vec::new() };
        }

        let settlement_period = Duration::from_secs(config.settlement_interval_secs);
        let accrual_period = Duration::from_secs(config.accrual_interval_secs);

        let jobs: Vec<Arc<dyn Job>> = vec![
            Arc::new(SettleDepositsJob {
                settlement: settlement.clone(),
                period: settlement_period,
            }),
            Arc::new(SettleWithdrawalsJob {
                settlement: settlement.clone(),
                period: settlement_period,
            }),
            Arc::new(AccrueProfitJob { settlement, period: accrual_period }),
        ];

        let handles = jobs.into_iter().map(Self::spawn_job).collect();
        Scheduler { handles }
    }

    fn spawn_job(job: Arc<dyn Job>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(job.period());
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            info!(job = job.name(), period_secs = job.period().as_secs(), "Job scheduled");
            loop {
                interval.tick().await;
                match job.run().await {
                    Ok(report) => info!(job = job.name(), %report, "Job cycle finished"),
                    Err(e) => error!(job = job.name(), "Job cycle failed: {}", e),
                }
            }
        })
    }

    pub fn shutdown(&self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
