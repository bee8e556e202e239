use std::env;
use tracing::{error, info, warn};

use crate::config::ConfigError;

/// Timing and batching parameters for the periodic settlement jobs
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Whether background jobs run at all (off for one-shot tooling and tests)
    pub enabled: bool,
    /// Period of the deposit/withdrawal settlement jobs in seconds
    pub settlement_interval_secs: u64,
    /// Period of the profit accrual job in seconds
    pub accrual_interval_secs: u64,
    /// Max in-flight per-record operations within one batch run
    pub batch_concurrency: usize,
}

impl SchedulerConfig {
    /// Load scheduler configuration from environment variables
    ///
    /// Expected environment variables:
    /// - SCHEDULER_ENABLED: defaults to true
    /// - SETTLEMENT_INTERVAL_SECS: defaults to 1800 (30 minutes)
    /// - ACCRUAL_INTERVAL_SECS: defaults to 86400 (daily)
    /// - BATCH_CONCURRENCY: defaults to 8
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading scheduler configuration from environment variables");

        let enabled = env::var("SCHEDULER_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .unwrap_or(true);

        let settlement_interval_secs = env::var("SETTLEMENT_INTERVAL_SECS")
            .unwrap_or_else(|_| {
                warn!("SETTLEMENT_INTERVAL_SECS not set, using default: 1800");
                "1800".to_string()
            })
            .parse::<u64>()
            .map_err(|_| {
                error!("Invalid SETTLEMENT_INTERVAL_SECS value");
                ConfigError::InvalidValue("Invalid SETTLEMENT_INTERVAL_SECS value".to_string())
            })?;

        let accrual_interval_secs = env::var("ACCRUAL_INTERVAL_SECS")
            .unwrap_or_else(|_| {
                warn!("ACCRUAL_INTERVAL_SECS not set, using default: 86400");
                "86400".to_string()
            })
            .parse::<u64>()
            .map_err(|_| {
                error!("Invalid ACCRUAL_INTERVAL_SECS value");
                ConfigError::InvalidValue("Invalid ACCRUAL_INTERVAL_SECS value".to_string())
            })?;

        let batch_concurrency = env::var("BATCH_CONCURRENCY")
            .unwrap_or_else(|_| "8".to_string())
            .parse::<usize>()
            .map_err(|_| {
                error!("Invalid BATCH_CONCURRENCY value");
                ConfigError::InvalidValue("Invalid BATCH_CONCURRENCY value".to_string())
            })?;

        let config = SchedulerConfig {
            enabled,
            settlement_interval_secs,
            accrual_interval_secs,
            batch_concurrency,
        };

        config.validate()?;
        info!("Scheduler configuration loaded successfully");
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.settlement_interval_secs == 0 {
            error!("Settlement interval is 0");
            return Err(ConfigError::ValidationError(
                "Settlement interval must be greater than 0".to_string(),
            ));
        }
        if self.accrual_interval_secs == 0 {
            error!("Accrual interval is 0");
            return Err(ConfigError::ValidationError(
                "Accrual interval must be greater than 0".to_string(),
            ));
        }
        if self.batch_concurrency == 0 {
            error!("Batch concurrency is 0");
            return Err(ConfigError::ValidationError(
                "Batch concurrency must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            enabled: true,
            settlement_interval_secs: 1800,
            accrual_interval_secs: 86400,
            batch_concurrency: 8,
        }
    }
}
