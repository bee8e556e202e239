use crate::config::{
    AdminUserConfig, AppConfig, EmailConfig, JwtConfig, MongoConfig, SchedulerConfig,
};
use crate::handler::admin_handler::AdminState;
use crate::middlewares::admin_middleware::AdminAuthState;
use crate::middlewares::user_middleware::UserAuthState;
use crate::repository::admin_repo::MongoAdminRepository;
use crate::repository::deposit_repo::MongoDepositRepository;
use crate::repository::job_state_repo::MongoJobStateRepository;
use crate::repository::user_repo::MongoUserRepository;
use crate::repository::withdrawal_repo::MongoWithdrawalRepository;
use crate::router::{admin_router::admin_router, auth_router::auth_router, user_router::user_router};
use crate::scheduler::Scheduler;
use crate::service::account_service::AccountServiceImpl;
use crate::service::admin_service::AdminServiceImpl;
use crate::service::auth_service::AuthServiceImpl;
use crate::service::settlement_service::SettlementService;
use crate::util::email::SmtpEmailService;
use crate::util::jwt::JwtTokenUtilsImpl;
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Composition root. Loads configuration, connects the repositories, wires
/// the services and routers, and owns the background scheduler.
pub struct App {
    config: AppConfig,
    router: Router,
    scheduler: Scheduler,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),
    #[error("Email service error: {0}")]
    Email(#[from] crate::util::email::EmailError),
    #[error("JWT setup error: {0}")]
    Jwt(#[from] crate::util::jwt::JwtError),
    #[error("Startup error: {0}")]
    Startup(String),
}

impl App {
    pub async fn new() -> Result<Self, AppError> {
        let config = AppConfig::from_env();
        let mongo_config = MongoConfig::from_env()?;
        let jwt_config = JwtConfig::from_env()?;
        let email_config = EmailConfig::from_env()?;
        let scheduler_config = SchedulerConfig::from_env()?;

        let db = crate::repository::connect(&mongo_config).await?;
        info!(database = %mongo_config.database, "Connected to MongoDB");

        let user_repo = Arc::new(MongoUserRepository::new(&db));
        let admin_repo = Arc::new(MongoAdminRepository::new(&db));
        let deposit_repo = Arc::new(MongoDepositRepository::new(&db));
        let withdrawal_repo = Arc::new(MongoWithdrawalRepository::new(&db));
        let job_state_repo = Arc::new(MongoJobStateRepository::new(&db));

        let jwt_utils = Arc::new(JwtTokenUtilsImpl::new(jwt_config));
        let notifier = Arc::new(SmtpEmailService::new(email_config)?);

        let auth_service = Arc::new(AuthServiceImpl::new(
            user_repo.clone(),
            deposit_repo.clone(),
            withdrawal_repo.clone(),
            jwt_utils.clone(),
            notifier.clone(),
        ));
        let account_service = Arc::new(AccountServiceImpl::new(
            user_repo.clone(),
            deposit_repo.clone(),
            withdrawal_repo.clone(),
            jwt_utils.clone(),
            notifier.clone(),
        ));
        let admin_service = Arc::new(AdminServiceImpl::new(
            admin_repo,
            user_repo.clone(),
            deposit_repo.clone(),
            withdrawal_repo.clone(),
            jwt_utils.clone(),
            notifier.clone(),
        ));
        let settlement = Arc::new(SettlementService::new(
            user_repo,
            deposit_repo,
            withdrawal_repo,
            job_state_repo,
            notifier,
            scheduler_config.batch_concurrency,
        ));

        // Seed the admin account if credentials are configured.
        match AdminUserConfig::from_env() {
            Ok(admin_conf) => {
                if let Err(e) = admin_service.ensure_admin(&admin_conf).await {
                    error!("Failed to bootstrap admin account: {}", e);
                }
            }
            Err(e) => warn!("Admin credentials not configured, skipping bootstrap: {}", e),
        }

        let user_auth_state = Arc::new(UserAuthState { jwt_utils: jwt_utils.clone() });
        let admin_auth_state = Arc::new(AdminAuthState { jwt_utils });
        let admin_state = Arc::new(AdminState {
            admin_service,
            settlement: settlement.clone(),
        });

        let router = Router::new()
            .merge(auth_router(auth_service))
            .merge(user_router(account_service, user_auth_state))
            .merge(admin_router(admin_state, admin_auth_state))
            .route("/health", get(|| async { "OK" }));

        let scheduler = Scheduler::start(&scheduler_config, settlement);

        Ok(App { config, router, scheduler })
    }

    pub async fn start(self) -> Result<(), AppError> {
        let host = self
            .config
            .host
            .parse()
            .map_err(|_| AppError::Startup(format!("Invalid host: {}", self.config.host)))?;
        let addr = SocketAddr::new(host, self.config.port);
        info!("Server running at http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::Startup(format!("Failed to bind {}: {}", addr, e)))?;

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| AppError::Startup(format!("Server error: {}", e)))?;

        self.scheduler.shutdown();
        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    } else {
        info!("Shutdown signal received");
    }
}
