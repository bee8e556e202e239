use crate::config::AdminUserConfig;
use crate::model::admin::Admin;
use crate::repository::admin_repo::AdminRepository;
use crate::repository::deposit_repo::DepositRepository;
use crate::repository::repository_error::RepositoryError;
use crate::repository::user_repo::UserRepository;
use crate::repository::withdrawal_repo::WithdrawalRepository;
use crate::service::auth_service::UserProfile;
use crate::util::email::Notifier;
use crate::util::error::ServiceError;
use crate::util::jwt::{JwtTokenUtils, JwtTokenUtilsImpl, TokenPair};
use crate::util::password::{PasswordUtils, PasswordUtilsImpl};
use async_trait::async_trait;
use bson::oid::ObjectId;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

#[async_trait]
pub trait AdminService: Send + Sync {
    async fn sign_in(&self, email: String, password: String) -> Result<TokenPair, ServiceError>;
    async fn list_users(&self) -> Result<Vec<UserProfile>, ServiceError>;
    /// Removes the user and their deposit and withdrawal records.
    async fn delete_user(&self, user_id: &ObjectId) -> Result<(), ServiceError>;
    /// Sends one email per user, in order, aborting on the first failure.
    async fn broadcast(&self, subject: String, body: String) -> Result<usize, ServiceError>;
}

pub struct AdminServiceImpl {
    pub admin_repo: Arc<dyn AdminRepository>,
    pub user_repo: Arc<dyn UserRepository>,
    pub deposit_repo: Arc<dyn DepositRepository>,
    pub withdrawal_repo: Arc<dyn WithdrawalRepository>,
    pub jwt_utils: Arc<JwtTokenUtilsImpl>,
    pub notifier: Arc<dyn Notifier>,
}

impl AdminServiceImpl {
    pub fn new(
        admin_repo: Arc<dyn AdminRepository>,
        user_repo: Arc<dyn UserRepository>,
        deposit_repo: Arc<dyn DepositRepository>,
        withdrawal_repo: Arc<dyn WithdrawalRepository>,
        jwt_utils: Arc<JwtTokenUtilsImpl>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self { admin_repo, user_repo, deposit_repo, withdrawal_repo, jwt_utils, notifier }
    }

    /// Seed the admin account from configuration if it does not exist yet.
    #[instrument(skip(self, config), fields(email = %config.email))]
    pub async fn ensure_admin(&self, config: &AdminUserConfig) -> Result<(), ServiceError> {
        let email = config.email.trim().to_lowercase();
        if self.admin_repo.find_by_email(&email).await?.is_some() {
            return Ok(());
        }

        let password_hash = PasswordUtilsImpl::hash_password(&config.password)
            .map_err(|e| ServiceError::InternalError(format!("Password hash error: {}", e)))?;
        let admin = Admin {
            id: None,
            email,
            password_hash,
            created_at: None,
            updated_at: None,
        };
        self.admin_repo.insert(admin).await?;
        info!("Admin account bootstrapped");
        Ok(())
    }
}

#[async_trait]
impl AdminService for AdminServiceImpl {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_in(&self, email: String, password: String) -> Result<TokenPair, ServiceError> {
        let email = email.trim().to_lowercase();

        // Same error for unknown email and wrong password.
        let admin = self
            .admin_repo
            .find_by_email(&email)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("Invalid credentials".to_string()))?;

        let valid = PasswordUtilsImpl::verify_password(&password, &admin.password_hash)
            .map_err(|e| ServiceError::InternalError(format!("Password verify error: {}", e)))?;
        if !valid {
            warn!("Invalid admin credentials for: {}", email);
            return Err(ServiceError::Unauthorized("Invalid credentials".to_string()));
        }

        let tokens = self
            .jwt_utils
            .generate_token_pair(
                &admin.id.as_ref().map(|id| id.to_string()).unwrap_or_default(),
                &admin.email,
                "admin",
            )
            .map_err(|e| ServiceError::InternalError(format!("JWT error: {}", e)))?;
        info!("Admin signed in");
        Ok(tokens)
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<UserProfile>, ServiceError> {
        let users = self.user_repo.list_all().await?;
        Ok(users.into_iter().map(UserProfile::from).collect())
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn delete_user(&self, user_id: &ObjectId) -> Result<(), ServiceError> {
        self.user_repo.delete(user_id).await?;

        // Companion records may already be gone; only real failures propagate.
        match self.deposit_repo.delete_by_investor(user_id).await {
            Ok(()) | Err(RepositoryError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
        match self.withdrawal_repo.delete_by_investor(user_id).await {
            Ok(()) | Err(RepositoryError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        info!("User and companion records deleted");
        Ok(())
    }

    #[instrument(skip(self, subject, body), fields(subject = %subject))]
    async fn broadcast(&self, subject: String, body: String) -> Result<usize, ServiceError> {
        if subject.trim().is_empty() || body.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "Subject and body are required".to_string(),
            ));
        }

        let users = self.user_repo.list_all().await?;
        let mut sent = 0usize;
        for user in &users {
            if let Err(e) = self.notifier.send_broadcast_email(&user.email, &subject, &body).await {
                error!(sent, "Broadcast aborted at {}: {}", user.email, e);
                return Err(ServiceError::InternalError(format!(
                    "Broadcast aborted after {} emails: {}",
                    sent, e
                )));
            }
            sent += 1;
        }

        info!(sent, "Broadcast complete");
        Ok(sent)
    }
}
