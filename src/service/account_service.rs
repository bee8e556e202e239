use crate::model::deposit::Deposit;
use crate::model::withdrawal::Withdrawal;
use crate::repository::deposit_repo::{DepositRepository, DepositRequest};
use crate::repository::user_repo::UserRepository;
use crate::repository::withdrawal_repo::WithdrawalRepository;
use crate::service::auth_service::UserProfile;
use crate::util::email::Notifier;
use crate::util::error::ServiceError;
use crate::util::jwt::{JwtTokenUtils, JwtTokenUtilsImpl, TokenPair};
use crate::util::password::{PasswordUtils, PasswordUtilsImpl};
use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// A deposit request as it arrives from the client, before persistence.
#[derive(Debug, Clone)]
pub struct NewDeposit {
    pub amount: f64,
    pub coin: String,
    pub plan: String,
    pub daily_return: f64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewWithdrawal {
    pub amount: f64,
    pub coin: String,
    pub wallet_address: String,
}

/// Everything the investor dashboard renders in one read.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Dashboard {
    pub profile: UserProfile,
    pub deposit: Deposit,
    pub withdrawal: Withdrawal,
    pub referral_count: u64,
}

#[async_trait]
pub trait AccountService: Send + Sync {
    async fn update_profile(
        &self,
        user_id: &ObjectId,
        full_name: String,
        nationality: String,
    ) -> Result<UserProfile, ServiceError>;
    /// Changing the password rotates the token pair.
    async fn update_password(
        &self,
        user_id: &ObjectId,
        old_password: String,
        new_password: String,
    ) -> Result<TokenPair, ServiceError>;
    async fn referral_count(&self, user_id: &ObjectId) -> Result<u64, ServiceError>;
    async fn request_deposit(
        &self,
        user_id: &ObjectId,
        request: NewDeposit,
    ) -> Result<(), ServiceError>;
    async fn request_withdrawal(
        &self,
        user_id: &ObjectId,
        request: NewWithdrawal,
    ) -> Result<(), ServiceError>;
    async fn send_support_request(
        &self,
        user_id: &ObjectId,
        subject: String,
        message: String,
    ) -> Result<(), ServiceError>;
    async fn dashboard(&self, user_id: &ObjectId) -> Result<Dashboard, ServiceError>;
}

pub struct AccountServiceImpl {
    pub user_repo: Arc<dyn UserRepository>,
    pub deposit_repo: Arc<dyn DepositRepository>,
    pub withdrawal_repo: Arc<dyn WithdrawalRepository>,
    pub jwt_utils: Arc<JwtTokenUtilsImpl>,
    pub notifier: Arc<dyn Notifier>,
}

impl AccountServiceImpl {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        deposit_repo: Arc<dyn DepositRepository>,
        withdrawal_repo: Arc<dyn WithdrawalRepository>,
        jwt_utils: Arc<JwtTokenUtilsImpl>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self { user_repo, deposit_repo, withdrawal_repo, jwt_utils, notifier }
    }

    async fn require_user(&self, user_id: &ObjectId) -> Result<crate::model::user::User, ServiceError> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))
    }
}

#[async_trait]
impl AccountService for AccountServiceImpl {
    #[instrument(skip(self, full_name, nationality), fields(user_id = %user_id))]
    async fn update_profile(
        &self,
        user_id: &ObjectId,
        full_name: String,
        nationality: String,
    ) -> Result<UserProfile, ServiceError> {
        if full_name.trim().is_empty() {
            return Err(ServiceError::InvalidInput("Full name cannot be empty".to_string()));
        }

        self.user_repo
            .update_profile(user_id, full_name.trim(), nationality.trim())
            .await?;
        let user = self.require_user(user_id).await?;
        info!("Profile updated");
        Ok(user.into())
    }

    #[instrument(skip(self, old_password, new_password), fields(user_id = %user_id))]
    async fn update_password(
        &self,
        user_id: &ObjectId,
        old_password: String,
        new_password: String,
    ) -> Result<TokenPair, ServiceError> {
        let user = self.require_user(user_id).await?;

        let valid = PasswordUtilsImpl::verify_password(&old_password, &user.password_hash)
            .map_err(|e| ServiceError::InternalError(format!("Password verify error: {}", e)))?;
        if !valid {
            warn!("Password change rejected, old password mismatch");
            return Err(ServiceError::Unauthorized("Current password is incorrect".to_string()));
        }

        if let Err(errors) = PasswordUtilsImpl::validate_password_strength(&new_password) {
            return Err(ServiceError::InvalidInput(errors.join("; ")));
        }

        let password_hash = PasswordUtilsImpl::hash_password(&new_password)
            .map_err(|e| ServiceError::InternalError(format!("Password hash error: {}", e)))?;
        self.user_repo.update_password(user_id, &password_hash).await?;

        let tokens = self
            .jwt_utils
            .generate_token_pair(&user_id.to_string(), &user.email, "user")
            .map_err(|e| ServiceError::InternalError(format!("JWT error: {}", e)))?;
        info!("Password updated, token pair rotated");
        Ok(tokens)
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn referral_count(&self, user_id: &ObjectId) -> Result<u64, ServiceError> {
        let user = self.require_user(user_id).await?;
        let count = self.user_repo.count_referred_by(&user.referral_code).await?;
        Ok(count)
    }

    #[instrument(skip(self, request), fields(user_id = %user_id, amount = request.amount, plan = %request.plan))]
    async fn request_deposit(
        &self,
        user_id: &ObjectId,
        request: NewDeposit,
    ) -> Result<(), ServiceError> {
        if request.amount <= 0.0 {
            return Err(ServiceError::InvalidInput(
                "Deposit amount must be positive".to_string(),
            ));
        }
        if request.daily_return < 0.0 {
            return Err(ServiceError::InvalidInput(
                "Daily return cannot be negative".to_string(),
            ));
        }
        if request.end_date <= request.start_date {
            return Err(ServiceError::InvalidInput(
                "Plan end date must be after the start date".to_string(),
            ));
        }

        let user = self.require_user(user_id).await?;

        let repo_request = DepositRequest {
            amount: request.amount,
            coin: request.coin.clone(),
            plan: request.plan.clone(),
            daily_return: request.daily_return,
            start_date: bson::DateTime::from_chrono(request.start_date),
            end_date: bson::DateTime::from_chrono(request.end_date),
        };
        self.deposit_repo.record_request(user_id, &repo_request).await?;

        // The pending write is already durable; the next scan picks it up
        // even though the caller sees the notification failure.
        if let Err(e) = self
            .notifier
            .send_deposit_request_emails(
                &user.email,
                &user.full_name,
                request.amount,
                &request.coin,
                &request.plan,
            )
            .await
        {
            error!("Failed to send deposit request emails: {}", e);
            return Err(ServiceError::InternalError(format!(
                "Deposit request recorded but notification emails failed: {}",
                e
            )));
        }

        info!("Deposit request recorded");
        Ok(())
    }

    #[instrument(skip(self, request), fields(user_id = %user_id, amount = request.amount))]
    async fn request_withdrawal(
        &self,
        user_id: &ObjectId,
        request: NewWithdrawal,
    ) -> Result<(), ServiceError> {
        if request.amount <= 0.0 {
            return Err(ServiceError::InvalidInput(
                "Withdrawal amount must be positive".to_string(),
            ));
        }
        if request.wallet_address.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "Wallet address is required".to_string(),
            ));
        }

        let user = self.require_user(user_id).await?;

        let deposit = self
            .deposit_repo
            .find_by_investor(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Deposit record not found".to_string()))?;
        if request.amount > deposit.balance {
            return Err(ServiceError::InvalidInput(
                "Withdrawal amount exceeds available balance".to_string(),
            ));
        }

        self.withdrawal_repo
            .record_request(user_id, request.amount, &request.coin, request.wallet_address.trim())
            .await?;

        if let Err(e) = self
            .notifier
            .send_withdrawal_request_emails(
                &user.email,
                &user.full_name,
                request.amount,
                &request.coin,
                &request.wallet_address,
            )
            .await
        {
            error!("Failed to send withdrawal request emails: {}", e);
            return Err(ServiceError::InternalError(format!(
                "Withdrawal request recorded but notification emails failed: {}",
                e
            )));
        }

        info!("Withdrawal request recorded");
        Ok(())
    }

    #[instrument(skip(self, subject, message), fields(user_id = %user_id))]
    async fn send_support_request(
        &self,
        user_id: &ObjectId,
        subject: String,
        message: String,
    ) -> Result<(), ServiceError> {
        if subject.trim().is_empty() || message.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "Subject and message are required".to_string(),
            ));
        }

        let user = self.require_user(user_id).await?;
        self.notifier
            .send_support_email(&user.email, &user.full_name, subject.trim(), message.trim())
            .await
            .map_err(|e| {
                error!("Failed to forward support request: {}", e);
                ServiceError::InternalError(format!("Failed to send support request: {}", e))
            })?;
        info!("Support request forwarded");
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn dashboard(&self, user_id: &ObjectId) -> Result<Dashboard, ServiceError> {
        let user = self.require_user(user_id).await?;
        let deposit = self
            .deposit_repo
            .find_by_investor(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Deposit record not found".to_string()))?;
        let withdrawal = self
            .withdrawal_repo
            .find_by_investor(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Withdrawal record not found".to_string()))?;
        let referral_count = self.user_repo.count_referred_by(&user.referral_code).await?;

        Ok(Dashboard { profile: user.into(), deposit, withdrawal, referral_count })
    }
}
