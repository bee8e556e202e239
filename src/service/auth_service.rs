use crate::model::deposit::Deposit;
use crate::model::user::User;
use crate::model::withdrawal::Withdrawal;
use crate::repository::deposit_repo::DepositRepository;
use crate::repository::user_repo::UserRepository;
use crate::repository::withdrawal_repo::WithdrawalRepository;
use crate::util::email::Notifier;
use crate::util::error::ServiceError;
use crate::util::jwt::{JwtTokenUtils, JwtTokenUtilsImpl, TokenPair};
use crate::util::password::{PasswordUtils, PasswordUtilsImpl};
use crate::util::referral;
use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

const RESET_TOKEN_TTL_MINUTES: i64 = 30;

/// Fields collected at registration.
#[derive(Debug, Clone)]
pub struct SignUpRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub nationality: String,
    pub referred_by_code: Option<String>,
}

/// A user with credential fields stripped, safe to return to clients.
#[derive(Debug, Clone, serde::Serialize)]
pub struct UserProfile {
    pub id: Option<ObjectId>,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub nationality: String,
    pub referral_code: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        UserProfile {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            nationality: user.nationality,
            referral_code: user.referral_code,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub tokens: TokenPair,
}

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_up(&self, request: SignUpRequest) -> Result<AuthResponse, ServiceError>;
    async fn sign_in(&self, email: String, password: String) -> Result<AuthResponse, ServiceError>;
    async fn refresh_token(&self, refresh_token: String) -> Result<TokenPair, ServiceError>;
    async fn forgot_password(&self, email: String) -> Result<(), ServiceError>;
    async fn reset_password(&self, token: String, new_password: String) -> Result<(), ServiceError>;
}

pub struct AuthServiceImpl {
    pub user_repo: Arc<dyn UserRepository>,
    pub deposit_repo: Arc<dyn DepositRepository>,
    pub withdrawal_repo: Arc<dyn WithdrawalRepository>,
    pub jwt_utils: Arc<JwtTokenUtilsImpl>,
    pub notifier: Arc<dyn Notifier>,
}

impl AuthServiceImpl {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        deposit_repo: Arc<dyn DepositRepository>,
        withdrawal_repo: Arc<dyn WithdrawalRepository>,
        jwt_utils: Arc<JwtTokenUtilsImpl>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self { user_repo, deposit_repo, withdrawal_repo, jwt_utils, notifier }
    }

    fn token_pair_for(&self, user: &User) -> Result<TokenPair, ServiceError> {
        self.jwt_utils
            .generate_token_pair(
                &user.id.as_ref().map(|id| id.to_string()).unwrap_or_default(),
                &user.email,
                "user",
            )
            .map_err(|e| ServiceError::InternalError(format!("JWT error: {}", e)))
    }
}

#[async_trait]
impl AuthService for AuthServiceImpl {
    #[instrument(skip(self, request), fields(username = %request.username, email = %request.email))]
    async fn sign_up(&self, request: SignUpRequest) -> Result<AuthResponse, ServiceError> {
        info!("Registering new investor");

        if let Err(errors) = PasswordUtilsImpl::validate_password_strength(&request.password) {
            return Err(ServiceError::InvalidInput(errors.join("; ")));
        }

        let email = request.email.trim().to_lowercase();
        let username = request.username.trim().to_lowercase();

        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(ServiceError::Conflict("Email already registered".to_string()));
        }
        if self.user_repo.find_by_username(&username).await?.is_some() {
            return Err(ServiceError::Conflict("Username already taken".to_string()));
        }

        // An unknown referral code is a typo, not a silent no-op.
        let referred_by_code = match request.referred_by_code {
            Some(code) if !code.trim().is_empty() => {
                let code = code.trim().to_uppercase();
                if self.user_repo.find_by_referral_code(&code).await?.is_none() {
                    return Err(ServiceError::InvalidInput("Unknown referral code".to_string()));
                }
                Some(code)
            }
            _ => None,
        };

        let referral_code = referral::generate_unique_referral_code(self.user_repo.as_ref()).await?;

        let password_hash = PasswordUtilsImpl::hash_password(&request.password)
            .map_err(|e| ServiceError::InternalError(format!("Password hash error: {}", e)))?;

        let user = User {
            id: None,
            username,
            email,
            password_hash,
            full_name: request.full_name,
            nationality: request.nationality,
            referral_code,
            referred_by_code,
            reset_token: String::new(),
            reset_token_expiry: None,
            created_at: None,
            updated_at: None,
        };

        let user = self.user_repo.insert(user).await?;
        let user_id = user
            .id
            .ok_or_else(|| ServiceError::InternalError("Inserted user has no ID".to_string()))?;

        // Every investor carries exactly one deposit and one withdrawal record.
        self.deposit_repo.create(Deposit::empty(user_id)).await?;
        self.withdrawal_repo.create(Withdrawal::empty(user_id)).await?;

        if let Err(e) = self.notifier.send_welcome_email(&user.email, &user.full_name).await {
            error!("Failed to send welcome email: {}", e);
            return Err(ServiceError::InternalError(format!(
                "Account created but welcome email failed: {}",
                e
            )));
        }

        let tokens = self.token_pair_for(&user)?;
        info!("Investor registered successfully");
        Ok(AuthResponse { user: user.into(), tokens })
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_in(&self, email: String, password: String) -> Result<AuthResponse, ServiceError> {
        let email = email.trim().to_lowercase();
        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

        let valid = PasswordUtilsImpl::verify_password(&password, &user.password_hash)
            .map_err(|e| ServiceError::InternalError(format!("Password verify error: {}", e)))?;
        if !valid {
            warn!("Invalid credentials for: {}", email);
            return Err(ServiceError::Unauthorized("Invalid credentials".to_string()));
        }

        let tokens = self.token_pair_for(&user)?;
        info!("Investor signed in");
        Ok(AuthResponse { user: user.into(), tokens })
    }

    #[instrument(skip(self, refresh_token))]
    async fn refresh_token(&self, refresh_token: String) -> Result<TokenPair, ServiceError> {
        let claims = self
            .jwt_utils
            .validate_refresh_token(&refresh_token)
            .map_err(|e| ServiceError::Unauthorized(format!("Invalid refresh token: {}", e)))?;

        // The account must still exist for the rotation to be honored.
        let id = ObjectId::parse_str(&claims.sub)
            .map_err(|_| ServiceError::Unauthorized("Invalid token subject".to_string()))?;
        let user = self
            .user_repo
            .find_by_id(&id)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("Account no longer exists".to_string()))?;

        self.token_pair_for(&user)
    }

    #[instrument(skip(self), fields(email = %email))]
    async fn forgot_password(&self, email: String) -> Result<(), ServiceError> {
        let email = email.trim().to_lowercase();
        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;
        let user_id = user
            .id
            .ok_or_else(|| ServiceError::InternalError("User has no ID".to_string()))?;

        let token = referral::generate_unique_reset_token(self.user_repo.as_ref()).await?;
        let expiry = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);
        self.user_repo
            .update_reset_token(&user_id, &token, bson::DateTime::from_chrono(expiry))
            .await?;

        self.notifier
            .send_password_reset_email(&user.email, &user.full_name, &token)
            .await
            .map_err(|e| {
                error!("Failed to send password reset email: {}", e);
                ServiceError::InternalError(format!("Failed to send reset email: {}", e))
            })?;

        info!("Password reset token issued");
        Ok(())
    }

    #[instrument(skip(self, token, new_password))]
    async fn reset_password(&self, token: String, new_password: String) -> Result<(), ServiceError> {
        let token = token.trim().to_string();
        if token.is_empty() {
            return Err(ServiceError::InvalidInput("Reset token is required".to_string()));
        }

        let user = self
            .user_repo
            .find_by_reset_token(&token)
            .await?
            .ok_or_else(|| ServiceError::InvalidInput("Invalid reset token".to_string()))?;

        let expired = match user.reset_token_expiry {
            Some(expiry) => expiry.to_chrono() < Utc::now(),
            None => true,
        };
        if expired {
            return Err(ServiceError::InvalidInput("Reset token has expired".to_string()));
        }

        if let Err(errors) = PasswordUtilsImpl::validate_password_strength(&new_password) {
            return Err(ServiceError::InvalidInput(errors.join("; ")));
        }

        let same_as_old = PasswordUtilsImpl::verify_password(&new_password, &user.password_hash)
            .map_err(|e| ServiceError::InternalError(format!("Password verify error: {}", e)))?;
        if same_as_old {
            return Err(ServiceError::InvalidInput(
                "New password must differ from the old password".to_string(),
            ));
        }

        let user_id = user
            .id
            .ok_or_else(|| ServiceError::InternalError("User has no ID".to_string()))?;
        let password_hash = PasswordUtilsImpl::hash_password(&new_password)
            .map_err(|e| ServiceError::InternalError(format!("Password hash error: {}", e)))?;

        self.user_repo.update_password(&user_id, &password_hash).await?;
        // Invalidate the token so it cannot be replayed.
        self.user_repo
            .update_reset_token(&user_id, "", bson::DateTime::from_chrono(Utc::now()))
            .await?;

        info!("Password reset completed");
        Ok(())
    }
}
