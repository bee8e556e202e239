use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequestDto {
    #[validate(length(min = 2, max = 100))]
    pub full_name: String,
    #[validate(length(min = 2, max = 64))]
    pub nationality: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePasswordRequestDto {
    #[validate(length(min = 8, max = 128))]
    pub old_password: String,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DepositRequestDto {
    #[validate(range(min = 0.01))]
    pub amount: f64,
    #[validate(length(min = 2, max = 16))]
    pub coin: String,
    #[validate(length(min = 2, max = 32))]
    pub plan: String,
    #[validate(range(min = 0.0))]
    pub daily_return: f64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct WithdrawalRequestDto {
    #[validate(range(min = 0.01))]
    pub amount: f64,
    #[validate(length(min = 2, max = 16))]
    pub coin: String,
    #[validate(length(min = 10, max = 128))]
    pub wallet_address: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SupportRequestDto {
    #[validate(length(min = 2, max = 120))]
    pub subject: String,
    #[validate(length(min = 2, max = 4000))]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ReferralCountResponseDto {
    pub referral_count: u64,
}
