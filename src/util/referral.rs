//! Referral code and password reset token generation.
//!
//! Both are short random identifiers that must be unique across the users
//! collection, so generation retries against the repository a bounded number
//! of times before giving up.

use crate::repository::user_repo::UserRepository;
use crate::util::error::ServiceError;
use rand::Rng;
use tracing::{debug, warn};

const REFERRAL_CODE_LEN: usize = 6;
const RESET_TOKEN_BYTES: usize = 3;
const MAX_GENERATION_ATTEMPTS: usize = 10;

const REFERRAL_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

fn random_referral_code() -> String {
    let mut rng = rand::thread_rng();
    (0..REFERRAL_CODE_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..REFERRAL_CHARSET.len());
            REFERRAL_CHARSET[idx] as char
        })
        .collect()
}

fn random_reset_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; RESET_TOKEN_BYTES] = rng.gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Generate a referral code no existing user holds.
pub async fn generate_unique_referral_code(
    users: &dyn UserRepository,
) -> Result<String, ServiceError> {
    for attempt in 0..MAX_GENERATION_ATTEMPTS {
        let code = random_referral_code();
        if users.find_by_referral_code(&code).await?.is_none() {
            debug!(attempt, "Generated unique referral code");
            return Ok(code);
        }
        warn!(attempt, "Referral code collision, retrying");
    }
    Err(ServiceError::InternalError(
        "Could not generate a unique referral code".to_string(),
    ))
}

/// Generate a password reset token no other pending reset holds.
pub async fn generate_unique_reset_token(
    users: &dyn UserRepository,
) -> Result<String, ServiceError> {
    for attempt in 0..MAX_GENERATION_ATTEMPTS {
        let token = random_reset_token();
        if users.find_by_reset_token(&token).await?.is_none() {
            debug!(attempt, "Generated unique reset token");
            return Ok(token);
        }
        warn!(attempt, "Reset token collision, retrying");
    }
    Err(ServiceError::InternalError(
        "Could not generate a unique reset token".to_string(),
    ))
}
