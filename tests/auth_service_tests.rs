mod common;

use chrono::{Duration, Utc};
use common::*;
use cryptfx_backend::config::JwtConfig;
use cryptfx_backend::repository::user_repo::UserRepository;
use cryptfx_backend::service::auth_service::{AuthService, AuthServiceImpl, SignUpRequest};
use cryptfx_backend::util::error::ServiceError;
use cryptfx_backend::util::jwt::JwtTokenUtilsImpl;
use cryptfx_backend::util::password::{PasswordUtils, PasswordUtilsImpl};
use std::sync::Arc;

struct Fixture {
    users: Arc<InMemoryUserRepo>,
    deposits: Arc<InMemoryDepositRepo>,
    withdrawals: Arc<InMemoryWithdrawalRepo>,
    notifier: Arc<RecordingNotifier>,
    service: AuthServiceImpl,
}

fn fixture() -> Fixture {
    let users = Arc::new(InMemoryUserRepo::new());
    let deposits = Arc::new(InMemoryDepositRepo::new());
    let withdrawals = Arc::new(InMemoryWithdrawalRepo::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let jwt_utils = Arc::new(JwtTokenUtilsImpl::new(JwtConfig::default()));
    let service = AuthServiceImpl::new(
        users.clone(),
        deposits.clone(),
        withdrawals.clone(),
        jwt_utils,
        notifier.clone(),
    );
    Fixture { users, deposits, withdrawals, notifier, service }
}

fn sign_up_request(username: &str) -> SignUpRequest {
    SignUpRequest {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        password: "Sup3rSecret".to_string(),
        full_name: format!("{} Test", username),
        nationality: "Testland".to_string(),
        referred_by_code: None,
    }
}

#[tokio::test]
async fn test_sign_up_creates_user_and_companion_records() {
    let fx = fixture();

    let response = fx.service.sign_up(sign_up_request("alice")).await.unwrap();
    let user_id = response.user.id.unwrap();

    assert_eq!(response.user.email, "alice@example.com");
    assert_eq!(response.user.referral_code.len(), 6);
    assert!(!response.tokens.access_token.is_empty());
    assert!(!response.tokens.refresh_token.is_empty());

    // Empty deposit and withdrawal records exist from day one.
    let deposit = fx.deposits.get_by_investor(&user_id).unwrap();
    assert_eq!(deposit.balance, 0.0);
    assert!(!deposit.is_active);
    let withdrawal = fx.withdrawals.get_by_investor(&user_id).unwrap();
    assert_eq!(withdrawal.withdrawal_amount, 0.0);

    assert_eq!(fx.notifier.count_kind("welcome"), 1);

    // The stored hash is not the raw password.
    let stored = fx.users.get(&user_id).unwrap();
    assert_ne!(stored.password_hash, "Sup3rSecret");
    assert!(stored.password_hash.starts_with("$argon2"));
}

#[tokio::test]
async fn test_sign_up_rejects_duplicate_email() {
    let fx = fixture();
    fx.service.sign_up(sign_up_request("bob")).await.unwrap();

    let mut dup = sign_up_request("bobby");
    dup.email = "bob@example.com".to_string();
    let err = fx.service.sign_up(dup).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn test_sign_up_rejects_weak_password() {
    let fx = fixture();
    let mut request = sign_up_request("carol");
    request.password = "weak".to_string();
    let err = fx.service.sign_up(request).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
}

#[tokio::test]
async fn test_sign_up_rejects_unknown_referral_code() {
    let fx = fixture();
    let mut request = sign_up_request("dave");
    request.referred_by_code = Some("ZZZZZZ".to_string());
    let err = fx.service.sign_up(request).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
}

#[tokio::test]
async fn test_sign_up_links_valid_referral_code() {
    let fx = fixture();
    let referrer = fx.service.sign_up(sign_up_request("erin")).await.unwrap();

    let mut request = sign_up_request("frank");
    request.referred_by_code = Some(referrer.user.referral_code.clone());
    fx.service.sign_up(request).await.unwrap();

    let count = fx.users.count_referred_by(&referrer.user.referral_code).await.unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_sign_in_with_wrong_password_is_unauthorized() {
    let fx = fixture();
    fx.service.sign_up(sign_up_request("grace")).await.unwrap();

    let err = fx
        .service
        .sign_in("grace@example.com".to_string(), "WrongPass123".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Unauthorized(_)));
}

#[tokio::test]
async fn test_sign_in_returns_token_pair() {
    let fx = fixture();
    fx.service.sign_up(sign_up_request("heidi")).await.unwrap();

    let response = fx
        .service
        .sign_in("heidi@example.com".to_string(), "Sup3rSecret".to_string())
        .await
        .unwrap();
    assert_eq!(response.tokens.token_type, "Bearer");
}

#[tokio::test]
async fn test_refresh_token_rotates_pair() {
    let fx = fixture();
    let response = fx.service.sign_up(sign_up_request("ivan")).await.unwrap();

    let tokens = fx
        .service
        .refresh_token(response.tokens.refresh_token.clone())
        .await
        .unwrap();
    assert!(!tokens.access_token.is_empty());
}

#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let fx = fixture();
    let response = fx.service.sign_up(sign_up_request("judy")).await.unwrap();

    let err = fx
        .service
        .refresh_token(response.tokens.access_token.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Unauthorized(_)));
}

#[tokio::test]
async fn test_forgot_password_issues_expiring_token() {
    let fx = fixture();
    let response = fx.service.sign_up(sign_up_request("kate")).await.unwrap();

    fx.service.forgot_password("kate@example.com".to_string()).await.unwrap();
    assert_eq!(fx.notifier.count_kind("password_reset"), 1);

    let stored = fx.users.get(&response.user.id.unwrap()).unwrap();
    assert_eq!(stored.reset_token.len(), 6);
    assert!(stored.reset_token_expiry.is_some());
    let expiry = stored.reset_token_expiry.unwrap().to_chrono();
    assert!(expiry > Utc::now());
    assert!(expiry <= Utc::now() + Duration::minutes(31));
}

#[tokio::test]
async fn test_reset_password_full_flow() {
    let fx = fixture();
    let response = fx.service.sign_up(sign_up_request("leo")).await.unwrap();
    fx.service.forgot_password("leo@example.com".to_string()).await.unwrap();

    let token = fx.notifier.last_reset_token.lock().unwrap().clone().unwrap();
    fx.service
        .reset_password(token.clone(), "An0therSecret".to_string())
        .await
        .unwrap();

    let stored = fx.users.get(&response.user.id.unwrap()).unwrap();
    assert!(PasswordUtilsImpl::verify_password("An0therSecret", &stored.password_hash).unwrap());
    // Token is single-use.
    assert!(stored.reset_token.is_empty());
    let err = fx
        .service
        .reset_password(token, "YetAn0therOne".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
}

#[tokio::test]
async fn test_reset_password_rejects_expired_token() {
    let fx = fixture();
    let response = fx.service.sign_up(sign_up_request("mona")).await.unwrap();
    let user_id = response.user.id.unwrap();

    let expired = Utc::now() - Duration::minutes(1);
    fx.users
        .update_reset_token(&user_id, "abc123", bson::DateTime::from_chrono(expired))
        .await
        .unwrap();

    let err = fx
        .service
        .reset_password("abc123".to_string(), "An0therSecret".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
}

#[tokio::test]
async fn test_reset_password_rejects_old_password_reuse() {
    let fx = fixture();
    fx.service.sign_up(sign_up_request("nick")).await.unwrap();
    fx.service.forgot_password("nick@example.com".to_string()).await.unwrap();

    let token = fx.notifier.last_reset_token.lock().unwrap().clone().unwrap();
    let err = fx
        .service
        .reset_password(token, "Sup3rSecret".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
}
