mod common;

use bson::oid::ObjectId;
use chrono::{Duration, Utc};
use common::*;
use cryptfx_backend::config::JwtConfig;
use cryptfx_backend::model::deposit::Deposit;
use cryptfx_backend::model::withdrawal::Withdrawal;
use cryptfx_backend::repository::deposit_repo::DepositRepository;
use cryptfx_backend::repository::user_repo::UserRepository;
use cryptfx_backend::repository::withdrawal_repo::WithdrawalRepository;
use cryptfx_backend::service::account_service::{
    AccountService, AccountServiceImpl, NewDeposit, NewWithdrawal,
};
use cryptfx_backend::util::error::ServiceError;
use cryptfx_backend::util::jwt::JwtTokenUtilsImpl;
use cryptfx_backend::util::password::{PasswordUtils, PasswordUtilsImpl};
use std::sync::Arc;

struct Fixture {
    users: Arc<InMemoryUserRepo>,
    deposits: Arc<InMemoryDepositRepo>,
    withdrawals: Arc<InMemoryWithdrawalRepo>,
    notifier: Arc<RecordingNotifier>,
    service: AccountServiceImpl,
}

fn fixture() -> Fixture {
    let users = Arc::new(InMemoryUserRepo::new());
    let deposits = Arc::new(InMemoryDepositRepo::new());
    let withdrawals = Arc::new(InMemoryWithdrawalRepo::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let jwt_utils = Arc::new(JwtTokenUtilsImpl::new(JwtConfig::default()));
    let service = AccountServiceImpl::new(
        users.clone(),
        deposits.clone(),
        withdrawals.clone(),
        jwt_utils,
        notifier.clone(),
    );
    Fixture { users, deposits, withdrawals, notifier, service }
}

async fn seed_investor(fx: &Fixture, username: &str, code: &str) -> ObjectId {
    let mut user = make_user(username, &format!("{}@example.com", username), code);
    user.password_hash = PasswordUtilsImpl::hash_password("Sup3rSecret").unwrap();
    let user = fx.users.insert(user).await.unwrap();
    let id = user.id.unwrap();
    fx.deposits.create(Deposit::empty(id)).await.unwrap();
    fx.withdrawals.create(Withdrawal::empty(id)).await.unwrap();
    id
}

fn deposit_request(amount: f64) -> NewDeposit {
    NewDeposit {
        amount,
        coin: "BTC".to_string(),
        plan: "gold".to_string(),
        daily_return: 12.5,
        start_date: Utc::now(),
        end_date: Utc::now() + Duration::days(30),
    }
}

#[tokio::test]
async fn test_deposit_request_marks_pending_and_notifies() {
    let fx = fixture();
    let investor = seed_investor(&fx, "alice", "AAA111").await;

    fx.service.request_deposit(&investor, deposit_request(250.0)).await.unwrap();

    let deposit = fx.deposits.get_by_investor(&investor).unwrap();
    assert_eq!(deposit.pending_deposit, 250.0);
    assert_eq!(deposit.coin.as_deref(), Some("BTC"));
    assert_eq!(deposit.plan, "gold");
    assert_eq!(deposit.active_deposit, 250.0);
    // Balance only moves at settlement.
    assert_eq!(deposit.balance, 0.0);
    assert_eq!(fx.notifier.count_kind("deposit_request"), 1);
}

#[tokio::test]
async fn test_deposit_request_email_failure_surfaces_but_request_persists() {
    let fx = fixture();
    let investor = seed_investor(&fx, "olga", "OLG123").await;
    fx.notifier.fail_for("olga@example.com");

    let err = fx
        .service
        .request_deposit(&investor, deposit_request(250.0))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InternalError(_)));

    // The pending write landed before the notification attempt.
    let deposit = fx.deposits.get_by_investor(&investor).unwrap();
    assert_eq!(deposit.pending_deposit, 250.0);
}

#[tokio::test]
async fn test_withdrawal_request_email_failure_surfaces_but_request_persists() {
    let fx = fixture();
    let investor = seed_investor(&fx, "pete", "PTE123").await;
    fx.notifier.fail_for("pete@example.com");

    {
        let mut deposits = fx.deposits.deposits.lock().unwrap();
        deposits.values_mut().next().unwrap().balance = 500.0;
    }

    let request = NewWithdrawal {
        amount: 100.0,
        coin: "BTC".to_string(),
        wallet_address: "bc1qexampleaddress".to_string(),
    };
    let err = fx.service.request_withdrawal(&investor, request).await.unwrap_err();
    assert!(matches!(err, ServiceError::InternalError(_)));

    let withdrawal = fx.withdrawals.get_by_investor(&investor).unwrap();
    assert_eq!(withdrawal.pending_withdrawal, 100.0);
}

#[tokio::test]
async fn test_deposit_request_rejects_nonpositive_amount() {
    let fx = fixture();
    let investor = seed_investor(&fx, "bob", "BBB222").await;

    let err = fx
        .service
        .request_deposit(&investor, deposit_request(0.0))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
}

#[tokio::test]
async fn test_deposit_request_rejects_inverted_plan_window() {
    let fx = fixture();
    let investor = seed_investor(&fx, "carol", "CCC333").await;

    let mut request = deposit_request(100.0);
    request.end_date = request.start_date - Duration::days(1);
    let err = fx.service.request_deposit(&investor, request).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
}

#[tokio::test]
async fn test_deposit_request_for_unknown_user_is_not_found() {
    let fx = fixture();
    let err = fx
        .service
        .request_deposit(&ObjectId::new(), deposit_request(100.0))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_withdrawal_request_rejects_amount_over_balance() {
    let fx = fixture();
    let investor = seed_investor(&fx, "dave", "DDD444").await;

    let request = NewWithdrawal {
        amount: 50.0,
        coin: "BTC".to_string(),
        wallet_address: "bc1qexampleaddress".to_string(),
    };
    let err = fx.service.request_withdrawal(&investor, request).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
}

#[tokio::test]
async fn test_withdrawal_request_overwrites_pending() {
    let fx = fixture();
    let investor = seed_investor(&fx, "erin", "EEE555").await;

    {
        let mut deposits = fx.deposits.deposits.lock().unwrap();
        deposits.values_mut().next().unwrap().balance = 1000.0;
    }

    let first = NewWithdrawal {
        amount: 100.0,
        coin: "BTC".to_string(),
        wallet_address: "bc1qfirstaddress".to_string(),
    };
    let second = NewWithdrawal {
        amount: 400.0,
        coin: "ETH".to_string(),
        wallet_address: "0xsecondaddress00".to_string(),
    };
    fx.service.request_withdrawal(&investor, first).await.unwrap();
    fx.service.request_withdrawal(&investor, second).await.unwrap();

    // Last request wins.
    let withdrawal = fx.withdrawals.get_by_investor(&investor).unwrap();
    assert_eq!(withdrawal.pending_withdrawal, 400.0);
    assert_eq!(withdrawal.coin.as_deref(), Some("ETH"));
    assert_eq!(fx.notifier.count_kind("withdrawal_request"), 2);
}

#[tokio::test]
async fn test_withdrawal_request_requires_wallet_address() {
    let fx = fixture();
    let investor = seed_investor(&fx, "frank", "FFF666").await;

    let request = NewWithdrawal {
        amount: 10.0,
        coin: "BTC".to_string(),
        wallet_address: "   ".to_string(),
    };
    let err = fx.service.request_withdrawal(&investor, request).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
}

#[tokio::test]
async fn test_update_password_rotates_tokens() {
    let fx = fixture();
    let investor = seed_investor(&fx, "grace", "GGG777").await;

    let tokens = fx
        .service
        .update_password(&investor, "Sup3rSecret".to_string(), "An0therSecret".to_string())
        .await
        .unwrap();
    assert!(!tokens.access_token.is_empty());

    let stored = fx.users.get(&investor).unwrap();
    assert!(PasswordUtilsImpl::verify_password("An0therSecret", &stored.password_hash).unwrap());
}

#[tokio::test]
async fn test_update_password_rejects_wrong_old_password() {
    let fx = fixture();
    let investor = seed_investor(&fx, "heidi", "HHH888").await;

    let err = fx
        .service
        .update_password(&investor, "WrongOld123".to_string(), "An0therSecret".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Unauthorized(_)));
}

#[tokio::test]
async fn test_referral_count_counts_only_direct_referrals() {
    let fx = fixture();
    let referrer = seed_investor(&fx, "ivan", "IVN123").await;

    for name in ["judy", "kate"] {
        let mut user = make_user(name, &format!("{}@example.com", name), "XXXXXX");
        user.referral_code = format!("{}00", name.to_uppercase());
        user.referred_by_code = Some("IVN123".to_string());
        fx.users.insert(user).await.unwrap();
    }
    let mut unrelated = make_user("leo", "leo@example.com", "LEO123");
    unrelated.referred_by_code = Some("OTHER1".to_string());
    fx.users.insert(unrelated).await.unwrap();

    let count = fx.service.referral_count(&referrer).await.unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_dashboard_gathers_all_records() {
    let fx = fixture();
    let investor = seed_investor(&fx, "mona", "MNA123").await;

    let dashboard = fx.service.dashboard(&investor).await.unwrap();
    assert_eq!(dashboard.profile.username, "mona");
    assert_eq!(dashboard.deposit.investor, investor);
    assert_eq!(dashboard.withdrawal.investor, investor);
    assert_eq!(dashboard.referral_count, 0);
}

#[tokio::test]
async fn test_support_request_goes_to_operator() {
    let fx = fixture();
    let investor = seed_investor(&fx, "nick", "NCK123").await;

    fx.service
        .send_support_request(&investor, "Login issue".to_string(), "I cannot sign in".to_string())
        .await
        .unwrap();
    assert_eq!(fx.notifier.count_kind("support"), 1);
}
