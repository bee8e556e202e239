//! In-memory fakes for the repository and notifier seams, shared across the
//! integration test files.

#![allow(dead_code)]

use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::Utc;
use cryptfx_backend::model::admin::Admin;
use cryptfx_backend::model::deposit::Deposit;
use cryptfx_backend::model::user::User;
use cryptfx_backend::model::withdrawal::Withdrawal;
use cryptfx_backend::repository::admin_repo::AdminRepository;
use cryptfx_backend::repository::deposit_repo::{DepositRepository, DepositRequest};
use cryptfx_backend::repository::job_state_repo::JobStateRepository;
use cryptfx_backend::repository::repository_error::{RepositoryError, RepositoryResult};
use cryptfx_backend::repository::user_repo::UserRepository;
use cryptfx_backend::repository::withdrawal_repo::WithdrawalRepository;
use cryptfx_backend::util::email::{EmailError, Notifier};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Users

#[derive(Default)]
pub struct InMemoryUserRepo {
    pub users: Mutex<HashMap<ObjectId, User>>,
}

impl InMemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &ObjectId) -> Option<User> {
        self.users.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepo {
    async fn insert(&self, mut user: User) -> RepositoryResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::already_exists("email"));
        }
        user.id = Some(ObjectId::new());
        let now = Utc::now().to_rfc3339();
        user.created_at = Some(now.clone());
        user.updated_at = Some(now);
        users.insert(user.id.unwrap(), user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<User>> {
        Ok(self.users.lock().unwrap().get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        Ok(self.users.lock().unwrap().values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<User>> {
        Ok(self.users.lock().unwrap().values().find(|u| u.username == username).cloned())
    }

    async fn find_by_referral_code(&self, code: &str) -> RepositoryResult<Option<User>> {
        Ok(self.users.lock().unwrap().values().find(|u| u.referral_code == code).cloned())
    }

    async fn find_by_reset_token(&self, token: &str) -> RepositoryResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| !u.reset_token.is_empty() && u.reset_token == token)
            .cloned())
    }

    async fn count_referred_by(&self, code: &str) -> RepositoryResult<u64> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .filter(|u| u.referred_by_code.as_deref() == Some(code))
            .count() as u64)
    }

    async fn list_all(&self) -> RepositoryResult<Vec<User>> {
        let mut users: Vec<User> = self.users.lock().unwrap().values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn update_password(&self, id: &ObjectId, password_hash: &str) -> RepositoryResult<()> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(id).ok_or_else(|| RepositoryError::not_found("user"))?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn update_profile(
        &self,
        id: &ObjectId,
        full_name: &str,
        nationality: &str,
    ) -> RepositoryResult<()> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(id).ok_or_else(|| RepositoryError::not_found("user"))?;
        user.full_name = full_name.to_string();
        user.nationality = nationality.to_string();
        Ok(())
    }

    async fn update_reset_token(
        &self,
        id: &ObjectId,
        token: &str,
        expiry: bson::DateTime,
    ) -> RepositoryResult<()> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(id).ok_or_else(|| RepositoryError::not_found("user"))?;
        user.reset_token = token.to_string();
        user.reset_token_expiry = Some(expiry);
        Ok(())
    }

    async fn delete(&self, id: &ObjectId) -> RepositoryResult<()> {
        self.users
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::not_found("user"))
    }
}

// ---------------------------------------------------------------------------
// Deposits

#[derive(Default)]
pub struct InMemoryDepositRepo {
    pub deposits: Mutex<HashMap<ObjectId, Deposit>>,
    /// Record IDs whose mutations fail, for error isolation tests.
    pub fail_ids: Mutex<HashSet<ObjectId>>,
}

impl InMemoryDepositRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_by_investor(&self, investor: &ObjectId) -> Option<Deposit> {
        self.deposits
            .lock()
            .unwrap()
            .values()
            .find(|d| &d.investor == investor)
            .cloned()
    }

    pub fn fail_on(&self, id: ObjectId) {
        self.fail_ids.lock().unwrap().insert(id);
    }

    fn check_fail(&self, id: &ObjectId) -> RepositoryResult<()> {
        if self.fail_ids.lock().unwrap().contains(id) {
            return Err(RepositoryError::database("injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl DepositRepository for InMemoryDepositRepo {
    async fn create(&self, mut deposit: Deposit) -> RepositoryResult<Deposit> {
        deposit.id = Some(ObjectId::new());
        self.deposits.lock().unwrap().insert(deposit.id.unwrap(), deposit.clone());
        Ok(deposit)
    }

    async fn find_by_investor(&self, investor: &ObjectId) -> RepositoryResult<Option<Deposit>> {
        Ok(self.get_by_investor(investor))
    }

    async fn find_pending(&self) -> RepositoryResult<Vec<Deposit>> {
        Ok(self
            .deposits
            .lock()
            .unwrap()
            .values()
            .filter(|d| d.pending_deposit > 0.0)
            .cloned()
            .collect())
    }

    async fn find_active(&self) -> RepositoryResult<Vec<Deposit>> {
        Ok(self
            .deposits
            .lock()
            .unwrap()
            .values()
            .filter(|d| d.is_active)
            .cloned()
            .collect())
    }

    async fn record_request(
        &self,
        investor: &ObjectId,
        request: &DepositRequest,
    ) -> RepositoryResult<()> {
        let mut deposits = self.deposits.lock().unwrap();
        let deposit = deposits
            .values_mut()
            .find(|d| &d.investor == investor)
            .ok_or_else(|| RepositoryError::not_found("deposit"))?;
        deposit.pending_deposit = request.amount;
        deposit.coin = Some(request.coin.clone());
        deposit.plan = request.plan.clone();
        deposit.daily_return = request.daily_return;
        deposit.start_date = Some(request.start_date);
        deposit.end_date = Some(request.end_date);
        deposit.active_deposit = request.amount;
        Ok(())
    }

    async fn settle_pending(&self, id: &ObjectId, amount: f64) -> RepositoryResult<()> {
        self.check_fail(id)?;
        let mut deposits = self.deposits.lock().unwrap();
        let deposit = deposits.get_mut(id).ok_or_else(|| RepositoryError::not_found("deposit"))?;
        deposit.balance += amount;
        deposit.pending_deposit = 0.0;
        deposit.last_deposit = amount;
        deposit.is_active = true;
        Ok(())
    }

    async fn accrue(&self, id: &ObjectId, daily_return: f64) -> RepositoryResult<()> {
        self.check_fail(id)?;
        let mut deposits = self.deposits.lock().unwrap();
        let deposit = deposits.get_mut(id).ok_or_else(|| RepositoryError::not_found("deposit"))?;
        deposit.total_return += daily_return;
        Ok(())
    }

    async fn mature(&self, id: &ObjectId, total_return: f64) -> RepositoryResult<()> {
        self.check_fail(id)?;
        let mut deposits = self.deposits.lock().unwrap();
        let deposit = deposits.get_mut(id).ok_or_else(|| RepositoryError::not_found("deposit"))?;
        deposit.balance += total_return;
        deposit.total_return = 0.0;
        deposit.active_deposit = 0.0;
        deposit.is_active = false;
        deposit.plan = cryptfx_backend::model::deposit::NO_PLAN.to_string();
        deposit.daily_return = 0.0;
        deposit.start_date = None;
        deposit.end_date = None;
        Ok(())
    }

    async fn delete_by_investor(&self, investor: &ObjectId) -> RepositoryResult<()> {
        let mut deposits = self.deposits.lock().unwrap();
        let id = deposits
            .values()
            .find(|d| &d.investor == investor)
            .and_then(|d| d.id)
            .ok_or_else(|| RepositoryError::not_found("deposit"))?;
        deposits.remove(&id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Withdrawals

#[derive(Default)]
pub struct InMemoryWithdrawalRepo {
    pub withdrawals: Mutex<HashMap<ObjectId, Withdrawal>>,
    /// Record IDs whose mutations fail, for error isolation tests.
    pub fail_ids: Mutex<HashSet<ObjectId>>,
}

impl InMemoryWithdrawalRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_by_investor(&self, investor: &ObjectId) -> Option<Withdrawal> {
        self.withdrawals
            .lock()
            .unwrap()
            .values()
            .find(|w| &w.investor == investor)
            .cloned()
    }

    pub fn fail_on(&self, id: ObjectId) {
        self.fail_ids.lock().unwrap().insert(id);
    }

    fn check_fail(&self, id: &ObjectId) -> RepositoryResult<()> {
        if self.fail_ids.lock().unwrap().contains(id) {
            return Err(RepositoryError::database("injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl WithdrawalRepository for InMemoryWithdrawalRepo {
    async fn create(&self, mut withdrawal: Withdrawal) -> RepositoryResult<Withdrawal> {
        withdrawal.id = Some(ObjectId::new());
        self.withdrawals
            .lock()
            .unwrap()
            .insert(withdrawal.id.unwrap(), withdrawal.clone());
        Ok(withdrawal)
    }

    async fn find_by_investor(&self, investor: &ObjectId) -> RepositoryResult<Option<Withdrawal>> {
        Ok(self.get_by_investor(investor))
    }

    async fn find_pending(&self) -> RepositoryResult<Vec<Withdrawal>> {
        Ok(self
            .withdrawals
            .lock()
            .unwrap()
            .values()
            .filter(|w| w.pending_withdrawal > 0.0)
            .cloned()
            .collect())
    }

    async fn record_request(
        &self,
        investor: &ObjectId,
        amount: f64,
        coin: &str,
        wallet_address: &str,
    ) -> RepositoryResult<()> {
        let mut withdrawals = self.withdrawals.lock().unwrap();
        let withdrawal = withdrawals
            .values_mut()
            .find(|w| &w.investor == investor)
            .ok_or_else(|| RepositoryError::not_found("withdrawal"))?;
        withdrawal.pending_withdrawal = amount;
        withdrawal.coin = Some(coin.to_string());
        withdrawal.wallet_address = Some(wallet_address.to_string());
        Ok(())
    }

    async fn settle_pending(&self, id: &ObjectId, amount: f64) -> RepositoryResult<()> {
        self.check_fail(id)?;
        let mut withdrawals = self.withdrawals.lock().unwrap();
        let withdrawal = withdrawals
            .get_mut(id)
            .ok_or_else(|| RepositoryError::not_found("withdrawal"))?;
        withdrawal.withdrawal_amount += amount;
        withdrawal.pending_withdrawal = 0.0;
        withdrawal.last_withdrawal = amount;
        Ok(())
    }

    async fn delete_by_investor(&self, investor: &ObjectId) -> RepositoryResult<()> {
        let mut withdrawals = self.withdrawals.lock().unwrap();
        let id = withdrawals
            .values()
            .find(|w| &w.investor == investor)
            .and_then(|w| w.id)
            .ok_or_else(|| RepositoryError::not_found("withdrawal"))?;
        withdrawals.remove(&id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Job state

#[derive(Default)]
pub struct InMemoryJobStateRepo {
    pub runs: Mutex<HashMap<String, bson::DateTime>>,
}

impl InMemoryJobStateRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStateRepository for InMemoryJobStateRepo {
    async fn last_run(&self, job: &str) -> RepositoryResult<Option<bson::DateTime>> {
        Ok(self.runs.lock().unwrap().get(job).copied())
    }

    async fn record_run(&self, job: &str, at: bson::DateTime) -> RepositoryResult<()> {
        self.runs.lock().unwrap().insert(job.to_string(), at);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Admins

#[derive(Default)]
pub struct InMemoryAdminRepo {
    pub admins: Mutex<HashMap<String, Admin>>,
}

impl InMemoryAdminRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AdminRepository for InMemoryAdminRepo {
    async fn insert(&self, mut admin: Admin) -> RepositoryResult<Admin> {
        admin.id = Some(ObjectId::new());
        self.admins.lock().unwrap().insert(admin.email.clone(), admin.clone());
        Ok(admin)
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<Admin>> {
        Ok(self.admins.lock().unwrap().get(email).cloned())
    }
}

// ---------------------------------------------------------------------------
// Notifier

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub kind: &'static str,
    pub to: String,
}

/// Records every send; can be told to fail for specific recipients.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<SentEmail>>,
    pub fail_for: Mutex<HashSet<String>>,
    pub last_reset_token: Mutex<Option<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, recipient: &str) {
        self.fail_for.lock().unwrap().insert(recipient.to_string());
    }

    pub fn sent_to(&self, recipient: &str) -> Vec<SentEmail> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.to == recipient)
            .cloned()
            .collect()
    }

    pub fn count_kind(&self, kind: &str) -> usize {
        self.sent.lock().unwrap().iter().filter(|e| e.kind == kind).count()
    }

    fn record(&self, kind: &'static str, to: &str) -> Result<(), EmailError> {
        if self.fail_for.lock().unwrap().contains(to) {
            return Err(EmailError::SmtpError("injected failure".to_string()));
        }
        self.sent.lock().unwrap().push(SentEmail { kind, to: to.to_string() });
        Ok(())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_welcome_email(&self, to: &str, _full_name: &str) -> Result<(), EmailError> {
        self.record("welcome", to)
    }

    async fn send_deposit_request_emails(
        &self,
        to: &str,
        _full_name: &str,
        _amount: f64,
        _coin: &str,
        _plan: &str,
    ) -> Result<(), EmailError> {
        self.record("deposit_request", to)
    }

    async fn send_deposit_settled_email(
        &self,
        to: &str,
        _full_name: &str,
        _amount: f64,
    ) -> Result<(), EmailError> {
        self.record("deposit_settled", to)
    }

    async fn send_withdrawal_request_emails(
        &self,
        to: &str,
        _full_name: &str,
        _amount: f64,
        _coin: &str,
        _wallet_address: &str,
    ) -> Result<(), EmailError> {
        self.record("withdrawal_request", to)
    }

    async fn send_withdrawal_settled_email(
        &self,
        to: &str,
        _full_name: &str,
        _amount: f64,
    ) -> Result<(), EmailError> {
        self.record("withdrawal_settled", to)
    }

    async fn send_password_reset_email(
        &self,
        to: &str,
        _full_name: &str,
        reset_token: &str,
    ) -> Result<(), EmailError> {
        *self.last_reset_token.lock().unwrap() = Some(reset_token.to_string());
        self.record("password_reset", to)
    }

    async fn send_support_email(
        &self,
        from_email: &str,
        _from_name: &str,
        _subject: &str,
        _body: &str,
    ) -> Result<(), EmailError> {
        self.record("support", from_email)
    }

    async fn send_broadcast_email(
        &self,
        to: &str,
        _subject: &str,
        _body: &str,
    ) -> Result<(), EmailError> {
        self.record("broadcast", to)
    }
}

// ---------------------------------------------------------------------------
// Builders

pub fn make_user(username: &str, email: &str, referral_code: &str) -> User {
    User {
        id: None,
        username: username.to_string(),
        email: email.to_string(),
        password_hash: String::new(),
        full_name: format!("{} Test", username),
        nationality: "Testland".to_string(),
        referral_code: referral_code.to_string(),
        referred_by_code: None,
        reset_token: String::new(),
        reset_token_expiry: None,
        created_at: None,
        updated_at: None,
    }
}
