use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Sentinel plan name used when a deposit has no active investment plan.
pub const NO_PLAN: &str = "none";

/// One deposit record per investor, created empty at sign-up.
///
/// `pending_deposit` holds a requested amount awaiting settlement; `balance`
/// is confirmed funds; `active_deposit` is the principal currently accruing
/// under `plan` between `start_date` and `end_date`. `total_return` is profit
/// accrued but not yet folded into `balance`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deposit {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    pub investor: ObjectId,
    pub pending_deposit: f64,
    pub balance: f64,
    pub active_deposit: f64,
    pub last_deposit: f64,
    pub coin: Option<String>,
    pub plan: String,
    pub daily_return: f64,
    pub total_return: f64,
    pub start_date: Option<bson::DateTime>,
    pub end_date: Option<bson::DateTime>,
    pub is_active: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Deposit {
    /// An empty record for a freshly registered investor.
    pub fn empty(investor: ObjectId) -> Self {
        Deposit {
            id: None,
            investor,
            pending_deposit: 0.0,
            balance: 0.0,
            active_deposit: 0.0,
            last_deposit: 0.0,
            coin: None,
            plan: NO_PLAN.to_string(),
            daily_return: 0.0,
            total_return: 0.0,
            start_date: None,
            end_date: None,
            is_active: false,
            created_at: None,
            updated_at: None,
        }
    }

    /// Whether the plan window has closed relative to `now`.
    pub fn is_matured(&self, now: bson::DateTime) -> bool {
        match self.end_date {
            Some(end) => end <= now,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_record_is_neutral() {
        let deposit = Deposit::empty(ObjectId::new());
        assert_eq!(deposit.pending_deposit, 0.0);
        assert_eq!(deposit.balance, 0.0);
        assert_eq!(deposit.plan, NO_PLAN);
        assert!(!deposit.is_active);
    }

    #[test]
    fn test_maturity_check() {
        let mut deposit = Deposit::empty(ObjectId::new());
        let now = bson::DateTime::now();
        assert!(!deposit.is_matured(now));

        deposit.end_date = Some(bson::DateTime::from_millis(now.timestamp_millis() - 1000));
        assert!(deposit.is_matured(now));

        deposit.end_date = Some(bson::DateTime::from_millis(now.timestamp_millis() + 1000));
        assert!(!deposit.is_matured(now));
    }
}
