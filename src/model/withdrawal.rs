use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// One withdrawal record per investor, created empty at sign-up.
///
/// `pending_withdrawal` is overwritten by each new request (last request
/// wins); `withdrawal_amount` accumulates every settled withdrawal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Withdrawal {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    pub investor: ObjectId,
    pub pending_withdrawal: f64,
    pub withdrawal_amount: f64,
    pub last_withdrawal: f64,
    pub coin: Option<String>,
    pub wallet_address: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Withdrawal {
    /// An empty record for a freshly registered investor.
    pub fn empty(investor: ObjectId) -> Self {
        Withdrawal {
            id: None,
            investor,
            pending_withdrawal: 0.0,
            withdrawal_amount: 0.0,
            last_withdrawal: 0.0,
            coin: None,
            wallet_address: None,
            created_at: None,
            updated_at: None,
        }
    }
}
