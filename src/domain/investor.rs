use super::account::AccountId;
use super::money::Balance;
use crate::error::{FundError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An immutable ledger entry recording one contribution or withdrawal.
///
/// The amount is signed: positive for funds added, negative for funds
/// removed. Entries are kept on the position they belong to as an audit
/// trail and returned to callers of the mutating operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    pub account: AccountId,
    pub amount: Balance,
    pub created_at: DateTime<Utc>,
}

/// An account's current stake in a fund.
///
/// Created lazily on the first contribution and never deleted afterwards; a
/// fully withdrawn position stays behind with a zero amount so the audit
/// trail remains anchored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investor {
    pub account: AccountId,
    pub invested_amount: Balance,
    pub investments: Vec<Investment>,
}

impl Investor {
    pub fn new(account: AccountId) -> Self {
        Self {
            account,
            invested_amount: Balance::ZERO,
            investments: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.invested_amount.is_positive()
    }

    /// Applies a signed delta to the position and records the ledger entry.
    ///
    /// The position can reach exactly zero but never go negative.
    pub fn add_investment(&mut self, amount: Balance, now: DateTime<Utc>) -> Result<Investment> {
        let next = self.invested_amount + amount;

        if next < Balance::ZERO {
            return Err(FundError::Validation(
                "withdrawal exceeds the invested amount".to_string(),
            ));
        }

        self.invested_amount = next;

        let investment = Investment {
            account: self.account,
            amount,
            created_at: now,
        };
        self.investments.push(investment.clone());

        Ok(investment)
    }
}
