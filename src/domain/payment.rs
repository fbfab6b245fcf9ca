use super::account::AccountId;
use super::money::{Amount, Balance};
use super::transfer::{Currency, Transfer, TransferType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One investor's share of a payment.
///
/// Shares are floor-divided, so an individual payout can be zero when the
/// position is small relative to the pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payout {
    pub account: AccountId,
    pub amount: Balance,
}

/// A distribution of returns to all active investors at once.
///
/// Carries the outbound transfer for the nominal amount and the per-investor
/// payouts. Immutable once attached to the fund's payment history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub amount: Amount,
    pub payouts: Vec<Payout>,
    pub transfer: Transfer,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(amount: Amount, account: AccountId, now: DateTime<Utc>) -> Self {
        let mut transfer = Transfer::new(TransferType::Payout, amount, Currency::Btc, account);
        transfer.confirm();

        Self {
            amount,
            payouts: Vec::new(),
            transfer,
            created_at: now,
        }
    }

    pub fn add_payout(&mut self, account: AccountId, amount: Balance) {
        self.payouts.push(Payout { account, amount });
    }

    /// The sum actually allocated to investors.
    ///
    /// At most the nominal amount; each share is truncated independently, so
    /// up to one minor unit per additional investor stays undistributed.
    pub fn distributed(&self) -> Balance {
        self.payouts
            .iter()
            .fold(Balance::ZERO, |acc, payout| acc + payout.amount)
    }
}
