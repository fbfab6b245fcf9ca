use super::account::AccountId;
use super::money::Amount;
use serde::{Deserialize, Serialize};

/// The currencies funds settle in. A single code in the current deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    Btc,
}

/// Direction/purpose of a money movement created by the fund core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferType {
    /// Capital moved onto the fund's settlement account at closing.
    Deposit,
    /// A distribution of returns paid out from the settlement account.
    Payout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferState {
    Pending,
    Confirmed,
}

/// A directional money movement recorded against an account.
///
/// The fund core only creates transfers; execution and settlement are the
/// responsibility of the surrounding system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub transfer_type: TransferType,
    pub amount: Amount,
    pub currency: Currency,
    pub state: TransferState,
    /// The account the movement is recorded against.
    pub account: AccountId,
}

impl Transfer {
    pub fn new(
        transfer_type: TransferType,
        amount: Amount,
        currency: Currency,
        account: AccountId,
    ) -> Self {
        Self {
            transfer_type,
            amount,
            currency,
            state: TransferState::Pending,
            account,
        }
    }

    pub fn confirm(&mut self) {
        self.state = TransferState::Confirmed;
    }
}
