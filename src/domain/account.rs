use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identity of an external money account.
///
/// The fund core never inspects account state; it only uses the identity as
/// a ledger key and as the target of transfers. Account management itself
/// lives outside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
