use super::money::Balance;
use crate::error::{EngineError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type UserId = u64;

/// A user's wallet. One per user; the balance only moves through
/// `LedgerStore::apply`, which keeps it in step with the ledger rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub user: UserId,
    pub balance: Balance,
    pub currency_code: String,
}

impl Wallet {
    pub fn new(user: UserId, currency_code: &str) -> Self {
        Self {
            user,
            balance: Balance::ZERO,
            currency_code: currency_code.to_string(),
        }
    }

    /// Adds funds to the balance.
    pub fn credit(&mut self, amount: Decimal) {
        self.balance += Balance::new(amount);
    }

    /// Removes funds from the balance if sufficient.
    pub fn debit(&mut self, amount: Decimal) -> Result<()> {
        let amount = Balance::new(amount);
        if self.balance >= amount {
            self.balance -= amount;
            Ok(())
        } else {
            Err(EngineError::InsufficientBalance)
        }
    }
}
