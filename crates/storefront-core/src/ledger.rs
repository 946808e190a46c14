//! Currency ledger interface and the shared shop wallet.

use serde::{Deserialize, Serialize};

pub trait CurrencyLedger {
    fn balance(&self) -> i64;
    fn credit(&mut self, amount: i64);
    /// Withdraw `amount`. Fails without change when funds are short.
    fn debit(&mut self, amount: i64) -> bool;
}

/// One balance shared by every participant of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    balance: i64,
}

impl Wallet {
    pub fn new(balance: i64) -> Self {
        Self { balance }
    }
}

impl CurrencyLedger for Wallet {
    fn balance(&self) -> i64 {
        self.balance
    }

    fn credit(&mut self, amount: i64) {
        self.balance = self.balance.saturating_add(amount.max(0));
    }

    fn debit(&mut self, amount: i64) -> bool {
        if amount < 0 || amount > self.balance {
            return false;
        }
        self.balance -= amount;
        true
    }
}

/// Apply a signed currency outcome. Penalties larger than the balance drain
/// it to zero instead of failing. Returns the signed amount actually moved.
pub fn apply_currency(ledger: &mut dyn CurrencyLedger, amount: i64) -> i64 {
    if amount >= 0 {
        ledger.credit(amount);
        return amount;
    }
    let owed = amount.saturating_neg();
    let taken = owed.min(ledger.balance().max(0));
    if ledger.debit(taken) {
        -taken
    } else {
        0
    }
}
