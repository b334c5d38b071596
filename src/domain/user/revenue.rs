//! Revenue ledger kept on every account.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Money;

/// Balances in cents. Platform fees accrue on the primary admin's ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RevenueLedger {
    pub total: Money,
    pub available: Money,
    pub pending: Money,
    pub withdrawn: Money,
}

impl RevenueLedger {
    /// Returns the ledger after crediting `amount` to `total` and `available`.
    ///
    /// Storage adapters perform the same increment atomically; this is the
    /// in-process equivalent used by the in-memory store.
    pub fn credited(self, amount: Money) -> Option<Self> {
        Some(Self {
            total: self.total.checked_add(amount)?,
            available: self.available.checked_add(amount)?,
            ..self
        })
    }
}
