//! Promotion purchase status state machine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::StateMachine;

/// Lifecycle of a promotion purchase.
///
/// Purchases are normally created directly as `Active`, since nothing is
/// stored until payment succeeds. `Pending` and `Failed` exist for records
/// carried over from the legacy table and for history filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionStatus {
    Pending,
    Active,
    Cancelled,
    Expired,
    Failed,
}

impl PromotionStatus {
    pub const ALL: [PromotionStatus; 5] = [
        PromotionStatus::Pending,
        PromotionStatus::Active,
        PromotionStatus::Cancelled,
        PromotionStatus::Expired,
        PromotionStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PromotionStatus::Pending => "pending",
            PromotionStatus::Active => "active",
            PromotionStatus::Cancelled => "cancelled",
            PromotionStatus::Expired => "expired",
            PromotionStatus::Failed => "failed",
        }
    }
}

impl StateMachine for PromotionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use PromotionStatus::*;
        matches!(
            (self, target),
            (Pending, Active) | (Pending, Failed) | (Active, Cancelled) | (Active, Expired)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use PromotionStatus::*;
        match self {
            Pending => vec![Active, Failed],
            Active => vec![Cancelled, Expired],
            Cancelled | Expired | Failed => vec![],
        }
    }
}

impl fmt::Display for PromotionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromotionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PromotionStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| format!("unknown promotion status: {}", s))
    }
}
