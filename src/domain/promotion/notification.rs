//! Notifications emitted when a promotion activates.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Money, UserId};
use crate::domain::user::User;

use super::PromotionPurchase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Payment,
    System,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Payment => "payment",
            NotificationKind::System => "system",
        }
    }
}

/// A user-facing notification. Persisted, then pushed to the user's room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub link: String,
}

impl Notification {
    /// Confirmation sent to the buyer.
    pub fn promotion_activated(purchase: &PromotionPurchase, link: &str) -> Self {
        Self {
            user_id: purchase.user_id,
            title: "Promotion Activated".to_string(),
            message: format!("Your \"{}\" promotion is now active!", purchase.plan_name),
            kind: NotificationKind::Payment,
            link: link.to_string(),
        }
    }

    /// Sale alert sent to the primary admin.
    pub fn promotion_sold(
        admin_id: UserId,
        buyer: &User,
        purchase: &PromotionPurchase,
        charged: Money,
        link: &str,
    ) -> Self {
        Self {
            user_id: admin_id,
            title: "New Promotion Purchase".to_string(),
            message: format!(
                "{} purchased {} promotion (${})",
                buyer.display_name(),
                purchase.plan_name,
                charged
            ),
            kind: NotificationKind::System,
            link: link.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;
    use crate::domain::promotion::{
        PlanDefinition, PromotionCharges, PromotionScope, PromotionTarget,
    };
    use crate::domain::user::{RevenueLedger, UserRole};

    fn purchase(user_id: UserId) -> PromotionPurchase {
        PromotionPurchase::activate(
            "pi_1",
            user_id,
            PlanDefinition::find(PromotionScope::AllGigs, "premium").unwrap(),
            PromotionTarget::AllGigs,
            PromotionCharges::default(),
            Timestamp::now(),
        )
        .unwrap()
    }

    #[test]
    fn buyer_notification_names_plan() {
        let user_id = UserId::new();
        let n = Notification::promotion_activated(&purchase(user_id), "/promote-gigs");
        assert_eq!(n.user_id, user_id);
        assert_eq!(n.kind, NotificationKind::Payment);
        assert_eq!(n.message, "Your \"Premium Boost\" promotion is now active!");
        assert_eq!(n.link, "/promote-gigs");
    }

    #[test]
    fn admin_notification_names_buyer_and_amount() {
        let buyer = User {
            id: UserId::new(),
            email: "s@example.com".to_string(),
            username: "seller42".to_string(),
            full_name: None,
            role: UserRole::Seller,
            is_seller: true,
            is_company: false,
            seller_type: None,
            country_code: None,
            revenue: RevenueLedger::default(),
            created_at: Timestamp::now(),
        };
        let admin = UserId::new();
        let n = Notification::promotion_sold(
            admin,
            &buyer,
            &purchase(buyer.id),
            Money::from_cents(6_300),
            "/admin/promotions",
        );
        assert_eq!(n.user_id, admin);
        assert_eq!(n.kind, NotificationKind::System);
        assert_eq!(n.message, "seller42 purchased Premium Boost promotion ($63.00)");
    }

    #[test]
    fn serializes_kind_as_type() {
        let n = Notification::promotion_activated(&purchase(UserId::new()), "/x");
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "payment");
    }
}
