//! Shared fixture for promotion handler tests: in-memory adapters wired
//! the way the server wires the real ones.

use std::collections::HashMap;
use std::sync::Arc;

use crate::adapters::memory::{
    InMemoryGigRepository, InMemoryLegacyPromotionSource, InMemoryNotificationStore,
    InMemoryPromotionRepository, InMemoryRealtimePublisher, InMemoryUserRepository,
};
use crate::adapters::stripe::MockPaymentProvider;
use crate::adapters::vat::ConfiguredVatRates;
use crate::domain::foundation::{GigId, Money, PromotionId, Timestamp, UserId};
use crate::domain::gig::Gig;
use crate::domain::promotion::{
    LegacyPromotion, LegacyPromotionStatus, PlanDefinition, PricingPolicy, PromotionCharges,
    PromotionPurchase, PromotionScope, PromotionStatus, PromotionTarget, Rate,
};
use crate::domain::user::{RevenueLedger, User, UserRole};
use crate::ports::PaymentIntentStatus;

use super::badges::badge_for;
use super::{
    BackfillLegacyPromotionsHandler, CancelPromotionHandler, CheckGigPromotionHandler,
    CompletePromotionHandler, DeletePromotionHandler, ExpirePromotionsHandler,
    HandlePaymentWebhookHandler, InitiatePromotionCommand, InitiatePromotionHandler,
    ListActivePromotionsHandler, ListPromotionsHandler, NotificationLinks,
    PromotionHistoryHandler,
};

pub(crate) struct TestWorld {
    pub users: Arc<InMemoryUserRepository>,
    pub gigs: Arc<InMemoryGigRepository>,
    pub promotions: Arc<InMemoryPromotionRepository>,
    pub legacy: Arc<InMemoryLegacyPromotionSource>,
    pub notifications: Arc<InMemoryNotificationStore>,
    pub realtime: Arc<InMemoryRealtimePublisher>,
    pub payments: Arc<MockPaymentProvider>,
    pub vat_rates: Arc<ConfiguredVatRates>,
    pub admin: User,
}

impl TestWorld {
    /// VAT 20% for everyone, platform fee 5%, one admin account.
    pub fn new() -> Self {
        let promotions = Arc::new(InMemoryPromotionRepository::new());
        let world = Self {
            users: Arc::new(InMemoryUserRepository::new()),
            gigs: Arc::new(InMemoryGigRepository::new()),
            legacy: Arc::new(InMemoryLegacyPromotionSource::new(promotions.clone())),
            promotions,
            notifications: Arc::new(InMemoryNotificationStore::new()),
            realtime: Arc::new(InMemoryRealtimePublisher::new()),
            payments: Arc::new(MockPaymentProvider::new()),
            vat_rates: Arc::new(ConfiguredVatRates::new(
                Rate::from_basis_points(2_000).unwrap(),
                HashMap::new(),
            )),
            admin: user(UserRole::Admin),
        };
        world.users.insert(world.admin.clone());
        world
    }

    pub fn seller(&self) -> User {
        let mut seller = user(UserRole::Seller);
        seller.is_seller = true;
        self.users.insert(seller.clone());
        seller
    }

    pub fn client(&self) -> User {
        let client = user(UserRole::Client);
        self.users.insert(client.clone());
        client
    }

    pub fn gig_of(&self, seller: &User) -> Gig {
        let id = GigId::new();
        let gig = Gig {
            id,
            seller_id: seller.id,
            title: format!("Gig {}", id),
            photos: vec![format!("https://cdn.example.test/{}.jpg", id)],
            promotion: None,
        };
        self.gigs.insert(gig.clone());
        gig
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Handlers
    // ════════════════════════════════════════════════════════════════════════════

    pub fn initiate_handler(&self) -> InitiatePromotionHandler {
        InitiatePromotionHandler::new(
            self.users.clone(),
            self.gigs.clone(),
            self.promotions.clone(),
            self.vat_rates.clone(),
            self.payments.clone(),
            PricingPolicy::new(Rate::from_basis_points(500).unwrap()),
            "usd",
        )
    }

    pub fn complete_handler(&self) -> CompletePromotionHandler {
        CompletePromotionHandler::new(
            self.users.clone(),
            self.gigs.clone(),
            self.promotions.clone(),
            self.payments.clone(),
            self.notifications.clone(),
            self.realtime.clone(),
            NotificationLinks::default(),
        )
    }

    pub fn webhook_handler(&self) -> HandlePaymentWebhookHandler {
        HandlePaymentWebhookHandler::new(
            self.payments.clone(),
            Arc::new(self.complete_handler()),
        )
    }

    pub fn list_handler(&self) -> ListPromotionsHandler {
        ListPromotionsHandler::new(self.promotions.clone(), self.gigs.clone())
    }

    pub fn list_active_handler(&self) -> ListActivePromotionsHandler {
        ListActivePromotionsHandler::new(self.promotions.clone(), self.gigs.clone())
    }

    pub fn check_gig_handler(&self) -> CheckGigPromotionHandler {
        CheckGigPromotionHandler::new(self.promotions.clone())
    }

    pub fn history_handler(&self) -> PromotionHistoryHandler {
        PromotionHistoryHandler::new(self.promotions.clone(), self.gigs.clone())
    }

    pub fn cancel_handler(&self) -> CancelPromotionHandler {
        CancelPromotionHandler::new(self.promotions.clone(), self.gigs.clone())
    }

    pub fn delete_handler(&self) -> DeletePromotionHandler {
        DeletePromotionHandler::new(self.promotions.clone(), self.gigs.clone())
    }

    pub fn expire_handler(&self) -> ExpirePromotionsHandler {
        ExpirePromotionsHandler::new(self.promotions.clone(), self.gigs.clone())
    }

    pub fn backfill_handler(&self, batch_size: u32) -> BackfillLegacyPromotionsHandler {
        BackfillLegacyPromotionsHandler::new(self.legacy.clone(), self.promotions.clone(), batch_size)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Payments
    // ════════════════════════════════════════════════════════════════════════════

    /// Opens an intent through the initiation handler, left unpaid.
    pub async fn initiated_intent(
        &self,
        user: &User,
        scope: PromotionScope,
        plan_key: &str,
        gig_id: Option<GigId>,
    ) -> String {
        self.initiate_handler()
            .handle(InitiatePromotionCommand {
                user_id: user.id,
                scope,
                plan_key: Some(plan_key.to_string()),
                gig_id,
            })
            .await
            .expect("initiation should succeed")
            .payment_intent_id
    }

    /// Opens an intent and marks it paid.
    pub async fn paid_intent(
        &self,
        user: &User,
        scope: PromotionScope,
        plan_key: &str,
        gig_id: Option<GigId>,
    ) -> String {
        let id = self.initiated_intent(user, scope, plan_key, gig_id).await;
        self.payments.set_intent_status(&id, PaymentIntentStatus::Succeeded);
        id
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Seeded purchases
    // ════════════════════════════════════════════════════════════════════════════

    /// Stores an active purchase that started now, badges included.
    pub fn activate_directly(
        &self,
        user: &User,
        target: PromotionTarget,
        plan_key: &str,
    ) -> PromotionPurchase {
        self.seed(user, target, plan_key, Timestamp::now())
    }

    /// Stores a purchase still marked active whose window closed yesterday.
    /// Its badge is left on the listings, as before the expiry sweep runs.
    pub fn activate_lapsed(
        &self,
        user: &User,
        target: PromotionTarget,
        plan_key: &str,
    ) -> PromotionPurchase {
        self.seed(user, target, plan_key, Timestamp::now().add_days(-31))
    }

    /// Stores an active all-gigs purchase migrated from a legacy row.
    pub fn backfilled(&self, user: &User, legacy_id: &str) -> PromotionPurchase {
        let start = Timestamp::now();
        let purchase = LegacyPromotion {
            id: legacy_id.to_string(),
            user_id: user.id,
            gig_id: None,
            is_for_all: true,
            promotion_plan: "basic".to_string(),
            status: LegacyPromotionStatus::Active,
            promotion_start_date: Some(start),
            promotion_end_date: Some(start.add_days(30)),
            amount_paid: Money::from_units(40),
            created_at: start,
        }
        .to_purchase()
        .expect("legacy row converts");
        self.promotions.insert_now(&purchase).expect("seed insert");
        purchase
    }

    pub fn set_status(&self, id: &PromotionId, status: PromotionStatus) {
        self.promotions.set_status(id, status);
    }

    fn seed(
        &self,
        user: &User,
        target: PromotionTarget,
        plan_key: &str,
        started: Timestamp,
    ) -> PromotionPurchase {
        let plan = PlanDefinition::find(target.scope(), plan_key).expect("known plan");
        let charges = PromotionCharges {
            base_amount: plan.price,
            total_amount: plan.price,
            ..PromotionCharges::default()
        };
        let purchase = PromotionPurchase::activate(
            format!("pi_seed_{}", PromotionId::new()),
            user.id,
            plan,
            target,
            charges,
            started,
        )
        .expect("plan matches target");
        self.promotions.insert_now(&purchase).expect("seed insert");

        if let Some(badge) = badge_for(&purchase) {
            match target {
                PromotionTarget::SingleGig(gig_id) => {
                    self.gigs.badge_gig(&gig_id, &badge, started);
                }
                PromotionTarget::AllGigs => {
                    self.gigs.badge_seller(&user.id, &badge, started);
                }
            }
        }
        purchase
    }
}

fn user(role: UserRole) -> User {
    let id = UserId::new();
    User {
        id,
        email: format!("{}@example.test", id),
        username: format!("user-{}", id),
        full_name: None,
        role,
        is_seller: false,
        is_company: false,
        seller_type: None,
        country_code: None,
        revenue: RevenueLedger::default(),
        created_at: Timestamp::now(),
    }
}
