//! Marketplace accounts.
//!
//! Only the parts of a user the promotion workflow reads: role and seller
//! flags for eligibility, country for VAT, and the revenue ledger the
//! platform fee is credited to.

mod account;
mod revenue;
mod role;

pub use account::{lenient_bool, SellerType, User};
pub use revenue::RevenueLedger;
pub use role::UserRole;
