//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `user` - Accounts, roles, eligibility and revenue ledger
//! - `gig` - Gig listings and their denormalized promotion badge
//! - `promotion` - Plans, pricing and the promotion purchase lifecycle

pub mod foundation;
pub mod gig;
pub mod promotion;
pub mod user;
