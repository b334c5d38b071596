//! Gig listings and the promotion badge denormalized onto them.

mod listing;

pub use listing::{Gig, GigSummary, PromotionBadge};
