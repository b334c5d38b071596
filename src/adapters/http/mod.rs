//! HTTP adapters - REST API implementations.
//!
//! - `middleware` - bearer-token authentication
//! - `promotion` - promotion and webhook endpoints
//! - `router` - application assembly with tower layers

pub mod middleware;
pub mod promotion;
pub mod router;

pub use promotion::{promotion_router, PromotionAppState};
pub use router::{build_router, health, RouterConfig};
