//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `auth` - JWT session validation (and a mock for tests)
//! - `http` - axum REST API and router assembly
//! - `memory` - in-memory repositories for tests and local runs
//! - `postgres` - sqlx repositories over PostgreSQL
//! - `realtime` - per-user WebSocket rooms for notifications
//! - `stripe` - Stripe payment intents and webhooks
//! - `vat` - configured VAT rates by country

pub mod auth;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod realtime;
pub mod stripe;
pub mod vat;
