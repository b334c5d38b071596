//! Noretmy - freelance marketplace backend.
//!
//! This crate implements gig promotions: sellers buy time-boxed visibility
//! boosts for one gig or for all of their gigs, paid through Stripe payment
//! intents. Layout follows a hexagonal architecture: `domain` and
//! `application` know nothing about HTTP, SQL or Stripe; `adapters`
//! implement the `ports`.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
