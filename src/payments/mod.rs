//! Square payment integration module
//!
//! Builds idempotent Square payment requests for event registrations, submits
//! them through a [`traits::PaymentTransport`] and normalizes the outcome.

pub mod builder;
pub mod gateway;
pub mod idempotency;
#[cfg(feature = "square-http")]
pub mod providers;
pub mod traits;
pub mod types;
