//! Payment transport implementations
//!
//! Concrete implementations of the PaymentTransport trait.

pub mod square;

pub use square::SquareTransport;
