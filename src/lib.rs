//! Square payment gateway core for event registrations
//!
//! Builds idempotent Square payment requests, submits them and normalizes the
//! responses.
//!
#![cfg_attr(feature = "square-http", doc = "```rust,no_run")]
#![cfg_attr(not(feature = "square-http"), doc = "```rust,ignore")]
//! use rust_decimal::Decimal;
//! use square_gateway::payments::builder::PaymentRequestBuilder;
//! use square_gateway::payments::gateway::CurrencyGateway;
//! use square_gateway::payments::providers::SquareTransport;
//! use square_gateway::payments::types::Transaction;
//! use square_gateway::SquareConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SquareConfig::from_env()?;
//! let transport = SquareTransport::new(&config)?;
//! let gateway = CurrencyGateway::new("USD", true);
//! let transaction = Transaction::new(Some("42".to_string()), Decimal::new(1250, 2), "USD");
//!
//! let mut builder = PaymentRequestBuilder::for_gateway(&transaction, &gateway, &transport, &config)?;
//! builder.set_token("cnon:card-nonce-ok");
//! let result = builder.create().await;
//! println!("payment succeeded: {}", result.is_success());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod payments;

pub use config::SquareConfig;
pub use error::{GatewayError, GatewayErrorKind, GatewayResult};
pub use payments::builder::PaymentRequestBuilder;
pub use payments::types::{Environment, FailureKind, PaymentRequest, PaymentResult};
