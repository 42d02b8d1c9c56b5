//! Collaborator trait definitions
//!
//! The builder only sees transactions, gateways and transports through these
//! narrow interfaces.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::GatewayResult;

/// Amount and currency of the thing being paid for
pub trait AmountSource {
    fn amount(&self) -> Decimal;

    /// 3-letter ISO 4217 code
    fn currency_code(&self) -> &str;
}

/// Persisted identity of a transaction, if it has one yet
pub trait TransactionRef {
    fn id(&self) -> Option<String>;
}

/// Everything the builder reads from a transaction
pub trait TransactionRecord: AmountSource + TransactionRef + Send + Sync {}

impl<T: AmountSource + TransactionRef + Send + Sync> TransactionRecord for T {}

/// Gateway-side settings the request depends on
pub trait GatewayAdapter: Send + Sync {
    /// Convert a decimal amount to the smallest unit of the gateway's currency
    fn to_minor_units(&self, amount: Decimal) -> GatewayResult<i64>;

    /// Whether the gateway is configured for the Square sandbox
    fn is_sandbox(&self) -> bool;
}

/// HTTP transport used to reach the payment provider
///
/// Implementations return the decoded JSON mapping. A provider-side rejection
/// is returned as `Ok` with an `error` entry; `Err` is reserved for requests
/// that never produced a usable response.
#[async_trait]
pub trait PaymentTransport: Send + Sync {
    /// POST `body` to `url` with `Authorization: Bearer {bearer_token}`
    async fn post(&self, url: &str, bearer_token: &str, body: &Value) -> GatewayResult<Value>;
}
