//! Payment types and data structures
//!
//! Request bodies in Square's wire shape and the normalized result handed back
//! to callers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GatewayError, GatewayErrorKind};
use crate::payments::traits::{AmountSource, TransactionRef};

/// Diagnostic used when a successful response carries no payment
pub const NO_PAYMENT_RETURNED: &str =
    "Unexpected error. No payment returned in the payment response.";

/// Square environment a request is made against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Sandbox,
    Production,
}

impl Environment {
    pub fn from_sandbox(sandbox: bool) -> Self {
        if sandbox {
            Environment::Sandbox
        } else {
            Environment::Production
        }
    }

    pub fn is_sandbox(&self) -> bool {
        matches!(self, Environment::Sandbox)
    }

    /// Prefix shared by idempotency keys and reference ids
    pub fn key_prefix(&self) -> &'static str {
        match self {
            Environment::Sandbox => "TEST-payment",
            Environment::Production => "event-payment",
        }
    }

    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Production => "https://connect.squareup.com",
            Environment::Sandbox => "https://connect.squareupsandbox.com",
        }
    }
}

/// Money amount representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the smallest currency unit (e.g., cents for USD)
    pub amount: i64,
    /// 3-letter ISO 4217 currency code
    pub currency: String,
}

/// Body of a Square create/complete payment call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Tokenized card reference from the checkout form
    pub source_id: String,
    pub idempotency_key: String,
    pub amount_money: Money,
    pub location_id: String,
    pub reference_id: String,
    pub note: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

/// Broad category of a failed payment submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The request never got a usable answer; safe to retry with the same builder
    Transport,
    /// Square rejected the payment
    Provider,
    /// Square answered without a payment object
    ProtocolViolation,
    /// The amount could not be converted to minor units
    InvalidAmount,
    /// Caller input was rejected before anything was sent
    InvalidRequest,
    /// The gateway or transport is misconfigured; retrying will not help
    Configuration,
}

/// Outcome of a payment submission
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentResult {
    /// Square's payment object, passed through untouched
    Success { payment: Value },
    Failure {
        kind: FailureKind,
        message: String,
        /// `{"error": {"message": ..., ...}}` mapping
        raw_error: Value,
    },
}

impl PaymentResult {
    pub fn is_success(&self) -> bool {
        matches!(self, PaymentResult::Success { .. })
    }

    pub fn payment(&self) -> Option<&Value> {
        match self {
            PaymentResult::Success { payment } => Some(payment),
            PaymentResult::Failure { .. } => None,
        }
    }

    /// Payment id of a successful result
    pub fn payment_id(&self) -> Option<&str> {
        self.payment()
            .and_then(|payment| payment.get("id"))
            .and_then(Value::as_str)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            PaymentResult::Success { .. } => None,
            PaymentResult::Failure { message, .. } => Some(message),
        }
    }

    /// Wrap a structured provider error mapping without altering it
    pub fn provider_failure(raw_error: Value) -> Self {
        let message = raw_error
            .get("error")
            .and_then(|error| error.get("message"))
            .and_then(Value::as_str)
            .unwrap_or("Square returned an error without a message")
            .to_string();

        PaymentResult::Failure {
            kind: FailureKind::Provider,
            message,
            raw_error,
        }
    }

    pub fn protocol_violation() -> Self {
        PaymentResult::Failure {
            kind: FailureKind::ProtocolViolation,
            message: NO_PAYMENT_RETURNED.to_string(),
            raw_error: serde_json::json!({ "error": { "message": NO_PAYMENT_RETURNED } }),
        }
    }
}

impl From<GatewayError> for PaymentResult {
    fn from(err: GatewayError) -> Self {
        let kind = match &err.kind {
            GatewayErrorKind::Provider { .. } => FailureKind::Provider,
            GatewayErrorKind::ProtocolViolation { .. } => FailureKind::ProtocolViolation,
            GatewayErrorKind::InvalidAmount { .. } => FailureKind::InvalidAmount,
            GatewayErrorKind::InvalidRequest { .. } => FailureKind::InvalidRequest,
            GatewayErrorKind::Configuration { .. } => FailureKind::Configuration,
            GatewayErrorKind::Transport { .. } => FailureKind::Transport,
        };

        let mut error = serde_json::json!({
            "message": err.message(),
            "retryable": err.is_retryable(),
        });
        if let GatewayErrorKind::Transport {
            status: Some(status),
            ..
        } = &err.kind
        {
            error["status"] = Value::from(*status);
        }
        if let Some(context) = &err.context {
            error["context"] = Value::String(context.clone());
        }

        PaymentResult::Failure {
            kind,
            message: err.message().to_string(),
            raw_error: serde_json::json!({ "error": error }),
        }
    }
}

/// Plain transaction record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// `None` until the platform has saved the transaction
    pub id: Option<String>,
    pub total: Decimal,
    #[serde(default)]
    pub paid: Decimal,
    pub currency: String,
}

impl Transaction {
    pub fn new<C: Into<String>>(id: Option<String>, total: Decimal, currency: C) -> Self {
        Self {
            id,
            total,
            paid: Decimal::ZERO,
            currency: currency.into(),
        }
    }

    pub fn with_paid(mut self, paid: Decimal) -> Self {
        self.paid = paid;
        self
    }

    /// What a checkout should charge: the outstanding balance, or the full
    /// total when nothing (or less than nothing) is outstanding
    pub fn amount_owing(&self) -> Decimal {
        let owing = self.total - self.paid;
        if owing > Decimal::ZERO {
            owing
        } else {
            self.total
        }
    }
}

impl AmountSource for Transaction {
    fn amount(&self) -> Decimal {
        self.amount_owing()
    }

    fn currency_code(&self) -> &str {
        &self.currency
    }
}

impl TransactionRef for Transaction {
    fn id(&self) -> Option<String> {
        self.id.clone()
    }
}
