//! Square payment request construction and submission
//!
//! A builder is created for one checkout attempt. It captures an
//! [`IdempotencyContext`] at construction, assembles the Square payment body
//! from the transaction and gateway, posts it through a [`PaymentTransport`]
//! and folds whatever comes back into a [`PaymentResult`].

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::SquareConfig;
use crate::error::{GatewayError, GatewayErrorKind, GatewayResult};
use crate::payments::idempotency::IdempotencyContext;
use crate::payments::traits::{GatewayAdapter, PaymentTransport, TransactionRecord};
use crate::payments::types::{Environment, Money, PaymentRequest, PaymentResult};

pub struct PaymentRequestBuilder<'a> {
    transaction: &'a dyn TransactionRecord,
    gateway: &'a dyn GatewayAdapter,
    transport: &'a dyn PaymentTransport,
    config: &'a SquareConfig,
    idempotency: IdempotencyContext,
    token: String,
    order_id: Option<String>,
}

impl<'a> PaymentRequestBuilder<'a> {
    /// Returns a configuration error when the location or access token is missing.
    pub fn new(
        transaction: &'a dyn TransactionRecord,
        gateway: &'a dyn GatewayAdapter,
        transport: &'a dyn PaymentTransport,
        config: &'a SquareConfig,
        sandbox: bool,
    ) -> GatewayResult<Self> {
        if config.location_id.trim().is_empty() {
            return Err(GatewayError::configuration(
                "a Square location id is required to take payments",
            ));
        }

        if config.access_token.trim().is_empty() {
            return Err(GatewayError::configuration(
                "a Square access token is required to take payments",
            ));
        }

        let idempotency =
            IdempotencyContext::new(Environment::from_sandbox(sandbox), transaction.id());

        debug!(
            "Payment builder ready: transaction_id={}, environment={:?}",
            idempotency.transaction_id(),
            idempotency.environment()
        );

        Ok(Self {
            transaction,
            gateway,
            transport,
            config,
            idempotency,
            token: String::new(),
            order_id: None,
        })
    }

    /// Same as [`new`](Self::new), taking the environment from the gateway
    pub fn for_gateway(
        transaction: &'a dyn TransactionRecord,
        gateway: &'a dyn GatewayAdapter,
        transport: &'a dyn PaymentTransport,
        config: &'a SquareConfig,
    ) -> GatewayResult<Self> {
        Self::new(transaction, gateway, transport, config, gateway.is_sandbox())
    }

    /// Resume an earlier attempt with its captured context
    pub fn with_idempotency_context(mut self, idempotency: IdempotencyContext) -> Self {
        self.idempotency = idempotency;
        self
    }

    /// Card nonce produced by the Square Web Payments SDK
    pub fn set_token<S: Into<String>>(&mut self, token: S) {
        self.token = token.into();
    }

    /// Attach the payment to an existing Square order; an empty id clears it
    pub fn set_order_id<S: Into<String>>(&mut self, order_id: S) {
        let order_id = order_id.into();
        self.order_id = if order_id.is_empty() {
            None
        } else {
            Some(order_id)
        };
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn order_id(&self) -> Option<&str> {
        self.order_id.as_deref()
    }

    pub fn transaction(&self) -> &'a dyn TransactionRecord {
        self.transaction
    }

    pub fn gateway(&self) -> &'a dyn GatewayAdapter {
        self.gateway
    }

    pub fn environment(&self) -> Environment {
        self.idempotency.environment()
    }

    pub fn transaction_id(&self) -> &str {
        self.idempotency.transaction_id()
    }

    pub fn pre_number(&self) -> &str {
        self.idempotency.pre_number()
    }

    pub fn idempotency_context(&self) -> &IdempotencyContext {
        &self.idempotency
    }

    pub fn idempotency_key(&self) -> String {
        self.idempotency.idempotency_key()
    }

    pub fn reference_id(&self) -> String {
        self.idempotency.reference_id()
    }

    /// Human-readable note shown on the payment in the Square dashboard
    pub fn note(&self) -> String {
        let site_name = decode_special_chars(self.config.site_name.trim());
        if site_name.is_empty() {
            format!(
                "{}, Transaction {}",
                self.config.platform_name,
                self.transaction_id()
            )
        } else {
            format!(
                "{} - {}, Transaction {}",
                self.config.platform_name,
                site_name,
                self.transaction_id()
            )
        }
    }

    /// Assemble the payment body without sending it
    pub fn build_request(&self) -> GatewayResult<PaymentRequest> {
        let amount = self.gateway.to_minor_units(self.transaction.amount())?;

        Ok(PaymentRequest {
            source_id: self.token.clone(),
            idempotency_key: self.idempotency_key(),
            amount_money: Money {
                amount,
                currency: self.transaction.currency_code().to_string(),
            },
            location_id: self.config.location_id.clone(),
            reference_id: self.reference_id(),
            note: self.note(),
            order_id: self.order_id.clone(),
        })
    }

    /// Create (authorize, and capture unless the account delays it) a payment
    pub async fn create(&self) -> PaymentResult {
        let url = format!(
            "{}/v2/payments",
            self.config.api_base_url(self.environment())
        );
        self.submit(&url).await
    }

    /// Capture a previously authorized payment
    pub async fn complete(&self, payment_id: &str) -> PaymentResult {
        if !is_valid_payment_id(payment_id) {
            warn!(
                "Refusing to complete payment with malformed id for transaction {}",
                self.transaction_id()
            );
            return GatewayError::invalid_request(format!(
                "payment id {:?} may only contain letters, digits, '-' and '_'",
                payment_id
            ))
            .into();
        }

        let url = format!(
            "{}/v2/payments/{}/complete",
            self.config.api_base_url(self.environment()),
            payment_id
        );
        self.submit(&url).await
    }

    /// Post the payment body to `endpoint_url` and normalize the response
    pub async fn submit(&self, endpoint_url: &str) -> PaymentResult {
        let request = match self.build_request() {
            Ok(request) => request,
            Err(e) => {
                warn!(
                    "Could not build Square payment for transaction {}: {}",
                    self.transaction_id(),
                    e
                );
                return e.into();
            }
        };

        let body = match serde_json::to_value(&request) {
            Ok(body) => body,
            Err(e) => {
                return GatewayError::new(GatewayErrorKind::ProtocolViolation {
                    message: format!("failed to encode payment body: {}", e),
                })
                .into();
            }
        };

        info!(
            "Submitting Square payment: reference_id={}, amount={} {}",
            request.reference_id, request.amount_money.amount, request.amount_money.currency
        );

        match self
            .transport
            .post(endpoint_url, &self.config.access_token, &body)
            .await
        {
            Ok(response) => {
                let result = normalize_response(response);
                match &result {
                    PaymentResult::Success { .. } => info!(
                        "Square payment accepted: reference_id={}, payment_id={}",
                        request.reference_id,
                        result.payment_id().unwrap_or("unknown")
                    ),
                    PaymentResult::Failure { kind, message, .. } => warn!(
                        "Square payment failed: reference_id={}, kind={:?}, message={}",
                        request.reference_id, kind, message
                    ),
                }
                result
            }
            Err(e) => {
                warn!(
                    "Square payment request did not complete: reference_id={}, retryable={}, error={}",
                    request.reference_id,
                    e.is_retryable(),
                    e
                );
                e.with_context(format!("POST {}", endpoint_url)).into()
            }
        }
    }
}

/// Fold a decoded Square response into a [`PaymentResult`]
///
/// An `error` entry is passed through unchanged; a response without a
/// `payment` entry is a protocol violation.
pub fn normalize_response(response: Value) -> PaymentResult {
    if response.get("error").filter(|error| !error.is_null()).is_some() {
        return PaymentResult::provider_failure(response);
    }

    match response {
        Value::Object(mut map) => match map.remove("payment") {
            Some(payment) if !payment.is_null() => PaymentResult::Success { payment },
            _ => PaymentResult::protocol_violation(),
        },
        _ => PaymentResult::protocol_violation(),
    }
}

/// Square payment ids are URL-safe tokens and go straight into the path
fn is_valid_payment_id(payment_id: &str) -> bool {
    !payment_id.is_empty()
        && payment_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Undo the HTML escaping the platform applies to stored site names
fn decode_special_chars(input: &str) -> String {
    input
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}
