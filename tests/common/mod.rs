//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use square_gateway::payments::traits::{AmountSource, GatewayAdapter, PaymentTransport, TransactionRef};
use square_gateway::{GatewayResult, SquareConfig};

/// A request the transport saw
#[derive(Debug, Clone)]
pub struct SentRequest {
    pub url: String,
    pub bearer_token: String,
    pub body: Value,
}

/// Transport that records every call and replays scripted responses
#[derive(Default)]
pub struct RecordingTransport {
    responses: Mutex<VecDeque<GatewayResult<Value>>>,
    sent: Mutex<Vec<SentRequest>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replying(responses: Vec<GatewayResult<Value>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<SentRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_body(&self) -> Value {
        self.sent().last().expect("no request was sent").body.clone()
    }
}

#[async_trait]
impl PaymentTransport for RecordingTransport {
    async fn post(&self, url: &str, bearer_token: &str, body: &Value) -> GatewayResult<Value> {
        self.sent.lock().unwrap().push(SentRequest {
            url: url.to_string(),
            bearer_token: bearer_token.to_string(),
            body: body.clone(),
        });

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(json!({})))
    }
}

/// Gateway that multiplies by 100, like a two-decimal currency
pub struct CentsGateway {
    pub sandbox: bool,
}

impl GatewayAdapter for CentsGateway {
    fn to_minor_units(&self, amount: Decimal) -> GatewayResult<i64> {
        use rust_decimal::prelude::ToPrimitive;
        Ok((amount * Decimal::from(100)).round().to_i64().unwrap_or_default())
    }

    fn is_sandbox(&self) -> bool {
        self.sandbox
    }
}

/// Minimal stand-in for a platform transaction record
pub struct Registration {
    pub id: Option<String>,
    pub amount: Decimal,
    pub currency: String,
}

impl AmountSource for Registration {
    fn amount(&self) -> Decimal {
        self.amount
    }

    fn currency_code(&self) -> &str {
        &self.currency
    }
}

impl TransactionRef for Registration {
    fn id(&self) -> Option<String> {
        self.id.clone()
    }
}

pub fn registration(id: &str, amount: Decimal) -> Registration {
    Registration {
        id: if id.is_empty() { None } else { Some(id.to_string()) },
        amount,
        currency: "USD".to_string(),
    }
}

pub fn test_config() -> SquareConfig {
    SquareConfig::new("EAAA-test-token", "LOC123")
        .with_site_name("Spring Conference")
        .with_base_url("https://square.test")
}

pub fn payment_response(id: &str) -> Value {
    json!({"payment": {"id": id, "status": "COMPLETED"}})
}
