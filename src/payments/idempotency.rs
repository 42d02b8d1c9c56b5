//! Idempotency key derivation
//!
//! A context is captured once per payment attempt. Every key it produces is
//! identical, so re-sending the same attempt is deduplicated by Square, while
//! a freshly built context for the same transaction yields a new key.

use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

use crate::payments::types::Environment;

/// Upper bound on the length of the time-derived key component
pub const PRE_NUMBER_MAX_DIGITS: usize = 30;

/// Longest `idempotency_key` Square's CreatePayment accepts
pub const IDEMPOTENCY_KEY_MAX_LEN: usize = 45;

/// Longest `reference_id` Square's CreatePayment accepts
pub const REFERENCE_ID_MAX_LEN: usize = 40;

/// Length of generated ids for unsaved transactions
const FALLBACK_ID_LEN: usize = 13;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotencyContext {
    environment: Environment,
    transaction_id: String,
    pre_number: String,
}

impl IdempotencyContext {
    /// Capture a new context; `transaction_id` falls back to a generated id
    /// when the transaction has not been saved yet
    pub fn new(environment: Environment, transaction_id: Option<String>) -> Self {
        Self::with_pre_number(environment, transaction_id, generate_pre_number())
    }

    /// Rebuild a context with a known pre-number, e.g. to retry an attempt
    /// after the original builder is gone
    pub fn with_pre_number<P: Into<String>>(
        environment: Environment,
        transaction_id: Option<String>,
        pre_number: P,
    ) -> Self {
        let transaction_id = transaction_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty() && id != "0")
            .unwrap_or_else(fallback_transaction_id);

        // Whatever room the prefix and transaction id leave under Square's key limit
        let key_budget = IDEMPOTENCY_KEY_MAX_LEN
            .saturating_sub(environment.key_prefix().len() + transaction_id.len() + 2);
        let mut pre_number = pre_number.into();
        truncate_at_char(&mut pre_number, PRE_NUMBER_MAX_DIGITS.min(key_budget).max(1));

        Self {
            environment,
            transaction_id,
            pre_number,
        }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    pub fn pre_number(&self) -> &str {
        &self.pre_number
    }

    /// `{prefix}-{pre_number}-{transaction_id}`
    pub fn idempotency_key(&self) -> String {
        format!(
            "{}-{}-{}",
            self.environment.key_prefix(),
            self.pre_number,
            self.transaction_id
        )
    }

    /// `{prefix}-{transaction_id}`, searchable in the Square dashboard
    pub fn reference_id(&self) -> String {
        let mut reference_id = format!("{}-{}", self.environment.key_prefix(), self.transaction_id);
        truncate_at_char(&mut reference_id, REFERENCE_ID_MAX_LEN);
        reference_id
    }
}

/// Unix time (s) times a random multiplier in `2..=99999`, as plain digits
fn generate_pre_number() -> String {
    let seed = u128::try_from(Utc::now().timestamp()).unwrap_or_default();
    let multiplier: u128 = rand::thread_rng().gen_range(2..=99_999);

    let mut digits = seed.saturating_mul(multiplier).to_string();
    digits.truncate(PRE_NUMBER_MAX_DIGITS);
    digits
}

/// Cut `value` to at most `max_len` bytes without splitting a character
fn truncate_at_char(value: &mut String, max_len: usize) {
    if value.len() <= max_len {
        return;
    }
    let mut end = max_len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    value.truncate(end);
}

fn fallback_transaction_id() -> String {
    Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(FALLBACK_ID_LEN)
        .collect()
}
