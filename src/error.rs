//! Error types for the Square payment gateway
//!
//! Errors carry a kind, an optional context string and a retryability flag so
//! callers can decide whether re-submitting the same request is safe.

use std::fmt;

use thiserror::Error;

/// Classification of gateway failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayErrorKind {
    /// A required collaborator or setting is missing
    #[error("Gateway configuration error: {message}")]
    Configuration { message: String },

    /// Network, timeout or HTTP-level failure talking to the provider
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        status: Option<u16>,
    },

    /// The provider answered with a structured error body
    #[error("Square API error: {message}")]
    Provider {
        message: String,
        code: Option<String>,
    },

    /// A successful response that does not honour the provider contract
    #[error("Protocol violation: {message}")]
    ProtocolViolation { message: String },

    /// The amount cannot be expressed in minor units
    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    /// Caller-supplied input that cannot be sent to the provider
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Clone)]
pub struct GatewayError {
    pub kind: GatewayErrorKind,
    pub context: Option<String>,
    pub is_retryable: bool,
}

impl GatewayError {
    pub fn new(kind: GatewayErrorKind) -> Self {
        let is_retryable = match &kind {
            GatewayErrorKind::Transport { status, .. } => match status {
                None => true,
                Some(code) => *code == 429 || *code >= 500,
            },
            _ => false,
        };

        Self {
            kind,
            context: None,
            is_retryable,
        }
    }

    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::new(GatewayErrorKind::Configuration {
            message: message.into(),
        })
    }

    pub fn transport<S: Into<String>>(message: S, status: Option<u16>) -> Self {
        Self::new(GatewayErrorKind::Transport {
            message: message.into(),
            status,
        })
    }

    pub fn invalid_amount<S: Into<String>>(message: S) -> Self {
        Self::new(GatewayErrorKind::InvalidAmount {
            message: message.into(),
        })
    }

    pub fn invalid_request<S: Into<String>>(message: S) -> Self {
        Self::new(GatewayErrorKind::InvalidRequest {
            message: message.into(),
        })
    }

    pub fn with_context<S: Into<String>>(mut self, context: S) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.is_retryable
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self.kind, GatewayErrorKind::Configuration { .. })
    }

    /// Message without the kind prefix, as surfaced in failure payloads
    pub fn message(&self) -> &str {
        match &self.kind {
            GatewayErrorKind::Configuration { message }
            | GatewayErrorKind::Transport { message, .. }
            | GatewayErrorKind::Provider { message, .. }
            | GatewayErrorKind::ProtocolViolation { message }
            | GatewayErrorKind::InvalidAmount { message }
            | GatewayErrorKind::InvalidRequest { message } => message,
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(f, "{} ({})", self.kind, context)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

impl std::error::Error for GatewayError {}

impl PartialEq for GatewayError {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}
