//! End-to-end submissions through `SquareTransport` against a mock Square API

#![cfg(feature = "square-http")]

mod common;

use common::{registration, CentsGateway};
use mockito::Matcher;
use rust_decimal_macros::dec;
use serde_json::json;
use square_gateway::payments::providers::SquareTransport;
use square_gateway::{FailureKind, PaymentRequestBuilder, PaymentResult, SquareConfig};

fn config_for(base_url: &str) -> SquareConfig {
    SquareConfig::new("EAAA-sandbox-token", "LOC123")
        .with_site_name("Spring Conference")
        .with_base_url(base_url)
        .with_retries(0, 1)
}

#[tokio::test]
async fn test_create_payment_success() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/v2/payments")
        .match_header("authorization", "Bearer EAAA-sandbox-token")
        .match_header("square-version", "2024-01-18")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(json!({
            "source_id": "cnon:card-nonce-ok",
            "amount_money": {"amount": 1250, "currency": "USD"},
            "location_id": "LOC123",
            "reference_id": "TEST-payment-42",
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"payment":{"id":"pay_1","status":"COMPLETED"}}"#)
        .expect(1)
        .create_async()
        .await;

    let config = config_for(&server.url());
    let transport = SquareTransport::new(&config).unwrap();
    let txn = registration("42", dec!(12.50));
    let gateway = CentsGateway { sandbox: true };

    let mut builder = PaymentRequestBuilder::new(&txn, &gateway, &transport, &config, true).unwrap();
    builder.set_token("cnon:card-nonce-ok");
    let result = builder.create().await;

    mock.assert_async().await;
    assert_eq!(
        result,
        PaymentResult::Success {
            payment: json!({"id": "pay_1", "status": "COMPLETED"})
        }
    );
}

#[tokio::test]
async fn test_card_declined_is_provider_failure() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", "/v2/payments")
        .with_status(402)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"errors":[{"category":"PAYMENT_METHOD_ERROR","code":"CARD_DECLINED","detail":"Card declined."}]}"#,
        )
        .create_async()
        .await;

    let config = config_for(&server.url());
    let transport = SquareTransport::new(&config).unwrap();
    let txn = registration("42", dec!(12.50));
    let gateway = CentsGateway { sandbox: true };

    let builder = PaymentRequestBuilder::new(&txn, &gateway, &transport, &config, true).unwrap();
    match builder.create().await {
        PaymentResult::Failure {
            kind,
            message,
            raw_error,
        } => {
            assert_eq!(kind, FailureKind::Provider);
            assert_eq!(message, "Card declined.");
            assert_eq!(raw_error["error"]["code"], "CARD_DECLINED");
            assert_eq!(raw_error["error"]["status"], 402);
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_errors_are_retried_then_reported() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/v2/payments")
        .with_status(503)
        .with_body("service unavailable")
        .expect(2)
        .create_async()
        .await;

    let config = config_for(&server.url()).with_retries(1, 1);
    let transport = SquareTransport::new(&config).unwrap();
    let txn = registration("42", dec!(12.50));
    let gateway = CentsGateway { sandbox: true };

    let builder = PaymentRequestBuilder::new(&txn, &gateway, &transport, &config, true).unwrap();
    let result = builder.create().await;

    mock.assert_async().await;
    match result {
        PaymentResult::Failure {
            kind, raw_error, ..
        } => {
            assert_eq!(kind, FailureKind::Transport);
            assert_eq!(raw_error["error"]["status"], 503);
            assert_eq!(raw_error["error"]["retryable"], true);
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_ok_without_payment_is_protocol_violation() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", "/v2/payments/pay_9/complete")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("{}")
        .create_async()
        .await;

    let config = config_for(&server.url());
    let transport = SquareTransport::new(&config).unwrap();
    let txn = registration("42", dec!(12.50));
    let gateway = CentsGateway { sandbox: false };

    let builder = PaymentRequestBuilder::new(&txn, &gateway, &transport, &config, false).unwrap();
    let result = builder.complete("pay_9").await;

    assert!(matches!(
        result,
        PaymentResult::Failure {
            kind: FailureKind::ProtocolViolation,
            ..
        }
    ));
}

#[tokio::test]
async fn test_unreachable_host_is_retryable_transport_failure() {
    let config = config_for("http://127.0.0.1:1");
    let transport = SquareTransport::new(&config).unwrap();
    let txn = registration("42", dec!(12.50));
    let gateway = CentsGateway { sandbox: false };

    let builder = PaymentRequestBuilder::new(&txn, &gateway, &transport, &config, false).unwrap();
    match builder.create().await {
        PaymentResult::Failure {
            kind, raw_error, ..
        } => {
            assert_eq!(kind, FailureKind::Transport);
            assert_eq!(raw_error["error"]["retryable"], true);
        }
        other => panic!("expected failure, got {:?}", other),
    }
}
