mod common;

use common::{harness, initiate_request};
use paylink::domain::payment::PaymentStatus;
use paylink::error::PaymentError;

#[tokio::test]
async fn test_order_lifecycle_end_to_end() {
    let h = harness();
    let engine = &h.orchestrator;

    let initiated = engine
        .initiate(initiate_request("ORD42", 50000, Some("RAZORPAY")))
        .await
        .unwrap();
    assert_eq!(initiated.order_id, "ORD42");
    assert_eq!(initiated.payment_link_id, "razorpay_link_ORD42");
    assert!(!initiated.already_exists);
    assert_eq!(
        engine.status_by_order_id("ORD42").await.unwrap().status,
        PaymentStatus::Pending
    );

    h.razorpay.report("captured");
    let verified = engine.verify(None, Some("ORD42")).await.unwrap();
    assert_eq!(verified.status, PaymentStatus::Success);
    assert_eq!(verified.amount, 50000);
    let payment_id = verified.payment_id.unwrap();
    assert_eq!(payment_id, "pay_razorpay_1");

    let refund = engine.refund(&payment_id, None).await.unwrap();
    assert_eq!(refund.refund_id, "rfnd_razorpay_1");
    assert_eq!(refund.amount, 50000);
    assert_eq!(refund.message, "Refund processed successfully");

    let view = engine.status_by_order_id("ORD42").await.unwrap();
    assert_eq!(view.status, PaymentStatus::Refunded);
    assert_eq!(view.amount, 50000);
    assert_eq!(view.payment_id.as_deref(), Some("pay_razorpay_1"));
}

#[tokio::test]
async fn test_initiate_is_idempotent_while_pending() {
    let h = harness();
    let first = h
        .orchestrator
        .initiate(initiate_request("ORD1", 1000, Some("RAZORPAY")))
        .await
        .unwrap();
    let second = h
        .orchestrator
        .initiate(initiate_request("ORD1", 1000, Some("RAZORPAY")))
        .await
        .unwrap();

    assert_eq!(first.payment_link_id, second.payment_link_id);
    assert_eq!(first.payment_link_url, second.payment_link_url);
    assert!(second.already_exists);
    assert_eq!(second.message, "Payment link already exists");
    assert_eq!(h.razorpay.creates(), 1);
}

#[tokio::test]
async fn test_settled_order_cannot_be_initiated_again() {
    let h = harness();
    h.orchestrator
        .initiate(initiate_request("ORD7", 1000, None))
        .await
        .unwrap();
    h.razorpay.report("failed");
    h.orchestrator.verify(None, Some("ORD7")).await.unwrap();

    let err = h
        .orchestrator
        .initiate(initiate_request("ORD7", 1000, None))
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::InvalidPaymentState(_)));
    assert_eq!(h.razorpay.creates(), 1);
}

#[tokio::test]
async fn test_gateway_token_routes_to_adapter() {
    let h = harness();
    let outcome = h
        .orchestrator
        .initiate(initiate_request("ORD-S", 700, Some("stripe")))
        .await
        .unwrap();
    assert_eq!(outcome.payment_link_id, "stripe_link_ORD-S");
    assert_eq!(h.stripe.creates(), 1);
    assert_eq!(h.razorpay.creates(), 0);

    // Later operations follow the stored gateway, not the default.
    h.stripe.report("succeeded");
    let verified = h.orchestrator.verify(None, Some("ORD-S")).await.unwrap();
    assert_eq!(verified.payment_id.as_deref(), Some("pay_stripe_1"));
    assert_eq!(h.stripe.fetches.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unknown_gateway_token_is_rejected() {
    let h = harness();
    let err = h
        .orchestrator
        .initiate(initiate_request("ORD9", 1000, Some("paypal")))
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::UnknownGateway(_)));
    assert!(matches!(
        h.orchestrator.status_by_order_id("ORD9").await,
        Err(PaymentError::PaymentNotFound(_))
    ));
}

#[tokio::test]
async fn test_failed_link_creation_persists_nothing() {
    let h = harness();
    h.razorpay
        .fail_create
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let err = h
        .orchestrator
        .initiate(initiate_request("ORD5", 1000, None))
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::Gateway(_)));
    assert!(err.to_string().contains("razorpay link creation unavailable"));
    assert!(matches!(
        h.orchestrator.status_by_order_id("ORD5").await,
        Err(PaymentError::PaymentNotFound(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_initiate_creates_one_link() {
    let h = harness();
    h.razorpay.respond_after(20);
    let mut handles = Vec::new();
    for _ in 0..16 {
        let engine = h.orchestrator.clone();
        handles.push(tokio::spawn(async move {
            engine
                .initiate(initiate_request("ORD-RACE", 1000, None))
                .await
        }));
    }

    let mut created = 0;
    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        assert_eq!(outcome.payment_link_id, "razorpay_link_ORD-RACE");
        if !outcome.already_exists {
            created += 1;
        }
    }
    assert_eq!(created, 1);
    assert_eq!(h.razorpay.creates(), 1);
    assert_eq!(
        h.orchestrator
            .status_by_order_id("ORD-RACE")
            .await
            .unwrap()
            .status,
        PaymentStatus::Pending
    );
}

#[tokio::test]
async fn test_verify_unknown_payment_is_not_found() {
    let h = harness();
    let err = h
        .orchestrator
        .verify(Some("nonexistent"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::PaymentNotFound(_)));
    assert_eq!(h.razorpay.fetches.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_verify_failure_leaves_record_pending() {
    let h = harness();
    h.orchestrator
        .initiate(initiate_request("ORD8", 1000, None))
        .await
        .unwrap();
    h.razorpay.report("captured");
    h.razorpay
        .fail_fetch
        .store(true, std::sync::atomic::Ordering::SeqCst);

    assert!(matches!(
        h.orchestrator.verify(None, Some("ORD8")).await,
        Err(PaymentError::Gateway(_))
    ));
    let view = h.orchestrator.status_by_order_id("ORD8").await.unwrap();
    assert_eq!(view.status, PaymentStatus::Pending);
    assert!(view.payment_id.is_none());
}

#[tokio::test]
async fn test_verify_does_not_bind_another_orders_payment() {
    let h = harness();
    for order_id in ["ORD-A", "ORD-B"] {
        h.orchestrator
            .initiate(initiate_request(order_id, 1000, None))
            .await
            .unwrap();
    }
    h.razorpay.report("captured");

    let err = h
        .orchestrator
        .verify(Some("pay_of_ord_b"), Some("ORD-A"))
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::ValidationError(_)), "{err}");
    assert_eq!(err.code(), "VALIDATION_ERROR");

    let view = h.orchestrator.status_by_order_id("ORD-A").await.unwrap();
    assert_eq!(view.status, PaymentStatus::Pending);
    assert!(view.payment_id.is_none());
}
