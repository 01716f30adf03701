mod common;

use common::ScriptedGateway;
use paylink::domain::gateway::PaymentRef;
use paylink::domain::payment::{Amount, GatewayType, NewPayment, PaymentRecord, PaymentStatus};
use paylink::domain::ports::{GatewayHandle, PaymentStoreBox};
use paylink::infrastructure::in_memory::InMemoryPaymentStore;

fn record(order_id: &str) -> PaymentRecord {
    PaymentRecord::new(NewPayment {
        order_id: order_id.to_string(),
        amount: Amount::new(1000).unwrap(),
        currency: "INR".to_string(),
        customer_phone: "+911234567890".to_string(),
        customer_email: "a@b.com".to_string(),
        gateway_type: GatewayType::Razorpay,
        gateway_link_id: format!("plink_{order_id}"),
        gateway_link_url: format!("https://rzp.io/i/{order_id}"),
    })
}

#[tokio::test]
async fn test_store_as_trait_object() {
    let store: PaymentStoreBox = Box::new(InMemoryPaymentStore::new());

    // Verify Send + Sync by moving the boxed store into a task
    let handle = tokio::spawn(async move {
        store.insert(record("ORD1")).await.unwrap();
        let mut found = store.find_by_link_id("plink_ORD1").await.unwrap().unwrap();
        found.assign_gateway_payment_id("pay_1");
        found.transition_to(PaymentStatus::Success).unwrap();
        store.update(found, PaymentStatus::Pending).await.unwrap();
        store.find_by_payment_id("pay_1").await.unwrap().unwrap()
    });

    let saved = handle.await.unwrap();
    assert_eq!(saved.order_id(), "ORD1");
    assert_eq!(saved.status(), PaymentStatus::Success);
    assert!(saved.updated_at() >= saved.created_at());
}

#[tokio::test]
async fn test_gateways_as_trait_objects() {
    let adapters: Vec<GatewayHandle> = vec![
        ScriptedGateway::new("razorpay"),
        ScriptedGateway::new("stripe"),
    ];

    let mut handles = Vec::new();
    for adapter in adapters {
        handles.push(tokio::spawn(async move {
            adapter
                .fetch_payment(&PaymentRef::Payment("any".into()))
                .await
                .unwrap()
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().payment_id.unwrap());
    }
    assert_eq!(ids, ["pay_razorpay_1", "pay_stripe_1"]);
}
