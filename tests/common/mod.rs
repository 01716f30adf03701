#![allow(dead_code)]

use async_trait::async_trait;
use paylink::application::orchestrator::{InitiatePayment, PaymentOrchestrator};
use paylink::application::selector::GatewaySelector;
use paylink::domain::gateway::{
    CollectionLink, CollectionRequest, GatewayPayment, GatewayRefund, PaymentRef,
};
use paylink::domain::payment::{Amount, GatewayType};
use paylink::domain::ports::PaymentGateway;
use paylink::error::GatewayError;
use paylink::infrastructure::in_memory::InMemoryPaymentStore;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Gateway double whose answers are set by the test and whose calls are counted.
pub struct ScriptedGateway {
    pub name: &'static str,
    pub status: Mutex<String>,
    pub amount: i64,
    pub payment_id: String,
    pub fail_create: AtomicBool,
    pub fail_fetch: AtomicBool,
    pub fail_refund: AtomicBool,
    /// Milliseconds every call sleeps before answering.
    pub delay_ms: AtomicU64,
    pub creates: AtomicUsize,
    pub fetches: AtomicUsize,
    pub refunds: AtomicUsize,
    pub status_calls: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            status: Mutex::new("created".to_string()),
            amount: 50000,
            payment_id: format!("pay_{name}_1"),
            fail_create: AtomicBool::new(false),
            fail_fetch: AtomicBool::new(false),
            fail_refund: AtomicBool::new(false),
            delay_ms: AtomicU64::new(0),
            creates: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
            refunds: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
        })
    }

    pub fn report(&self, status: &str) {
        *self.status.lock().unwrap() = status.to_string();
    }

    /// Makes every call yield for `millis` before answering, like a real
    /// network round trip.
    pub fn respond_after(&self, millis: u64) {
        self.delay_ms.store(millis, Ordering::SeqCst);
    }

    async fn pause(&self) {
        let millis = self.delay_ms.load(Ordering::SeqCst);
        if millis > 0 {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn refunds(&self) -> usize {
        self.refunds.load(Ordering::SeqCst)
    }

    fn provider_error(&self, what: &str) -> GatewayError {
        GatewayError::Provider {
            status: 502,
            message: format!("{} {what} unavailable", self.name),
        }
    }

    fn payment(&self, with_method: bool) -> GatewayPayment {
        GatewayPayment {
            payment_id: Some(self.payment_id.clone()),
            status: self.status.lock().unwrap().clone(),
            amount: self.amount,
            currency: "INR".to_string(),
            order_id: None,
            method: with_method.then(|| "upi".to_string()),
        }
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn create_collection_link(
        &self,
        request: &CollectionRequest,
    ) -> Result<CollectionLink, GatewayError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(self.provider_error("link creation"));
        }
        Ok(CollectionLink {
            link_id: format!("{}_link_{}", self.name, request.order_id),
            link_url: format!("https://{}.test/pay/{}", self.name, request.order_id),
        })
    }

    async fn fetch_payment(&self, _reference: &PaymentRef) -> Result<GatewayPayment, GatewayError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(self.provider_error("payment lookup"));
        }
        Ok(self.payment(false))
    }

    async fn refund(
        &self,
        _payment_id: &str,
        amount: Option<Amount>,
    ) -> Result<GatewayRefund, GatewayError> {
        self.refunds.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_refund.load(Ordering::SeqCst) {
            return Err(self.provider_error("refund"));
        }
        Ok(GatewayRefund {
            refund_id: format!("rfnd_{}_1", self.name),
            amount: amount.map(|a| a.value()).unwrap_or(self.amount),
            status: "processed".to_string(),
        })
    }

    async fn fetch_status(&self, _payment_id: &str) -> Result<GatewayPayment, GatewayError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(self.provider_error("status lookup"));
        }
        Ok(self.payment(true))
    }
}

pub struct Harness {
    pub orchestrator: Arc<PaymentOrchestrator>,
    pub razorpay: Arc<ScriptedGateway>,
    pub stripe: Arc<ScriptedGateway>,
}

/// Orchestrator over an in-memory store with both gateways scripted and
/// Razorpay as the default.
pub fn harness() -> Harness {
    let razorpay = ScriptedGateway::new("razorpay");
    let stripe = ScriptedGateway::new("stripe");
    let selector = GatewaySelector::new(GatewayType::Razorpay, razorpay.clone())
        .with_gateway(GatewayType::Stripe, stripe.clone());
    let orchestrator =
        PaymentOrchestrator::new(Box::new(InMemoryPaymentStore::new()), selector, "INR");
    Harness {
        orchestrator: Arc::new(orchestrator),
        razorpay,
        stripe,
    }
}

pub fn initiate_request(order_id: &str, amount: i64, gateway: Option<&str>) -> InitiatePayment {
    InitiatePayment {
        order_id: order_id.to_string(),
        amount: Amount::new(amount).unwrap(),
        phone: "+911234567890".to_string(),
        email: "a@b.com".to_string(),
        gateway: gateway.map(str::to_string),
    }
}
