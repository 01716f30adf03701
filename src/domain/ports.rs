use super::gateway::{
    CollectionLink, CollectionRequest, GatewayPayment, GatewayRefund, PaymentRef,
};
use super::payment::{Amount, PaymentRecord, PaymentStatus};
use crate::error::{GatewayError, StoreError};
use async_trait::async_trait;
use std::sync::Arc;

/// Durable storage of payment records.
///
/// Implementations must serialise each call's read-check-write so that
/// `insert` and `update` are atomic with respect to each other, and must
/// maintain `created_at` / `updated_at`.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Persists a new record. Fails with [`StoreError::Duplicate`] if the order
    /// id, link id or payment id is already taken.
    async fn insert(&self, record: PaymentRecord) -> Result<PaymentRecord, StoreError>;

    /// Replaces a record only if its stored status still equals `expected`.
    async fn update(
        &self,
        record: PaymentRecord,
        expected: PaymentStatus,
    ) -> Result<PaymentRecord, StoreError>;

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<PaymentRecord>, StoreError>;
    async fn find_by_link_id(&self, link_id: &str) -> Result<Option<PaymentRecord>, StoreError>;
    async fn find_by_payment_id(
        &self,
        payment_id: &str,
    ) -> Result<Option<PaymentRecord>, StoreError>;
}

/// One external payment provider, normalised to four operations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_collection_link(
        &self,
        request: &CollectionRequest,
    ) -> Result<CollectionLink, GatewayError>;

    async fn fetch_payment(&self, reference: &PaymentRef) -> Result<GatewayPayment, GatewayError>;

    /// Full refund when `amount` is `None`, partial otherwise.
    async fn refund(
        &self,
        payment_id: &str,
        amount: Option<Amount>,
    ) -> Result<GatewayRefund, GatewayError>;

    /// Like [`PaymentGateway::fetch_payment`], with the payment method filled in.
    async fn fetch_status(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError>;
}

/// Checks a webhook signature. Algorithms are provider specific and plugged
/// in from outside the core.
pub trait NotificationVerifier: Send + Sync {
    fn verify(&self, raw_payload: &[u8], signature: &str) -> bool;
}

pub type PaymentStoreBox = Box<dyn PaymentStore>;
pub type GatewayHandle = Arc<dyn PaymentGateway>;
