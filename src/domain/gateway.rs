//! Canonical shapes exchanged with gateway adapters.
//!
//! Adapters translate provider payloads into these types; provider status
//! strings are passed through untouched and normalised by the application
//! layer.

use super::payment::Amount;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct CollectionRequest {
    pub order_id: String,
    pub amount: Amount,
    pub currency: String,
    pub phone: String,
    pub email: String,
}

/// The provider-side artifact a customer pays against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionLink {
    pub link_id: String,
    pub link_url: String,
}

/// What an adapter should look up.
///
/// `Link` is used for a first verification, when only the collection
/// artifact is known locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentRef {
    Payment(String),
    Link(String),
}

impl PaymentRef {
    pub fn as_str(&self) -> &str {
        match self {
            PaymentRef::Payment(id) | PaymentRef::Link(id) => id,
        }
    }
}

/// Remote truth for one transaction, in the provider's vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayPayment {
    /// `None` when a link was queried and nobody has paid against it yet.
    pub payment_id: Option<String>,
    pub status: String,
    pub amount: i64,
    pub currency: String,
    pub order_id: Option<String>,
    pub method: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayRefund {
    pub refund_id: String,
    pub amount: i64,
    pub status: String,
}
