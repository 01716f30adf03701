//! Canonical results returned by the orchestrator.

use crate::domain::payment::PaymentStatus;
use serde::Serialize;

pub const MESSAGE_PAYMENT_LINK_GENERATED: &str = "Payment link generated successfully";
pub const MESSAGE_PAYMENT_LINK_EXISTS: &str = "Payment link already exists";
pub const MESSAGE_PAYMENT_VERIFIED: &str = "Payment verified successfully";
pub const MESSAGE_REFUND_PROCESSED: &str = "Refund processed successfully";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateOutcome {
    pub order_id: String,
    pub payment_link_id: String,
    pub payment_link_url: String,
    pub message: &'static str,
    /// `true` when an outstanding link was returned instead of creating one.
    pub already_exists: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOutcome {
    pub payment_id: Option<String>,
    pub order_id: String,
    pub status: PaymentStatus,
    /// As reported by the gateway, not as stored.
    pub amount: i64,
    pub currency: String,
    pub message: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundOutcome {
    pub refund_id: String,
    pub payment_id: String,
    pub amount: i64,
    /// Provider's refund status (`processed`, `pending`, ...).
    pub status: String,
    pub message: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    /// Read from the gateway during this call.
    Live,
    /// Last persisted state; the gateway was not asked or did not answer.
    Stored,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub payment_id: Option<String>,
    pub order_id: Option<String>,
    pub status: PaymentStatus,
    /// Provider's own status string when the view is live.
    pub gateway_status: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub method: Option<String>,
    pub freshness: Freshness,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationOutcome {
    Verified,
    Ignored,
}

/// Result of the notification hook. `order_id` names the matched record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationReceipt {
    pub outcome: NotificationOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

impl NotificationReceipt {
    pub fn ignored() -> Self {
        Self {
            outcome: NotificationOutcome::Ignored,
            order_id: None,
        }
    }
}
