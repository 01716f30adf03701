use crate::error::PaymentError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A positive amount in the smallest currency unit (paise, cents).
///
/// Construction fails for zero or negative values, so an `Amount` in hand is
/// always chargeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Amount(i64);

impl Amount {
    pub fn new(value: i64) -> Result<Self, PaymentError> {
        if value > 0 {
            Ok(Self(value))
        } else {
            Err(PaymentError::ValidationError(
                "Amount must be greater than 0".to_string(),
            ))
        }
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for Amount {
    type Error = PaymentError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for i64 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonical payment status.
///
/// Legal edges:
/// PENDING -> SUCCESS | FAILED | CANCELLED
/// SUCCESS -> REFUNDED
/// FAILED, REFUNDED and CANCELLED are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
    Refunded,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Success => "SUCCESS",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Refunded => "REFUNDED",
            PaymentStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn can_transition_to(&self, to: PaymentStatus) -> bool {
        match self {
            PaymentStatus::Pending => matches!(
                to,
                PaymentStatus::Success | PaymentStatus::Failed | PaymentStatus::Cancelled
            ),
            PaymentStatus::Success => matches!(to, PaymentStatus::Refunded),
            PaymentStatus::Failed | PaymentStatus::Refunded | PaymentStatus::Cancelled => false,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies which gateway adapter owns a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GatewayType {
    Razorpay,
    Stripe,
}

impl GatewayType {
    pub const ALL: [GatewayType; 2] = [GatewayType::Razorpay, GatewayType::Stripe];

    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayType::Razorpay => "RAZORPAY",
            GatewayType::Stripe => "STRIPE",
        }
    }
}

impl FromStr for GatewayType {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        GatewayType::ALL
            .into_iter()
            .find(|gateway| gateway.as_str().eq_ignore_ascii_case(token))
            .ok_or_else(|| PaymentError::UnknownGateway(token.to_string()))
    }
}

impl fmt::Display for GatewayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to create a record once the gateway has issued a link.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub order_id: String,
    pub amount: Amount,
    pub currency: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub gateway_type: GatewayType,
    pub gateway_link_id: String,
    pub gateway_link_url: String,
}

/// The durable ledger entry for one order.
///
/// Fields are private so that the immutable ones (order, amount, currency,
/// contact data, gateway, link id) cannot be rewritten after creation and the
/// status only moves along legal edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    id: Uuid,
    order_id: String,
    amount: Amount,
    currency: String,
    customer_phone: String,
    customer_email: String,
    status: PaymentStatus,
    gateway_type: GatewayType,
    gateway_link_id: Option<String>,
    gateway_payment_id: Option<String>,
    gateway_link_url: Option<String>,
    failure_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PaymentRecord {
    pub fn new(payment: NewPayment) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            order_id: payment.order_id,
            amount: payment.amount,
            currency: payment.currency,
            customer_phone: payment.customer_phone,
            customer_email: payment.customer_email,
            status: PaymentStatus::Pending,
            gateway_type: payment.gateway_type,
            gateway_link_id: Some(payment.gateway_link_id),
            gateway_payment_id: None,
            gateway_link_url: Some(payment.gateway_link_url),
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn customer_phone(&self) -> &str {
        &self.customer_phone
    }

    pub fn customer_email(&self) -> &str {
        &self.customer_email
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn gateway_type(&self) -> GatewayType {
        self.gateway_type
    }

    pub fn gateway_link_id(&self) -> Option<&str> {
        self.gateway_link_id.as_deref()
    }

    pub fn gateway_payment_id(&self) -> Option<&str> {
        self.gateway_payment_id.as_deref()
    }

    pub fn gateway_link_url(&self) -> Option<&str> {
        self.gateway_link_url.as_deref()
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Moves the record along a legal edge of the status machine.
    pub fn transition_to(&mut self, to: PaymentStatus) -> Result<(), PaymentError> {
        if self.status.can_transition_to(to) {
            self.status = to;
            Ok(())
        } else {
            Err(PaymentError::InvalidPaymentState(format!(
                "cannot move payment for order {} from {} to {}",
                self.order_id, self.status, to
            )))
        }
    }

    /// Records the provider's transaction id. Returns `false` and leaves the
    /// record untouched when an id is already present.
    pub fn assign_gateway_payment_id(&mut self, payment_id: impl Into<String>) -> bool {
        if self.gateway_payment_id.is_some() {
            return false;
        }
        self.gateway_payment_id = Some(payment_id.into());
        true
    }

    pub fn set_failure_reason(&mut self, reason: Option<String>) {
        self.failure_reason = reason;
    }

    /// Timestamps are owned by the store; backends call this on every write.
    pub fn stamp(&mut self, created_at: Option<DateTime<Utc>>, updated_at: DateTime<Utc>) {
        if let Some(created_at) = created_at {
            self.created_at = created_at;
        }
        self.updated_at = updated_at;
    }
}
