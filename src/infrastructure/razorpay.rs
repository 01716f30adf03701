use super::http::{build_client, read_json};
use crate::config::RazorpayConfig;
use crate::domain::gateway::{
    CollectionLink, CollectionRequest, GatewayPayment, GatewayRefund, PaymentRef,
};
use crate::domain::payment::Amount;
use crate::domain::ports::PaymentGateway;
use crate::error::{GatewayError, PaymentError};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Payment links stay open for seven days.
pub const PAYMENT_LINK_EXPIRY_SECS: i64 = 7 * 24 * 60 * 60;

/// Razorpay adapter built on hosted payment links.
///
/// A payment link (`plink_...`) is the collection artifact; each attempt
/// against it produces a payment (`pay_...`), which is what gets verified and
/// refunded.
pub struct RazorpayGateway {
    client: reqwest::Client,
    config: RazorpayConfig,
}

impl RazorpayGateway {
    pub fn new(config: RazorpayConfig) -> Result<Self, PaymentError> {
        let client = build_client(config.timeout)?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        debug!(path, "Razorpay GET");
        let response = self
            .client
            .get(self.url(path))
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .send()
            .await?;
        read_json(response).await
    }

    async fn post<B: Serialize + Sync, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        debug!(path, "Razorpay POST");
        let response = self
            .client
            .post(self.url(path))
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(body)
            .send()
            .await?;
        read_json(response).await
    }
}

#[derive(Serialize)]
struct PaymentLinkRequest<'a> {
    amount: i64,
    currency: &'a str,
    accept_partial: bool,
    expire_by: i64,
    reference_id: &'a str,
    description: String,
    customer: Customer<'a>,
    notify: Notify,
    reminder_enable: bool,
    notes: Notes<'a>,
}

#[derive(Serialize)]
struct Customer<'a> {
    name: &'a str,
    contact: &'a str,
    email: &'a str,
}

#[derive(Serialize)]
struct Notify {
    sms: bool,
    email: bool,
}

#[derive(Serialize)]
struct Notes<'a> {
    order_id: &'a str,
}

#[derive(Serialize)]
struct RefundRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    amount: Option<i64>,
}

#[derive(Deserialize)]
struct PaymentLink {
    id: String,
    short_url: String,
}

#[derive(Deserialize)]
struct PaymentLinkDetails {
    status: String,
    amount: i64,
    currency: String,
    reference_id: Option<String>,
    #[serde(default)]
    payments: Option<Vec<LinkPayment>>,
}

#[derive(Deserialize)]
struct LinkPayment {
    payment_id: String,
    status: String,
}

#[derive(Deserialize)]
struct Payment {
    id: String,
    status: String,
    amount: i64,
    currency: String,
    order_id: Option<String>,
    method: Option<String>,
}

#[derive(Deserialize)]
struct Refund {
    id: String,
    amount: i64,
    status: String,
}

impl From<Payment> for GatewayPayment {
    fn from(payment: Payment) -> Self {
        GatewayPayment {
            payment_id: Some(payment.id),
            status: payment.status,
            amount: payment.amount,
            currency: payment.currency,
            order_id: payment.order_id,
            method: payment.method,
        }
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_collection_link(
        &self,
        request: &CollectionRequest,
    ) -> Result<CollectionLink, GatewayError> {
        let body = PaymentLinkRequest {
            amount: request.amount.value(),
            currency: &request.currency,
            accept_partial: false,
            expire_by: Utc::now().timestamp() + PAYMENT_LINK_EXPIRY_SECS,
            reference_id: &request.order_id,
            description: format!("Payment for order #{}", request.order_id),
            customer: Customer {
                name: &request.phone,
                contact: &request.phone,
                email: &request.email,
            },
            notify: Notify {
                sms: true,
                email: true,
            },
            reminder_enable: true,
            notes: Notes {
                order_id: &request.order_id,
            },
        };

        let link: PaymentLink = self.post("payment_links", &body).await?;
        info!(order_id = %request.order_id, link_id = %link.id, "Razorpay payment link created");
        Ok(CollectionLink {
            link_id: link.id,
            link_url: link.short_url,
        })
    }

    async fn fetch_payment(&self, reference: &PaymentRef) -> Result<GatewayPayment, GatewayError> {
        match reference {
            PaymentRef::Payment(id) => {
                let payment: Payment = self.get(&format!("payments/{id}")).await?;
                Ok(payment.into())
            }
            PaymentRef::Link(id) => {
                let link: PaymentLinkDetails = self.get(&format!("payment_links/{id}")).await?;
                let payments = link.payments.unwrap_or_default();
                // Prefer a captured attempt over the most recent one.
                let attempt = payments
                    .iter()
                    .find(|p| p.status == "captured")
                    .or_else(|| payments.last());
                match attempt {
                    Some(attempt) => {
                        let payment: Payment =
                            self.get(&format!("payments/{}", attempt.payment_id)).await?;
                        let mut payment = GatewayPayment::from(payment);
                        if payment.order_id.is_none() {
                            payment.order_id = link.reference_id;
                        }
                        Ok(payment)
                    }
                    None => Ok(GatewayPayment {
                        payment_id: None,
                        status: link.status,
                        amount: link.amount,
                        currency: link.currency,
                        order_id: link.reference_id,
                        method: None,
                    }),
                }
            }
        }
    }

    async fn refund(
        &self,
        payment_id: &str,
        amount: Option<Amount>,
    ) -> Result<GatewayRefund, GatewayError> {
        let body = RefundRequest {
            amount: amount.map(|a| a.value()),
        };
        let refund: Refund = self
            .post(&format!("payments/{payment_id}/refund"), &body)
            .await?;
        info!(payment_id, refund_id = %refund.id, "Razorpay refund created");
        Ok(GatewayRefund {
            refund_id: refund.id,
            amount: refund.amount,
            status: refund.status,
        })
    }

    async fn fetch_status(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError> {
        let payment: Payment = self.get(&format!("payments/{payment_id}")).await?;
        Ok(payment.into())
    }
}
