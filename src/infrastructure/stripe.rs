use super::http::{build_client, read_json};
use crate::config::StripeConfig;
use crate::domain::gateway::{
    CollectionLink, CollectionRequest, GatewayPayment, GatewayRefund, PaymentRef,
};
use crate::domain::payment::Amount;
use crate::domain::ports::PaymentGateway;
use crate::error::{GatewayError, PaymentError};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Stripe adapter built on payment intents.
///
/// The intent id (`pi_...`) serves as both the collection artifact and the
/// payment reference, so `PaymentRef::Link` and `PaymentRef::Payment` resolve
/// to the same lookup.
pub struct StripeGateway {
    client: reqwest::Client,
    config: StripeConfig,
}

impl StripeGateway {
    pub fn new(config: StripeConfig) -> Result<Self, PaymentError> {
        let client = build_client(config.timeout)?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, GatewayError> {
        debug!(intent_id, "Stripe retrieve payment intent");
        let response = self
            .client
            .get(self.url(&format!("payment_intents/{intent_id}")))
            .bearer_auth(&self.config.secret_key)
            .send()
            .await?;
        read_json(response).await
    }
}

#[derive(Deserialize)]
struct PaymentIntent {
    id: String,
    status: String,
    amount: i64,
    currency: String,
    client_secret: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
    #[serde(default)]
    payment_method_types: Vec<String>,
    // Either a charge id or an expanded charge object.
    latest_charge: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct Refund {
    id: String,
    amount: i64,
    status: Option<String>,
}

impl PaymentIntent {
    fn into_payment(mut self, with_method: bool) -> GatewayPayment {
        let method = if with_method {
            Some(
                self.payment_method_types
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
            )
        } else {
            None
        };
        GatewayPayment {
            order_id: self.metadata.remove("order_id"),
            payment_id: Some(self.id),
            status: self.status,
            amount: self.amount,
            currency: self.currency,
            method,
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_collection_link(
        &self,
        request: &CollectionRequest,
    ) -> Result<CollectionLink, GatewayError> {
        let form = [
            ("amount", request.amount.value().to_string()),
            ("currency", request.currency.to_lowercase()),
            ("metadata[order_id]", request.order_id.clone()),
            ("metadata[email]", request.email.clone()),
            ("metadata[phone]", request.phone.clone()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
        ];
        let response = self
            .client
            .post(self.url("payment_intents"))
            .bearer_auth(&self.config.secret_key)
            // Stripe replays the original intent for a repeated key.
            .header("Idempotency-Key", format!("paylink-{}", request.order_id))
            .form(&form)
            .send()
            .await?;
        let intent: PaymentIntent = read_json(response).await?;

        let client_secret = intent.client_secret.ok_or_else(|| {
            GatewayError::Decode(format!("payment intent {} has no client_secret", intent.id))
        })?;
        info!(order_id = %request.order_id, intent_id = %intent.id, "Stripe payment intent created");
        Ok(CollectionLink {
            link_url: format!(
                "{}/pay/{}",
                self.config.checkout_base_url.trim_end_matches('/'),
                client_secret
            ),
            link_id: intent.id,
        })
    }

    async fn fetch_payment(&self, reference: &PaymentRef) -> Result<GatewayPayment, GatewayError> {
        let intent = self.retrieve_intent(reference.as_str()).await?;
        Ok(intent.into_payment(false))
    }

    async fn refund(
        &self,
        payment_id: &str,
        amount: Option<Amount>,
    ) -> Result<GatewayRefund, GatewayError> {
        let intent = self.retrieve_intent(payment_id).await?;
        if intent.latest_charge.is_none() {
            warn!(payment_id, "Stripe intent has no charge to refund");
            return Err(GatewayError::ChargeNotFound(payment_id.to_string()));
        }

        let mut form = vec![("payment_intent", payment_id.to_string())];
        if let Some(amount) = amount {
            form.push(("amount", amount.value().to_string()));
        }
        let response = self
            .client
            .post(self.url("refunds"))
            .bearer_auth(&self.config.secret_key)
            .form(&form)
            .send()
            .await?;
        let refund: Refund = read_json(response).await?;
        info!(payment_id, refund_id = %refund.id, "Stripe refund created");
        Ok(GatewayRefund {
            refund_id: refund.id,
            amount: refund.amount,
            status: refund.status.unwrap_or_else(|| "pending".to_string()),
        })
    }

    async fn fetch_status(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError> {
        let intent = self.retrieve_intent(payment_id).await?;
        Ok(intent.into_payment(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn gateway(server: &MockServer) -> StripeGateway {
        let mut config = StripeConfig::new("sk_test_123").with_base_url(server.base_url());
        config.checkout_base_url = "https://checkout.example".to_string();
        StripeGateway::new(config).unwrap()
    }

    fn intent(status: &str, latest_charge: serde_json::Value) -> serde_json::Value {
        json!({
            "id": "pi_1",
            "status": status,
            "amount": 50000,
            "currency": "inr",
            "client_secret": "pi_1_secret_abc",
            "metadata": {"order_id": "ORD42"},
            "payment_method_types": ["card", "upi"],
            "latest_charge": latest_charge
        })
    }

    #[tokio::test]
    async fn test_create_intent() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/payment_intents")
                    .header("authorization", "Bearer sk_test_123")
                    .header("idempotency-key", "paylink-ORD42")
                    .x_www_form_urlencoded_tuple("amount", "50000")
                    .x_www_form_urlencoded_tuple("currency", "inr")
                    .x_www_form_urlencoded_tuple("metadata[order_id]", "ORD42");
                then.status(200).json_body(intent("requires_payment_method", json!(null)));
            })
            .await;

        let link = gateway(&server)
            .create_collection_link(&CollectionRequest {
                order_id: "ORD42".to_string(),
                amount: Amount::new(50000).unwrap(),
                currency: "INR".to_string(),
                phone: "+911234567890".to_string(),
                email: "a@b.com".to_string(),
            })
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(link.link_id, "pi_1");
        assert_eq!(link.link_url, "https://checkout.example/pay/pi_1_secret_abc");
    }

    #[tokio::test]
    async fn test_fetch_payment_and_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/payment_intents/pi_1");
                then.status(200).json_body(intent("succeeded", json!("ch_1")));
            })
            .await;

        let gw = gateway(&server);
        let payment = gw
            .fetch_payment(&PaymentRef::Link("pi_1".into()))
            .await
            .unwrap();
        assert_eq!(payment.payment_id.as_deref(), Some("pi_1"));
        assert_eq!(payment.status, "succeeded");
        assert_eq!(payment.order_id.as_deref(), Some("ORD42"));
        assert!(payment.method.is_none());

        let status = gw.fetch_status("pi_1").await.unwrap();
        assert_eq!(status.method.as_deref(), Some("card"));
    }

    #[tokio::test]
    async fn test_refund_requires_a_charge() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/payment_intents/pi_1");
                then.status(200).json_body(intent("requires_payment_method", json!(null)));
            })
            .await;
        let refund = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/refunds");
                then.status(200).json_body(json!({"id": "re_1", "amount": 1}));
            })
            .await;

        let err = gateway(&server).refund("pi_1", None).await.unwrap_err();
        assert!(matches!(err, GatewayError::ChargeNotFound(ref id) if id == "pi_1"));
        refund.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_partial_refund() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/payment_intents/pi_1");
                then.status(200).json_body(intent("succeeded", json!("ch_1")));
            })
            .await;
        let refund = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/refunds")
                    .x_www_form_urlencoded_tuple("payment_intent", "pi_1")
                    .x_www_form_urlencoded_tuple("amount", "2500");
                then.status(200)
                    .json_body(json!({"id": "re_1", "amount": 2500, "status": "succeeded"}));
            })
            .await;

        let result = gateway(&server)
            .refund("pi_1", Some(Amount::new(2500).unwrap()))
            .await
            .unwrap();
        refund.assert_async().await;
        assert_eq!(result.refund_id, "re_1");
        assert_eq!(result.amount, 2500);
        assert_eq!(result.status, "succeeded");
    }

    #[tokio::test]
    async fn test_unknown_intent_surfaces_stripe_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/payment_intents/pi_missing");
                then.status(404).json_body(json!({
                    "error": {"type": "invalid_request_error", "message": "No such payment_intent: 'pi_missing'"}
                }));
            })
            .await;

        let err = gateway(&server).fetch_status("pi_missing").await.unwrap_err();
        assert!(
            err.to_string()
                .contains("No such payment_intent: 'pi_missing'")
        );
    }
}
