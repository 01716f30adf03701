//! Helpers shared by the HTTP gateway adapters.

use crate::error::{GatewayError, PaymentError};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, PaymentError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| PaymentError::Config(format!("failed to build HTTP client: {e}")))
}

/// Decodes a successful response, or turns a provider error payload into a
/// [`GatewayError::Provider`] carrying the provider's own text.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()));
    }
    let body = response.text().await.unwrap_or_default();
    Err(GatewayError::Provider {
        status: status.as_u16(),
        message: provider_message(&body),
    })
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

// Razorpay fills `description`, Stripe fills `message`.
#[derive(Deserialize)]
struct ErrorDetail {
    description: Option<String>,
    message: Option<String>,
    code: Option<String>,
}

fn provider_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope
            .error
            .description
            .or(envelope.error.message)
            .or(envelope.error.code)
            .unwrap_or_else(|| body.trim().to_string()),
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}
