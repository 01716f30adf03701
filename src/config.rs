//! Explicit configuration, injected into adapters at construction time.

use crate::domain::payment::GatewayType;
use crate::error::{PaymentError, Result};
use std::env;
use std::fmt;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_CURRENCY: &str = "INR";
pub const DEFAULT_RAZORPAY_BASE_URL: &str = "https://api.razorpay.com";
pub const DEFAULT_STRIPE_BASE_URL: &str = "https://api.stripe.com";
pub const DEFAULT_STRIPE_CHECKOUT_BASE_URL: &str = "https://checkout.stripe.com";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl RazorpayConfig {
    pub fn new(key_id: impl Into<String>, key_secret: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            key_secret: key_secret.into(),
            base_url: DEFAULT_RAZORPAY_BASE_URL.to_string(),
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl fmt::Debug for RazorpayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RazorpayConfig")
            .field("key_id", &self.key_id)
            .field("key_secret", &"***")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub base_url: String,
    pub checkout_base_url: String,
    pub timeout: Duration,
}

impl StripeConfig {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            base_url: DEFAULT_STRIPE_BASE_URL.to_string(),
            checkout_base_url: DEFAULT_STRIPE_CHECKOUT_BASE_URL.to_string(),
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"***")
            .field("base_url", &self.base_url)
            .field("checkout_base_url", &self.checkout_base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub default_gateway: GatewayType,
    pub currency: String,
    pub razorpay: RazorpayConfig,
    pub stripe: StripeConfig,
}

impl AppConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] over an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let default_gateway = match var("PAYLINK_DEFAULT_GATEWAY") {
            Some(token) => token.parse::<GatewayType>().map_err(|_| {
                PaymentError::Config(format!("PAYLINK_DEFAULT_GATEWAY is not a gateway: {token}"))
            })?,
            None => GatewayType::Razorpay,
        };
        let timeout = match var("PAYLINK_HTTP_TIMEOUT_SECS") {
            Some(secs) => Duration::from_secs(secs.parse().map_err(|_| {
                PaymentError::Config(format!("PAYLINK_HTTP_TIMEOUT_SECS is not a number: {secs}"))
            })?),
            None => DEFAULT_HTTP_TIMEOUT,
        };

        let razorpay = RazorpayConfig {
            key_id: var("RAZORPAY_KEY_ID").unwrap_or_default(),
            key_secret: var("RAZORPAY_KEY_SECRET").unwrap_or_default(),
            base_url: var("RAZORPAY_BASE_URL")
                .unwrap_or_else(|| DEFAULT_RAZORPAY_BASE_URL.to_string()),
            timeout,
        };
        if razorpay.key_id.is_empty() || razorpay.key_secret.is_empty() {
            warn!("RAZORPAY_KEY_ID / RAZORPAY_KEY_SECRET not set; Razorpay calls will be rejected");
        }

        let stripe = StripeConfig {
            secret_key: var("STRIPE_SECRET_KEY").unwrap_or_default(),
            base_url: var("STRIPE_BASE_URL").unwrap_or_else(|| DEFAULT_STRIPE_BASE_URL.to_string()),
            checkout_base_url: var("STRIPE_CHECKOUT_BASE_URL")
                .unwrap_or_else(|| DEFAULT_STRIPE_CHECKOUT_BASE_URL.to_string()),
            timeout,
        };
        if stripe.secret_key.is_empty() {
            warn!("STRIPE_SECRET_KEY not set; Stripe calls will be rejected");
        }

        Ok(Self {
            default_gateway,
            currency: var("PAYLINK_CURRENCY").unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            razorpay,
            stripe,
        })
    }
}
