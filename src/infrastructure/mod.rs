//! Concrete implementations of the domain ports: record stores and gateway
//! adapters.

mod http;
pub mod in_memory;
pub mod razorpay;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod stripe;

use crate::application::selector::GatewaySelector;
use crate::config::AppConfig;
use crate::domain::payment::GatewayType;
use crate::domain::ports::GatewayHandle;
use crate::error::Result;
use std::sync::Arc;

/// Builds every HTTP adapter from configuration and registers it with a
/// selector defaulting to `config.default_gateway`.
pub fn build_selector(config: &AppConfig) -> Result<GatewaySelector> {
    let razorpay: GatewayHandle = Arc::new(razorpay::RazorpayGateway::new(config.razorpay.clone())?);
    let stripe: GatewayHandle = Arc::new(stripe::StripeGateway::new(config.stripe.clone())?);
    GatewaySelector::from_adapters(
        config.default_gateway,
        [(GatewayType::Razorpay, razorpay), (GatewayType::Stripe, stripe)],
    )
}
