use crate::domain::payment::GatewayType;
use crate::domain::ports::GatewayHandle;
use crate::error::{PaymentError, Result};
use std::collections::HashMap;

/// Resolves a gateway token to an adapter.
///
/// This is the only place that branches on which provider is in play. An
/// absent or blank token falls back to the default adapter; a token that names
/// no provider is rejected.
#[derive(Clone)]
pub struct GatewaySelector {
    gateways: HashMap<GatewayType, GatewayHandle>,
    default: GatewayType,
}

impl GatewaySelector {
    pub fn new(default: GatewayType, default_gateway: GatewayHandle) -> Self {
        let mut gateways = HashMap::new();
        gateways.insert(default, default_gateway);
        Self { gateways, default }
    }

    /// Builds a selector from a set of adapters, one of which must be `default`.
    pub fn from_adapters(
        default: GatewayType,
        adapters: impl IntoIterator<Item = (GatewayType, GatewayHandle)>,
    ) -> Result<Self> {
        let gateways: HashMap<_, _> = adapters.into_iter().collect();
        if !gateways.contains_key(&default) {
            return Err(PaymentError::InvalidGateway(format!(
                "default gateway {default} is not configured"
            )));
        }
        Ok(Self { gateways, default })
    }

    pub fn with_gateway(mut self, gateway_type: GatewayType, gateway: GatewayHandle) -> Self {
        self.gateways.insert(gateway_type, gateway);
        self
    }

    pub fn default_type(&self) -> GatewayType {
        self.default
    }

    /// Resolves a caller-supplied token (case-insensitive).
    pub fn resolve(&self, token: Option<&str>) -> Result<(GatewayType, GatewayHandle)> {
        let gateway_type = match token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(token) => token.parse::<GatewayType>()?,
            None => self.default,
        };
        Ok((gateway_type, self.for_type(gateway_type)?))
    }

    /// Adapter for a gateway type stored on a record.
    pub fn for_type(&self, gateway_type: GatewayType) -> Result<GatewayHandle> {
        self.gateways.get(&gateway_type).cloned().ok_or_else(|| {
            PaymentError::InvalidGateway(format!("{gateway_type} is not configured"))
        })
    }

    pub fn default_gateway(&self) -> Result<GatewayHandle> {
        self.for_type(self.default)
    }
}
