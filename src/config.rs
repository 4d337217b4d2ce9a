use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

/// Runtime configuration for the engine.
///
/// Deserializable so a host can load it from its own config file; `Default`
/// carries the production values used by the original platform.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Shared secret the gateway echoes back in the webhook signature header.
    pub webhook_secret: String,
    /// ISO currency code stamped on new wallets and outbound transfers.
    pub currency_code: String,
    /// Smallest withdrawal amount accepted from a user.
    pub min_withdrawal: Decimal,
    /// Seconds a pending task performance may sit before it times out.
    pub performance_timeout_secs: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            webhook_secret: String::new(),
            currency_code: "NGN".to_string(),
            min_withdrawal: dec!(1000),
            performance_timeout_secs: 3600,
        }
    }
}

impl EngineConfig {
    pub fn performance_timeout(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.performance_timeout_secs)
    }
}
