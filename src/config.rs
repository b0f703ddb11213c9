//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every field has a default, so a missing file is not an error.
//! Secrets (API credentials, the stablecoin account reference) are
//! referenced by env-var name and resolved at runtime.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub exchange: ExchangeConfig,
    pub strategy: StrategyConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ExchangeConfig {
    pub base_url: String,
    pub api_key_env: String,
    pub api_secret_env: String,
    /// Env var holding the uuid of the stablecoin account used for funding.
    pub stablecoin_account_env: String,
    pub timeout_secs: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.coinbase.com".to_string(),
            api_key_env: "API_KEY".to_string(),
            api_secret_env: "API_SECRET".to_string(),
            stablecoin_account_env: "USDC_WALLET_ID".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Trading parameters for one allocate-buy-sell pass.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StrategyConfig {
    /// Quote currency; also the suffix a product id must end with.
    pub quote_currency: String,
    /// Minimum 24h change (percent) a product must strictly exceed.
    pub min_price_change_pct: Decimal,
    /// Fraction of the per-product share actually spent (0.98 = 2% buffer).
    pub spend_buffer: Decimal,
    /// Spend per product must strictly exceed this to be funded.
    pub min_spend: Decimal,
    /// Take-profit above the reference price (0.06 = +6%).
    pub target_profit_pct: Decimal,
    pub quote_decimals: u32,
    pub base_decimals: u32,
    pub price_decimals: u32,
    /// Unconditional wait after each market buy.
    pub settle_delay_secs: u64,
    /// Wait between products.
    pub pacing_delay_secs: u64,
    /// Log orders instead of submitting them.
    pub dry_run: bool,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            quote_currency: "USDC".to_string(),
            min_price_change_pct: dec!(3),
            spend_buffer: dec!(0.98),
            min_spend: dec!(1),
            target_profit_pct: dec!(0.06),
            quote_decimals: 2,
            base_decimals: 4,
            price_decimals: 4,
            settle_delay_secs: 5,
            pacing_delay_secs: 2,
            dry_run: false,
        }
    }
}

impl StrategyConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }

    pub fn pacing_delay(&self) -> Duration {
        Duration::from_secs(self.pacing_delay_secs)
    }

    /// Same parameters with both pauses disabled.
    pub fn without_delays(mut self) -> Self {
        self.settle_delay_secs = 0;
        self.pacing_delay_secs = 0;
        self
    }
}

/// Log output. `RUST_LOG` and `SURGE_LOG_JSON` override these at startup.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives.
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
    /// Include the module path in human-readable output.
    pub show_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "surge=info".to_string(),
            json: false,
            show_target: true,
        }
    }
}

/// API credentials resolved from the environment.
#[derive(Debug)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: SecretString,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    ///
    /// Runs before logging is set up, so it stays silent.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        let value = std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))?;
        if value.trim().is_empty() {
            anyhow::bail!("Environment variable is empty: {env_name}");
        }
        Ok(value)
    }

    pub fn credentials(&self) -> Result<Credentials> {
        Ok(Credentials {
            api_key: Self::resolve_env(&self.exchange.api_key_env)?,
            api_secret: SecretString::new(Self::resolve_env(&self.exchange.api_secret_env)?),
        })
    }

    pub fn stablecoin_account(&self) -> Result<String> {
        Self::resolve_env(&self.exchange.stablecoin_account_env)
    }
}
