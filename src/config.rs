//! Application configuration loaded from environment variables.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::ladder::plan;
use crate::monitor::MonitorSettings;
use crate::trading::clob::{configured_credentials, funder_address};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Polymarket Credentials ===
    /// Wallet private key (hex, starts with 0x). Only trading needs it.
    #[serde(default)]
    pub polymarket_private_key: String,

    /// Pre-generated CLOB API key. Derived from the wallet when unset.
    #[serde(default)]
    pub polymarket_api_key: Option<String>,

    /// API secret that goes with the key.
    #[serde(default)]
    pub polymarket_api_secret: Option<String>,

    /// API passphrase that goes with the key.
    #[serde(default)]
    pub polymarket_api_passphrase: Option<String>,

    // === Wallet Configuration ===
    /// Signature type: 0=EOA, 1=Magic.link, 2=Gnosis Safe.
    #[serde(default)]
    pub polymarket_signature_type: u8,

    /// Proxy wallet address (required for Magic.link).
    #[serde(default)]
    pub polymarket_funder: Option<String>,

    /// Chain ID (137 for Polygon mainnet).
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    // === Endpoints ===
    /// CLOB API base URL.
    #[serde(default = "default_clob_url")]
    pub polymarket_clob_url: String,

    /// Gamma markets API base URL.
    #[serde(default = "default_gamma_url")]
    pub gamma_api_url: String,

    // === Ladder Parameters ===
    /// Limit prices of the entry ladder, comma separated.
    #[serde(default = "default_ladder_prices")]
    pub ladder_prices: Vec<Decimal>,

    /// Shares per ladder step.
    #[serde(default = "default_size_per_step")]
    pub size_per_step: Decimal,

    /// Exit once position value reaches max ladder cost times this.
    #[serde(default = "default_profit_multiple")]
    pub profit_multiple: Decimal,

    /// Skip the trade when fewer minutes than this remain before close.
    #[serde(default = "default_time_threshold")]
    pub time_threshold_minutes: i64,

    /// Outcome token to trade: 0=YES/UP, 1=NO/DOWN.
    #[serde(default = "default_outcome_index")]
    pub outcome_index: usize,

    /// Limit price of the closing sell order.
    #[serde(default = "default_exit_price")]
    pub exit_price: Decimal,

    // === Monitor ===
    /// Seconds between regular monitor polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Seconds between polls while waiting for fills or book data.
    #[serde(default = "default_wait_interval")]
    pub wait_interval_secs: u64,

    /// Give up after this many consecutive failed polls (unset = never).
    #[serde(default)]
    pub max_consecutive_errors: Option<u32>,

    /// Give up after monitoring this many seconds (unset = never).
    #[serde(default)]
    pub max_monitor_secs: Option<u64>,

    // === HTTP ===
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_ms: u64,

    /// Idle connections kept per host.
    #[serde(default = "default_http_pool_size")]
    pub http_pool_size: usize,

    // === Observability ===
    /// Expose Prometheus metrics.
    #[serde(default)]
    pub metrics_enabled: bool,

    /// Prometheus listener port.
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

fn default_chain_id() -> u64 {
    137
}

fn default_clob_url() -> String {
    "https://clob.polymarket.com".to_string()
}

fn default_gamma_url() -> String {
    "https://gamma-api.polymarket.com".to_string()
}

fn default_ladder_prices() -> Vec<Decimal> {
    vec![Decimal::new(10, 2), Decimal::new(20, 2), Decimal::new(30, 2)]
}

fn default_size_per_step() -> Decimal {
    Decimal::new(10, 0) // 10 shares
}

fn default_profit_multiple() -> Decimal {
    Decimal::new(13, 1) // 1.3
}

fn default_time_threshold() -> i64 {
    13
}

fn default_outcome_index() -> usize {
    1
}

fn default_exit_price() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

fn default_poll_interval() -> u64 {
    15
}

fn default_wait_interval() -> u64 {
    10
}

fn default_http_timeout() -> u64 {
    10_000
}

fn default_http_pool_size() -> usize {
    10
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    ///
    /// Succeeds without a private key; [`Config::validate`] is what
    /// requires one before trading.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.polymarket_private_key.is_empty() {
            return Err("POLYMARKET_PRIVATE_KEY is required".to_string());
        }

        if !self.polymarket_private_key.starts_with("0x") {
            return Err("POLYMARKET_PRIVATE_KEY must start with 0x".to_string());
        }

        configured_credentials(self).map_err(|e| e.to_string())?;
        funder_address(self).map_err(|e| e.to_string())?;

        plan(&self.ladder_prices, self.size_per_step).map_err(|e| e.to_string())?;

        if self.profit_multiple <= Decimal::ZERO {
            return Err("PROFIT_MULTIPLE must be positive".to_string());
        }

        if self.exit_price <= Decimal::ZERO || self.exit_price >= Decimal::ONE {
            return Err("EXIT_PRICE must be strictly between 0 and 1".to_string());
        }

        if self.time_threshold_minutes < 0 {
            return Err("TIME_THRESHOLD_MINUTES must not be negative".to_string());
        }

        Ok(())
    }

    /// Monitor loop settings derived from this config.
    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            wait_interval: Duration::from_secs(self.wait_interval_secs),
            max_consecutive_errors: self.max_consecutive_errors,
            max_duration: self.max_monitor_secs.map(Duration::from_secs),
        }
    }

    /// Check if using Magic.link (signature_type == 1).
    pub fn is_magic_link(&self) -> bool {
        self.polymarket_signature_type == 1
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        polymarket_private_key:
            "0x0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef".to_string(),
        polymarket_api_key: None,
        polymarket_api_secret: None,
        polymarket_api_passphrase: None,
        polymarket_signature_type: 0,
        polymarket_funder: None,
        chain_id: default_chain_id(),
        polymarket_clob_url: default_clob_url(),
        gamma_api_url: default_gamma_url(),
        ladder_prices: default_ladder_prices(),
        size_per_step: default_size_per_step(),
        profit_multiple: default_profit_multiple(),
        time_threshold_minutes: default_time_threshold(),
        outcome_index: default_outcome_index(),
        exit_price: default_exit_price(),
        poll_interval_secs: default_poll_interval(),
        wait_interval_secs: default_wait_interval(),
        max_consecutive_errors: None,
        max_monitor_secs: None,
        http_timeout_ms: default_http_timeout(),
        http_pool_size: default_http_pool_size(),
        metrics_enabled: false,
        metrics_port: default_metrics_port(),
        rust_log: default_log_level(),
        verbose: false,
    }
}
