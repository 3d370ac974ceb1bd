//! TOML configuration loading and validation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use allocsync::{Market, PollingPolicy, Price, TimeInForce};
use allocsync_risk::ExitConfig;
use serde::Deserialize;
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// Environment variable consulted when `gateway.secret_key` is not in the file.
pub const SECRET_ENV: &str = "ALLOCSYNC_GATEWAY_SECRET";

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub feed: FeedConfig,
    pub gateway: GatewayConfig,
    pub account: AccountConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub exits: ExitConfig,
    #[serde(default)]
    pub orders: OrdersConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub base_url: String,
    pub api_key: String,
    /// Falls back to the `ALLOCSYNC_GATEWAY_SECRET` environment variable.
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    /// Notional balance in dollars that ratios are sized against.
    pub balance: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    #[serde(default)]
    pub market: Market,
    #[serde(default = "default_poll_interval")]
    pub interval_secs: u64,
    #[serde(default = "default_off_hours")]
    pub off_hours_interval_secs: u64,
}

fn default_poll_interval() -> u64 {
    60
}
fn default_off_hours() -> u64 {
    3600
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            market: Market::default(),
            interval_secs: default_poll_interval(),
            off_hours_interval_secs: default_off_hours(),
        }
    }
}

/// Order price style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStyle {
    /// Limit at the resolved quote.
    Limit,
    Market,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrdersConfig {
    #[serde(default = "default_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
    #[serde(default = "default_style")]
    pub order_type: OrderStyle,
    #[serde(default)]
    pub time_in_force: TimeInForce,
}

fn default_attempts() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    5
}
fn default_style() -> OrderStyle {
    OrderStyle::Limit
}

impl Default for OrdersConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_attempts(),
            retry_delay_secs: default_retry_delay(),
            order_type: default_style(),
            time_in_force: TimeInForce::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotifyConfig {
    /// POST target for notifications; log-only when absent.
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_baseline_file")]
    pub baseline_file: String,
    #[serde(default = "default_audit_file")]
    pub audit_file: String,
}

fn default_baseline_file() -> String {
    "./data/baseline.json".into()
}
fn default_audit_file() -> String {
    "./logs/audit.jsonl".into()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            baseline_file: default_baseline_file(),
            audit_file: default_audit_file(),
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&contents)
    }

    /// Parse and validate a TOML document.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    fn validate(&self) -> Result<()> {
        if self.feed.url.trim().is_empty() {
            return Err(Error::Config("feed.url must not be empty".into()));
        }
        if self.feed.timeout_secs == 0 {
            return Err(Error::Config("feed.timeout_secs must be > 0".into()));
        }
        if self.gateway.base_url.trim().is_empty() {
            return Err(Error::Config("gateway.base_url must not be empty".into()));
        }
        if !self.account.balance.is_finite() || self.account.balance <= 0.0 {
            return Err(Error::Config("account.balance must be > 0".into()));
        }
        if self.polling.interval_secs == 0 || self.polling.off_hours_interval_secs == 0 {
            return Err(Error::Config("polling intervals must be > 0".into()));
        }
        if self.orders.max_attempts == 0 {
            return Err(Error::Config("orders.max_attempts must be >= 1".into()));
        }
        if let Some(url) = &self.notify.webhook_url
            && url.trim().is_empty()
        {
            return Err(Error::Config("notify.webhook_url must not be empty".into()));
        }
        self.exits
            .validate()
            .map_err(|msg| Error::Config(format!("exits: {msg}")))?;
        Ok(())
    }

    /// Notional balance in cents.
    pub fn balance(&self) -> Price {
        Price::from_dollars(self.account.balance)
    }

    /// Polling cadence for the configured market.
    pub fn polling_policy(&self) -> PollingPolicy {
        PollingPolicy::new(
            self.polling.market,
            Duration::from_secs(self.polling.interval_secs),
        )
        .with_off_hours(Duration::from_secs(self.polling.off_hours_interval_secs))
    }

    /// Gateway secret from the file, else from the environment.
    pub fn gateway_secret(&self) -> Result<Zeroizing<String>> {
        resolve_secret(
            self.gateway.secret_key.as_deref(),
            std::env::var(SECRET_ENV).ok(),
        )
        .ok_or_else(|| {
            Error::Config(format!(
                "gateway.secret_key not set and {SECRET_ENV} is not in the environment"
            ))
        })
    }

    pub fn baseline_path(&self) -> PathBuf {
        PathBuf::from(&self.storage.baseline_file)
    }

    pub fn audit_path(&self) -> PathBuf {
        PathBuf::from(&self.storage.audit_file)
    }
}

/// The file value wins over the environment; empty values count as unset.
fn resolve_secret(file: Option<&str>, env: Option<String>) -> Option<Zeroizing<String>> {
    file.filter(|s| !s.is_empty())
        .map(|s| Zeroizing::new(s.to_string()))
        .or_else(|| env.filter(|s| !s.is_empty()).map(Zeroizing::new))
}
