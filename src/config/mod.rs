//! Layered configuration loading and the validated, immutable `Config` the
//! core pipeline actually runs on.
//!
//! [`Settings`] is the raw shape loaded from files/env. [`Config::try_from_settings`]
//! validates it once at startup and produces the immutable, already-parsed
//! form every other module depends on.

pub mod settings;

pub use settings::{CliOverrides, LoggingSettings, MetricsSettings, Settings, TuningSettings, WatchedEntrySettings};

use std::collections::HashMap;
use std::time::Duration;

use crate::error::ConfigError;
use crate::types::{EthAddress, WatchedWallet, WeiAmount};

/// The validated, immutable configuration the core pipeline runs on.
///
/// Built once via [`Config::try_from_settings`]; never mutated afterward.
#[derive(Debug, Clone)]
pub struct Config {
    /// RPC endpoint URLs, in failover order.
    pub endpoints: Vec<String>,
    /// Minimum transfer value that is reported.
    pub threshold: WeiAmount,
    /// Watch-listed wallets, keyed by normalized address for O(1) lookup.
    pub watched: HashMap<EthAddress, WatchedWallet>,
    /// Base backoff delay before retrying a failed endpoint.
    pub base_delay: Duration,
    /// Ceiling on the exponential backoff cooldown.
    pub max_cooldown: Duration,
    /// Interval between background health probes.
    pub health_check_interval: Duration,
    /// Per-RPC-call timeout.
    pub request_timeout: Duration,
    /// Dedup-set TTL eviction window.
    pub dedup_retention: Duration,
    /// Logging configuration, unmodified from settings.
    pub logging: LoggingSettings,
    /// Metrics configuration, unmodified from settings.
    pub metrics: MetricsSettings,
}

impl Config {
    /// Validate and convert raw `Settings` into an immutable `Config`.
    ///
    /// # Errors
    /// Returns `ConfigError` on the first structural problem (empty endpoint
    /// list, non-ws scheme, unparsable threshold, malformed or duplicate
    /// watch-list address).
    pub fn try_from_settings(settings: Settings) -> Result<Self, ConfigError> {
        if settings.endpoints.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }
        for endpoint in &settings.endpoints {
            if !(endpoint.starts_with("ws://") || endpoint.starts_with("wss://")) {
                return Err(ConfigError::InvalidEndpoint(endpoint.clone()));
            }
        }

        let threshold = WeiAmount::from_eth_str(&settings.threshold_eth)
            .map_err(|e| ConfigError::InvalidThreshold(e.to_string()))?;

        let mut watched = HashMap::with_capacity(settings.watch_list.len());
        for entry in settings.watch_list {
            let address = EthAddress::from_hex(&entry.address)
                .map_err(|e| ConfigError::InvalidWatchedAddress(entry.address.clone(), e))?;
            if watched.contains_key(&address) {
                return Err(ConfigError::DuplicateWatchedAddress(address.to_hex()));
            }
            watched.insert(address, WatchedWallet::new(entry.label, address));
        }

        Ok(Self {
            endpoints: settings.endpoints,
            threshold,
            watched,
            base_delay: settings.tuning.base_delay(),
            max_cooldown: settings.tuning.max_cooldown(),
            health_check_interval: settings.tuning.health_check_interval(),
            request_timeout: settings.tuning.request_timeout(),
            dedup_retention: settings.tuning.dedup_retention(),
            logging: settings.logging,
            metrics: settings.metrics,
        })
    }

    /// Load configuration from files/env/CLI overrides and validate it in one step.
    ///
    /// # Errors
    /// Returns `ConfigError` if loading or validation fails.
    pub fn load(environment: &str, overrides: &settings::CliOverrides) -> Result<Self, ConfigError> {
        let settings = Settings::load(environment, overrides)?;
        Self::try_from_settings(settings)
    }

    /// Look up the watched entry for an address, if any.
    #[must_use]
    pub fn lookup(&self, address: &EthAddress) -> Option<&WatchedWallet> {
        self.watched.get(address)
    }
}
