//! Raw, layered settings structs and their loading logic.
//!
//! Settings are loaded from multiple sources in order of precedence:
//! 1. Built-in defaults (lowest)
//! 2. `config/default.toml` (optional)
//! 3. `config/{environment}.toml` (optional)
//! 4. Environment variables, prefixed `SENTINEL__`
//! 5. An explicit `--config` file, if given
//! 6. Per-field CLI flags (`--threshold-eth`, `--watch-list`) (highest)
//!
//! `--endpoint` is layered separately after loading: it prepends to whatever
//! endpoint list the file/env layers produced, rather than replacing a key.
//!
//! `Settings` is the raw, unvalidated shape. [`crate::config::Config::try_from_settings`]
//! turns a validated `Settings` into the core's immutable `Config`.

use std::path::PathBuf;
use std::time::Duration;

use config::{Config as RawConfig, ConfigError, Environment, File};
use serde::Deserialize;

/// CLI-supplied overrides, applied on top of the file/env layers at the
/// highest precedence. All fields are optional; an absent field leaves the
/// file/env value untouched.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// Extra config file to layer in above `config/{environment}.toml`.
    pub config_path: Option<PathBuf>,
    /// Endpoints to prepend to whatever the file/env layers produced.
    pub endpoints: Vec<String>,
    /// Override for `threshold_eth`.
    pub threshold_eth: Option<String>,
    /// A file to load the watch-list from, replacing the file/env one.
    pub watch_list_file: Option<PathBuf>,
    /// Override for `logging.format`.
    pub log_format: Option<String>,
    /// Override for `logging.level`.
    pub log_level: Option<String>,
}

/// Root settings structure as loaded from files/env/CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// RPC endpoints, tried in order with failover.
    pub endpoints: Vec<String>,
    /// Minimum transfer value to emit, as a decimal ETH string.
    pub threshold_eth: String,
    /// Watch-listed wallets.
    pub watch_list: Vec<WatchedEntrySettings>,
    /// Pool/continuity tuning knobs.
    pub tuning: TuningSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
    /// Metrics configuration.
    pub metrics: MetricsSettings,
}

impl Settings {
    /// Load settings from configuration files and environment variables,
    /// then layer `overrides` on top at the highest precedence.
    ///
    /// # Errors
    /// Returns `ConfigError` if configuration cannot be loaded or parsed.
    pub fn load(environment: &str, overrides: &CliOverrides) -> Result<Self, ConfigError> {
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".into());

        let mut builder = RawConfig::builder()
            .set_default("endpoints", Vec::<String>::new())?
            .set_default("threshold_eth", "100")?
            .set_default("watch_list", Vec::<String>::new())?
            .set_default("tuning.base_delay_ms", 5000)?
            .set_default("tuning.max_cooldown_ms", 300_000)?
            .set_default("tuning.health_check_interval_ms", 60_000)?
            .set_default("tuning.request_timeout_ms", 10_000)?
            .set_default("tuning.dedup_retention_ms", 900_000)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .set_default("metrics.enabled", false)?
            .set_default("metrics.host", "0.0.0.0")?
            .set_default("metrics.port", 9090)?
            .add_source(File::with_name(&format!("{config_dir}/default")).required(false))
            .add_source(File::with_name(&format!("{config_dir}/{environment}")).required(false))
            .add_source(
                Environment::with_prefix("SENTINEL")
                    .separator("__")
                    .try_parsing(true),
            );

        if let Some(path) = &overrides.config_path {
            builder = builder.add_source(File::from(path.as_path()));
        }
        if let Some(file) = &overrides.watch_list_file {
            builder = builder.add_source(File::from(file.as_path()));
        }
        if let Some(threshold) = &overrides.threshold_eth {
            builder = builder.set_override("threshold_eth", threshold.clone())?;
        }
        if let Some(format) = &overrides.log_format {
            builder = builder.set_override("logging.format", format.clone())?;
        }
        if let Some(level) = &overrides.log_level {
            builder = builder.set_override("logging.level", level.clone())?;
        }

        let mut settings: Self = builder.build()?.try_deserialize()?;

        if !overrides.endpoints.is_empty() {
            let mut endpoints = overrides.endpoints.clone();
            endpoints.append(&mut settings.endpoints);
            settings.endpoints = endpoints;
        }

        Ok(settings)
    }

    /// Validate settings and return any validation errors.
    ///
    /// # Errors
    /// Returns a list of validation error messages; all checks run before
    /// returning so an operator sees every problem in one pass.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.endpoints.is_empty() {
            errors.push("endpoints cannot be empty".into());
        }
        for endpoint in &self.endpoints {
            if !(endpoint.starts_with("ws://") || endpoint.starts_with("wss://")) {
                errors.push(format!("endpoint {endpoint} must use ws:// or wss://"));
            }
        }

        if self.threshold_eth.parse::<f64>().is_err() {
            errors.push(format!(
                "threshold_eth {} does not look like a decimal number",
                self.threshold_eth
            ));
        }

        for entry in &self.watch_list {
            if entry.address.trim().is_empty() {
                errors.push(format!("watch_list entry {} has an empty address", entry.label));
            }
        }

        if self.tuning.request_timeout_ms == 0 {
            errors.push("tuning.request_timeout_ms must be non-zero".into());
        }
        if self.tuning.health_check_interval_ms == 0 {
            errors.push("tuning.health_check_interval_ms must be non-zero".into());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// One watch-list entry as loaded from config (not yet validated as an address).
#[derive(Debug, Clone, Deserialize)]
pub struct WatchedEntrySettings {
    /// Operator-facing label.
    pub label: String,
    /// Chain address, hex string.
    pub address: String,
}

/// Pool/continuity tuning knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct TuningSettings {
    /// Base backoff delay in milliseconds.
    pub base_delay_ms: u64,
    /// Maximum backoff cooldown in milliseconds.
    pub max_cooldown_ms: u64,
    /// Background health-probe interval in milliseconds.
    pub health_check_interval_ms: u64,
    /// Per-RPC-call timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Dedup-set TTL eviction window in milliseconds.
    pub dedup_retention_ms: u64,
}

impl TuningSettings {
    /// Get the base delay as a `Duration`.
    #[must_use]
    pub const fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Get the max cooldown as a `Duration`.
    #[must_use]
    pub const fn max_cooldown(&self) -> Duration {
        Duration::from_millis(self.max_cooldown_ms)
    }

    /// Get the health-check interval as a `Duration`.
    #[must_use]
    pub const fn health_check_interval(&self) -> Duration {
        Duration::from_millis(self.health_check_interval_ms)
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Get the dedup retention window as a `Duration`.
    #[must_use]
    pub const fn dedup_retention(&self) -> Duration {
        Duration::from_millis(self.dedup_retention_ms)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
    /// Log format (pretty, json).
    pub format: String,
}

/// Metrics configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// Whether the Prometheus metrics listener is enabled.
    pub enabled: bool,
    /// Host to bind metrics server to.
    pub host: String,
    /// Port for metrics server.
    pub port: u16,
}

impl MetricsSettings {
    /// Get the metrics socket address string.
    #[must_use]
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
