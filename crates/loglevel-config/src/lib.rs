//! Shared configuration for the `loglevel` tool.
//!
//! Configuration is layered with `ortho_config`: built-in defaults, then a
//! TOML file (`--config-path` or `LOGLEVEL_CONFIG_PATH`), then `LOGLEVEL_*`
//! environment variables, then command-line flags. The CLI and the core
//! library both read the resolved [`Config`]; nothing here performs IO beyond
//! what the loader itself needs.

mod defaults;
mod logging;

use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_AGENT_MARKER, DEFAULT_BRIDGED_REGISTRY, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_LOG_FILTER,
    DEFAULT_NATIVE_REGISTRY, DEFAULT_SELF_NAME, default_log_filter, default_log_format,
    default_perfdata_root,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved configuration for one invocation of the tool.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "LOGLEVEL")]
pub struct Config {
    /// `tracing` filter expression applied to diagnostics.
    #[serde(default = "defaults::default_log_filter_string")]
    pub log_filter: String,
    /// Diagnostics format written to stderr.
    #[serde(default = "defaults::default_log_format")]
    pub log_format: LogFormat,
    /// Directory scanned for `hsperfdata_*` directories.
    #[serde(default)]
    pub perfdata_root: Option<Utf8PathBuf>,
    /// Substring identifying the management agent jar in JVM arguments.
    #[serde(default = "defaults::default_agent_marker")]
    pub agent_marker: String,
    /// Explicit agent URL that bypasses discovery.
    #[serde(default)]
    pub agent_url: Option<String>,
    /// Connect and read timeout for management requests, in milliseconds.
    #[serde(default = "defaults::default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Identifying name hidden from the `jobs` listing.
    #[serde(default = "defaults::default_self_name")]
    pub self_name: String,
    /// Registry identifier of the native logging facility.
    #[serde(default = "defaults::default_native_registry")]
    pub native_registry: String,
    /// Registry identifier of the bridged logging facility.
    #[serde(default = "defaults::default_bridged_registry")]
    pub bridged_registry: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: defaults::default_log_filter_string(),
            log_format: defaults::default_log_format(),
            perfdata_root: None,
            agent_marker: defaults::default_agent_marker(),
            agent_url: None,
            connect_timeout_ms: defaults::default_connect_timeout_ms(),
            self_name: defaults::default_self_name(),
            native_registry: defaults::default_native_registry(),
            bridged_registry: defaults::default_bridged_registry(),
        }
    }
}

impl Config {
    /// Filter expression for the diagnostics subscriber.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Format of diagnostics written to stderr.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Root directory holding `hsperfdata_*` directories.
    #[must_use]
    pub fn perfdata_root(&self) -> Utf8PathBuf {
        self.perfdata_root
            .clone()
            .unwrap_or_else(defaults::default_perfdata_root)
    }

    /// Agent jar marker used by address discovery.
    #[must_use]
    pub fn agent_marker(&self) -> &str {
        &self.agent_marker
    }

    /// Explicit agent URL, when one is configured.
    #[must_use]
    pub fn agent_url(&self) -> Option<&str> {
        self.agent_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Timeout applied to management requests.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Name used to hide the tool from its own process listing.
    #[must_use]
    pub fn self_name(&self) -> &str {
        &self.self_name
    }

    /// Registry identifier of the native facility.
    #[must_use]
    pub fn native_registry(&self) -> &str {
        &self.native_registry
    }

    /// Registry identifier of the bridged facility.
    #[must_use]
    pub fn bridged_registry(&self) -> &str {
        &self.bridged_registry
    }
}
