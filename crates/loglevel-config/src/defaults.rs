use std::env;

use camino::Utf8PathBuf;

/// Diagnostics stay quiet unless something needs the operator's attention.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Jar-path fragment identifying the HTTP management agent on a JVM command line.
pub const DEFAULT_AGENT_MARKER: &str = "jolokia";

/// Connect and read timeout applied to management requests.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

/// Name the tool uses to recognise (and hide) itself in process listings.
pub const DEFAULT_SELF_NAME: &str = "loglevel";

/// Registry identifier of the platform logging facility.
pub const DEFAULT_NATIVE_REGISTRY: &str = "java.util.logging:type=Logging";

/// Registry identifier of the bridged logging facility.
pub const DEFAULT_BRIDGED_REGISTRY: &str = "log4j:type=Logging";

/// Default log filter expression used by the binary.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binary.
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Compact
}

/// Owned agent marker for serde defaults.
pub fn default_agent_marker() -> String {
    DEFAULT_AGENT_MARKER.to_owned()
}

/// Timeout for serde defaults.
pub fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

/// Owned self name for serde defaults.
pub fn default_self_name() -> String {
    DEFAULT_SELF_NAME.to_owned()
}

/// Owned native registry identifier for serde defaults.
pub fn default_native_registry() -> String {
    DEFAULT_NATIVE_REGISTRY.to_owned()
}

/// Owned bridged registry identifier for serde defaults.
pub fn default_bridged_registry() -> String {
    DEFAULT_BRIDGED_REGISTRY.to_owned()
}

/// Directory holding the per-user `hsperfdata_*` directories.
///
/// JVMs write their performance data under the system temporary directory,
/// which is also where `java.io.tmpdir` points unless overridden.
pub fn default_perfdata_root() -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(env::temp_dir()).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}
