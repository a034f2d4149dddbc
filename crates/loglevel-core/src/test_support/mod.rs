//! Test doubles shared by this crate's tests and the CLI's behavioural tests.
//!
//! Compiled for unit tests and behind the `test-support` feature.

mod fake_agent;
mod fake_target;
mod perfdata_image;

pub use fake_agent::FakeAgent;
pub use fake_target::{Call, FakeRegistry, FakeTarget, RecordingConnection, StaticDiscovery};
pub use perfdata_image::PerfDataImage;

/// Registry identifier used for the native facility in tests.
pub const NATIVE_REGISTRY: &str = "java.util.logging:type=Logging";
/// Registry identifier used for the bridged facility in tests.
pub const BRIDGED_REGISTRY: &str = "log4j:type=Logging";
