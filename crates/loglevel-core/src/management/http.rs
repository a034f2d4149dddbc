//! HTTP transport for the JSON management-agent protocol.
//!
//! Every request is a single `POST` of a JSON object to the agent URL. The
//! agent answers with an envelope carrying a `status`; `200` carries the
//! `value`, anything else carries the remote exception type and message,
//! which [`AgentResponse::into_result`] maps onto [`ManagementError`].

use std::io;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{ConnectError, ManagementConnection, ManagementConnector, ManagementError};
use crate::CORE_TARGET;

const STATUS_OK: u16 = 200;
const MISSING_REGISTRY_SUFFIX: &str = "InstanceNotFoundException";
const REJECTED_ARGUMENT_SUFFIX: &str = "IllegalArgumentException";

/// Opens [`HttpConnection`]s with a fixed timeout.
#[derive(Debug, Clone, Copy)]
pub struct HttpConnector {
    timeout: Duration,
}

impl HttpConnector {
    /// Creates a connector applying `timeout` to connects and reads.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl ManagementConnector for HttpConnector {
    fn connect(&self, address: &str) -> Result<Box<dyn ManagementConnection>, ConnectError> {
        let url = parse_agent_url(address)?;
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(self.timeout)
            .timeout(self.timeout)
            .build();
        let connection = HttpConnection { agent, url };
        connection.handshake()?;
        Ok(Box::new(connection))
    }
}

/// Connection to one agent; dropping it releases the pooled sockets.
pub struct HttpConnection {
    agent: ureq::Agent,
    url: Url,
}

impl HttpConnection {
    /// Agent URL this connection posts to.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    fn handshake(&self) -> Result<(), ConnectError> {
        let address = self.url.to_string();
        let response = self
            .send(&AgentRequest::Version)
            .map_err(|failure| match failure {
                SendFailure::Transport {
                    unreachable: true,
                    message,
                } => ConnectError::Unreachable {
                    address: address.clone(),
                    message,
                },
                other => ConnectError::Handshake {
                    address: address.clone(),
                    message: other.to_string(),
                },
            })?;
        if response.status != STATUS_OK {
            return Err(ConnectError::Handshake {
                address,
                message: response.error.unwrap_or_else(|| format!("status {}", response.status)),
            });
        }
        debug!(target: CORE_TARGET, agent = %self.url, "agent handshake complete");
        Ok(())
    }

    fn send(&self, request: &AgentRequest<'_>) -> Result<AgentResponse, SendFailure> {
        let response = match self.agent.post(self.url.as_str()).send_json(request) {
            Ok(response) => response,
            // Agents may mirror the envelope status onto the HTTP status line;
            // the body still carries the envelope.
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(transport)) => {
                return Err(SendFailure::Transport {
                    unreachable: matches!(
                        transport.kind(),
                        ureq::ErrorKind::ConnectionFailed | ureq::ErrorKind::Dns
                    ),
                    message: transport.to_string(),
                });
            }
        };
        response
            .into_json::<AgentResponse>()
            .map_err(SendFailure::Decode)
    }
}

impl ManagementConnection for HttpConnection {
    fn get_attribute(
        &mut self,
        registry: &str,
        attribute: &str,
    ) -> Result<Value, ManagementError> {
        self.send(&AgentRequest::Read {
            mbean: registry,
            attribute,
        })?
        .into_result(registry)
    }

    fn invoke(
        &mut self,
        registry: &str,
        operation: &str,
        arguments: &[Value],
    ) -> Result<Value, ManagementError> {
        self.send(&AgentRequest::Exec {
            mbean: registry,
            operation,
            arguments,
        })?
        .into_result(registry)
    }
}

/// Validates `address` as an agent URL.
pub fn parse_agent_url(address: &str) -> Result<Url, ConnectError> {
    let invalid = |reason: String| ConnectError::InvalidAddress {
        address: address.to_owned(),
        reason,
    };
    let url = Url::parse(address).map_err(|error| invalid(error.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid(String::from("missing host")));
    }
    Ok(url)
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum AgentRequest<'a> {
    Version,
    Read {
        mbean: &'a str,
        attribute: &'a str,
    },
    Exec {
        mbean: &'a str,
        operation: &'a str,
        arguments: &'a [Value],
    },
}

#[derive(Debug, Deserialize)]
struct AgentResponse {
    status: u16,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    error_type: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl AgentResponse {
    fn into_result(self, registry: &str) -> Result<Value, ManagementError> {
        if self.status == STATUS_OK {
            return Ok(self.value);
        }
        let error_type = self.error_type.unwrap_or_default();
        let message = self
            .error
            .unwrap_or_else(|| format!("agent returned status {}", self.status));
        if error_type.ends_with(MISSING_REGISTRY_SUFFIX) {
            Err(ManagementError::RegistryMissing {
                registry: registry.to_owned(),
            })
        } else if error_type.ends_with(REJECTED_ARGUMENT_SUFFIX) {
            Err(ManagementError::Rejected {
                message: strip_exception_prefix(&message, &error_type),
            })
        } else {
            Err(ManagementError::Remote {
                error_type,
                message,
            })
        }
    }
}

/// Agents prefix messages with the exception class; operators only need the text.
fn strip_exception_prefix(message: &str, error_type: &str) -> String {
    message
        .strip_prefix(error_type)
        .map(|rest| rest.trim_start().trim_start_matches(':').trim())
        .unwrap_or(message)
        .to_owned()
}

#[derive(Debug, thiserror::Error)]
enum SendFailure {
    #[error("{message}")]
    Transport { unreachable: bool, message: String },
    #[error("failed to decode agent response: {0}")]
    Decode(io::Error),
}

impl From<SendFailure> for ManagementError {
    fn from(failure: SendFailure) -> Self {
        match failure {
            SendFailure::Transport { message, .. } => Self::Transport { message },
            SendFailure::Decode(error) => Self::Protocol {
                message: error.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeAgent, FakeRegistry, FakeTarget, NATIVE_REGISTRY};
    use rstest::rstest;
    use serde_json::json;
    use std::net::TcpListener;

    fn target() -> FakeTarget {
        FakeTarget::new().with_registry(
            FakeRegistry::native(NATIVE_REGISTRY)
                .logger("", Some("INFO"), "")
                .logger("com.app.Worker", Some("FINE"), ""),
        )
    }

    fn connect(agent: &FakeAgent) -> Box<dyn ManagementConnection> {
        HttpConnector::new(Duration::from_secs(2))
            .connect(&agent.url())
            .expect("connect to fake agent")
    }

    #[test]
    fn reads_attribute_through_agent() {
        let agent = FakeAgent::spawn(target()).expect("spawn agent");
        let mut connection = connect(&agent);

        let names = connection
            .get_attribute(NATIVE_REGISTRY, "LoggerNames")
            .expect("read logger names");

        assert_eq!(names, json!(["", "com.app.Worker"]));
        let requests = agent.requests();
        assert_eq!(requests.first(), Some(&json!({"type": "version"})));
        assert_eq!(
            requests.get(1),
            Some(&json!({
                "type": "read",
                "mbean": NATIVE_REGISTRY,
                "attribute": "LoggerNames"
            }))
        );
    }

    #[test]
    fn invokes_operation_with_null_argument() {
        let agent = FakeAgent::spawn(target()).expect("spawn agent");
        let mut connection = connect(&agent);

        connection
            .invoke(
                NATIVE_REGISTRY,
                "setLoggerLevel",
                &[json!("com.app.Worker"), Value::Null],
            )
            .expect("clear level");
        let level = connection
            .invoke(NATIVE_REGISTRY, "getLoggerLevel", &[json!("com.app.Worker")])
            .expect("read level");

        assert_eq!(level, json!(""));
        assert!(agent.requests().contains(&json!({
            "type": "exec",
            "mbean": NATIVE_REGISTRY,
            "operation": "setLoggerLevel",
            "arguments": ["com.app.Worker", null]
        })));
    }

    #[test]
    fn missing_registry_maps_to_registry_missing() {
        let agent = FakeAgent::spawn(target()).expect("spawn agent");
        let mut connection = connect(&agent);
        let error = connection
            .get_attribute("log4j:type=Logging", "LoggerNames")
            .unwrap_err();
        assert_eq!(
            error,
            ManagementError::RegistryMissing {
                registry: String::from("log4j:type=Logging")
            }
        );
    }

    #[test]
    fn illegal_argument_maps_to_rejected_without_class_prefix() {
        let agent = FakeAgent::spawn(target()).expect("spawn agent");
        let mut connection = connect(&agent);
        let error = connection
            .invoke(
                NATIVE_REGISTRY,
                "setLoggerLevel",
                &[json!("com.app.Worker"), json!("LOUD")],
            )
            .unwrap_err();
        assert_eq!(
            error,
            ManagementError::Rejected {
                message: String::from("Bad level \"LOUD\"")
            }
        );
    }

    #[test]
    fn refused_connection_is_unreachable() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind probe port");
        let port = listener.local_addr().expect("local addr").port();
        drop(listener);

        let error = HttpConnector::new(Duration::from_millis(500))
            .connect(&format!("http://127.0.0.1:{port}/jolokia/"))
            .err()
            .expect("connect must fail");
        assert!(matches!(error, ConnectError::Unreachable { .. }), "{error:?}");
    }

    #[rstest]
    #[case("not a url")]
    #[case("service:jmx:rmi:///jndi/rmi://localhost:9999/jmxrmi")]
    #[case("ftp://127.0.0.1/jolokia")]
    fn rejects_non_http_addresses(#[case] address: &str) {
        let error = parse_agent_url(address).unwrap_err();
        assert!(matches!(error, ConnectError::InvalidAddress { .. }));
    }

    #[rstest]
    #[case(
        "java.lang.IllegalArgumentException : Bad level \"X\"",
        "java.lang.IllegalArgumentException",
        "Bad level \"X\""
    )]
    #[case("Bad level \"X\"", "java.lang.IllegalArgumentException", "Bad level \"X\"")]
    fn strips_exception_class_from_messages(
        #[case] message: &str,
        #[case] error_type: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(strip_exception_prefix(message, error_type), expected);
    }
}
