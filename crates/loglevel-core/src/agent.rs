//! Derives the advertised agent URL from a JVM's startup arguments.
//!
//! The HTTP management agent is attached with
//! `-javaagent:<jar>=key=value,key=value`. Only the options that shape the
//! listening URL are interpreted; everything else is ignored.

const JAVAAGENT_PREFIX: &str = "-javaagent:";
const DEFAULT_PROTOCOL: &str = "http";
const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 8778;
const DEFAULT_CONTEXT: &str = "/jolokia/";
const LOOPBACK: &str = "127.0.0.1";

/// Listening coordinates of an attached agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentOptions {
    protocol: String,
    host: String,
    port: u16,
    context: String,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            protocol: DEFAULT_PROTOCOL.to_owned(),
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            context: DEFAULT_CONTEXT.to_owned(),
        }
    }
}

impl AgentOptions {
    /// Parses the comma-separated option string that follows the agent jar.
    #[must_use]
    pub fn parse(options: &str) -> Self {
        let mut parsed = Self::default();
        for (key, value) in options
            .split(',')
            .filter_map(|pair| pair.split_once('='))
            .map(|(key, value)| (key.trim(), value.trim()))
        {
            match key {
                "protocol" if matches!(value, "http" | "https") => {
                    value.clone_into(&mut parsed.protocol);
                }
                "host" if !value.is_empty() => parsed.host = connectable_host(value),
                "port" => {
                    if let Ok(port) = value.parse() {
                        parsed.port = port;
                    }
                }
                "agentContext" if !value.is_empty() => parsed.context = normalise_context(value),
                _ => {}
            }
        }
        parsed
    }

    /// Absolute URL requests are posted to.
    #[must_use]
    pub fn url(&self) -> String {
        format!(
            "{}://{}:{}{}",
            self.protocol, self.host, self.port, self.context
        )
    }
}

/// Finds the agent attached with a jar whose path contains `marker` and
/// returns its URL.
#[must_use]
pub fn agent_url_from_jvm_args(jvm_args: &str, marker: &str) -> Option<String> {
    let marker = marker.to_ascii_lowercase();
    jvm_options(jvm_args)
        .filter_map(|token| token.strip_prefix(JAVAAGENT_PREFIX))
        .map(|spec| spec.split_once('=').unwrap_or((spec, "")))
        .find(|(jar, _)| jar.to_ascii_lowercase().contains(&marker))
        .map(|(_, options)| AgentOptions::parse(options).url())
}

/// Splits the argument string into options. A new option starts only where
/// whitespace is followed by `-`, so paths containing spaces stay whole.
fn jvm_options(jvm_args: &str) -> impl Iterator<Item = &str> {
    let mut rest = jvm_args.trim_start();
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let end = rest
            .char_indices()
            .find(|&(index, character)| {
                character.is_whitespace() && rest[index..].trim_start().starts_with('-')
            })
            .map_or(rest.len(), |(index, _)| index);
        let (option, tail) = rest.split_at(end);
        rest = tail.trim_start();
        Some(option.trim_end())
    })
}

fn connectable_host(host: &str) -> String {
    match host {
        "*" | "0.0.0.0" => LOOPBACK.to_owned(),
        "::" | "[::]" => String::from("[::1]"),
        literal if literal.contains(':') && !literal.starts_with('[') => format!("[{literal}]"),
        other => other.to_owned(),
    }
}

fn normalise_context(context: &str) -> String {
    let trimmed = context.trim_matches('/');
    if trimmed.is_empty() {
        String::from("/")
    } else {
        format!("/{trimmed}/")
    }
}
