//! Server configuration.
//!
//! [`ServerConfig::default`] gives a server you can run from the repo
//! root. [`ServerConfig::from_env`] overrides any field from environment
//! variables:
//!
//! | variable          | default         | values              |
//! |-------------------|-----------------|---------------------|
//! | `HOST`            | `127.0.0.1`     | any host or IP      |
//! | `PORT`            | `8889`          | `0..=65535`         |
//! | `MAX_CONNECTIONS` | `64`            | positive integer    |
//! | `MAPS_DIR`        | `assets/maps`   | directory of `.txt` |
//! | `TRANSPORT`       | `tcp`           | `tcp`, `websocket`  |
//! | `WIRE_FORMAT`     | `text`          | `text`, `json`      |
//!
//! A variable that is set but unparsable is an error, never a silent
//! fallback to the default.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// A configuration value that could not be used.
#[derive(Debug, thiserror::Error)]
#[error("invalid {var}={value:?}: {reason}")]
pub struct ConfigError {
    /// The environment variable name.
    pub var: &'static str,
    /// The rejected value.
    pub value: String,
    /// What was expected instead.
    pub reason: String,
}

// ---------------------------------------------------------------------------
// TransportKind / WireFormat
// ---------------------------------------------------------------------------

/// Which transport the server listens with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportKind {
    /// Newline-delimited text over plain TCP (`nc`, `telnet`).
    #[default]
    Tcp,
    /// One request per WebSocket message (browsers).
    WebSocket,
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(TransportKind::Tcp),
            "websocket" | "ws" => Ok(TransportKind::WebSocket),
            _ => Err("expected `tcp` or `websocket`".into()),
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransportKind::Tcp => "tcp",
            TransportKind::WebSocket => "websocket",
        })
    }
}

/// How tokens are encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireFormat {
    /// Bare uppercase tokens.
    #[default]
    Text,
    /// Tokens as JSON strings, details as a JSON object.
    Json,
}

impl FromStr for WireFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(WireFormat::Text),
            "json" => Ok(WireFormat::Json),
            _ => Err("expected `text` or `json`".into()),
        }
    }
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WireFormat::Text => "text",
            WireFormat::Json => "json",
        })
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

/// Everything needed to start a server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host or IP to listen on.
    pub host: String,
    /// TCP port to listen on. `0` lets the OS pick.
    pub port: u16,
    /// Maximum number of live sessions. Connections beyond this are
    /// closed as soon as they are accepted.
    pub max_connections: usize,
    /// Directory holding the `*.txt` map templates.
    pub maps_dir: PathBuf,
    /// Listening transport.
    pub transport: TransportKind,
    /// Wire encoding.
    pub wire_format: WireFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8889,
            max_connections: 64,
            maps_dir: PathBuf::from("assets/maps"),
            transport: TransportKind::default(),
            wire_format: WireFormat::default(),
        }
    }
}

impl ServerConfig {
    /// `host:port`, ready for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Defaults overridden by the process environment.
    ///
    /// # Errors
    /// [`ConfigError`] for the first variable that is set but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    /// name. `from_env` is this with `std::env::var`; tests pass a map.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(host) = lookup("HOST") {
            if host.trim().is_empty() {
                return Err(ConfigError {
                    var: "HOST",
                    value: host,
                    reason: "must not be empty".into(),
                });
            }
            config.host = host;
        }
        if let Some(port) = parse_var(&lookup, "PORT")? {
            config.port = port;
        }
        if let Some(max) = parse_var::<usize>(&lookup, "MAX_CONNECTIONS")? {
            if max == 0 {
                return Err(ConfigError {
                    var: "MAX_CONNECTIONS",
                    value: max.to_string(),
                    reason: "must be at least 1".into(),
                });
            }
            config.max_connections = max;
        }
        if let Some(dir) = lookup("MAPS_DIR") {
            config.maps_dir = PathBuf::from(dir);
        }
        if let Some(transport) = parse_var(&lookup, "TRANSPORT")? {
            config.transport = transport;
        }
        if let Some(format) = parse_var(&lookup, "WIRE_FORMAT")? {
            config.wire_format = format;
        }

        Ok(config)
    }
}

/// Looks up `var` and parses it, if set.
fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let Some(value) = lookup(var) else {
        return Ok(None);
    };
    match value.trim().parse() {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => Err(ConfigError {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}
