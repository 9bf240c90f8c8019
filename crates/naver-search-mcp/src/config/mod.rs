//! Configuration loading and resolution.
//!
//! Every setting resolves as CLI flag, then environment variable, then default.

use std::time::Duration;

use naver_search::Credentials;

use crate::types::{McpError, McpResult};

pub const PORT_ENV: &str = "PORT";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Fully resolved settings for `serve`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub credentials: Credentials,
    pub idle_timeout: Option<Duration>,
}

impl ServerConfig {
    pub fn resolve(
        host: Option<String>,
        port: Option<u16>,
        client_id: Option<String>,
        client_secret: Option<String>,
        idle_timeout_secs: Option<u64>,
    ) -> McpResult<Self> {
        Ok(Self {
            host: resolve_host(host),
            port: resolve_port(port)?,
            credentials: resolve_credentials(client_id, client_secret)?,
            idle_timeout: resolve_idle_timeout(idle_timeout_secs),
        })
    }

    /// `host:port`, bracketing IPv6 literals.
    pub fn bind_addr(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

pub fn resolve_host(explicit: Option<String>) -> String {
    explicit
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_HOST.to_string())
}

/// Resolve the listen port.
pub fn resolve_port(explicit: Option<u16>) -> McpResult<u16> {
    if let Some(port) = explicit {
        return Ok(port);
    }
    port_from_env(std::env::var(PORT_ENV).ok())
}

fn port_from_env(value: Option<String>) -> McpResult<u16> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(DEFAULT_PORT),
        Some(raw) => raw
            .parse()
            .map_err(|_| McpError::Config(format!("{PORT_ENV} must be a port number, got {raw:?}"))),
    }
}

/// Credentials are required; their absence is a configuration error.
pub fn resolve_credentials(
    client_id: Option<String>,
    client_secret: Option<String>,
) -> McpResult<Credentials> {
    Credentials::resolve(client_id, client_secret).map_err(|e| McpError::Config(e.to_string()))
}

/// Zero or unset disables idle reaping.
pub fn resolve_idle_timeout(secs: Option<u64>) -> Option<Duration> {
    secs.filter(|s| *s > 0).map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_port_wins() {
        assert_eq!(resolve_port(Some(9999)).unwrap(), 9999);
    }

    #[test]
    fn test_port_from_env_value() {
        assert_eq!(port_from_env(None).unwrap(), DEFAULT_PORT);
        assert_eq!(port_from_env(Some(" ".into())).unwrap(), DEFAULT_PORT);
        assert_eq!(port_from_env(Some("3000".into())).unwrap(), 3000);
        assert!(matches!(
            port_from_env(Some("http".into())),
            Err(McpError::Config(_))
        ));
    }

    #[test]
    fn test_host_default() {
        assert_eq!(resolve_host(None), DEFAULT_HOST);
        assert_eq!(resolve_host(Some("127.0.0.1".into())), "127.0.0.1");
    }

    #[test]
    fn test_idle_timeout_off_by_default() {
        assert_eq!(resolve_idle_timeout(None), None);
        assert_eq!(resolve_idle_timeout(Some(0)), None);
        assert_eq!(resolve_idle_timeout(Some(90)), Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_bind_addr() {
        let mut config = ServerConfig {
            host: "0.0.0.0".into(),
            port: 8080,
            credentials: Credentials::new("id", "secret"),
            idle_timeout: None,
        };
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
        config.host = "::1".into();
        assert_eq!(config.bind_addr(), "[::1]:8080");
    }
}
