//! The fixed address the development server is reached at.

use crate::config::DevServerConfig;
use crate::error::{DevServerError, Result};
use std::fmt;
use url::Url;

/// Local address of the development server.
///
/// Built once from configuration and never derived from the child's output,
/// so it stays the same across every resolve call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    scheme: String,
    host: String,
    port: u16,
}

impl Endpoint {
    /// Create an endpoint, checking that it forms a valid URL.
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, port: u16) -> Result<Self> {
        let endpoint = Self {
            scheme: scheme.into(),
            host: host.into(),
            port,
        };
        endpoint.to_url()?;
        Ok(endpoint)
    }

    /// Endpoint described by the config's scheme, host and port.
    pub fn from_config(config: &DevServerConfig) -> Result<Self> {
        Self::new(config.scheme.clone(), config.host.clone(), config.port)
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Convert to a URL suitable as a proxy target.
    pub fn to_url(&self) -> Result<Url> {
        Url::parse(&self.to_string()).map_err(|e| {
            DevServerError::config("endpoint", format!("'{}' is not a valid URL: {}", self, e))
        })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint() {
        let endpoint = Endpoint::from_config(&DevServerConfig::default()).unwrap();

        assert_eq!(endpoint.to_string(), "http://127.0.0.1:8080");
        assert_eq!(endpoint.port(), 8080);
        assert_eq!(endpoint.host(), "127.0.0.1");
    }

    #[test]
    fn test_to_url() {
        let endpoint = Endpoint::new("http", "127.0.0.1", 5173).unwrap();
        let url = endpoint.to_url().unwrap();

        assert_eq!(url.scheme(), "http");
        assert_eq!(url.port(), Some(5173));
        assert_eq!(url.host_str(), Some("127.0.0.1"));
    }

    #[test]
    fn test_invalid_host_rejected() {
        assert!(Endpoint::new("http", "bad host", 8080).is_err());
    }
}
