//! Server configuration.
//!
//! Base URLs of the upstream services and settings for the HTTP client and query engine.

use crate::error::{McpError, Result};

/// Default base URL of the metawarehouse (search and geoproduct catalog).
pub const DEFAULT_METAWAREHOUSE_URL: &str = "https://www.metawarehouse.apps.be.ch";

/// Default base URL of the ÖREB cadastre service.
pub const DEFAULT_OEREB_URL: &str = "https://www.oereb2.apps.be.ch";

/// Default base URL of the published Parquet geodata files.
pub const DEFAULT_GEOFILES_URL: &str = "https://geofiles.be.ch/geoportal/pub/download";

/// Default HTTP timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// DuckDB extensions loaded for every analytic query by default.
pub const DEFAULT_EXTENSIONS: &[&str] = &["spatial", "httpfs"];

/// Configuration shared by all tools.
#[derive(Debug, Clone)]
pub struct GeoportalConfig {
    /// Base URL of the metawarehouse API.
    pub metawarehouse_url: String,
    /// Base URL of the ÖREB cadastre service.
    pub oereb_url: String,
    /// Base URL (or local directory) holding the Parquet datasets.
    pub geofiles_url: String,
    /// Timeout for a single upstream HTTP request.
    pub timeout_secs: u64,
    /// User agent sent with every HTTP request.
    pub user_agent: String,
    /// DuckDB extensions installed and loaded on each query connection.
    pub extensions: Vec<String>,
}

impl Default for GeoportalConfig {
    fn default() -> Self {
        Self {
            metawarehouse_url: DEFAULT_METAWAREHOUSE_URL.to_string(),
            oereb_url: DEFAULT_OEREB_URL.to_string(),
            geofiles_url: DEFAULT_GEOFILES_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: format!("geoportal-mcp/{}", env!("CARGO_PKG_VERSION")),
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl GeoportalConfig {
    /// Check that the configuration is usable.
    ///
    /// The REST bases must be http(s) URLs; the geofiles base may also be a
    /// local directory.
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("metawarehouse_url", &self.metawarehouse_url),
            ("oereb_url", &self.oereb_url),
        ] {
            if !is_http_url(url) {
                return Err(McpError::InvalidArg {
                    name: name.to_string(),
                    reason: format!("expected an http(s) URL, got '{}'", url),
                });
            }
        }

        if self.geofiles_url.trim().is_empty() {
            return Err(McpError::InvalidArg {
                name: "geofiles_url".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        if self.timeout_secs == 0 {
            return Err(McpError::InvalidArg {
                name: "timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GeoportalConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.extensions, vec!["spatial", "httpfs"]);
    }

    #[test]
    fn test_rejects_non_http_rest_base() {
        let config = GeoportalConfig {
            oereb_url: "ftp://example.com".to_string(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("oereb_url"));
    }

    #[test]
    fn test_accepts_local_geofiles_directory() {
        let config = GeoportalConfig {
            geofiles_url: "/var/lib/geofiles".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let config = GeoportalConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
