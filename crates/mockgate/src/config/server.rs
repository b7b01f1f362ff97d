//! Listen, metrics, and downstream configuration for the host server.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MetricsConfig {
    /// Port for the Prometheus endpoint; disabled when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub listen: ListenConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// Base URL that deferred requests are forwarded to. Without one, deferred
    /// requests receive a 404.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream: Option<String>,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if let Some(ref upstream) = self.upstream {
            let uri: hyper::Uri = upstream
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid upstream URL '{upstream}': {e}"))?;
            match uri.scheme_str() {
                Some("http") | Some("https") => {}
                _ => anyhow::bail!(
                    "Unsupported upstream URL '{}'. Currently supported schemes: http, https",
                    upstream
                ),
            }
            if uri.host().is_none() {
                anyhow::bail!("Upstream URL '{upstream}' has no host");
            }
        }
        Ok(())
    }

    /// Upstream base URL without a trailing slash.
    pub fn upstream_base(&self) -> Option<&str> {
        self.upstream.as_deref().map(|u| u.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: ServerConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.listen.host, "0.0.0.0");
        assert_eq!(config.listen.port, 8080);
        assert!(config.metrics.port.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_upstream_validation() {
        let mut config = ServerConfig {
            upstream: Some("http://localhost:3000/".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.upstream_base(), Some("http://localhost:3000"));

        config.upstream = Some("ftp://localhost".to_string());
        assert!(config.validate().is_err());

        config.upstream = Some("localhost:3000".to_string());
        assert!(config.validate().is_err());
    }
}
