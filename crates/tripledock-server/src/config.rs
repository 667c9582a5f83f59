//! Process configuration from the environment.

use anyhow::Context;
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_COMMENTARY_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// `SERVER_ADDR`
    pub addr: SocketAddr,
    /// `COMMENTARY_URL`; commentary is off when unset
    pub commentary_url: Option<String>,
    /// `COMMENTARY_TIMEOUT_MS`
    pub commentary_timeout: Duration,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr = lookup("SERVER_ADDR")
            .unwrap_or_else(|| DEFAULT_ADDR.into())
            .parse()
            .context("SERVER_ADDR is not a socket address")?;

        let commentary_url = lookup("COMMENTARY_URL").filter(|url| !url.trim().is_empty());

        let commentary_timeout = match lookup("COMMENTARY_TIMEOUT_MS") {
            Some(ms) => Duration::from_millis(
                ms.parse()
                    .context("COMMENTARY_TIMEOUT_MS is not a number of milliseconds")?,
            ),
            None => Duration::from_millis(DEFAULT_COMMENTARY_TIMEOUT_MS),
        };

        Ok(Self {
            addr,
            commentary_url,
            commentary_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> anyhow::Result<ServerConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.addr, DEFAULT_ADDR.parse().unwrap());
        assert_eq!(config.commentary_url, None);
        assert_eq!(config.commentary_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("SERVER_ADDR", "127.0.0.1:9000"),
            ("COMMENTARY_URL", "http://localhost:8000/comment"),
            ("COMMENTARY_TIMEOUT_MS", "250"),
        ])
        .unwrap();
        assert_eq!(config.addr.port(), 9000);
        assert_eq!(
            config.commentary_url.as_deref(),
            Some("http://localhost:8000/comment")
        );
        assert_eq!(config.commentary_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(config_from(&[("SERVER_ADDR", "nowhere")]).is_err());
        assert!(config_from(&[("COMMENTARY_TIMEOUT_MS", "soon")]).is_err());
        assert_eq!(
            config_from(&[("COMMENTARY_URL", " ")]).unwrap().commentary_url,
            None
        );
    }
}
