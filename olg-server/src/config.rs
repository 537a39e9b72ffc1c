use std::env;
use std::net::SocketAddr;

use olg_core::EconomyConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
    #[error("cannot bind to {0:?}")]
    Address(String),
}

/// Everything the server reads from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub economy: EconomyConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
            economy: EconomyConfig::default(),
        }
    }
}

impl ServerConfig {
    /// `OLG_HOST`, `PORT`, `DEFAULT_INTEREST_RATE`, `DEFAULT_BORROWING_LIMIT`
    /// and `OLG_SEED`; anything unset keeps its default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(host) = lookup("OLG_HOST").filter(|h| !h.trim().is_empty()) {
            config.host = host;
        }
        if let Some(port) = parse(&lookup, "PORT", "a port number")? {
            config.port = port;
        }
        if let Some(rate) = parse::<f64>(&lookup, "DEFAULT_INTEREST_RATE", "a number")? {
            config.economy.initial_interest_rate = rate;
        }
        if let Some(limit) = parse::<f64>(&lookup, "DEFAULT_BORROWING_LIMIT", "a number")? {
            if limit < 0.0 {
                return Err(ConfigError::Invalid {
                    var: "DEFAULT_BORROWING_LIMIT",
                    expected: "non-negative",
                    value: limit.to_string(),
                });
            }
            config.economy.policy.borrowing_limit = limit;
        }
        config.economy.seed = parse(&lookup, "OLG_SEED", "an unsigned integer")?;

        Ok(config)
    }

    pub fn addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|_| ConfigError::Address(addr))
    }
}

fn parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    expected: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                var,
                expected,
                value,
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| {
            vars.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.addr().unwrap().port(), 5001);
    }

    #[test]
    fn reads_every_variable() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("OLG_HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("DEFAULT_INTEREST_RATE", "0.05"),
            ("DEFAULT_BORROWING_LIMIT", "80"),
            ("OLG_SEED", "17"),
        ]))
        .unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.economy.initial_interest_rate, 0.05);
        assert_eq!(config.economy.policy.borrowing_limit, 80.0);
        assert_eq!(config.economy.seed, Some(17));
    }

    #[test]
    fn rejects_garbage() {
        let err = ServerConfig::from_lookup(lookup(&[("PORT", "lots")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "PORT", .. }));
        assert!(ServerConfig::from_lookup(lookup(&[("DEFAULT_BORROWING_LIMIT", "-1")])).is_err());
    }
}
