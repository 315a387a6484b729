use std::{
    env,
    error::Error as StdError,
    fmt::{Display, Formatter, Result as FmtResult},
    net::SocketAddr,
    str::FromStr,
    time::Duration,
};

const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CREATION_COOLDOWN_SECS: u64 = 15;
const DEFAULT_METRICS_ADDR: &str = "0.0.0.0:9000";

#[derive(Debug, Eq, PartialEq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ConfigError::Missing(key) => write!(f, "Expected {} in the environment", key),
            ConfigError::Invalid { key, value } => {
                write!(f, "{} holds an invalid value: {}", key, value)
            }
        }
    }
}

impl StdError for ConfigError {}

/// Everything the bot reads from its environment at startup
#[derive(Clone, Debug)]
pub struct BotConfig {
    pub discord_token: String,
    pub backend_url: String,
    pub backend_token: String,
    pub backend_timeout: Duration,
    pub creation_cooldown: Duration,
    pub metrics_addr: SocketAddr,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));

        let backend_timeout = parse_or(&lookup, "BACKEND_TIMEOUT_SECS", DEFAULT_BACKEND_TIMEOUT_SECS)?;
        let creation_cooldown =
            parse_or(&lookup, "CREATION_COOLDOWN_SECS", DEFAULT_CREATION_COOLDOWN_SECS)?;
        let metrics_addr = match lookup("METRICS_ADDR") {
            Some(value) => parse("METRICS_ADDR", value)?,
            None => parse("METRICS_ADDR", DEFAULT_METRICS_ADDR.to_string())?,
        };

        Ok(Self {
            discord_token: required("DISCORD_TOKEN")?,
            backend_url: required("BACKEND_URL")?.trim_end_matches('/').to_string(),
            backend_token: required("BACKEND_TOKEN")?,
            backend_timeout: Duration::from_secs(backend_timeout),
            creation_cooldown: Duration::from_secs(creation_cooldown),
            metrics_addr,
        })
    }
}

fn parse<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value })
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
    T: FromStr,
{
    lookup(key).map_or(Ok(default), |value| parse(key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&'static str, &str)]) -> HashMap<&'static str, String> {
        pairs.iter().map(|(k, v)| (*k, (*v).to_string())).collect()
    }

    #[test]
    fn defaults_fill_optional_keys() {
        let vars = env(&[
            ("DISCORD_TOKEN", "token"),
            ("BACKEND_URL", "https://api.example.com/"),
            ("BACKEND_TOKEN", "secret"),
        ]);
        let config = BotConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.backend_url, "https://api.example.com");
        assert_eq!(config.backend_timeout, Duration::from_secs(10));
        assert_eq!(config.creation_cooldown, Duration::from_secs(15));
        assert_eq!(config.metrics_addr.port(), 9000);
    }

    #[test]
    fn missing_and_invalid_keys_are_reported() {
        let vars = env(&[("DISCORD_TOKEN", "token"), ("BACKEND_URL", "http://localhost")]);
        let err = BotConfig::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert_eq!(err, ConfigError::Missing("BACKEND_TOKEN"));

        let vars = env(&[
            ("DISCORD_TOKEN", "token"),
            ("BACKEND_URL", "http://localhost"),
            ("BACKEND_TOKEN", "secret"),
            ("CREATION_COOLDOWN_SECS", "soon"),
        ]);
        let err = BotConfig::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "CREATION_COOLDOWN_SECS", .. }));
    }
}
