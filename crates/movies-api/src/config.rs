//! # Service Configuration
//!
//! Read once from the environment at startup.
//!
//! | Variable             | Default  | Notes                                 |
//! |----------------------|----------|---------------------------------------|
//! | `PORT`               | `8080`   |                                       |
//! | `DATABASE_URL`       | unset    | unset runs on in-memory repositories  |
//! | `DB_MAX_CONNECTIONS` | `20`     |                                       |
//! | `JWT_KEY`            | required | HS256 signing secret                  |
//! | `JWT_ISSUER`         | unset    | checked against `iss` when set        |
//! | `JWT_AUDIENCE`       | unset    | checked against `aud` when set        |
//! | `API_KEY`            | unset    | when set, `POST /movies` needs `x-api-key` |
//! | `LOG_FORMAT`         | `text`   | `json` for structured output          |

use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Token validation settings.
///
/// Custom `Debug` redacts the signing key.
#[derive(Clone, PartialEq, Eq)]
pub struct JwtConfig {
    pub key: String,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("key", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish()
    }
}

/// Process configuration. Custom `Debug` redacts secrets.
#[derive(Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub jwt: JwtConfig,
    pub api_key: Option<String>,
    pub log_format: LogFormat,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .field("db_max_connections", &self.db_max_connections)
            .field("jwt", &self.jwt)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let key = get("JWT_KEY").ok_or(ConfigError::Missing("JWT_KEY"))?;
        let log_format = match get("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "LOG_FORMAT",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            port: parse_or("PORT", get("PORT"), 8080)?,
            database_url: get("DATABASE_URL"),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), 20)?,
            jwt: JwtConfig {
                key,
                issuer: get("JWT_ISSUER"),
                audience: get("JWT_AUDIENCE"),
            },
            api_key: get("API_KEY"),
            log_format,
        })
    }
}

fn parse_or<T: FromStr>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config = AppConfig::from_lookup(lookup(&[("JWT_KEY", "secret")])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.db_max_connections, 20);
        assert!(config.database_url.is_none());
        assert!(config.api_key.is_none());
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn jwt_key_is_required() {
        let err = AppConfig::from_lookup(lookup(&[("PORT", "9000")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_KEY")));
    }

    #[test]
    fn blank_values_are_unset() {
        let config =
            AppConfig::from_lookup(lookup(&[("JWT_KEY", "k"), ("API_KEY", "  ")])).unwrap();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn bad_port_is_rejected() {
        let err =
            AppConfig::from_lookup(lookup(&[("JWT_KEY", "k"), ("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "PORT", .. }));
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = AppConfig::from_lookup(lookup(&[
            ("JWT_KEY", "super-secret"),
            ("API_KEY", "key-123"),
            ("DATABASE_URL", "postgres://user:pw@host/db"),
            ("LOG_FORMAT", "json"),
        ]))
        .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("key-123"));
        assert!(!debug.contains("pw@host"));
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
