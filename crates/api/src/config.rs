//! Process configuration, read from the environment once at startup.

use std::net::{Ipv4Addr, SocketAddr};

use thiserror::Error;
use tracing::warn;

use gotham_auth::{SessionConfig, SigningSecret};

const DEV_SIGNING_SECRET: &str = "gotham-local-dev-secret";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
const DEFAULT_BCRYPT_COST: u32 = 12;
const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set outside the local environment")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub app_name: String,
    pub app_env: String,
    pub signing_secret: SigningSecret,
    pub port: u16,
    pub session: SessionConfig,
    pub redis_url: Option<String>,
    pub database_url: Option<String>,
    /// Password given to the seeded administrator of the in-memory store.
    pub admin_password: String,
    pub bcrypt_cost: u32,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let app_name = get("APP_NAME").unwrap_or_else(|| "Gotham".to_string());
        let app_env = get("APP_ENV").unwrap_or_else(|| "local".to_string());
        let local = app_env == "local";

        let secret = match get("APP_KEY") {
            Some(key) => key,
            None if local => {
                warn!("APP_KEY not set; using insecure dev default");
                DEV_SIGNING_SECRET.to_string()
            }
            None => return Err(ConfigError::Missing("APP_KEY")),
        };
        let signing_secret = SigningSecret::new(secret).map_err(|e| ConfigError::Invalid {
            name: "APP_KEY",
            reason: e.to_string(),
        })?;

        let port = parse_or("APP_PORT", get("APP_PORT"), 8000u16)?;

        let ttl_secs = parse_or("TOKEN_TTL_SECS", get("TOKEN_TTL_SECS"), 86_400i64)?;
        if !(1..=MAX_TOKEN_TTL_SECS).contains(&ttl_secs) {
            return Err(ConfigError::Invalid {
                name: "TOKEN_TTL_SECS",
                reason: format!("must be between 1 and {MAX_TOKEN_TTL_SECS}"),
            });
        }

        let admin_password = match get("ADMIN_PASSWORD") {
            Some(p) => p,
            None => {
                if !local {
                    warn!("ADMIN_PASSWORD not set; seeded administrator uses the default password");
                }
                DEFAULT_ADMIN_PASSWORD.to_string()
            }
        };

        let bcrypt_cost = parse_or("BCRYPT_COST", get("BCRYPT_COST"), DEFAULT_BCRYPT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                name: "BCRYPT_COST",
                reason: "must be between 4 and 31".to_string(),
            });
        }

        Ok(Self {
            app_name,
            app_env,
            signing_secret,
            port,
            session: SessionConfig::with_lifetime(chrono::Duration::seconds(ttl_secs)),
            redis_url: get("REDIS_URL"),
            database_url: get("DATABASE_URL"),
            admin_password,
            bcrypt_cost,
        })
    }

    pub fn is_local(&self) -> bool {
        self.app_env == "local"
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}

fn parse_or<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_apply_in_local_environment() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.app_name, "Gotham");
        assert!(cfg.is_local());
        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.session.lifetime, chrono::Duration::hours(24));
        assert_eq!(cfg.redis_url, None);
        assert_eq!(cfg.database_url, None);
        assert_eq!(cfg.bind_addr().port(), 8000);
    }

    #[test]
    fn signing_secret_is_required_outside_local() {
        assert_eq!(
            config(&[("APP_ENV", "production")]).unwrap_err(),
            ConfigError::Missing("APP_KEY")
        );
        assert_eq!(
            config(&[("APP_ENV", "production"), ("APP_KEY", "  ")]).unwrap_err(),
            ConfigError::Missing("APP_KEY")
        );
        assert!(config(&[("APP_ENV", "production"), ("APP_KEY", "s3cret")]).is_ok());
    }

    #[test]
    fn numeric_values_are_validated() {
        let cfg = config(&[("APP_PORT", "9001"), ("TOKEN_TTL_SECS", "60")]).unwrap();
        assert_eq!(cfg.port, 9001);
        assert_eq!(cfg.session.lifetime, chrono::Duration::seconds(60));

        for (name, value) in [
            ("APP_PORT", "eighty"),
            ("APP_PORT", "70000"),
            ("TOKEN_TTL_SECS", "0"),
            ("TOKEN_TTL_SECS", "-5"),
            ("TOKEN_TTL_SECS", "31536001"),
            ("TOKEN_TTL_SECS", "10000000000000"),
            ("TOKEN_TTL_SECS", "9223372036854775807"),
            ("BCRYPT_COST", "2"),
        ] {
            assert!(
                matches!(config(&[(name, value)]), Err(ConfigError::Invalid { .. })),
                "{name}={value}"
            );
        }
    }

    #[test]
    fn token_lifetime_of_one_year_is_the_upper_bound() {
        let cfg = config(&[("TOKEN_TTL_SECS", "31536000")]).unwrap();
        assert_eq!(cfg.session.lifetime, chrono::Duration::days(365));
    }

    #[test]
    fn backend_urls_are_optional() {
        let cfg = config(&[
            ("REDIS_URL", "redis://localhost:6379"),
            ("DATABASE_URL", ""),
        ])
        .unwrap();
        assert_eq!(cfg.redis_url.as_deref(), Some("redis://localhost:6379"));
        assert_eq!(cfg.database_url, None);
    }
}
