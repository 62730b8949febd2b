//! Process configuration from environment variables (optionally seeded from `.env`).

use crate::error::ConfigError;
use regex::Regex;
use std::net::SocketAddr;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/oficina";
const DEFAULT_SCHEMA: &str = "public";
const DEFAULT_LISTEN: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

#[derive(Clone, Debug)]
pub struct ShopConfig {
    pub database_url: String,
    /// Schema holding the shop tables. Must be a plain PostgreSQL identifier.
    pub schema: String,
    pub listen_addr: SocketAddr,
    pub max_connections: u32,
    pub body_limit_bytes: usize,
}

impl ShopConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!("ignoring unreadable .env: {}", e);
            }
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup (the environment in production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into());
        if database_url.trim().is_empty() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let schema = lookup("OFICINA_SCHEMA").unwrap_or_else(|| DEFAULT_SCHEMA.into());
        if !is_identifier(&schema) {
            return Err(ConfigError::Invalid {
                name: "OFICINA_SCHEMA",
                value: schema,
            });
        }

        let listen = lookup("OFICINA_LISTEN").unwrap_or_else(|| DEFAULT_LISTEN.into());
        let listen_addr = listen.parse().map_err(|_| ConfigError::Invalid {
            name: "OFICINA_LISTEN",
            value: listen.clone(),
        })?;

        let max_connections = match lookup("OFICINA_MAX_CONNECTIONS") {
            Some(v) => match v.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "OFICINA_MAX_CONNECTIONS",
                        value: v,
                    })
                }
            },
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let body_limit_bytes = match lookup("OFICINA_BODY_LIMIT") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                name: "OFICINA_BODY_LIMIT",
                value: v.clone(),
            })?,
            None => DEFAULT_BODY_LIMIT,
        };

        Ok(ShopConfig {
            database_url,
            schema,
            listen_addr,
            max_connections,
            body_limit_bytes,
        })
    }
}

fn is_identifier(s: &str) -> bool {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$")
        .map(|re| re.is_match(s))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<ShopConfig, ConfigError> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ShopConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = from_pairs(&[]).expect("defaults");
        assert_eq!(cfg.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(cfg.schema, "public");
        assert_eq!(cfg.listen_addr.port(), 3000);
        assert_eq!(cfg.max_connections, 5);
        assert_eq!(cfg.body_limit_bytes, 1024 * 1024);
    }

    #[test]
    fn reads_overrides() {
        let cfg = from_pairs(&[
            ("DATABASE_URL", "postgres://db/shop"),
            ("OFICINA_SCHEMA", "oficina"),
            ("OFICINA_LISTEN", "127.0.0.1:8080"),
            ("OFICINA_MAX_CONNECTIONS", "12"),
        ])
        .expect("overrides");
        assert_eq!(cfg.database_url, "postgres://db/shop");
        assert_eq!(cfg.schema, "oficina");
        assert_eq!(cfg.listen_addr.port(), 8080);
        assert_eq!(cfg.max_connections, 12);
    }

    #[test]
    fn rejects_schema_that_is_not_an_identifier() {
        let err = from_pairs(&[("OFICINA_SCHEMA", "public; drop table x")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "OFICINA_SCHEMA", .. }));
    }

    #[test]
    fn rejects_zero_connections() {
        let err = from_pairs(&[("OFICINA_MAX_CONNECTIONS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "OFICINA_MAX_CONNECTIONS", .. }));
    }
}
