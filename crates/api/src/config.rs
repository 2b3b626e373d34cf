use std::path::PathBuf;

use chrono::Duration;
use dsu_core::authentication::DEFAULT_LIFETIME_MINS;
use dsu_core::authorization::{DEFAULT_CODE_LIFETIME_MINS, DEFAULT_TOKEN_LIFETIME_MINS};
use dsu_core::paging::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// A configuration value that could not be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be set")]
    Missing { name: &'static str },

    #[error("{name} has invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Which storage engine backs the bins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Postgres { database_url: String },
    MongoDb { uri: String, database: String },
    Memory,
}

/// Lifetimes of minted tokens and codes.
#[derive(Debug, Clone, Copy)]
pub struct TokenConfig {
    pub authentication_lifetime: Duration,
    pub code_lifetime: Duration,
    pub authorization_lifetime: Duration,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            authentication_lifetime: Duration::minutes(DEFAULT_LIFETIME_MINS),
            code_lifetime: Duration::minutes(DEFAULT_CODE_LIFETIME_MINS),
            authorization_lifetime: Duration::minutes(DEFAULT_TOKEN_LIFETIME_MINS),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PagingConfig {
    pub default_page_size: i64,
    pub max_page_size: i64,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development except the
/// connection settings of the chosen storage engine.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    pub storage: StorageConfig,
    pub tokens: TokenConfig,
    pub paging: PagingConfig,
    pub password_min_length: usize,
    /// Directory of schema records loaded into the registry at startup.
    pub schema_dir: Option<PathBuf>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                              | Default                 |
    /// |--------------------------------------|-------------------------|
    /// | `HOST`                               | `0.0.0.0`               |
    /// | `PORT`                               | `3000`                  |
    /// | `CORS_ORIGINS`                       | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`               | `30`                    |
    /// | `STORAGE_BACKEND`                    | `postgres`              |
    /// | `DATABASE_URL`                       | required for postgres   |
    /// | `MONGODB_URI`                        | required for mongodb    |
    /// | `MONGODB_DATABASE`                   | `dsu`                   |
    /// | `AUTH_TOKEN_LIFETIME_MINS`           | `30`                    |
    /// | `AUTH_CODE_LIFETIME_MINS`            | `5`                     |
    /// | `AUTHORIZATION_TOKEN_LIFETIME_MINS`  | `60`                    |
    /// | `DEFAULT_PAGE_SIZE`                  | `100`                   |
    /// | `MAX_PAGE_SIZE`                      | `100`                   |
    /// | `PASSWORD_MIN_LENGTH`                | `8`                     |
    /// | `SCHEMA_DIR`                         | unset                   |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let host = env.string("HOST", "0.0.0.0");
        let port: u16 = env.parsed("PORT", 3000)?;
        let cors_origins: Vec<String> = env
            .string("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let request_timeout_secs: u64 = env.parsed("REQUEST_TIMEOUT_SECS", 30)?;

        let storage = match env.string("STORAGE_BACKEND", "postgres").as_str() {
            "postgres" => StorageConfig::Postgres {
                database_url: env.required("DATABASE_URL")?,
            },
            "mongodb" => StorageConfig::MongoDb {
                uri: env.required("MONGODB_URI")?,
                database: env.string("MONGODB_DATABASE", "dsu"),
            },
            "memory" => StorageConfig::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    name: "STORAGE_BACKEND",
                    value: other.to_string(),
                    reason: "expected postgres, mongodb or memory".into(),
                })
            }
        };

        let tokens = TokenConfig {
            authentication_lifetime: env.minutes("AUTH_TOKEN_LIFETIME_MINS", DEFAULT_LIFETIME_MINS)?,
            code_lifetime: env.minutes("AUTH_CODE_LIFETIME_MINS", DEFAULT_CODE_LIFETIME_MINS)?,
            authorization_lifetime: env.minutes(
                "AUTHORIZATION_TOKEN_LIFETIME_MINS",
                DEFAULT_TOKEN_LIFETIME_MINS,
            )?,
        };

        let paging = PagingConfig {
            default_page_size: env.positive("DEFAULT_PAGE_SIZE", DEFAULT_PAGE_SIZE)?,
            max_page_size: env.positive("MAX_PAGE_SIZE", MAX_PAGE_SIZE)?,
        };
        if paging.default_page_size > paging.max_page_size {
            return Err(ConfigError::Invalid {
                name: "DEFAULT_PAGE_SIZE",
                value: paging.default_page_size.to_string(),
                reason: format!("must not exceed MAX_PAGE_SIZE ({})", paging.max_page_size),
            });
        }

        let password_min_length: usize = env.parsed("PASSWORD_MIN_LENGTH", 8)?;
        let schema_dir = (env.lookup)("SCHEMA_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            storage,
            tokens,
            paging,
            password_min_length,
            schema_dir,
        })
    }
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, name: &str, default: &str) -> String {
        (self.lookup)(name).unwrap_or_else(|| default.to_string())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        (self.lookup)(name)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing { name })
    }

    fn parsed<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match (self.lookup)(name) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                name,
                value: raw.clone(),
                reason: e.to_string(),
            }),
        }
    }

    fn positive(&self, name: &'static str, default: i64) -> Result<i64, ConfigError> {
        let value: i64 = self.parsed(name, default)?;
        if value <= 0 {
            return Err(ConfigError::Invalid {
                name,
                value: value.to_string(),
                reason: "must be positive".into(),
            });
        }
        Ok(value)
    }

    fn minutes(&self, name: &'static str, default: i64) -> Result<Duration, ConfigError> {
        self.positive(name, default).map(Duration::minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_with_memory_storage() {
        let config = load(&[("STORAGE_BACKEND", "memory")]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.storage, StorageConfig::Memory);
        assert_eq!(config.tokens.authentication_lifetime, Duration::minutes(30));
        assert_eq!(config.tokens.code_lifetime, Duration::minutes(5));
        assert_eq!(config.tokens.authorization_lifetime, Duration::minutes(60));
        assert_eq!(config.paging.max_page_size, 100);
        assert_eq!(config.password_min_length, 8);
        assert!(config.schema_dir.is_none());
    }

    #[test]
    fn postgres_requires_database_url() {
        assert_matches!(load(&[]), Err(ConfigError::Missing { name: "DATABASE_URL" }));
        let config = load(&[("DATABASE_URL", "postgres://localhost/dsu")]).unwrap();
        assert_matches!(config.storage, StorageConfig::Postgres { .. });
    }

    #[test]
    fn mongodb_settings() {
        let config = load(&[
            ("STORAGE_BACKEND", "mongodb"),
            ("MONGODB_URI", "mongodb://localhost:27017"),
        ])
        .unwrap();
        assert_eq!(
            config.storage,
            StorageConfig::MongoDb {
                uri: "mongodb://localhost:27017".into(),
                database: "dsu".into(),
            }
        );
    }

    #[test]
    fn invalid_values_rejected() {
        assert_matches!(
            load(&[("STORAGE_BACKEND", "cassandra")]),
            Err(ConfigError::Invalid { name: "STORAGE_BACKEND", .. })
        );
        assert_matches!(
            load(&[("STORAGE_BACKEND", "memory"), ("PORT", "http")]),
            Err(ConfigError::Invalid { name: "PORT", .. })
        );
        assert_matches!(
            load(&[("STORAGE_BACKEND", "memory"), ("AUTH_CODE_LIFETIME_MINS", "0")]),
            Err(ConfigError::Invalid { name: "AUTH_CODE_LIFETIME_MINS", .. })
        );
        assert_matches!(
            load(&[
                ("STORAGE_BACKEND", "memory"),
                ("DEFAULT_PAGE_SIZE", "200"),
                ("MAX_PAGE_SIZE", "100"),
            ]),
            Err(ConfigError::Invalid { name: "DEFAULT_PAGE_SIZE", .. })
        );
    }

    #[test]
    fn cors_origins_split_on_commas() {
        let config = load(&[
            ("STORAGE_BACKEND", "memory"),
            ("CORS_ORIGINS", "https://a.example, https://b.example,"),
        ])
        .unwrap();
        assert_eq!(config.cors_origins, ["https://a.example", "https://b.example"]);
    }
}
