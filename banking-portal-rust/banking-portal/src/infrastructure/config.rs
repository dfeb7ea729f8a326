use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnectOptions;

use crate::domain::auth::SessionManager;

pub const DEFAULT_SESSION_COOKIE_AGE: u64 = 60 * 60 * 24 * 7 * 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Memory,
    File,
    Postgres,
}

impl FromStr for DatabaseBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(anyhow!(
                "Unknown DATABASE_BACKEND '{other}'. Expected memory, file or postgres"
            )),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    pub database: String,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub host: String,
    pub port: u16,
}

impl PostgresConfig {
    /// Connection options built field by field, so credentials are never
    /// parsed back out of a URL.
    pub fn connect_options(&self) -> PgConnectOptions {
        let mut options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database);
        if !self.user.is_empty() {
            options = options.username(&self.user);
        }
        if !self.password.is_empty() {
            options = options.password(&self.password);
        }
        options
    }
}

impl fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresConfig")
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub data_dir: PathBuf,
    pub postgres: PostgresConfig,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub cookie_age: u64,
    pub cookie_secure: bool,
    pub purge_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    pub level: String,
    pub directory: String,
    pub to_file: bool,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    pub environment: String,
    pub debug: bool,
    #[serde(skip_serializing)]
    pub secret_key: String,
    /// True when `SECRET_KEY` was absent and a throwaway key was generated.
    pub secret_key_generated: bool,
    pub allowed_hosts: Vec<String>,
    pub bind_address: String,
    pub port: u16,
    pub login_url: String,
    pub login_redirect_url: String,
    pub logout_redirect_url: String,
    pub session: SessionConfig,
    pub database: DatabaseConfig,
    pub cors_origins: Vec<String>,
    pub logging: LogSettings,
    pub version: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("environment", &self.environment)
            .field("debug", &self.debug)
            .field("secret_key", &"[REDACTED]")
            .field("secret_key_generated", &self.secret_key_generated)
            .field("allowed_hosts", &self.allowed_hosts)
            .field("bind_address", &self.bind_address)
            .field("port", &self.port)
            .field("login_url", &self.login_url)
            .field("login_redirect_url", &self.login_redirect_url)
            .field("logout_redirect_url", &self.logout_redirect_url)
            .field("session", &self.session)
            .field("database", &self.database)
            .field("cors_origins", &self.cors_origins)
            .field("logging", &self.logging)
            .field("version", &self.version)
            .finish()
    }
}

/// Environment variables the configuration is read from.
///
/// Snapshotting them into a map keeps profile construction deterministic
/// and lets tests supply their own values.
#[derive(Debug, Clone, Default)]
pub struct EnvVars(HashMap<String, String>);

impl EnvVars {
    pub fn from_process() -> Self {
        Self(env::vars().collect())
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    /// Value of `name`, treating an empty value as unset.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn string(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or(default).to_string()
    }

    pub fn parse<T>(&self, name: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(name) {
            Some(raw) => raw
                .parse()
                .map_err(|e| anyhow!("Invalid value for {name}: '{raw}' ({e})")),
            None => Ok(default),
        }
    }

    /// Boolean in the django-environ dialect: `true`, `on`, `ok`, `y`,
    /// `yes` and `1` are true, anything else is false.
    pub fn bool(&self, name: &str, default: bool) -> bool {
        match self.get(name) {
            Some(raw) => matches!(
                raw.to_lowercase().as_str(),
                "true" | "on" | "ok" | "y" | "yes" | "1"
            ),
            None => default,
        }
    }

    /// Comma separated list; blank items are dropped.
    pub fn list(&self, name: &str) -> Vec<String> {
        self.get(name)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Config {
    /// Loads `.env`, reads the process environment and validates the result.
    pub fn new() -> Result<Self> {
        dotenv::dotenv().ok();
        let config = Self::from_env(&EnvVars::from_process())?;

        let errors = config.validate();
        if !errors.is_empty() {
            return Err(anyhow!(
                "Configuration validation failed:\n{}",
                errors.join("\n")
            ));
        }
        Ok(config)
    }

    pub fn from_env(vars: &EnvVars) -> Result<Self> {
        match vars.string("RUST_ENV", "development").as_str() {
            "production" => Self::production_config(vars),
            "staging" => Self::staging_config(vars),
            "development" => Self::development_config(vars),
            other => {
                log::warn!("Unknown RUST_ENV '{other}', using development profile");
                Self::development_config(vars)
            }
        }
    }

    pub fn development_config(vars: &EnvVars) -> Result<Self> {
        Self::build(vars, "development", true, "debug")
    }

    pub fn staging_config(vars: &EnvVars) -> Result<Self> {
        Self::build(vars, "staging", false, "info")
    }

    pub fn production_config(vars: &EnvVars) -> Result<Self> {
        Self::build(vars, "production", false, "info")
    }

    fn build(vars: &EnvVars, environment: &str, is_dev: bool, log_level: &str) -> Result<Self> {
        let (secret_key, secret_key_generated) = match vars.get("SECRET_KEY") {
            Some(key) => (key.to_string(), false),
            None if is_dev => (SessionManager::generate_secret_key(), true),
            None => (String::new(), false),
        };

        let postgres = PostgresConfig {
            database: vars.string("POSTGRES_DB", ""),
            user: vars.string("POSTGRES_USER", ""),
            password: vars.string("POSTGRES_PASSWORD", ""),
            host: vars.string("POSTGRES_HOST", "localhost"),
            port: vars.parse("POSTGRES_PORT", 5432)?,
        };
        let default_backend = if postgres.database.is_empty() {
            DatabaseBackend::Memory
        } else {
            DatabaseBackend::Postgres
        };

        Ok(Self {
            environment: environment.to_string(),
            debug: vars.bool("DEBUG", is_dev),
            secret_key,
            secret_key_generated,
            allowed_hosts: vars.list("ALLOWED_HOSTS"),
            bind_address: vars.string("BIND_ADDRESS", "0.0.0.0"),
            port: vars.parse("PORT", 8000)?,
            login_url: vars.string("LOGIN_URL", "/users/login/"),
            login_redirect_url: vars.string("LOGIN_REDIRECT_URL", "/"),
            logout_redirect_url: vars.string("LOGOUT_REDIRECT_URL", "/users/login/"),
            session: SessionConfig {
                cookie_name: "sessionid".to_string(),
                cookie_age: vars.parse("SESSION_COOKIE_AGE", DEFAULT_SESSION_COOKIE_AGE)?,
                cookie_secure: vars.bool("SESSION_COOKIE_SECURE", !is_dev),
                purge_interval_secs: vars.parse("SESSION_PURGE_INTERVAL_SECS", 300)?,
            },
            database: DatabaseConfig {
                backend: vars.parse("DATABASE_BACKEND", default_backend)?,
                data_dir: PathBuf::from(vars.string("DATA_DIR", "./data")),
                postgres,
                max_connections: vars.parse("DATABASE_MAX_CONNECTIONS", 5)?,
            },
            cors_origins: vars.list("CORS_ORIGINS"),
            logging: LogSettings {
                level: vars.string("LOG_LEVEL", log_level),
                directory: vars.string("LOG_DIR", "logs"),
                to_file: vars.bool("LOG_TO_FILE", false),
            },
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    /// Every problem with this configuration; empty when it is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.secret_key.is_empty() {
            errors.push(format!(
                "SECRET_KEY is required in {} environment",
                self.environment
            ));
        } else if self.secret_key.len() < 32 && !self.is_development() {
            errors.push("SECRET_KEY must be at least 32 characters".to_string());
        }

        if self.port == 0 {
            errors.push("PORT must not be 0".to_string());
        }

        for (name, url) in [
            ("LOGIN_URL", &self.login_url),
            ("LOGIN_REDIRECT_URL", &self.login_redirect_url),
            ("LOGOUT_REDIRECT_URL", &self.logout_redirect_url),
        ] {
            if !url.starts_with('/') {
                errors.push(format!("{name} must be a path starting with '/': '{url}'"));
            }
        }

        if self.session.cookie_age == 0 {
            errors.push("SESSION_COOKIE_AGE must be greater than 0".to_string());
        }

        match self.database.backend {
            DatabaseBackend::Postgres if self.database.postgres.database.is_empty() => {
                errors.push("POSTGRES_DB is required for the postgres backend".to_string());
            }
            DatabaseBackend::File if self.database.data_dir.as_os_str().is_empty() => {
                errors.push("DATA_DIR cannot be empty for the file backend".to_string());
            }
            _ => {}
        }
        if self.database.max_connections == 0 {
            errors.push("DATABASE_MAX_CONNECTIONS must be greater than 0".to_string());
        }

        if !self.debug && self.allowed_hosts.is_empty() {
            log::warn!("ALLOWED_HOSTS is empty with DEBUG off; every request will be rejected");
        }

        errors
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Host patterns requests are checked against.
    ///
    /// With `DEBUG` on and nothing configured, local addresses are allowed.
    pub fn effective_allowed_hosts(&self) -> Vec<String> {
        if self.debug && self.allowed_hosts.is_empty() {
            return vec![
                "localhost".to_string(),
                "127.0.0.1".to_string(),
                "[::1]".to_string(),
            ];
        }
        self.allowed_hosts.clone()
    }

    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "environment": self.environment,
            "version": self.version,
            "debug": self.debug,
            "bind_address": self.bind_address,
            "port": self.port,
            "database_backend": self.database.backend,
            "allowed_hosts": self.effective_allowed_hosts(),
            "session_cookie_age": self.session.cookie_age,
            "session_cookie_secure": self.session.cookie_secure,
            "log_level": self.logging.level,
        })
    }

    /// Development profile with a fixed key and in-memory storage.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        let vars = EnvVars::from_pairs([
            ("SECRET_KEY", "test-secret-key-0123456789abcdef0123456789"),
            ("ALLOWED_HOSTS", "localhost"),
            ("DATABASE_BACKEND", "memory"),
        ]);
        let mut config =
            Self::build(&vars, "development", true, "debug").expect("test configuration is valid");
        config.debug = false;
        config
    }
}
