//! Configuration loaded from environment.
//!
//! Database settings are resolved through fallback chains:
//!
//! | Field      | Lookup order                                 |
//! |------------|----------------------------------------------|
//! | host       | `DB_HOST`, `BACKEND_SERVICE`, `"localhost"`  |
//! | port       | `DB_PORT`, `BACKEND_PORT`, `3306`            |
//! | user       | `MYSQL_USER`, `"root"`                       |
//! | password   | `MYSQL_PASSWORD`, absent                     |
//! | database   | `MYSQL_DATABASE`, `"test_nodejs"`            |
//!
//! An empty variable counts as unset.

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;

use sqlx::mysql::MySqlConnectOptions;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 3306;
pub const DEFAULT_USER: &str = "root";
pub const DEFAULT_DATABASE: &str = "test_nodejs";

/// Maximum number of simultaneously open connections.
pub const CONNECTION_LIMIT: u32 = 10;
/// Maximum number of queued acquisitions; 0 means unbounded.
pub const QUEUE_LIMIT: u32 = 0;

/// Application configuration loaded from `.env` and environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g. `0.0.0.0:3000`).
    pub server_addr: SocketAddr,
    /// Log level: `error`, `warn`, `info`, `debug`, `trace`.
    pub log_level: String,
    /// Database pool settings.
    pub database: DbConfig,
}

impl Config {
    /// Load configuration from environment. Call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let server_addr = std::env::var("SERVER_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let server_addr: SocketAddr = server_addr
            .parse()
            .map_err(|_| ConfigLoadError::InvalidServerAddr)?;

        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let database = DbConfig::from_env()?;

        Ok(Self {
            server_addr,
            log_level,
            database,
        })
    }
}

/// Resolved connection pool settings.
#[derive(Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub database: String,
    pub connection_limit: u32,
    pub queue_limit: u32,
}

impl DbConfig {
    /// Resolve settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings from a snapshot of key/value pairs.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigLoadError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    /// Resolve settings through `lookup`. Only the port is coerced; every
    /// other value is passed through to the driver as-is.
    ///
    /// A port value that does not coerce to a whole number in `0..=65535`
    /// is reported as [`ConfigLoadError::InvalidPort`] here, since the driver
    /// options only carry a `u16`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigLoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let host = var("DB_HOST")
            .or_else(|| var("BACKEND_SERVICE"))
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match var("DB_PORT").or_else(|| var("BACKEND_PORT")) {
            Some(raw) => coerce_port(&raw).ok_or(ConfigLoadError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let user = var("MYSQL_USER").unwrap_or_else(|| DEFAULT_USER.to_string());
        let password = var("MYSQL_PASSWORD");
        let database = var("MYSQL_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        Ok(Self {
            host,
            port,
            user,
            password,
            database,
            connection_limit: CONNECTION_LIMIT,
            queue_limit: QUEUE_LIMIT,
        })
    }

    /// Driver connect options. The password is only set when present.
    pub fn connect_options(&self) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(&self.database);
        match &self.password {
            Some(password) => options.password(password),
            None => options,
        }
    }
}

/// Numeric coercion of a port value: decimal (with optional fraction or
/// exponent) and `0x`/`0o`/`0b` integer literals are accepted, as long as the
/// result is a whole number in `0..=65535`.
fn coerce_port(raw: &str) -> Option<u16> {
    let raw = raw.trim();
    let radix_literal = raw.get(..2).and_then(|prefix| {
        let radix = match prefix.to_ascii_lowercase().as_str() {
            "0x" => 16,
            "0o" => 8,
            "0b" => 2,
            _ => return None,
        };
        let digits = &raw[2..];
        if digits.starts_with('+') {
            return Some(None);
        }
        Some(u32::from_str_radix(digits, radix).ok())
    });
    let value = match radix_literal {
        Some(parsed) => f64::from(parsed?),
        None if raw.chars().all(|c| c.is_ascii_digit() || "+-.eE".contains(c)) => {
            raw.parse::<f64>().ok()?
        }
        None => return None,
    };
    if value.fract() != 0.0 || !(0.0..=f64::from(u16::MAX)).contains(&value) {
        return None;
    }
    Some(value as u16)
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("database", &self.database)
            .field("connection_limit", &self.connection_limit)
            .field("queue_limit", &self.queue_limit)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Invalid SERVER_ADDR")]
    InvalidServerAddr,

    #[error("Invalid database port: {0:?}")]
    InvalidPort(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(vars: &[(&str, &str)]) -> DbConfig {
        DbConfig::from_vars(vars.iter().copied()).unwrap()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let cfg = resolve(&[]);
        assert_eq!(cfg.host, "localhost");
        assert_eq!(cfg.port, 3306);
        assert_eq!(cfg.user, "root");
        assert_eq!(cfg.password, None);
        assert_eq!(cfg.database, "test_nodejs");
        assert_eq!(cfg.connection_limit, 10);
        assert_eq!(cfg.queue_limit, 0);
    }

    #[test]
    fn host_prefers_db_host_then_backend_service() {
        assert_eq!(resolve(&[("BACKEND_SERVICE", "x")]).host, "x");
        assert_eq!(
            resolve(&[("DB_HOST", "db.internal"), ("BACKEND_SERVICE", "x")]).host,
            "db.internal"
        );
        assert_eq!(resolve(&[("DB_HOST", "db.internal")]).host, "db.internal");
    }

    #[test]
    fn port_prefers_db_port_then_backend_port() {
        assert_eq!(resolve(&[("DB_PORT", "5432")]).port, 5432);
        assert_eq!(resolve(&[("BACKEND_PORT", "3307")]).port, 3307);
        assert_eq!(
            resolve(&[("DB_PORT", "5432"), ("BACKEND_PORT", "3307")]).port,
            5432
        );
        assert_eq!(resolve(&[("DB_PORT", " 3310 ")]).port, 3310);
    }

    #[test]
    fn empty_values_fall_through() {
        let cfg = resolve(&[
            ("DB_HOST", ""),
            ("BACKEND_SERVICE", "svc"),
            ("DB_PORT", ""),
            ("BACKEND_PORT", "3308"),
            ("MYSQL_USER", ""),
            ("MYSQL_DATABASE", ""),
        ]);
        assert_eq!(cfg.host, "svc");
        assert_eq!(cfg.port, 3308);
        assert_eq!(cfg.user, "root");
        assert_eq!(cfg.database, "test_nodejs");
    }

    #[test]
    fn password_absent_not_empty() {
        assert_eq!(resolve(&[]).password, None);
        assert_eq!(resolve(&[("MYSQL_PASSWORD", "")]).password, None);
        assert_eq!(
            resolve(&[("MYSQL_PASSWORD", "s3cret")]).password.as_deref(),
            Some("s3cret")
        );
    }

    #[test]
    fn limits_ignore_environment() {
        let cfg = resolve(&[
            ("CONNECTION_LIMIT", "50"),
            ("QUEUE_LIMIT", "5"),
            ("connectionLimit", "50"),
        ]);
        assert_eq!(cfg.connection_limit, CONNECTION_LIMIT);
        assert_eq!(cfg.queue_limit, QUEUE_LIMIT);
    }

    #[test]
    fn malformed_port_is_rejected() {
        let err = DbConfig::from_vars([("DB_PORT", "mysql")]).unwrap_err();
        assert!(matches!(err, ConfigLoadError::InvalidPort(ref p) if p == "mysql"));

        let err = DbConfig::from_vars([("BACKEND_PORT", "70000")]).unwrap_err();
        assert!(matches!(err, ConfigLoadError::InvalidPort(_)));
    }

    #[test]
    fn port_accepts_other_numeric_forms() {
        assert_eq!(resolve(&[("DB_PORT", "3306.0")]).port, 3306);
        assert_eq!(resolve(&[("DB_PORT", "0x0CEA")]).port, 3306);
        assert_eq!(resolve(&[("DB_PORT", "0X0cea")]).port, 3306);
        assert_eq!(resolve(&[("DB_PORT", "1e3")]).port, 1000);
        assert_eq!(resolve(&[("DB_PORT", "+3307")]).port, 3307);
        assert_eq!(resolve(&[("BACKEND_PORT", "0o6732")]).port, 3546);
        assert_eq!(resolve(&[("BACKEND_PORT", "0b1010")]).port, 10);
    }

    #[test]
    fn port_rejects_values_that_are_not_ports() {
        for raw in [
            "3306.5", "-1", "65536", "0x", "0x+10", "0x10000", "inf", "NaN", "33 06",
        ] {
            let err = DbConfig::from_vars([("DB_PORT", raw)]).unwrap_err();
            assert!(
                matches!(err, ConfigLoadError::InvalidPort(ref p) if p == raw),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn debug_redacts_password() {
        let cfg = resolve(&[("MYSQL_PASSWORD", "hunter2")]);
        let out = format!("{:?}", cfg);
        assert!(!out.contains("hunter2"));
        assert!(out.contains("<redacted>"));
    }
}
