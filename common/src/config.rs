//! Service configuration loaded from the process environment.
//!
//! Everything is read once at startup and treated as immutable afterwards.

use std::fmt;
use std::time::Duration;

use crate::errors::{AppError, AppResult};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Deployment mode, controls whether the GraphiQL UI is exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Parses the `APP_ENV` value.
    ///
    /// Surrounding whitespace is ignored and the comparison is
    /// case-insensitive. `production` and `prod` select production, every
    /// other value (including an empty or missing one) selects development.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Document store connection settings.
#[derive(Clone)]
pub struct DatabaseConfig {
    /// Credential identity. No credential is sent when absent.
    pub user: Option<String>,
    /// Credential secret.
    pub password: String,
    /// Cluster endpoint, e.g. `cluster0.example.mongodb.net`.
    pub host: String,
    /// Logical database selected on the connection.
    pub database_name: String,
    /// Use the `mongodb+srv://` scheme instead of `mongodb://`.
    pub use_srv: bool,
    /// Full connection string overriding `host`/`use_srv`.
    pub uri: Option<String>,
    /// Upper bound for establishing the connection.
    pub connect_timeout: Duration,
}

impl DatabaseConfig {
    /// Connection string without credentials.
    ///
    /// Credentials are applied separately so that they never need URL
    /// escaping and never end up in log output.
    pub fn connection_uri(&self) -> String {
        if let Some(uri) = &self.uri {
            return uri.clone();
        }
        let scheme = if self.use_srv { "mongodb+srv" } else { "mongodb" };
        format!(
            "{}://{}/{}?retryWrites=true&w=majority",
            scheme, self.host, self.database_name
        )
    }

    /// Target description safe for logs.
    pub fn redacted_target(&self) -> String {
        match &self.uri {
            Some(_) => format!("<DB_URI>/{}", self.database_name),
            None => {
                let user = self.user.as_deref().unwrap_or("anonymous");
                let scheme = if self.use_srv { "mongodb+srv" } else { "mongodb" };
                format!("{}://{}@{}/{}", scheme, user, self.host, self.database_name)
            }
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("user", &self.user)
            .field("password", &"***")
            .field("host", &self.host)
            .field("database_name", &self.database_name)
            .field("use_srv", &self.use_srv)
            .field("uri", &self.uri.as_ref().map(|_| "***"))
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// Top level service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub service_name: String,
    /// Bind address.
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub cors_enabled: bool,
    /// Connect to the database before the listener is bound.
    pub connect_on_startup: bool,
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// Loads configuration from the process environment.
    pub fn load_with_service(service_name: &str) -> AppResult<Self> {
        Self::from_lookup(service_name, |key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(service_name: &str, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // 空字符串视为未设置
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let uri = get("DB_URI");
        let database_name = get("DB_NAME")
            .ok_or_else(|| AppError::Config("DB_NAME must be set".into()))?;
        let host = match (get("DB_HOST"), &uri) {
            (Some(host), _) => host,
            (None, Some(_)) => String::new(),
            (None, None) => {
                return Err(AppError::Config(
                    "DB_HOST must be set when DB_URI is not provided".into(),
                ))
            }
        };

        let timeout_secs: u64 = parse_number(
            "DB_CONNECT_TIMEOUT_SECS",
            get("DB_CONNECT_TIMEOUT_SECS"),
            DEFAULT_CONNECT_TIMEOUT_SECS,
        )?;
        if timeout_secs == 0 {
            return Err(AppError::Config(
                "DB_CONNECT_TIMEOUT_SECS must be greater than zero".into(),
            ));
        }

        let database = DatabaseConfig {
            user: get("DB_USER"),
            password: lookup("DB_PASSWORD").unwrap_or_default(),
            host,
            database_name,
            use_srv: parse_bool("DB_SRV", get("DB_SRV"), true)?,
            uri,
            connect_timeout: Duration::from_secs(timeout_secs),
        };

        Ok(Self {
            service_name: service_name.to_string(),
            host: get("SERVER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_number("PORT", get("PORT"), DEFAULT_PORT)?,
            environment: Environment::parse(lookup("APP_ENV").as_deref()),
            cors_enabled: parse_bool("CORS_ENABLED", get("CORS_ENABLED"), true)?,
            connect_on_startup: parse_bool(
                "DB_CONNECT_ON_STARTUP",
                get("DB_CONNECT_ON_STARTUP"),
                false,
            )?,
            database,
        })
    }

    /// Socket address string for the HTTP listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_bool(key: &str, value: Option<String>, default: bool) -> AppResult<bool> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AppError::Config(format!(
            "{} must be a boolean, got '{}'",
            key, other
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: Option<String>, default: T) -> AppResult<T> {
    match value {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} must be a number, got '{}'", key, v))),
        None => Ok(default),
    }
}
