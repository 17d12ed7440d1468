use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub catalog: CatalogConfig,
    /// `None` when `DATABASE_URL` is unset; the catalog then serves the snapshot only.
    pub database: Option<DatabaseConfig>,
    /// `None` unless every SMTP variable is present.
    pub mail: Option<MailConfig>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let ansi = env::var("APP_LOG_ANSI")
            .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level, ansi },
            catalog: CatalogConfig::from_env(),
            database: DatabaseConfig::from_env()?,
            mail: MailConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    /// Colored log output, enabled by `APP_LOG_ANSI`.
    pub ansi: bool,
}

/// Where the bundled snapshot and the per-model media directories live.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub media_root: PathBuf,
    /// Public path prefix media URLs are built from, e.g. `/models`.
    pub media_url_prefix: String,
    pub snapshot_path: PathBuf,
}

impl CatalogConfig {
    fn from_env() -> Self {
        let media_root =
            env::var("CATALOG_MEDIA_ROOT").unwrap_or_else(|_| "public/models".to_string());
        let media_url_prefix =
            env::var("CATALOG_MEDIA_URL_PREFIX").unwrap_or_else(|_| "/models".to_string());
        let snapshot_path =
            env::var("CATALOG_SNAPSHOT_PATH").unwrap_or_else(|_| "data/models.json".to_string());

        Self {
            media_root: PathBuf::from(media_root),
            media_url_prefix: media_url_prefix.trim_end_matches('/').to_string(),
            snapshot_path: PathBuf::from(snapshot_path),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            media_root: PathBuf::from("public/models"),
            media_url_prefix: "/models".to_string(),
            snapshot_path: PathBuf::from("data/models.json"),
        }
    }
}

/// Relational store connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    pub query_timeout: Duration,
    pub retry_attempts: u32,
    pub retry_backoff: Duration,
}

impl DatabaseConfig {
    /// Defaults used for every knob not set in the environment.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 1,
            connect_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(20),
            query_timeout: Duration::from_secs(10),
            retry_attempts: 3,
            retry_backoff: Duration::from_millis(500),
        }
    }

    /// Longest a single catalog fetch may take: a health check, one full
    /// connection cycle with its backoff sleeps, then the catalog query.
    pub fn fetch_deadline(&self) -> Duration {
        let attempts = self.retry_attempts.max(1);
        self.connect_timeout * attempts + self.retry_backoff * (attempts - 1) + self.query_timeout * 2
    }

    fn from_env() -> Result<Option<Self>, ConfigError> {
        let url = match env::var("DATABASE_URL") {
            Ok(url) if !url.trim().is_empty() => url.trim().to_string(),
            _ => return Ok(None),
        };

        let defaults = Self::with_url(url);
        Ok(Some(Self {
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS")?
                .unwrap_or(defaults.max_connections)
                .max(1),
            connect_timeout: parse_var("DATABASE_CONNECT_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            idle_timeout: parse_var("DATABASE_IDLE_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.idle_timeout),
            query_timeout: parse_var("DATABASE_QUERY_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.query_timeout),
            retry_attempts: parse_var("DATABASE_RETRY_ATTEMPTS")?
                .unwrap_or(defaults.retry_attempts)
                .max(1),
            retry_backoff: parse_var("DATABASE_RETRY_BACKOFF_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_backoff),
            ..defaults
        }))
    }
}

/// SMTP relay settings for the application form.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_password: String,
    pub recipient: String,
}

impl MailConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let read = |name: &str| {
            env::var(name)
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let (Some(smtp_host), Some(smtp_user), Some(smtp_password)) =
            (read("SMTP_HOST"), read("SMTP_USER"), read("SMTP_PASSWORD"))
        else {
            return Ok(None);
        };
        let Some(smtp_port) = parse_var::<u16>("SMTP_PORT")? else {
            return Ok(None);
        };
        let recipient = read("RECIPIENT_EMAIL").unwrap_or_else(|| smtp_user.clone());

        Ok(Some(Self {
            smtp_host,
            smtp_port,
            smtp_user,
            smtp_password,
            recipient,
        }))
    }
}

fn parse_var<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { variable: name }),
        _ => Ok(None),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { variable: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { variable } => {
                write!(f, "{variable} must be a non-negative integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    const VARS: &[&str] = &[
        "APP_ENV",
        "APP_HOST",
        "APP_PORT",
        "APP_LOG_LEVEL",
        "CATALOG_MEDIA_ROOT",
        "CATALOG_MEDIA_URL_PREFIX",
        "CATALOG_SNAPSHOT_PATH",
        "DATABASE_URL",
        "DATABASE_MAX_CONNECTIONS",
        "DATABASE_CONNECT_TIMEOUT_SECS",
        "DATABASE_IDLE_TIMEOUT_SECS",
        "DATABASE_QUERY_TIMEOUT_SECS",
        "DATABASE_RETRY_ATTEMPTS",
        "DATABASE_RETRY_BACKOFF_MS",
        "SMTP_HOST",
        "SMTP_PORT",
        "SMTP_USER",
        "SMTP_PASSWORD",
        "RECIPIENT_EMAIL",
        "APP_LOG_ANSI",
    ];

    fn reset_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(!config.telemetry.ansi);
        assert_eq!(config.catalog.media_root, PathBuf::from("public/models"));
        assert_eq!(config.catalog.media_url_prefix, "/models");
        assert_eq!(
            config.catalog.snapshot_path,
            PathBuf::from("data/models.json")
        );
        assert!(config.database.is_none());
        assert!(config.mail.is_none());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn ansi_logging_is_opt_in() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_LOG_ANSI", "true");
        assert!(AppConfig::load().expect("config loads").telemetry.ansi);

        env::set_var("APP_LOG_ANSI", "off");
        assert!(!AppConfig::load().expect("config loads").telemetry.ansi);
        reset_env();
    }

    #[test]
    fn database_settings_read_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("DATABASE_URL", "postgres://catalog@localhost/agency");
        env::set_var("DATABASE_RETRY_ATTEMPTS", "5");
        env::set_var("DATABASE_RETRY_BACKOFF_MS", "250");
        env::set_var("CATALOG_MEDIA_URL_PREFIX", "/media/");

        let config = AppConfig::load().expect("config loads");
        let database = config.database.expect("database configured");
        assert_eq!(database.url, "postgres://catalog@localhost/agency");
        assert_eq!(database.retry_attempts, 5);
        assert_eq!(database.retry_backoff, Duration::from_millis(250));
        assert_eq!(database.connect_timeout, Duration::from_secs(10));
        assert_eq!(database.max_connections, 1);
        assert_eq!(config.catalog.media_url_prefix, "/media");
        reset_env();
    }

    #[test]
    fn fetch_deadline_covers_one_connection_cycle() {
        let mut database = DatabaseConfig::with_url("postgres://localhost/roster");
        database.connect_timeout = Duration::from_secs(2);
        database.retry_attempts = 3;
        database.retry_backoff = Duration::from_millis(500);
        database.query_timeout = Duration::from_secs(1);
        assert_eq!(database.fetch_deadline(), Duration::from_secs(9));
    }

    #[test]
    fn rejects_non_numeric_database_knobs() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("DATABASE_URL", "postgres://localhost/agency");
        env::set_var("DATABASE_QUERY_TIMEOUT_SECS", "soon");

        match AppConfig::load() {
            Err(ConfigError::InvalidNumber { variable }) => {
                assert_eq!(variable, "DATABASE_QUERY_TIMEOUT_SECS")
            }
            other => panic!("expected invalid number error, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn mail_requires_complete_smtp_settings() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SMTP_HOST", "smtp.example.com");
        env::set_var("SMTP_USER", "bookings@example.com");
        let config = AppConfig::load().expect("config loads");
        assert!(config.mail.is_none());

        env::set_var("SMTP_PASSWORD", "secret");
        env::set_var("SMTP_PORT", "465");
        let config = AppConfig::load().expect("config loads");
        let mail = config.mail.expect("mail configured");
        assert_eq!(mail.smtp_port, 465);
        assert_eq!(mail.recipient, "bookings@example.com");
        reset_env();
    }
}
