//! Application configuration management.

use chrono_tz::Tz;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Deployment environment.
    #[serde(default)]
    pub environment: Environment,
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Daily invoice job configuration.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Log output configuration.
    #[serde(default)]
    pub log: LogConfig,
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development.
    #[default]
    Development,
    /// Automated tests.
    Test,
    /// Production deployment.
    Production,
}

impl Environment {
    /// Returns true for production.
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT settings as read from configuration sources.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in minutes.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expires_minutes: i64,
}

fn default_access_token_expiry() -> i64 {
    60
}

/// Daily invoice lifecycle job configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Whether the server spawns the daily job.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Local hour of the daily run.
    #[serde(default = "default_run_hour")]
    pub run_hour: u32,
    /// Local minute of the daily run.
    #[serde(default)]
    pub run_minute: u32,
    /// IANA timezone used to decide what "today" is.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Upper bound for processing a single invoice.
    #[serde(default = "default_item_timeout")]
    pub item_timeout_secs: u64,
    /// Copy the credit limit onto spawned successor invoices.
    #[serde(default)]
    pub carry_over_credit_limit: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            run_hour: default_run_hour(),
            run_minute: 0,
            timezone: default_timezone(),
            item_timeout_secs: default_item_timeout(),
            carry_over_credit_limit: false,
        }
    }
}

impl SchedulerConfig {
    /// Parses the configured timezone.
    ///
    /// # Errors
    ///
    /// Returns the offending name when it is not a known IANA zone.
    pub fn tz(&self) -> Result<Tz, String> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| format!("unknown timezone '{}'", self.timezone))
    }
}

fn default_true() -> bool {
    true
}

fn default_run_hour() -> u32 {
    6
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_item_timeout() -> u64 {
    30
}

/// Log output configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TALLY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [(&str, Option<&str>); 2] = [
        ("TALLY__DATABASE__URL", Some("postgres://localhost/tally")),
        ("TALLY__JWT__SECRET", Some("test-secret")),
    ];

    #[test]
    fn test_load_applies_defaults() {
        temp_env::with_vars(REQUIRED, || {
            let config = AppConfig::load().unwrap();

            assert_eq!(config.server.port, 8080);
            assert_eq!(config.environment, Environment::Development);
            assert!(config.scheduler.enabled);
            assert_eq!(config.scheduler.run_hour, 6);
            assert_eq!(config.scheduler.run_minute, 0);
            assert!(!config.scheduler.carry_over_credit_limit);
            assert_eq!(config.scheduler.tz().unwrap(), chrono_tz::UTC);
        });
    }

    #[test]
    fn test_load_reads_nested_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("TALLY__ENVIRONMENT", Some("production")));
        vars.push(("TALLY__SCHEDULER__TIMEZONE", Some("America/Sao_Paulo")));
        vars.push(("TALLY__SCHEDULER__RUN_HOUR", Some("4")));

        temp_env::with_vars(vars, || {
            let config = AppConfig::load().unwrap();

            assert!(config.environment.is_production());
            assert_eq!(config.scheduler.run_hour, 4);
            assert_eq!(
                config.scheduler.tz().unwrap(),
                chrono_tz::America::Sao_Paulo
            );
        });
    }

    #[test]
    fn test_unknown_timezone_is_rejected() {
        let scheduler = SchedulerConfig {
            timezone: "Mars/Olympus".to_string(),
            ..SchedulerConfig::default()
        };
        assert!(scheduler.tz().is_err());
    }
}
