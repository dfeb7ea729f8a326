use std::fs;
use std::sync::{Mutex, Once};

use serde::{Deserialize, Serialize};
use tracing::{info, warn, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling, rolling::Rotation};
use tracing_subscriber::{
    fmt::{self, time::UtcTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use super::config::LogSettings;

static INIT: Once = Once::new();
// Dropping a guard stops its background writer, so they live for the process.
static GUARDS: Mutex<Vec<WorkerGuard>> = Mutex::new(Vec::new());

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub service_name: String,
    pub version: String,
    pub enable_console: bool,
    pub enable_file: bool,
    pub log_directory: String,
    pub enable_colors: bool,
    pub enable_thread_ids: bool,
    pub enable_file_line: bool,
    pub enable_module_path: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            service_name: "banking-portal".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            enable_console: true,
            enable_file: false,
            log_directory: "logs".to_string(),
            enable_colors: true,
            enable_thread_ids: false,
            enable_file_line: false,
            enable_module_path: true,
        }
    }
}

impl From<&LogSettings> for LogConfig {
    fn from(settings: &LogSettings) -> Self {
        Self {
            level: settings.level.clone(),
            enable_file: settings.to_file,
            log_directory: settings.directory.clone(),
            ..Self::default()
        }
    }
}

pub struct EnhancedLogger {
    config: LogConfig,
}

impl EnhancedLogger {
    pub fn new(config: LogConfig) -> Self {
        if config.enable_file {
            if let Err(e) = fs::create_dir_all(&config.log_directory) {
                eprintln!("Failed to create log directory: {e}");
            }
        }

        Self { config }
    }

    fn level(&self) -> Level {
        match self.config.level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }

    /// Installs the global subscriber. Later calls are no-ops.
    pub fn init(&self) {
        INIT.call_once(|| {
            let level = self.level();
            let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new(format!(
                    "banking_portal={level},banking_portal_core={level},actix_web=info,sqlx=warn"
                ))
            });

            let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

            if self.config.enable_console {
                let console_layer = fmt::layer()
                    .with_timer(UtcTime::rfc_3339())
                    .with_thread_ids(self.config.enable_thread_ids)
                    .with_file(self.config.enable_file_line)
                    .with_line_number(self.config.enable_file_line)
                    .with_target(self.config.enable_module_path)
                    .with_ansi(self.config.enable_colors)
                    .with_writer(std::io::stdout);
                layers.push(Box::new(console_layer));
            }

            if self.config.enable_file {
                let file_appender = rolling::RollingFileAppender::new(
                    Rotation::DAILY,
                    &self.config.log_directory,
                    "banking_portal.log",
                );
                let (writer, guard) = non_blocking(file_appender);
                if let Ok(mut guards) = GUARDS.lock() {
                    guards.push(guard);
                }
                let file_layer = fmt::layer()
                    .with_timer(UtcTime::rfc_3339())
                    .with_thread_ids(self.config.enable_thread_ids)
                    .with_file(self.config.enable_file_line)
                    .with_line_number(self.config.enable_file_line)
                    .with_target(self.config.enable_module_path)
                    .with_ansi(false)
                    .with_writer(writer);
                layers.push(Box::new(file_layer));
            }

            let subscriber = Registry::default().with(layers).with(env_filter);
            if let Err(e) = subscriber.try_init() {
                eprintln!("Logger already initialised: {e}");
            }
        });
    }
}

/// Log entry points used across the service.
///
/// Never pass passwords, hashes or session tokens to these.
pub struct Logger;

impl Logger {
    pub fn init(settings: &LogSettings) {
        EnhancedLogger::new(LogConfig::from(settings)).init();
    }

    pub fn account_registered(username: &str) {
        info!(target: "banking_portal::auth", username, "Account registered");
    }

    pub fn login_succeeded(username: &str) {
        info!(target: "banking_portal::auth", username, "Login succeeded");
    }

    pub fn login_failed(username: &str, ip: &str) {
        warn!(target: "banking_portal::auth", username, ip, "Login failed");
    }

    pub fn logged_out(username: &str) {
        info!(target: "banking_portal::auth", username, "Logged out");
    }

    pub fn security_violation(ip: &str, action: &str) {
        warn!(target: "banking_portal::security", ip, action, "Security violation");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_from_settings() {
        let settings = LogSettings {
            level: "debug".to_string(),
            directory: "var/log".to_string(),
            to_file: true,
        };
        let config = LogConfig::from(&settings);
        assert_eq!(config.level, "debug");
        assert_eq!(config.log_directory, "var/log");
        assert!(config.enable_file);
        assert!(config.enable_console);
    }

    #[test]
    fn test_unknown_level_falls_back_to_info() {
        let logger = EnhancedLogger::new(LogConfig {
            level: "loud".to_string(),
            ..LogConfig::default()
        });
        assert_eq!(logger.level(), Level::INFO);
    }

    #[test]
    fn test_init_is_idempotent() {
        let settings = LogSettings {
            level: "info".to_string(),
            directory: "logs".to_string(),
            to_file: false,
        };
        Logger::init(&settings);
        Logger::init(&settings);
    }
}
