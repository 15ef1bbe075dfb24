// Process settings with layered configuration (defaults, file, env)

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::ScheduleError;

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub scheduler: SchedulerConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// IANA timezone the weekly trigger is evaluated in
    pub timezone: String,
}

impl SchedulerConfig {
    pub fn tz(&self) -> Result<chrono_tz::Tz, ScheduleError> {
        self.timezone
            .parse()
            .map_err(|_| ScheduleError::InvalidTimezone(self.timezone.clone()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Device configuration JSON file
    pub config_file: PathBuf,
    /// Flat run log appended by the runner and the script
    pub log_file: PathBuf,
    /// External reboot script invoked by the action runner
    pub reboot_script: PathBuf,
}

impl Settings {
    /// Load configuration with layered precedence: defaults → file → env
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let config = Config::builder()
            // Start with built-in defaults so the service runs with no files at all
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add local configuration (not committed to git)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("REBOOTER")
                    .separator("__")
                    .try_parsing(true),
            )
            // Bare PORT and TZ keep compatibility with the container deployment
            .set_override_option("server.port", std::env::var("PORT").ok())?
            .set_override_option("scheduler.timezone", std::env::var("TZ").ok())?
            .build()?;

        config.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port must be greater than 0".to_string());
        }

        if let Err(e) = self.scheduler.tz() {
            return Err(e.to_string());
        }

        if self.paths.config_file.as_os_str().is_empty() {
            return Err("Config file path cannot be empty".to_string());
        }
        if self.paths.log_file.as_os_str().is_empty() {
            return Err("Log file path cannot be empty".to_string());
        }
        if self.paths.reboot_script.as_os_str().is_empty() {
            return Err("Reboot script path cannot be empty".to_string());
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3333,
            },
            scheduler: SchedulerConfig {
                timezone: "Europe/Paris".to_string(),
            },
            paths: PathsConfig {
                config_file: PathBuf::from("/app/server/config.json"),
                log_file: PathBuf::from("/app/logs/rebooter.log"),
                reboot_script: PathBuf::from("/app/scripts/repeater_reboot.sh"),
            },
        }
    }
}
