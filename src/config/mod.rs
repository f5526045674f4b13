use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub pages: PageConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    pub doctors_per_page: usize,
    pub specialties_per_page: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Overrides the directory holding `session.json`
    pub config_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set
    pub default_filter: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // API overrides
        if let Ok(v) = env::var("MEDICONNECT_API_URL") {
            let v = v.trim();
            if !v.is_empty() {
                self.api.base_url = v.trim_end_matches('/').to_string();
            }
        }
        if let Ok(v) = env::var("MEDICONNECT_TIMEOUT_SECS") {
            self.api.timeout_secs = v.parse().unwrap_or(self.api.timeout_secs);
        }

        // Page overrides; zero would make pagination meaningless
        if let Ok(v) = env::var("MEDICONNECT_DOCTORS_PER_PAGE") {
            self.pages.doctors_per_page = v
                .parse()
                .ok()
                .filter(|n: &usize| *n > 0)
                .unwrap_or(self.pages.doctors_per_page);
        }
        if let Ok(v) = env::var("MEDICONNECT_SPECIALTIES_PER_PAGE") {
            self.pages.specialties_per_page = v
                .parse()
                .ok()
                .filter(|n: &usize| *n > 0)
                .unwrap_or(self.pages.specialties_per_page);
        }

        // Storage overrides
        if let Ok(v) = env::var("MEDICONNECT_CONFIG_DIR") {
            if !v.trim().is_empty() {
                self.storage.config_dir = Some(PathBuf::from(v));
            }
        }

        if let Ok(v) = env::var("MEDICONNECT_LOG") {
            self.logging.default_filter = v;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                base_url: DEFAULT_API_URL.to_string(),
                timeout_secs: 30,
                user_agent: user_agent(),
            },
            pages: PageConfig::default(),
            storage: StorageConfig { config_dir: None },
            logging: LoggingConfig {
                default_filter: "mediconnect=debug,warn".to_string(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                base_url: DEFAULT_API_URL.to_string(),
                timeout_secs: 15,
                user_agent: user_agent(),
            },
            pages: PageConfig::default(),
            storage: StorageConfig { config_dir: None },
            logging: LoggingConfig {
                default_filter: "mediconnect=info,warn".to_string(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                base_url: DEFAULT_API_URL.to_string(),
                timeout_secs: 10,
                user_agent: user_agent(),
            },
            pages: PageConfig::default(),
            storage: StorageConfig { config_dir: None },
            logging: LoggingConfig {
                default_filter: "warn".to_string(),
            },
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::development()
    }
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            doctors_per_page: 4,
            specialties_per_page: 3,
        }
    }
}

fn user_agent() -> String {
    format!("mediconnect/{}", env!("CARGO_PKG_VERSION"))
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.api.base_url, DEFAULT_API_URL);
        assert_eq!(config.pages.doctors_per_page, 4);
        assert_eq!(config.pages.specialties_per_page, 3);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.environment, Environment::Production);
        assert!(config.api.timeout_secs < AppConfig::development().api.timeout_secs);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        env::set_var("MEDICONNECT_API_URL", "http://clinic.local:9000/");
        env::set_var("MEDICONNECT_DOCTORS_PER_PAGE", "0");
        env::set_var("MEDICONNECT_SPECIALTIES_PER_PAGE", "5");

        let config = AppConfig::development().with_env_overrides();

        env::remove_var("MEDICONNECT_API_URL");
        env::remove_var("MEDICONNECT_DOCTORS_PER_PAGE");
        env::remove_var("MEDICONNECT_SPECIALTIES_PER_PAGE");

        assert_eq!(config.api.base_url, "http://clinic.local:9000");
        assert_eq!(config.pages.doctors_per_page, 4);
        assert_eq!(config.pages.specialties_per_page, 5);
    }
}
