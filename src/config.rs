use crate::error::{AppError, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub runtracker: RunTrackerConfig,
    pub voter_analytics: VoterAnalyticsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
    pub media_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            static_dir: PathBuf::from("static"),
            media_dir: PathBuf::from("media"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/cs412.sqlite3"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub file_name: String,
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            file_name: "cs412.log".to_string(),
            filter: "cs412=info,tower_http=info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunTrackerConfig {
    /// Runs whose centers lie within this many meters count as nearby.
    pub proximity_threshold_meters: f64,
}

impl Default for RunTrackerConfig {
    fn default() -> Self {
        Self {
            proximity_threshold_meters: 500.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VoterAnalyticsConfig {
    pub page_size: usize,
}

impl Default for VoterAnalyticsConfig {
    fn default() -> Self {
        Self { page_size: 100 }
    }
}

impl Config {
    /// Loads `config.toml` (or `$CS412_CONFIG`) when present, then applies environment overrides.
    pub fn load() -> Result<Self> {
        let path = env::var("CS412_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = if Path::new(&path).exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        config.apply_env()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.voter_analytics.page_size == 0 {
            return Err(AppError::Config("voter_analytics.page_size must be positive".into()));
        }
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(host) = env::var("HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| AppError::Config(format!("PORT is not a valid port: {port}")))?;
        }
        if let Ok(path) = env::var("DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Ok(dir) = env::var("LOG_DIR") {
            self.logging.directory = PathBuf::from(dir);
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.runtracker.proximity_threshold_meters, 500.0);
        assert_eq!(config.voter_analytics.page_size, 100);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = Config::from_toml_str(
            r#"
            [server]
            port = 9000

            [runtracker]
            proximity_threshold_meters = 250.0
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.runtracker.proximity_threshold_meters, 250.0);
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let err = Config::from_toml_str("[voter_analytics]\npage_size = 0").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
