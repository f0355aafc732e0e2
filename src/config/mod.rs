use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use thiserror::Error;


/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ConfigError> for crate::error::ApiError {
    fn from(err: ConfigError) -> Self {
        crate::error::ApiError::Configuration(err.to_string())
    }
}

/// Custom deserializer for comma-separated strings
fn deserialize_comma_separated<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    if s.is_empty() {
        Ok(Vec::new())
    } else {
        Ok(s.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    }
}

/// Application settings with environment variable support
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    // Document store
    pub database_url: Option<String>,
    pub database_name: Option<String>,

    // Cloud mirror (Google Drive)
    pub google_service_account_json: Option<String>,
    pub google_drive_folder_id: Option<String>,

    // Photo storage
    pub uploads_dir: String,
    pub max_upload_bytes: u64,

    // Server
    pub host: String,
    pub port: u16,
    #[serde(deserialize_with = "deserialize_comma_separated")]
    pub cors_allow_origins: Vec<String>,

    // Logging
    pub log_level: String,
    pub log_format: String,
}

impl Settings {
    /// Create new settings instance from environment variables and .env file
    pub fn new() -> Result<Self, ConfigError> {
        Self::new_with_env_file(true)
    }

    /// Create new settings instance with optional .env file loading
    pub fn new_with_env_file(load_env_file: bool) -> Result<Self, ConfigError> {
        // Tests mutate the process env; serialize reads so each build sees one snapshot
        static SETTINGS_BUILD_MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        let build_mutex = SETTINGS_BUILD_MUTEX.get_or_init(|| Mutex::new(()));
        let _guard = build_mutex
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        #[cfg(not(test))]
        {
            if load_env_file {
                dotenvy::dotenv().ok();
            }
        }
        #[cfg(test)]
        let _ = load_env_file;

        let mut builder = config::Config::builder()
            .set_default("database_url", None::<String>)?
            .set_default("database_name", None::<String>)?
            .set_default("google_service_account_json", None::<String>)?
            .set_default("google_drive_folder_id", None::<String>)?
            .set_default("uploads_dir", "uploads")?
            .set_default("max_upload_bytes", 52428800u64)? // 50MB
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8000u32)?
            .set_default("cors_allow_origins", "*")?
            .set_default("log_level", "INFO")?
            .set_default("log_format", "json")?;

        // Unset and empty values are both treated as absent
        fn read_env(key: &str) -> Option<String> {
            std::env::var(key).ok().filter(|v| !v.trim().is_empty())
        }

        if let Some(v) = read_env("DATABASE_URL") { builder = builder.set_override("database_url", v)?; }
        if let Some(v) = read_env("DATABASE_NAME") { builder = builder.set_override("database_name", v)?; }
        if let Some(v) = read_env("GOOGLE_SERVICE_ACCOUNT_JSON") { builder = builder.set_override("google_service_account_json", v)?; }
        if let Some(v) = read_env("GOOGLE_DRIVE_FOLDER_ID") { builder = builder.set_override("google_drive_folder_id", v)?; }
        if let Some(v) = read_env("UPLOADS_DIR") { builder = builder.set_override("uploads_dir", v)?; }
        if let Some(v) = read_env("HOST") { builder = builder.set_override("host", v)?; }
        if let Some(v) = read_env("CORS_ALLOW_ORIGINS") { builder = builder.set_override("cors_allow_origins", v)?; }
        if let Some(v) = read_env("LOG_LEVEL") { builder = builder.set_override("log_level", v)?; }
        if let Some(v) = read_env("LOG_FORMAT") { builder = builder.set_override("log_format", v)?; }

        // Numeric overrides
        if let Some(v) = read_env("PORT") {
            let port = v
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::Validation(format!("PORT must be a port number, got '{}'", v)))?;
            builder = builder.set_override("port", port as u32)?;
        }
        if let Some(v) = read_env("MAX_UPLOAD_BYTES") {
            let max_upload_bytes = v.trim().parse::<u64>().map_err(|_| {
                ConfigError::Validation(format!("MAX_UPLOAD_BYTES must be a byte count, got '{}'", v))
            })?;
            builder = builder.set_override("max_upload_bytes", max_upload_bytes)?;
        }

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.log_format.to_lowercase().as_str(), "json" | "plain" | "text") {
            return Err(ConfigError::Validation(
                "log_format must be 'json' or 'plain'".to_string(),
            ));
        }

        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Validation(
                "max_upload_bytes must be greater than 0".to_string(),
            ));
        }

        if self.port == 0 {
            return Err(ConfigError::Validation(
                "port must be greater than 0".to_string(),
            ));
        }

        if self.uploads_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "uploads_dir cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn uploads_path(&self) -> PathBuf {
        PathBuf::from(&self.uploads_dir)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
