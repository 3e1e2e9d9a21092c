use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable that overrides `backend.api_key`.
pub const API_KEY_ENV: &str = "VOLTSHOP_BACKEND_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub backend: BackendConfig,

    pub storage: StorageConfig,

    pub auth: AuthConfig,

    pub catalog: CatalogConfig,

    pub contact: ContactConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Only used by the `sqlite` backend.
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/voltshop.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Set to false for local development without HTTPS.
    pub secure_cookies: bool,

    pub session_minutes: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 8787,
            cors_allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            secure_cookies: true,
            session_minutes: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Local SQLite database, local file storage and local accounts.
    Sqlite,
    /// Hosted data service speaking the PostgREST/storage/auth HTTP APIs.
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,

    /// Project base URL of the hosted data service, e.g. `https://xyz.example.co`.
    pub url: String,

    /// Public (anon) API key sent as `apikey` and bearer token.
    pub api_key: String,

    pub request_timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Sqlite,
            url: String::new(),
            api_key: String::new(),
            request_timeout_seconds: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory for the local object store.
    pub local_path: String,

    /// URL prefix the local object store is served under.
    pub public_base_url: String,

    pub images_bucket: String,

    pub datasheets_bucket: String,

    /// Largest accepted upload in MiB.
    pub max_upload_mb: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            local_path: "data/storage".to_string(),
            public_base_url: "/storage".to_string(),
            images_bucket: "images".to_string(),
            datasheets_bucket: "datasheets".to_string(),
            max_upload_mb: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub allow_signup: bool,

    /// Minimum password length accepted by the local account store.
    pub min_password_length: usize,

    /// Argon2 memory cost in KiB for local accounts.
    pub argon2_memory_cost_kib: u32,

    pub argon2_time_cost: u32,

    pub argon2_parallelism: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            allow_signup: true,
            min_password_length: 6,
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SlugStyle {
    /// Lowercase and replace only the first space, matching slugs already stored.
    #[default]
    Legacy,
    /// Lowercase and replace every run of whitespace.
    Full,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub slug_style: SlugStyle,

    pub search_min_chars: usize,

    /// Populate the catalog store when the server starts.
    pub preload_categories: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            slug_style: SlugStyle::Legacy,
            search_min_chars: 3,
            preload_categories: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactConfig {
    /// International number, digits only. Empty disables the product contact link.
    pub phone_number: String,

    /// `{title}` is replaced by the product title.
    pub message_template: String,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            phone_number: String::new(),
            message_template: "Hello, I'm interested in {title}".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            backend: BackendConfig::default(),
            storage: StorageConfig::default(),
            auth: AuthConfig::default(),
            catalog: CatalogConfig::default(),
            contact: ContactConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });
        config.apply_env();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV)
            && !key.is_empty()
        {
            self.backend.api_key = key;
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("voltshop").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".voltshop").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            Self::default().save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.backend.kind == BackendKind::Remote {
            if self.backend.url.is_empty() {
                anyhow::bail!("backend.url cannot be empty for the remote backend");
            }
            url::Url::parse(&self.backend.url).context("backend.url is not a valid URL")?;
            if self.backend.api_key.is_empty() {
                anyhow::bail!("backend.api_key (or {API_KEY_ENV}) must be set for the remote backend");
            }
        }

        if self.catalog.search_min_chars == 0 {
            anyhow::bail!("catalog.search_min_chars must be at least 1");
        }

        if self.storage.images_bucket.is_empty() || self.storage.datasheets_bucket.is_empty() {
            anyhow::bail!("storage bucket names cannot be empty");
        }

        if !self.contact.phone_number.chars().all(|c| c.is_ascii_digit()) {
            anyhow::bail!("contact.phone_number must contain digits only");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.backend.kind, BackendKind::Sqlite);
        assert_eq!(config.catalog.search_min_chars, 3);
        assert_eq!(config.catalog.slug_style, SlugStyle::Legacy);
        assert_eq!(config.storage.images_bucket, "images");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[backend]"));
        assert!(toml_str.contains("[contact]"));
        assert!(toml_str.contains("kind = \"sqlite\""));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [backend]
            kind = "remote"
            url = "https://project.example.co"
            api_key = "anon"

            [catalog]
            slug_style = "full"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.backend.kind, BackendKind::Remote);
        assert_eq!(config.catalog.slug_style, SlugStyle::Full);
        assert_eq!(config.general.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_remote_backend_requires_url() {
        let mut config = Config::default();
        config.backend.kind = BackendKind::Remote;
        assert!(config.validate().is_err());

        config.backend.url = "https://project.example.co".to_string();
        assert!(config.validate().is_err());

        config.backend.api_key = "anon".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_phone_number_must_be_digits() {
        let mut config = Config::default();
        config.contact.phone_number = "+20 100".to_string();
        assert!(config.validate().is_err());
    }
}
