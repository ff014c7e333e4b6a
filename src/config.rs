use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub admin: AdminConfig,

    pub live: LiveConfig,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,

    /// Snapshot fan-out buffer size (default: 64)
    pub snapshot_buffer_size: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/audix-admin.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
            snapshot_buffer_size: 64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Whether to set the Secure flag on session cookies.
    /// Default: true for production safety. Set to false for local development without HTTPS.
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 4070,
            cors_allowed_origins: vec![
                "http://localhost:4070".to_string(),
                "http://127.0.0.1:4070".to_string(),
            ],
            secure_cookies: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Shared admin secret. The process refuses to start when this is empty.
    pub password: String,

    /// Extended session lifetime for "remember me" logins, in days.
    pub remember_days: i64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            password: String::new(),
            remember_days: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    /// Base URL of the live routing service.
    pub base_url: String,

    /// Shared token sent as x-audix-live-token on snapshot fetches.
    pub token: String,

    /// Request timeout in seconds (default: 10)
    pub request_timeout_seconds: u32,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token: String::new(),
            request_timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations) - higher = more CPU work
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,

    /// Default setup-code lifetime in minutes when the caller does not pass one.
    pub setup_code_ttl_minutes: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            setup_code_ttl_minutes: 60,
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
            admin: AdminConfig::default(),
            live: LiveConfig::default(),
            security: SecurityConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let path = Self::config_path();
        if path.exists() {
            info!("Loading config from: {}", path.display());
            return Self::load_from_path(&path);
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    fn config_path() -> PathBuf {
        std::env::var("AUDIX_ADMIN_CONFIG")
            .map_or_else(|_| PathBuf::from("config.toml"), PathBuf::from)
    }

    /// Boot-time validation. Any failure here is fatal: the process must
    /// refuse to start rather than run without an admin secret or with an
    /// unusable live-routing endpoint.
    pub fn validate(&self) -> Result<()> {
        if self.admin.password.is_empty() {
            anyhow::bail!("admin.password must be set");
        }

        if self.live.base_url.is_empty() {
            anyhow::bail!("live.base_url must be set");
        }
        url::Url::parse(&self.live.base_url)
            .with_context(|| format!("Invalid live.base_url: {}", self.live.base_url))?;

        if self.live.token.is_empty() {
            anyhow::bail!("live.token must be set");
        }

        if self.live.request_timeout_seconds == 0 {
            anyhow::bail!("live.request_timeout_seconds must be > 0");
        }

        if self.general.max_db_connections < self.general.min_db_connections {
            anyhow::bail!("general.max_db_connections must be >= min_db_connections");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.admin.password = "secret".to_string();
        config.live.base_url = "http://localhost:4000".to_string();
        config.live.token = "token".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 4070);
        assert_eq!(config.admin.remember_days, 30);
        assert_eq!(config.security.setup_code_ttl_minutes, 60);
        assert_eq!(config.live.request_timeout_seconds, 10);
    }

    #[test]
    fn test_validate_requires_admin_password() {
        let mut config = valid_config();
        config.admin.password = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_live_url() {
        let mut config = valid_config();
        config.live.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [admin]
            password = "hunter2"

            [live]
            base_url = "http://routing:4000"
            token = "shared"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.admin.password, "hunter2");
        assert_eq!(config.live.base_url, "http://routing:4000");

        assert_eq!(config.general.max_db_connections, 5);
        assert!(config.validate().is_ok());
    }
}
