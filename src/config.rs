//! Application configuration.
//!
//! Loaded from a YAML file (`config/default.yaml` by default, override with
//! `POS_CONFIG_PATH`) and then overlaid with environment variables prefixed
//! `POS_` (e.g. `POS_DATABASE_URL`, `POS_JWT_SECRET`). The YAML file carries
//! the defaults that are safe to commit; secrets are expected to arrive via
//! environment overlay in every real deployment.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    /// Maximum number of distinct tenant pool handles cached at once before
    /// least-recently-used eviction kicks in (spec.md §9).
    pub max_cached_tenants: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/pos".to_string(),
            max_connections: 100,
            min_connections: 10,
            acquire_timeout_secs: 30,
            max_cached_tenants: 256,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "dev-secret-change-me".to_string(),
            jwt_expiry_hours: 24,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_dir: String,
    pub log_file: String,
    pub log_level: String,
    pub rotation: String,
    pub use_json: bool,
    pub enable_tracing: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            log_file: "pos-core.log".to_string(),
            log_level: "info".to_string(),
            rotation: "daily".to_string(),
            use_json: true,
            enable_tracing: true,
        }
    }
}

/// Stock threshold alerting and event-pipeline defaults (C3/C6/C7).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Minimum interval between repeat alerts for the same
    /// (tenant, store, item, alert_type) key. 0 disables cooldown.
    pub alert_cooldown_seconds: i64,
    /// TTL of an idempotency record once marked Completed.
    pub idempotency_ttl_seconds: i64,
    /// TTL of a Processing guard record (crash recovery window).
    pub idempotency_processing_ttl_seconds: i64,
    /// Max consumer retries before an event is dead-lettered.
    pub max_delivery_attempts: u32,
    /// Default deadline for external calls (spec.md §5).
    pub default_deadline_secs: u64,
    /// Cart session cache TTL (spec.md §3, 10h).
    pub cart_cache_ttl_hours: i64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            alert_cooldown_seconds: 60,
            idempotency_ttl_seconds: 3600,
            idempotency_processing_ttl_seconds: 30,
            max_delivery_attempts: 5,
            default_deadline_secs: 30,
            cart_cache_ttl_hours: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
    pub pipeline: PipelineConfig,
}

impl AppConfig {
    /// Load configuration from `path`, falling back to built-in defaults for
    /// any field the file omits, then apply `POS_*` environment overrides.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let mut config: AppConfig = match std::fs::read_to_string(path) {
            Ok(raw) => serde_yaml::from_str(&raw)?,
            Err(_) => AppConfig::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from the path named by `POS_CONFIG_PATH`, or `config/default.yaml`.
    pub fn load_default() -> anyhow::Result<Self> {
        let path =
            std::env::var("POS_CONFIG_PATH").unwrap_or_else(|_| "config/default.yaml".to_string());
        Self::load(&path)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("POS_DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = std::env::var("POS_JWT_SECRET") {
            self.auth.jwt_secret = v;
        }
        if let Ok(v) = std::env::var("POS_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = std::env::var("POS_PORT")
            && let Ok(port) = v.parse()
        {
            self.server.port = port;
        }
        if let Ok(v) = std::env::var("POS_LOG_LEVEL") {
            self.logging.log_level = v;
        }
    }

    pub fn default_deadline(&self) -> Duration {
        Duration::from_secs(self.pipeline.default_deadline_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable_without_a_file() {
        let config = AppConfig::load("/nonexistent/path/does-not-exist.yaml").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.pipeline.alert_cooldown_seconds, 60);
    }

    #[test]
    fn env_override_wins_over_file_defaults() {
        // SAFETY: test-local env var, not read concurrently by other tests in this module.
        unsafe {
            std::env::set_var("POS_JWT_SECRET", "from-env");
        }
        let config = AppConfig::load("/nonexistent/path/does-not-exist.yaml").unwrap();
        assert_eq!(config.auth.jwt_secret, "from-env");
        unsafe {
            std::env::remove_var("POS_JWT_SECRET");
        }
    }
}
