use domain::models::{ActorRole, IdentityContext, ManagerId, OrganizationId};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub identity: IdentityConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the persistence API, e.g. https://fleet.example.com
    pub base_url: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Bearer token sent with every request
    #[serde(default)]
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    pub manager_id: ManagerId,

    #[serde(default)]
    pub organization_id: Option<OrganizationId>,

    #[serde(default)]
    pub role: ActorRole,
}

impl IdentityConfig {
    pub fn context(&self) -> IdentityContext {
        IdentityContext {
            manager_id: self.manager_id,
            organization_id: self.organization_id,
            role: self.role,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_timeout_ms() -> u64 {
    10_000
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with FD__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("FD").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// Defaults are embedded so tests do not depend on the config directory.
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [api]
            base_url = "http://localhost:8080"
            timeout_ms = 10000

            [identity]
            manager_id = 1
            role = "manager"

            [logging]
            level = "info"
            format = "json"
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        // Skip validation in tests to allow partial configs
        Ok(cfg)
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.api.base_url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "FD__API__BASE_URL environment variable must be set".to_string(),
            ));
        }

        if !(self.api.base_url.starts_with("http://") || self.api.base_url.starts_with("https://"))
        {
            return Err(ConfigValidationError::InvalidValue(
                "api.base_url must start with http:// or https://".to_string(),
            ));
        }

        if self.api.timeout_ms == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "api.timeout_ms cannot be 0".to_string(),
            ));
        }

        if self.identity.manager_id <= 0 {
            return Err(ConfigValidationError::InvalidValue(
                "identity.manager_id must be positive".to_string(),
            ));
        }

        if self.identity.role == ActorRole::Admin && self.identity.organization_id.is_none() {
            return Err(ConfigValidationError::MissingRequired(
                "identity.organization_id is required for admins".to_string(),
            ));
        }

        Ok(())
    }
}
