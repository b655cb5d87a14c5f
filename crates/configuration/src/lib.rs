use crate::error::ConfigError;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;
pub mod telemetry;

// Re-export the core types to provide a clean public API.
pub use settings::{
    AnalyticsSettings, AuthSettings, Config, DatabaseSettings, LogLevel, LoggingSettings,
    ServerSettings,
};
pub use telemetry::init_tracing;

const ENV_PREFIX: &str = "STOREFRONT";

/// Loads the application configuration.
///
/// Reads `config.toml` from the working directory when present, then applies
/// `STOREFRONT__SECTION__KEY` environment variables on top, and validates the result.
pub fn load_config() -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name("config").required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    finish(builder)
}

/// Loads the configuration from a TOML document without consulting the environment.
pub fn load_config_from_str(toml: &str) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;

    finish(builder)
}

fn finish(builder: config::Config) -> Result<Config, ConfigError> {
    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;
    Ok(config)
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "database.url must be set".to_string(),
            ));
        }
        if self.auth.session_secret.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "auth.session_secret must be set".to_string(),
            ));
        }
        if self.analytics.window_days == 0 {
            return Err(ConfigError::ValidationError(
                "analytics.window_days must be at least 1".to_string(),
            ));
        }
        if self.analytics.top_products_limit == 0 {
            return Err(ConfigError::ValidationError(
                "analytics.top_products_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
