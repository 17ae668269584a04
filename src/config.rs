use crate::database::config::DatabaseConfig;
use crate::server::config::{LoggingConfig, ServerConfig};
use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

const ENV_PREFIX: &str = "SUBSCRIPTIONS";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `SUBSCRIPTIONS_DATABASE__URL` maps to `database.url`
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

impl Config {
    /// Defaults, then `config.yaml` in the working directory if present, then environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(Path::new("config.yaml"), environment())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::build(path.as_ref(), environment())
    }

    fn build(path: &Path, env: Environment) -> Result<Self, ConfigError> {
        let mut builder =
            ConfigBuilder::builder().add_source(config::Config::try_from(&Config::default())?);

        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        builder.add_source(env).build()?.try_deserialize()
    }
}
