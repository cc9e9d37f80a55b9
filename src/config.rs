use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub reader_threads: usize,
    /// Minimum similarity for approximate search results.
    pub fuzzy_threshold: f64,
    /// Reject status changes on orders that were already served or cancelled.
    pub strict_order_status: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            host: "127.0.0.1".into(),
            port: 3000,
            data_dir: PathBuf::from("prueba_nfs"),
            reader_threads: 4,
            fuzzy_threshold: 0.6,
            strict_order_status: false,
        }
    }
}

impl Settings {
    /// Defaults, overridden by an optional `cafeteria.toml` and then by
    /// `CAFETERIA_*` environment variables (e.g. `CAFETERIA_DATA_DIR`).
    pub fn load() -> Result<Settings, ConfigError> {
        Self::from_sources(
            File::with_name("cafeteria").required(false),
            Environment::with_prefix("CAFETERIA").try_parsing(true),
        )
    }

    fn from_sources(
        file: File<config::FileSourceFile, config::FileFormat>,
        env: Environment,
    ) -> Result<Settings, ConfigError> {
        let defaults = Settings::default();

        let settings: Settings = Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("data_dir", defaults.data_dir.to_string_lossy().into_owned())?
            .set_default("reader_threads", defaults.reader_threads as i64)?
            .set_default("fuzzy_threshold", defaults.fuzzy_threshold)?
            .set_default("strict_order_status", defaults.strict_order_status)?
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.fuzzy_threshold) {
            return Err(ConfigError::Message(format!(
                "fuzzy_threshold must be between 0 and 1, got {}",
                self.fuzzy_threshold
            )));
        }
        if self.reader_threads == 0 {
            return Err(ConfigError::Message("reader_threads must be at least 1".into()));
        }
        Ok(())
    }
}
