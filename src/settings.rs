use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Runtime settings: built-in defaults, then `cantodict.toml` in the working
/// directory if present, then `CANTODICT_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub database: PathBuf,
    pub parallel: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
            database: PathBuf::from("output/cantodict.sqlite"),
            parallel: true,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::from_config(
            Config::builder()
                .add_source(File::with_name("cantodict").required(false))
                .add_source(Environment::with_prefix("CANTODICT"))
                .build()
                .context("loading settings")?,
        )
    }

    fn from_config(config: Config) -> Result<Self> {
        config.try_deserialize().context("invalid settings")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn defaults_when_nothing_is_set() {
        let settings = Settings::from_config(Config::builder().build().unwrap()).unwrap();
        assert_eq!(settings.data_dir, PathBuf::from("data"));
        assert_eq!(settings.database, PathBuf::from("output/cantodict.sqlite"));
        assert!(settings.parallel);
    }

    #[test]
    fn file_values_override_defaults() {
        let config = Config::builder()
            .add_source(File::from_str(
                "output_dir = \"out\"\nparallel = false",
                FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let settings = Settings::from_config(config).unwrap();
        assert_eq!(settings.output_dir, PathBuf::from("out"));
        assert_eq!(settings.data_dir, PathBuf::from("data"));
        assert!(!settings.parallel);
    }
}
