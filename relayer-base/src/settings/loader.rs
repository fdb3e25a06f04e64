//! Load a settings object from the config locations.

use std::{
    env,
    fmt::Debug,
    path::{Path, PathBuf},
};

use config::{Config, Environment, File};
use eyre::{eyre, Context, Result};
use serde::de::DeserializeOwned;

/// Directory scanned for `*.json` config files
pub const CONFIG_DIR: &str = "./config";

/// Deserialize a settings object from the configs.
pub fn load_settings<T>() -> Result<T>
where
    T: DeserializeOwned + Debug,
{
    let config_file_paths: Vec<PathBuf> = env::var("CONFIG_FILES")
        .map(|s| s.split(',').map(PathBuf::from).collect())
        .unwrap_or_default();
    load_settings_from(Path::new(CONFIG_DIR), &config_file_paths, true)
}

/// Deserialize a settings object from the json files of `config_dir`, then
/// `config_files`, then optionally the `RELAYER__` environment.
pub fn load_settings_from<T>(
    config_dir: &Path,
    config_files: &[PathBuf],
    with_environment: bool,
) -> Result<T>
where
    T: DeserializeOwned + Debug,
{
    let mut config_sources = vec![];
    let mut builder = Config::builder();

    if let Ok(entries) = config_dir.read_dir() {
        let mut paths = entries
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.is_file() && path.extension() == Some("json".as_ref()))
            .collect::<Vec<_>>();
        paths.sort();
        for path in paths {
            config_sources.push(format!("{path:?}"));
            builder = builder.add_source(File::from(path));
        }
    }

    for p in config_files {
        if p.is_file() {
            if p.extension() == Some("json".as_ref()) {
                config_sources.push(format!("{p:?}"));
                builder = builder.add_source(File::from(p.as_path()));
            } else {
                return Err(eyre!(
                    "Provided config path via CONFIG_FILES is of an unsupported type ({p:?})"
                ));
            }
        } else if !p.exists() {
            return Err(eyre!(
                "Provided config path via CONFIG_FILES does not exist ({p:?})"
            ));
        } else {
            return Err(eyre!(
                "Provided config path via CONFIG_FILES is not a file ({p:?})"
            ));
        }
    }

    if with_environment {
        builder = builder.add_source(Environment::with_prefix("RELAYER").separator("__"));
    }

    let config_deserializer = builder
        .build()
        .context("Failed to load config sources")?;

    let settings = config_deserializer
        .try_deserialize::<T>()
        .with_context(|| format!("Config deserialization error, loaded from {config_sources:?}"))?;
    tracing::debug!(?settings, "Loaded settings");
    Ok(settings)
}
