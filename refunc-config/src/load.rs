use std::path::Path;

use config::{ConfigBuilder, builder::DefaultState};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::environment::{Environment, EnvironmentError};

/// Directory holding `base.yaml` and the per-environment overlays, relative to
/// the working directory.
const CONFIGURATION_DIR: &str = "configuration";

const BASE_CONFIG_FILE: &str = "base.yaml";

/// `APP_LAMBDA__PORT=4575` sets `lambda.port`.
const ENV_PREFIX: &str = "APP";
const ENV_PREFIX_SEPARATOR: &str = "_";
const ENV_SEPARATOR: &str = "__";
const LIST_SEPARATOR: &str = ",";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to determine the working directory: {0}")]
    WorkingDir(#[from] std::io::Error),

    #[error(transparent)]
    Environment(#[from] EnvironmentError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

/// Top-level configuration types loadable with [`load_config`].
pub trait Config {
    /// Keys whose environment variable values are split on `,` into lists.
    const LIST_PARSE_KEYS: &'static [&'static str];

    /// `(key, value)` pairs applied after every other source.
    ///
    /// This is where plain variables of older deployments (`S3_ENDPOINT`,
    /// `PORT_LAMBDA`, ...) that predate the `APP_` scheme are mapped in.
    fn env_overrides() -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

/// Loads `T` from `./configuration` for the environment named by
/// `APP_ENVIRONMENT`.
///
/// Sources, later ones winning:
/// 1. `base.yaml`
/// 2. `{environment}.yaml`, if present
/// 3. `APP_`-prefixed environment variables
/// 4. [`Config::env_overrides`]
pub fn load_config<T>() -> Result<T, LoadError>
where
    T: Config + DeserializeOwned,
{
    let directory = std::env::current_dir()?.join(CONFIGURATION_DIR);
    let environment = Environment::load()?;

    Ok(load_config_from_dir(&directory, environment)?)
}

/// Same as [`load_config`] with an explicit directory and environment.
pub fn load_config_from_dir<T>(
    directory: &Path,
    environment: Environment,
) -> Result<T, config::ConfigError>
where
    T: Config + DeserializeOwned,
{
    let overlay = directory.join(format!("{environment}.yaml"));

    let builder = config::Config::builder()
        .add_source(config::File::from(directory.join(BASE_CONFIG_FILE)))
        .add_source(config::File::from(overlay).required(false))
        .add_source(prefixed_env_source::<T>());

    apply_overrides::<T>(builder)?
        .build()?
        .try_deserialize::<T>()
}

fn prefixed_env_source<T: Config>() -> config::Environment {
    let source = config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_PREFIX_SEPARATOR)
        .separator(ENV_SEPARATOR);

    if T::LIST_PARSE_KEYS.is_empty() {
        return source;
    }

    T::LIST_PARSE_KEYS.iter().fold(
        source.try_parsing(true).list_separator(LIST_SEPARATOR),
        |source, key| source.with_list_parse_key(key),
    )
}

fn apply_overrides<T: Config>(
    mut builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
    for (key, value) in T::env_overrides() {
        builder = builder.set_override(key, value)?;
    }

    Ok(builder)
}
