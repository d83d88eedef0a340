use refunc_config::load_config;
use refunc_config::shared::RefuncConfig;

/// Loads the [`RefuncConfig`] and validates it.
pub fn load_refunc_config() -> anyhow::Result<RefuncConfig> {
    let config = load_config::<RefuncConfig>()?;
    config.validate()?;

    Ok(config)
}
