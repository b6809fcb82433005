use std::path::Path;

use anyhow::{Result, bail};
use tracing::info;

use crate::cli::ApiArgs;
use crate::config::{load_config, mask_secret, resolve_config_path, save_config};

pub fn run(args: ApiArgs, config_path: Option<&Path>) -> Result<()> {
    let config_path = resolve_config_path(config_path)?;
    let message = apply(&args, &config_path)?;
    println!("{message}");
    Ok(())
}

/// `--show` wins over a key given in the same invocation.
pub(super) fn apply(args: &ApiArgs, config_path: &Path) -> Result<String> {
    let mut config = load_config(config_path)?;

    if args.show {
        return Ok(match config.api_key.as_deref() {
            Some(key) => format!("Configured API key: {}", mask_secret(key)),
            None => "No API key configured.".to_string(),
        });
    }

    let Some(key) = args.key.as_deref().map(str::trim).filter(|key| !key.is_empty()) else {
        bail!("provide an API key to store, or pass --show to display the stored one");
    };

    config.api_key = Some(key.to_string());
    save_config(config_path, &config)?;
    info!(path = %config_path.display(), key = %mask_secret(key), "stored API key");
    Ok("API key saved.".to_string())
}
