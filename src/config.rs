use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::embedding::ProviderCredentials;
use crate::util::write_json_pretty;

pub const CONFIG_DIR_NAME: &str = ".doc-coverage";
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const GEMINI_API_KEY_ENV: &str = "GOOGLE_API_KEY";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Settings persisted between runs by the `api` command.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

pub fn default_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("failed to locate the home directory")?;
    Ok(home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => default_config_path(),
    }
}

/// Missing file yields defaults; an unreadable JSON body is ignored with a warning.
pub fn load_config(path: &Path) -> Result<StoredConfig> {
    if !path.exists() {
        return Ok(StoredConfig::default());
    }

    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    match serde_json::from_slice::<StoredConfig>(&raw) {
        Ok(config) => Ok(config),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ignoring malformed config file");
            Ok(StoredConfig::default())
        }
    }
}

pub fn save_config(path: &Path, config: &StoredConfig) -> Result<()> {
    write_json_pretty(path, config)
}

/// First 8 and last 4 characters; short secrets are hidden completely.
pub fn mask_secret(secret: &str) -> String {
    let chars = secret.chars().collect::<Vec<char>>();
    if chars.len() <= 12 {
        return "*".repeat(chars.len().max(4));
    }
    let head = chars[..8].iter().collect::<String>();
    let tail = chars[chars.len() - 4..].iter().collect::<String>();
    format!("{head}...{tail}")
}

pub fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Gemini: flag, then `GOOGLE_API_KEY`, then the stored key. OpenAI: flag,
/// then `OPENAI_API_KEY`. Blank values count as absent.
pub fn resolve_credentials(
    gemini_flag: Option<&str>,
    openai_flag: Option<&str>,
    stored: &StoredConfig,
    env: impl Fn(&str) -> Option<String>,
) -> ProviderCredentials {
    let gemini_api_key = non_blank(gemini_flag.map(str::to_string))
        .or_else(|| non_blank(env(GEMINI_API_KEY_ENV)))
        .or_else(|| non_blank(stored.api_key.clone()));
    let openai_api_key =
        non_blank(openai_flag.map(str::to_string)).or_else(|| non_blank(env(OPENAI_API_KEY_ENV)));

    ProviderCredentials {
        gemini_api_key,
        openai_api_key,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let values = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<String, String>>();
        move |name: &str| values.get(name).cloned()
    }

    #[test]
    fn mask_secret_keeps_prefix_and_suffix_only() {
        assert_eq!(mask_secret("AIzaSyA1234567890abcd"), "AIzaSyA1...abcd");
        assert_eq!(mask_secret("short"), "*****");
        assert_eq!(mask_secret("ab"), "****");
    }

    #[test]
    fn config_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        assert_eq!(load_config(&path).expect("missing config loads"), StoredConfig::default());

        let config = StoredConfig {
            api_key: Some("stored-key".to_string()),
        };
        save_config(&path, &config).expect("config saves");
        assert_eq!(load_config(&path).expect("config loads"), config);
    }

    #[test]
    fn malformed_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "{ not json").expect("fixture writes");

        assert_eq!(load_config(&path).expect("config loads"), StoredConfig::default());
    }

    #[test]
    fn credentials_follow_flag_env_stored_precedence() {
        let stored = StoredConfig {
            api_key: Some("stored".to_string()),
        };

        let env = env_from(&[(GEMINI_API_KEY_ENV, "env")]);
        let creds = resolve_credentials(Some("flag"), None, &stored, &env);
        assert_eq!(creds.gemini_api_key.as_deref(), Some("flag"));

        let creds = resolve_credentials(None, None, &stored, &env);
        assert_eq!(creds.gemini_api_key.as_deref(), Some("env"));

        let blank = env_from(&[(GEMINI_API_KEY_ENV, "  ")]);
        let creds = resolve_credentials(None, None, &stored, blank);
        assert_eq!(creds.gemini_api_key.as_deref(), Some("stored"));
        assert_eq!(creds.openai_api_key, None);

        let openai = env_from(&[(OPENAI_API_KEY_ENV, "sk")]);
        let creds = resolve_credentials(None, None, &stored, openai);
        assert_eq!(creds.openai_api_key.as_deref(), Some("sk"));
    }
}
