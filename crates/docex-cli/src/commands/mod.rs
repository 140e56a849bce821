//! CLI subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod process;

use std::path::{Path, PathBuf};

use tracing::debug;

use docex_core::models::DocexConfig;

/// Location of the user configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docex")
        .join("config.json")
}

/// Load the configuration from `path`, the default location, or built-in defaults.
pub fn load_config(path: Option<&str>) -> anyhow::Result<DocexConfig> {
    if let Some(path) = path {
        debug!("Loading config from {}", path);
        return Ok(DocexConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Loading config from {}", default_path.display());
        Ok(DocexConfig::from_file(&default_path)?)
    } else {
        Ok(DocexConfig::default())
    }
}

/// Pick the API key from the command line or the configured environment variable.
pub fn resolve_api_key(flag: Option<String>, config: &DocexConfig) -> anyhow::Result<String> {
    flag.filter(|k| !k.trim().is_empty())
        .or_else(|| {
            std::env::var(&config.llm.api_key_env)
                .ok()
                .filter(|k| !k.trim().is_empty())
        })
        .ok_or_else(|| {
            anyhow::anyhow!(
                "No API key provided. Pass --api-key or set {}.",
                config.llm.api_key_env
            )
        })
}

/// Split a user-supplied field list, trimming names and dropping empties.
pub fn clean_field_list(raw: &[String]) -> Option<Vec<String>> {
    let fields: Vec<String> = raw
        .iter()
        .flat_map(|s| s.split(','))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    (!fields.is_empty()).then_some(fields)
}
