//! Load configuration from XDG `config.toml` and project `.env`, apply it to the process
//! environment with priority **existing env > .env > XDG**, then read the typed
//! [`AgentSettings`] the CLI needs.
//!
//! The agent endpoint and id are required; the API token and version are optional.
//! Secret acquisition beyond "read a string from the environment" is out of scope.

mod env_file;
#[cfg(feature = "tracing-init")]
pub mod tracing_init;
mod xdg_toml;

use std::path::Path;
use thiserror::Error;

pub const ENDPOINT_KEY: &str = "AZURE_AI_ENDPOINT";
pub const AGENT_ID_KEY: &str = "AZURE_AI_AGENT_ID";
pub const API_KEY_KEY: &str = "AZURE_AI_API_KEY";
pub const API_VERSION_KEY: &str = "AZURE_AI_API_VERSION";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("xdg config path: {0}")]
    XdgPath(String),
    #[error("read xdg config: {0}")]
    XdgRead(std::io::Error),
    #[error("parse xdg toml: {0}")]
    XdgParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    Dotenv(String),
}

/// Loads `.env` and XDG `config.toml`, then sets environment variables only for keys
/// that are **not** already set.
///
/// * `app_name`: XDG directory name, e.g. `"agent-chat"` → `~/.config/agent-chat/config.toml`.
/// * `override_dir`: look for `.env` here instead of the current directory.
pub fn load_and_apply(app_name: &str, override_dir: Option<&Path>) -> Result<(), LoadError> {
    let xdg_map = xdg_toml::load_env_map(app_name)?;
    let dotenv_map = env_file::load_env_map(override_dir)?;

    let mut keys: std::collections::HashSet<&String> = xdg_map.keys().collect();
    keys.extend(dotenv_map.keys());

    for key in keys {
        if std::env::var_os(key).is_some() {
            continue;
        }
        if let Some(v) = dotenv_map.get(key).or_else(|| xdg_map.get(key)) {
            std::env::set_var(key, v);
        }
    }

    Ok(())
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SettingsError {
    #[error("missing configuration: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
}

/// Connection settings for the remote agent service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSettings {
    pub endpoint: String,
    pub agent_id: String,
    /// Bearer token passed through as-is.
    pub api_key: Option<String>,
    pub api_version: Option<String>,
}

impl AgentSettings {
    /// Reads settings through `lookup`. Blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let endpoint = get(ENDPOINT_KEY);
        let agent_id = get(AGENT_ID_KEY);
        match (endpoint, agent_id) {
            (Some(endpoint), Some(agent_id)) => Ok(Self {
                endpoint,
                agent_id,
                api_key: get(API_KEY_KEY),
                api_version: get(API_VERSION_KEY),
            }),
            (endpoint, agent_id) => {
                let mut missing = Vec::new();
                if endpoint.is_none() {
                    missing.push(ENDPOINT_KEY);
                }
                if agent_id.is_none() {
                    missing.push(AGENT_ID_KEY);
                }
                Err(SettingsError::Missing(missing))
            }
        }
    }

    /// Lines telling the user where the required settings can be provided.
    pub fn setup_instructions(app_name: &str) -> Vec<String> {
        vec![
            "Error: Missing configuration. Please set the agent endpoint and id:".to_string(),
            format!("  export {}=\"your-endpoint-url\"", ENDPOINT_KEY),
            format!("  export {}=\"your-agent-id\"", AGENT_ID_KEY),
            format!(
                "or put them in ./.env, or under [agent] (endpoint, agent_id) in ~/.config/{}/config.toml",
                app_name
            ),
        ]
    }
}
