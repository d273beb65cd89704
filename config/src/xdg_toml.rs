//! Load settings from `$XDG_CONFIG_HOME/<app>/config.toml`.
//!
//! Two tables are read: `[env]` (arbitrary env keys) and `[agent]` (the agent
//! connection, mapped onto its env keys). `[agent]` wins when both name a key.
//!
//! ```toml
//! [agent]
//! endpoint = "https://<resource>.services.ai.azure.com/api/projects/<project>"
//! agent_id = "asst_..."
//!
//! [env]
//! RUST_LOG = "agent_thread=debug"
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::{LoadError, AGENT_ID_KEY, API_KEY_KEY, API_VERSION_KEY, ENDPOINT_KEY};

fn config_home() -> Result<PathBuf, LoadError> {
    match std::env::var_os("XDG_CONFIG_HOME") {
        Some(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
        _ => dirs::config_dir()
            .ok_or_else(|| LoadError::XdgPath("no config directory for this platform".to_string())),
    }
}

fn xdg_config_path(app_name: &str) -> Result<Option<PathBuf>, LoadError> {
    let path = config_home()?.join(app_name).join("config.toml");
    Ok(path.is_file().then_some(path))
}

#[derive(Deserialize, Default)]
struct AgentSection {
    endpoint: Option<String>,
    agent_id: Option<String>,
    api_key: Option<String>,
    api_version: Option<String>,
}

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    env: HashMap<String, String>,
    #[serde(default)]
    agent: AgentSection,
}

impl ConfigFile {
    fn into_env_map(self) -> HashMap<String, String> {
        let mut out = self.env;
        let agent = [
            (ENDPOINT_KEY, self.agent.endpoint),
            (AGENT_ID_KEY, self.agent.agent_id),
            (API_KEY_KEY, self.agent.api_key),
            (API_VERSION_KEY, self.agent.api_version),
        ];
        for (key, value) in agent {
            if let Some(v) = value {
                out.insert(key.to_string(), v);
            }
        }
        out
    }
}

/// Env key-value pairs from the config file. A missing file yields an empty map.
pub fn load_env_map(app_name: &str) -> Result<HashMap<String, String>, LoadError> {
    let Some(path) = xdg_config_path(app_name)? else {
        return Ok(HashMap::new());
    };
    let content = std::fs::read_to_string(&path).map_err(LoadError::XdgRead)?;
    let config: ConfigFile = toml::from_str(&content)?;
    Ok(config.into_env_map())
}
