use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SlateConfig {
    pub azure: AzureConfig,
    pub database: DatabaseConfig,
    pub agent: AgentConfig,
}

/// Azure OpenAI connection settings. The API key is never written to the
/// config file by default; it comes from the environment or a prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AzureConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub api_version: String,
    pub deployment: String,
    pub temperature: f32,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: String::new(),
            api_version: "2025-01-01-preview".to_string(),
            deployment: "gpt-4o".to_string(),
            temperature: 0.2,
        }
    }
}

impl AzureConfig {
    /// Apply the environment variable overrides the original deployment used.
    #[must_use]
    pub fn resolved(mut self) -> Self {
        if let Ok(key) = std::env::var("AZURE_OPENAI_API_KEY")
            && !key.is_empty()
        {
            self.api_key = Some(key);
        }
        if let Ok(endpoint) = std::env::var("AZURE_OPENAI_ENDPOINT")
            && !endpoint.is_empty()
        {
            self.endpoint = endpoint;
        }
        if let Ok(version) = std::env::var("OPENAI_API_VERSION")
            && !version.is_empty()
        {
            self.api_version = version;
        }
        if let Ok(deployment) = std::env::var("OPENAI_DEPLOYMENT_NAME")
            && !deployment.is_empty()
        {
            self.deployment = deployment;
        }
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("student.db"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Row cap the system prompt asks the model to respect.
    pub top_k: usize,
    /// Backend round-trips allowed per user turn.
    pub max_tool_rounds: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            max_tool_rounds: 8,
        }
    }
}

impl SlateConfig {
    pub fn get_or_default() -> Self {
        let Ok(home_dir) = std::env::var("HOME") else {
            return SlateConfig::default();
        };

        let Ok(config_file) =
            std::fs::read_to_string(format!("{home_dir}/.config/slate/config.toml"))
        else {
            return SlateConfig::default();
        };
        toml::from_str(&config_file).unwrap_or_default()
    }
}
