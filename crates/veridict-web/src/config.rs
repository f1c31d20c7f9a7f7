//! Configuration loading for Veridict.
//! Reads veridict.toml from the current directory or the path in the
//! VERIDICT_CONFIG env var. Every section has usable defaults, so the
//! server starts with no file at all.

use std::path::Path;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use veridict_common::{Result, VeridictError};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    3001
}
fn default_max_body_bytes() -> usize {
    64 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "openai" | "openai_compatible" | "ollama"
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Used by the ollama and openai_compatible backends.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Name of the env var holding the API key. The key itself never lives
    /// in the config file.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_backend() -> String {
    "openai".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_api_key_env() -> String {
    "VERIDICT_API_KEY".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            model: default_model(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
}

fn default_window_secs() -> u64 {
    60
}
fn default_max_requests() -> u32 {
    10
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            max_requests: default_max_requests(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "veridict.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Config {
    /// Load from VERIDICT_CONFIG or ./veridict.toml; defaults when absent.
    pub fn load() -> Result<Self> {
        let path =
            std::env::var("VERIDICT_CONFIG").unwrap_or_else(|_| "veridict.toml".to_string());
        Self::from_path(path)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| VeridictError::Config(format!("cannot read {}: {e}", path.display())))?;
        toml::from_str(&raw)
            .map_err(|e| VeridictError::Config(format!("cannot parse {}: {e}", path.display())))
    }

    /// API key resolved from the configured env var, if set.
    pub fn api_key(&self) -> Option<SecretString> {
        std::env::var(&self.llm.api_key_env)
            .ok()
            .filter(|v| !v.is_empty())
            .map(SecretString::from)
    }
}
