use config::{Config, Environment, File};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

use crate::error::{ServiceError, ServiceResult};

/// Environment variable consulted when `completion.api_key` is not configured.
pub const API_KEY_ENV_VAR: &str = "GROQ_API_KEY";

/// Application configuration, fixed at startup
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_server")]
    pub server: ServerConfig,

    #[serde(default = "default_completion")]
    pub completion: CompletionConfig,

    #[serde(default = "default_samples")]
    pub samples: SamplesConfig,

    #[serde(default = "default_limits")]
    pub limits: LimitsConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Hosted chat-completion endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionConfig {
    /// OpenAI-compatible API root; `/chat/completions` is appended.
    #[serde(default = "default_completion_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default)]
    pub api_key: Option<ApiKey>,

    /// Unset means the HTTP client's own defaults apply.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl CompletionConfig {
    /// Resolve the credential for a request: the configured key, else `GROQ_API_KEY`.
    pub fn resolve_api_key(&self) -> Option<ApiKey> {
        let present = |key: &ApiKey| !key.expose().trim().is_empty();
        self.api_key.clone().filter(present).or_else(|| {
            std::env::var(API_KEY_ENV_VAR)
                .ok()
                .map(ApiKey::new)
                .filter(present)
        })
    }
}

/// Bundled sample documents
#[derive(Debug, Clone, Deserialize)]
pub struct SamplesConfig {
    #[serde(default = "default_samples_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_sample_form_file")]
    pub form_file: String,

    #[serde(default = "default_sample_policy_file")]
    pub policy_file: String,
}

/// Size limits
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_document_size")]
    pub max_document_size_bytes: u64,
}

/// API credential. Never printed: `Debug` is redacted.
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey([redacted])")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            completion: default_completion(),
            samples: default_samples(),
            limits: default_limits(),
        }
    }
}

/// Load configuration from an optional `config.*` file and `IRB_ASSISTANT__*` env vars
pub fn load_config() -> ServiceResult<AppConfig> {
    Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(
            Environment::with_prefix("IRB_ASSISTANT")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| ServiceError::Config {
            message: format!("Failed to build config: {}", e),
        })?
        .try_deserialize()
        .map_err(|e| ServiceError::Config {
            message: format!("Failed to deserialize config: {}", e),
        })
}

// ==================== Default Value Functions ====================

fn default_server() -> ServerConfig {
    ServerConfig {
        host: default_host(),
        port: default_port(),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_completion() -> CompletionConfig {
    CompletionConfig {
        base_url: default_completion_url(),
        model: default_model(),
        temperature: default_temperature(),
        api_key: None,
        request_timeout_secs: None,
    }
}

fn default_completion_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_model() -> String {
    "mixtral-8x7b-32768".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_samples() -> SamplesConfig {
    SamplesConfig {
        dir: default_samples_dir(),
        form_file: default_sample_form_file(),
        policy_file: default_sample_policy_file(),
    }
}

fn default_samples_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/samples"))
}

fn default_sample_form_file() -> String {
    "irb_form.pdf".to_string()
}

fn default_sample_policy_file() -> String {
    "irb_policy.pdf".to_string()
}

fn default_limits() -> LimitsConfig {
    LimitsConfig {
        max_document_size_bytes: default_max_document_size(),
    }
}

fn default_max_document_size() -> u64 {
    20_971_520 // 20MB
}
