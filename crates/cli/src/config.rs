use proto::ConfigError;
use serde::{Deserialize, Serialize};
use session::{DEFAULT_ERROR_NOTICE, DispatcherConfig, SessionOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_CATALOG_TIMEOUT_SECS: u64 = 20;
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 60;
const DEFAULT_PROVIDER_URL: &str = "http://localhost:5000/chat";

/// Inference backend kinds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Generic JSON endpoint taking `{prompt, options: {model}}`. Default.
    #[default]
    Http,
    /// OpenAI-compatible chat completions API.
    OpenAi,
}

impl ProviderKind {
    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::OpenAi => "openai",
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "openai" => Ok(Self::OpenAi),
            other => Err(format!("unknown provider kind '{other}'")),
        }
    }
}

/// Top-level CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Model directory configuration.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Inference backend configuration.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Dispatcher behaviour.
    #[serde(default)]
    pub session: SessionConfig,
}

fn default_catalog_timeout() -> u64 {
    DEFAULT_CATALOG_TIMEOUT_SECS
}

fn default_provider_timeout() -> u64 {
    DEFAULT_PROVIDER_TIMEOUT_SECS
}

fn default_provider_url() -> String {
    DEFAULT_PROVIDER_URL.to_string()
}

fn default_true() -> bool {
    true
}

fn default_error_notice() -> String {
    DEFAULT_ERROR_NOTICE.to_string()
}

/// Model directory config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Directory URL. Empty uses the built-in list.
    #[serde(default)]
    pub url: String,
    /// HTTP timeout for the directory request.
    #[serde(default = "default_catalog_timeout")]
    pub timeout_secs: u64,
    /// Select the first entry after loading when no model is active.
    #[serde(default = "default_true")]
    pub auto_select_first: bool,
    /// Model id preferred over the first entry.
    #[serde(default)]
    pub preferred_model: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_secs: default_catalog_timeout(),
            auto_select_first: true,
            preferred_model: String::new(),
        }
    }
}

impl CatalogConfig {
    /// Directory URL, or `None` for the built-in list.
    pub fn effective_url(&self) -> Option<&str> {
        let url = self.url.trim();
        (!url.is_empty()).then_some(url)
    }
}

/// Inference backend config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Backend kind: http | openai.
    #[serde(default)]
    pub kind: ProviderKind,
    /// Endpoint for the `http` kind.
    #[serde(default = "default_provider_url")]
    pub url: String,
    /// API base URL override for the `openai` kind.
    pub base_url: Option<String>,
    /// API key (env overrides applied at load time; see `Config::load`).
    #[serde(default)]
    pub api_key: String,
    /// HTTP timeout for a single call (`http` kind).
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            url: default_provider_url(),
            base_url: None,
            api_key: String::new(),
            timeout_secs: default_provider_timeout(),
        }
    }
}

/// Dispatcher config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Transcript notice shown when a request fails.
    #[serde(default = "default_error_notice")]
    pub error_notice: String,
    /// Per-request deadline in seconds. 0 disables it.
    #[serde(default)]
    pub request_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            error_notice: default_error_notice(),
            request_timeout_secs: 0,
        }
    }
}

impl Config {
    /// Loads configuration from explicit path, fallback locations, and env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = path.map(|p| p.to_path_buf()).or_else(|| {
            // Look in current dir, then home dir
            let cwd = std::env::current_dir().ok()?.join("config.toml");
            if cwd.exists() {
                return Some(cwd);
            }
            let home = std::env::var("HOME").ok()?;
            let home_config = PathBuf::from(home).join(".nexus").join("config.toml");
            if home_config.exists() {
                return Some(home_config);
            }
            None
        });
        debug!(path = ?config_path, "Config file resolved");

        let mut config = if let Some(path) = config_path {
            let content = std::fs::read_to_string(&path).map_err(ConfigError::Io)?;
            Self::from_toml(&content)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        debug!(
            catalog = config.catalog.effective_url().unwrap_or("builtin"),
            provider = %config.provider.kind.name(),
            preferred_model = %config.catalog.preferred_model,
            "Config loaded"
        );
        Ok(config)
    }

    /// Defaults with `NEXUS_*` overrides applied. Used when the config file
    /// cannot be loaded.
    pub fn fallback() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Parses a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Toml(e.to_string()))
    }

    // Environment variable overrides (highest priority)
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("NEXUS_CATALOG_URL") {
            self.catalog.url = url;
        }
        if let Ok(kind) = std::env::var("NEXUS_PROVIDER_KIND") {
            match kind.parse::<ProviderKind>() {
                Ok(kind) => self.provider.kind = kind,
                Err(e) => warn!(error = %e, "Ignoring NEXUS_PROVIDER_KIND"),
            }
        }
        if let Ok(url) = std::env::var("NEXUS_PROVIDER_URL") {
            self.provider.url = url;
        }
        if let Ok(key) = std::env::var("NEXUS_API_KEY") {
            self.provider.api_key = key;
        }
        if let Ok(model) = std::env::var("NEXUS_MODEL") {
            self.catalog.preferred_model = model;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.kind == ProviderKind::Http && self.provider.url.trim().is_empty() {
            return Err(ConfigError::MissingField("provider.url".to_string()));
        }
        if self.session.error_notice.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "session.error_notice".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Resolves the API key for the configured provider.
    ///
    /// Priority:
    /// 1. `provider.api_key` in config file (or `NEXUS_API_KEY` applied at load time)
    /// 2. `OPENAI_API_KEY` for the `openai` kind
    pub fn resolve_api_key(&self) -> String {
        if !self.provider.api_key.is_empty() {
            debug!(source = "config", "API key resolved");
            return self.provider.api_key.clone();
        }
        if self.provider.kind == ProviderKind::OpenAi
            && let Ok(key) = std::env::var("OPENAI_API_KEY")
        {
            debug!(source = "env", env_var = "OPENAI_API_KEY", "API key resolved");
            return key;
        }
        String::new()
    }

    /// Session options derived from `[catalog]` and `[session]`.
    pub fn session_options(&self) -> SessionOptions {
        let preferred = self.catalog.preferred_model.trim();
        SessionOptions {
            auto_select_first: self.catalog.auto_select_first,
            preferred_model: (!preferred.is_empty()).then(|| preferred.to_string()),
            dispatcher: DispatcherConfig {
                error_notice: self.session.error_notice.clone(),
                request_timeout: (self.session.request_timeout_secs > 0)
                    .then(|| Duration::from_secs(self.session.request_timeout_secs)),
            },
        }
    }
}
