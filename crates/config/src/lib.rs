//! Configuration loading, validation, and management for uhh.
//!
//! Loads configuration from `~/.uhh/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A provider uhh knows how to reach out of the box.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinProvider {
    pub name: &'static str,
    pub display_name: &'static str,
    pub default_model: &'static str,
    /// `None` means the provider's own well-known endpoint
    pub base_url: Option<&'static str>,
    /// Environment variable holding the API key
    pub key_env: &'static str,
}

pub const BUILTIN_PROVIDERS: &[BuiltinProvider] = &[
    BuiltinProvider {
        name: "openai",
        display_name: "OpenAI",
        default_model: "gpt-4o",
        base_url: None,
        key_env: "OPENAI_API_KEY",
    },
    BuiltinProvider {
        name: "gemini",
        display_name: "Google Gemini",
        default_model: "gemini-2.0-flash",
        base_url: None,
        key_env: "GOOGLE_API_KEY",
    },
    BuiltinProvider {
        name: "deepseek",
        display_name: "DeepSeek",
        default_model: "deepseek-chat",
        base_url: Some("https://api.deepseek.com/v1"),
        key_env: "DEEPSEEK_API_KEY",
    },
    BuiltinProvider {
        name: "kimi",
        display_name: "Kimi (Moonshot)",
        default_model: "kimi-coding/k2p5",
        base_url: None,
        key_env: "MOONSHOT_API_KEY",
    },
    BuiltinProvider {
        name: "glm",
        display_name: "GLM (Zhipu AI)",
        default_model: "glm-4",
        base_url: Some("https://open.bigmodel.cn/api/paas/v4"),
        key_env: "GLM_API_KEY",
    },
];

/// Look up a built-in provider by name.
pub fn builtin_provider(name: &str) -> Option<&'static BuiltinProvider> {
    BUILTIN_PROVIDERS.iter().find(|p| p.name == name)
}

/// The root configuration structure.
///
/// Maps directly to `~/.uhh/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Provider used when none is given on the command line
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Provider-specific configurations
    #[serde(default = "default_providers")]
    pub providers: BTreeMap<String, ProviderConfig>,

    /// Agent mode settings
    #[serde(default)]
    pub agent: AgentSettings,

    /// Shell detection and prompt settings
    #[serde(default)]
    pub shell: ShellSettings,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_iterations() -> u32 {
    10
}
fn default_enabled_tools() -> Vec<String> {
    vec!["bash".into(), "file_read".into(), "file_write".into()]
}
fn default_max_messages() -> usize {
    50
}
fn default_tool_timeout_secs() -> u64 {
    30
}
fn default_max_context_tokens() -> usize {
    1000
}

fn default_providers() -> BTreeMap<String, ProviderConfig> {
    BUILTIN_PROVIDERS
        .iter()
        .map(|p| (p.name.to_string(), ProviderConfig::builtin(p)))
        .collect()
}

/// Settings for one language model provider.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default)]
    pub model: String,

    /// OpenAI-compatible endpoint; built-in default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ProviderConfig {
    fn builtin(p: &BuiltinProvider) -> Self {
        Self {
            enabled: p.name == "openai",
            api_key: None,
            model: p.default_model.to_string(),
            base_url: p.base_url.map(String::from),
            temperature: default_temperature(),
            max_tokens: None,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("enabled", &self.enabled)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Agent mode settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    #[serde(default)]
    pub auto_approve: bool,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Tools offered to the model; empty disables agent mode by default
    #[serde(default = "default_enabled_tools")]
    pub enabled_tools: Vec<String>,

    /// Conversation window size
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,

    /// Timeout for each `bash` invocation
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            auto_approve: false,
            max_iterations: default_max_iterations(),
            enabled_tools: default_enabled_tools(),
            max_messages: default_max_messages(),
            tool_timeout_secs: default_tool_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellSettings {
    /// Force a shell instead of detecting one
    #[serde(rename = "override", default, skip_serializing_if = "Option::is_none")]
    pub override_shell: Option<String>,

    /// Attach small referenced files to simple-mode prompts
    #[serde(default)]
    pub append_file_context: bool,

    /// Size limit (approximate tokens) for attached file context
    #[serde(default = "default_max_context_tokens")]
    pub max_context_tokens: usize,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            override_shell: None,
            append_file_context: false,
            max_context_tokens: default_max_context_tokens(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.uhh/config.toml).
    ///
    /// Environment variables override the file:
    /// - `UHH_PROVIDER`, `UHH_MODEL`, `UHH_SHELL`, `UHH_AUTO_APPROVE`,
    ///   `UHH_APPEND_SMALL_CONTEXT`
    /// - one API key variable per built-in provider (`OPENAI_API_KEY`, ...)
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env_overrides(|key| std::env::var(key).ok().filter(|v| !v.is_empty()));
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    ///
    /// Built-in providers missing from the file are filled in with defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        for builtin in BUILTIN_PROVIDERS {
            config
                .providers
                .entry(builtin.name.to_string())
                .or_insert_with(|| ProviderConfig::builtin(builtin));
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup` (normally `std::env::var`).
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider) = lookup("UHH_PROVIDER") {
            self.default_provider = provider;
        }

        for builtin in BUILTIN_PROVIDERS {
            if let Some(key) = lookup(builtin.key_env)
                && let Some(settings) = self.providers.get_mut(builtin.name)
            {
                settings.api_key = Some(key);
            }
        }

        if let Some(model) = lookup("UHH_MODEL")
            && let Some(settings) = self.providers.get_mut(&self.default_provider)
        {
            settings.model = model;
        }

        if let Some(shell) = lookup("UHH_SHELL") {
            self.shell.override_shell = Some(shell);
        }

        if let Some(value) = lookup("UHH_AUTO_APPROVE") {
            self.agent.auto_approve = value == "1" || value == "true";
        }

        if let Some(value) = lookup("UHH_APPEND_SMALL_CONTEXT") {
            if value == "1" || value == "true" {
                self.shell.append_file_context = true;
            } else if let Ok(tokens) = value.parse::<usize>()
                && tokens > 0
            {
                self.shell.append_file_context = true;
                self.shell.max_context_tokens = tokens;
            }
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".uhh")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Whether a config file has been written yet.
    pub fn exists() -> bool {
        Self::config_path().exists()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.providers.contains_key(&self.default_provider) {
            return Err(ConfigError::ValidationError(format!(
                "default provider '{}' is not configured",
                self.default_provider
            )));
        }

        for (name, provider) in &self.providers {
            if !(0.0..=2.0).contains(&provider.temperature) {
                return Err(ConfigError::ValidationError(format!(
                    "providers.{name}.temperature must be between 0.0 and 2.0"
                )));
            }
        }

        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be at least 1".into(),
            ));
        }
        if self.agent.max_messages == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_messages must be at least 1".into(),
            ));
        }
        if self.agent.tool_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "agent.tool_timeout_secs must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Write the configuration to `~/.uhh/config.toml`.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::config_path();
        self.save_to(&path)?;
        Ok(path)
    }

    /// Write the configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_error = |e: std::io::Error| ConfigError::WriteError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(write_error)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(write_error)?;

        // The file holds API keys
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
                .map_err(write_error)?;
        }

        tracing::debug!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Change a single setting by its command-line key.
    ///
    /// Keys: `provider`, `model` (of the default provider), `auto-approve`,
    /// `max-iterations`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "provider" => {
                if !self.providers.contains_key(value) {
                    return Err(ConfigError::ValidationError(format!(
                        "unknown provider '{value}'"
                    )));
                }
                self.default_provider = value.to_string();
                if let Some(settings) = self.providers.get_mut(value) {
                    settings.enabled = true;
                }
            }
            "model" => {
                let provider = self.default_provider.clone();
                let settings = self.providers.get_mut(&provider).ok_or_else(|| {
                    ConfigError::ValidationError(format!("unknown provider '{provider}'"))
                })?;
                settings.model = value.to_string();
            }
            "auto-approve" => {
                self.agent.auto_approve = parse_bool(value).ok_or_else(|| {
                    ConfigError::ValidationError(format!("expected true or false, got '{value}'"))
                })?;
            }
            "max-iterations" => {
                let max: u32 = value.parse().map_err(|_| {
                    ConfigError::ValidationError(format!("expected a number, got '{value}'"))
                })?;
                if max == 0 {
                    return Err(ConfigError::ValidationError(
                        "max-iterations must be at least 1".into(),
                    ));
                }
                self.agent.max_iterations = max;
            }
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    /// Settings of the provider used by default.
    pub fn active_provider(&self) -> Option<&ProviderConfig> {
        self.providers.get(&self.default_provider)
    }

    /// Generate a default config TOML string (for `init`).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            providers: default_providers(),
            agent: AgentSettings::default(),
            shell: ShellSettings::default(),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Get the user's home directory.
pub fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Failed to write config file at {path}: {reason}")]
    WriteError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Unknown config key '{0}' (expected provider, model, auto-approve, max-iterations)")]
    UnknownKey(String),
}
