//! Provider factory: builds the configured LLM provider by name.
//!
//! The factory is an explicit name → constructor map created at process
//! start and passed by reference to whoever needs a provider. Tests build
//! their own factory and register fakes next to (or instead of) the
//! built-in backends.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;
use uhh_config::{AppConfig, ProviderConfig, builtin_provider};
use uhh_core::error::ProviderError;
use uhh_core::provider::Provider;

use crate::openai_compat::OpenAiCompatProvider;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
const KIMI_BASE_URL: &str = "https://api.moonshot.cn/v1";
const KIMI_CODING_BASE_URL: &str = "https://api.kimi.com/coding/v1";

/// Builds a provider from its settings.
pub type ProviderConstructor =
    Box<dyn Fn(&ProviderConfig) -> Result<Arc<dyn Provider>, ProviderError> + Send + Sync>;

/// Name → constructor map for LLM providers.
pub struct ProviderFactory {
    constructors: BTreeMap<String, ProviderConstructor>,
}

impl ProviderFactory {
    /// An empty factory.
    pub fn new() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// A factory that knows every built-in provider.
    pub fn with_builtins() -> Self {
        let mut factory = Self::new();
        for name in ["openai", "gemini", "deepseek", "kimi", "glm"] {
            factory.register(name, move |config| build_builtin(name, config));
        }
        factory
    }

    /// Register (or replace) a constructor.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn(&ProviderConfig) -> Result<Arc<dyn Provider>, ProviderError> + Send + Sync + 'static,
    {
        self.constructors.insert(name.into(), Box::new(constructor));
    }

    pub fn has(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered provider names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    /// Build the provider registered under `name`.
    pub fn create(
        &self,
        name: &str,
        config: &ProviderConfig,
    ) -> Result<Arc<dyn Provider>, ProviderError> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| ProviderError::NotConfigured(format!("unknown provider: {name}")))?;
        debug!(provider = name, model = %config.model, "Creating provider");
        constructor(config)
    }

    /// Build `name` (or the configured default) from the app configuration.
    pub fn from_config(
        &self,
        config: &AppConfig,
        name: Option<&str>,
    ) -> Result<Arc<dyn Provider>, ProviderError> {
        let name = name.unwrap_or(&config.default_provider);
        let settings = config.providers.get(name).ok_or_else(|| {
            ProviderError::NotConfigured(format!("no settings for provider: {name}"))
        })?;
        self.create(name, settings)
    }
}

impl Default for ProviderFactory {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// The endpoint a built-in provider uses when none is configured.
///
/// Kimi keys issued for the coding plan (and the coding models) live on
/// a separate endpoint.
pub fn default_base_url(name: &str, api_key: &str, model: &str) -> Option<&'static str> {
    match name {
        "openai" => Some(OPENAI_BASE_URL),
        "gemini" => Some(GEMINI_BASE_URL),
        "kimi" if model.starts_with("kimi-coding") || api_key.starts_with("sk-kimi-") => {
            Some(KIMI_CODING_BASE_URL)
        }
        "kimi" => Some(KIMI_BASE_URL),
        _ => builtin_provider(name).and_then(|p| p.base_url),
    }
}

fn build_builtin(name: &str, config: &ProviderConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let builtin = builtin_provider(name)
        .ok_or_else(|| ProviderError::NotConfigured(format!("unknown provider: {name}")))?;

    let api_key = match config.api_key.as_deref() {
        Some(key) if !key.is_empty() => key,
        _ => {
            return Err(ProviderError::NotConfigured(format!(
                "{} has no API key (set {} or run `uhh init`)",
                builtin.display_name, builtin.key_env
            )));
        }
    };

    let model = if config.model.is_empty() {
        builtin.default_model
    } else {
        config.model.as_str()
    };

    let base_url = match config.base_url.as_deref() {
        Some(url) if !url.is_empty() => url,
        _ => default_base_url(name, api_key, model).ok_or_else(|| {
            ProviderError::NotConfigured(format!("{name} has no base URL configured"))
        })?,
    };

    let provider = OpenAiCompatProvider::new(name, base_url, api_key, model)
        .with_max_tokens(config.max_tokens)
        // Kimi rejects the standard tool schema
        .with_tool_calling(name != "kimi");

    Ok(Arc::new(provider))
}
