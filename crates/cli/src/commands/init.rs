//! `uhh init`: first-time setup.

use std::io::{BufRead, Write};

use uhh_config::{AppConfig, BUILTIN_PROVIDERS, ConfigError, builtin_provider};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("uhh setup");
    println!("=========\n");

    println!("Available providers:");
    for (i, p) in BUILTIN_PROVIDERS.iter().enumerate() {
        println!("  {}. {} ({}, default model {})", i + 1, p.display_name, p.name, p.default_model);
    }
    println!();

    let choice = prompt_line("Provider [1]: ")?;
    let provider = resolve_provider_choice(&choice)
        .ok_or_else(|| format!("Unknown provider: {}", choice.trim()))?;
    let builtin = builtin_provider(provider).ok_or("Unknown provider")?;

    let api_key = prompt_line(&format!(
        "{} API key (leave empty to use ${}): ",
        builtin.display_name, builtin.key_env
    ))?;
    let model = prompt_line(&format!("Model [{}]: ", builtin.default_model))?;

    let mut config = if AppConfig::exists() {
        AppConfig::load_from(&AppConfig::config_path())?
    } else {
        AppConfig::default()
    };
    apply_setup(&mut config, provider, api_key.trim(), model.trim())?;

    let path = config.save()?;

    println!("\nConfiguration saved to {}", path.display());
    println!();
    println!("Default provider: {}", builtin.display_name);
    if let Some(settings) = config.active_provider() {
        println!("Model: {}", settings.model);
    }
    println!("Auto-approve: {}", config.agent.auto_approve);
    println!();
    println!("Run 'uhh <your prompt>' to get started!");
    println!("Run 'uhh init' to reconfigure at any time.");
    println!("Run 'uhh config models' to see available models.");

    Ok(())
}

/// Accept a 1-based index or a provider name; empty picks the first.
pub fn resolve_provider_choice(input: &str) -> Option<&'static str> {
    let input = input.trim();
    if input.is_empty() {
        return BUILTIN_PROVIDERS.first().map(|p| p.name);
    }
    if let Ok(index) = input.parse::<usize>() {
        return index
            .checked_sub(1)
            .and_then(|i| BUILTIN_PROVIDERS.get(i))
            .map(|p| p.name);
    }
    builtin_provider(&input.to_ascii_lowercase()).map(|p| p.name)
}

/// Make `provider` the enabled default with the given key and model.
pub fn apply_setup(
    config: &mut AppConfig,
    provider: &str,
    api_key: &str,
    model: &str,
) -> Result<(), ConfigError> {
    config.set("provider", provider)?;
    let settings = config
        .providers
        .get_mut(provider)
        .ok_or_else(|| ConfigError::ValidationError(format!("unknown provider: {provider}")))?;
    settings.enabled = true;
    if !api_key.is_empty() {
        settings.api_key = Some(api_key.to_string());
    }
    if !model.is_empty() {
        settings.model = model.to_string();
    }
    Ok(())
}

fn prompt_line(prompt: &str) -> std::io::Result<String> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_choice_by_index_or_name() {
        assert_eq!(resolve_provider_choice(""), Some("openai"));
        assert_eq!(resolve_provider_choice("2\n"), Some("gemini"));
        assert_eq!(resolve_provider_choice("DeepSeek"), Some("deepseek"));
        assert_eq!(resolve_provider_choice("0"), None);
        assert_eq!(resolve_provider_choice("42"), None);
        assert_eq!(resolve_provider_choice("anthropic"), None);
    }

    #[test]
    fn setup_enables_provider() {
        let mut config = AppConfig::default();
        apply_setup(&mut config, "glm", "zk-123", "").unwrap();
        assert_eq!(config.default_provider, "glm");
        let glm = &config.providers["glm"];
        assert!(glm.enabled);
        assert_eq!(glm.api_key.as_deref(), Some("zk-123"));
        assert_eq!(glm.model, "glm-4");
    }

    #[test]
    fn setup_keeps_key_when_empty() {
        let mut config = AppConfig::default();
        config.providers.get_mut("openai").unwrap().api_key = Some("sk-old".into());
        apply_setup(&mut config, "openai", "", "gpt-4o-mini").unwrap();
        let openai = &config.providers["openai"];
        assert_eq!(openai.api_key.as_deref(), Some("sk-old"));
        assert_eq!(openai.model, "gpt-4o-mini");
    }
}
