//! `uhh config`: configuration management commands.

use uhh_config::AppConfig;
use uhh_providers::ProviderFactory;

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    print!("{}", render_summary(&config));
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", AppConfig::config_path().display());
    Ok(())
}

pub async fn set(key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
    // Load the file without env overrides so they are not persisted
    let mut config = AppConfig::load_from(&AppConfig::config_path())?;
    let key = normalize_key(key);
    config.set(&key, value)?;
    config.save()?;

    match key.as_str() {
        "provider" => println!("Default provider set to: {value}"),
        "model" => println!("Model for {} set to: {value}", config.default_provider),
        "auto-approve" => println!("Auto-approve set to: {}", config.agent.auto_approve),
        _ => println!("{key} set to: {value}"),
    }
    Ok(())
}

pub async fn models(provider: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let name = provider.unwrap_or(&config.default_provider);
    let settings = config
        .providers
        .get(name)
        .ok_or_else(|| format!("Unknown provider: {name}"))?;

    eprintln!("Fetching models for {name}...");
    let provider = ProviderFactory::with_builtins().from_config(&config, Some(name))?;
    let models = provider
        .list_models()
        .await
        .map_err(|e| format!("Failed to fetch models: {e}"))?;

    println!("\nAvailable models for {name}:");
    println!("Current model: {}\n", settings.model);
    for model in &models {
        let marker = if *model == settings.model { "* " } else { "  " };
        println!("{marker}{model}");
    }
    println!("\nRun 'uhh config set model <name>' to switch.");
    Ok(())
}

/// Accept the spellings users reach for (`default_provider`, `auto_approve`, ...).
pub fn normalize_key(key: &str) -> String {
    match key.to_ascii_lowercase().replace('_', "-").as_str() {
        "default-provider" => "provider".into(),
        "autoapprove" => "auto-approve".into(),
        "maxiterations" => "max-iterations".into(),
        other => other.to_string(),
    }
}

pub fn render_summary(config: &AppConfig) -> String {
    let mut out = String::new();
    out.push_str(&format!("Default Provider: {}\n", config.default_provider));
    out.push_str(&format!("Auto-Approve: {}\n", config.agent.auto_approve));
    out.push_str(&format!("Max Iterations: {}\n", config.agent.max_iterations));
    out.push_str(&format!(
        "Enabled Tools: {}\n",
        config.agent.enabled_tools.join(", ")
    ));
    out.push_str("\nProviders:\n");
    for (name, settings) in &config.providers {
        let status = if settings.enabled { "enabled" } else { "disabled" };
        let key = if settings.has_api_key() { "key set" } else { "no key" };
        out.push_str(&format!(
            "  {name}: {status} ({key}, model: {})\n",
            settings.model
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_is_valid() {
        let path = AppConfig::config_path();
        assert!(path.to_str().unwrap().contains("config.toml"));
    }

    #[test]
    fn key_aliases() {
        assert_eq!(normalize_key("default_provider"), "provider");
        assert_eq!(normalize_key("AUTO_APPROVE"), "auto-approve");
        assert_eq!(normalize_key("autoapprove"), "auto-approve");
        assert_eq!(normalize_key("max_iterations"), "max-iterations");
        assert_eq!(normalize_key("model"), "model");
    }

    #[test]
    fn summary_hides_keys() {
        let mut config = AppConfig::default();
        config.providers.get_mut("openai").unwrap().api_key = Some("sk-secret".into());
        let summary = render_summary(&config);
        assert!(summary.starts_with("Default Provider: openai\n"));
        assert!(summary.contains("Enabled Tools: bash, file_read, file_write\n"));
        assert!(summary.contains("  openai: enabled (key set, model: gpt-4o)\n"));
        assert!(summary.contains("  gemini: disabled (no key, model: gemini-2.0-flash)\n"));
        assert!(!summary.contains("sk-secret"));
    }
}
