//! `chatrelay config`: Configuration management commands.

use chatrelay_agent::PromptTemplate;
use chatrelay_config::AppConfig;

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let mut warnings = Vec::new();

            let template_path = config.prompt.template_file();
            if let Err(e) = PromptTemplate::from_file(&template_path) {
                warnings.push(format!("Prompt template unusable, built-in will be used: {e}"));
            }

            let storage_dir = config.chat.storage_dir();
            if storage_dir.exists() && !storage_dir.is_dir() {
                warnings.push(format!(
                    "History path {} is not a directory",
                    storage_dir.display()
                ));
            }

            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Max history: {}", config.chat.max_history);
            println!("   History:     {}", storage_dir.display());
            println!("   Template:    {}", template_path.display());
            println!("   Assistant:   {}", config.prompt.assistant_name);
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}
