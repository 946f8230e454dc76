//! `chatrelay init`: First-time setup.

use chatrelay_agent::prompt::DEFAULT_TEMPLATE;
use chatrelay_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("chatrelay: First-Time Setup");
    println!("============================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if !config_path.exists() {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created {}", config_path.display());
    } else {
        println!("  Config file exists: {}", config_path.display());
    }

    // Paths below honour whatever the (possibly pre-existing) config says
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let template_path = config.prompt.template_file();
    if !template_path.exists() {
        if let Some(parent) = template_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&template_path, DEFAULT_TEMPLATE)?;
        println!("✅ Created prompt template: {}", template_path.display());
    } else {
        println!("  Prompt template exists: {}", template_path.display());
    }

    let storage_dir = config.chat.storage_dir();
    if !storage_dir.exists() {
        std::fs::create_dir_all(&storage_dir)?;
        println!("✅ Created history directory: {}", storage_dir.display());
    } else {
        println!("  History directory exists: {}", storage_dir.display());
    }

    println!("\nDone. Edit {} to adjust the history bound.", config_path.display());
    Ok(())
}
