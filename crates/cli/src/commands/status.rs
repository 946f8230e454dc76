//! `chatrelay status`: Show resolved configuration and history summary.

use chatrelay_agent::PromptRenderer;
use chatrelay_config::AppConfig;
use chatrelay_memory::ConversationStore;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let store = ConversationStore::from_config(&config.chat)?;
    let renderer = PromptRenderer::from_config(&config.prompt);

    println!("chatrelay Status");
    println!("================");
    println!("  Config dir:    {}", AppConfig::config_dir().display());
    println!("  History dir:   {}", config.chat.storage_dir().display());
    println!("  Max history:   {}", store.max_history());
    println!("  Backend:       {}", store.backend_name());
    println!("  Template:      {}", renderer.template().source());
    println!("  Assistant:     {}", config.prompt.assistant_name);

    match store.list_known_chats().await {
        Ok(chats) => println!("  Known chats:   {}", chats.len()),
        Err(e) => println!("  Known chats:   ⚠️  {e}"),
    }

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file: run `chatrelay init` first");
    }

    Ok(())
}
