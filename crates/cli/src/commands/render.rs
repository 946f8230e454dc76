//! `chatrelay render`: Show the prompt a chat would send to the model.

use chatrelay_agent::PromptRenderer;
use chatrelay_config::AppConfig;
use chatrelay_core::message::ChatId;
use chatrelay_memory::ConversationStore;

pub async fn run(chat: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let store = ConversationStore::from_config(&config.chat)?;
    let renderer = PromptRenderer::from_config(&config.prompt);

    let chat = ChatId::from(chat);
    let history = store.get_history(&chat).await;
    println!("{}", renderer.render(&chat, &history));
    Ok(())
}
