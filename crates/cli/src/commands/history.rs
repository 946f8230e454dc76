//! `chatrelay history`: Stored chat history commands.

use chatrelay_config::AppConfig;
use chatrelay_core::message::{ChatId, Message};
use chatrelay_memory::ConversationStore;

fn open_store() -> Result<ConversationStore, Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    Ok(ConversationStore::from_config(&config.chat)?)
}

pub async fn list() -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store()?;
    let chats = store.list_known_chats().await?;

    if chats.is_empty() {
        println!("   No stored history.");
        return Ok(());
    }

    println!("💬 Stored chats ({})", chats.len());
    for chat in &chats {
        let history = store.get_history(chat).await;
        let last = history
            .last()
            .map(|m| format!("{} {}", m.date, m.time).trim().to_string())
            .unwrap_or_default();
        println!("  {:<32} {:>4} messages  {last}", chat.as_str(), history.len());
    }

    Ok(())
}

pub async fn show(chat: &str, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store()?;
    let history = store.get_history(&ChatId::from(chat)).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }

    if history.is_empty() {
        println!("   No history for '{chat}'.");
        return Ok(());
    }

    for message in &history {
        println!(
            "[{} {}] {}: {}",
            message.date, message.time, message.sender, message.text
        );
    }

    Ok(())
}

pub async fn append(
    chat: &str,
    sender: String,
    text: String,
    date: String,
    time: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store()?;
    let report = store
        .append(&ChatId::from(chat), [Message::new(sender, text, date, time)])
        .await;

    for rejected in &report.rejected {
        println!("   ❌ Rejected: {}", rejected.error);
    }
    if report.appended == 0 {
        return Err("nothing appended".into());
    }

    println!(
        "   ✅ Appended to '{chat}' ({} retained, {} evicted)",
        report.retained, report.evicted
    );
    if let Some(e) = &report.persistence {
        println!("   ⚠️  Not persisted: {e}");
        return Err(e.clone().into());
    }

    Ok(())
}

pub async fn clear(chat: Option<&str>, confirm: bool) -> Result<(), Box<dyn std::error::Error>> {
    let target = chat.map_or_else(|| "ALL chats".to_string(), |c| format!("'{c}'"));
    if !confirm {
        println!("⚠️  This will delete the stored history of {target}.");
        println!("   Re-run with --confirm to proceed.");
        return Ok(());
    }

    let store = open_store()?;
    let chat = chat.map(ChatId::from);
    let report = store.clear(chat.as_ref()).await;

    println!("🗑️  Cleared {} chat(s)", report.cleared.len());
    for (chat, e) in &report.failures {
        println!("   ⚠️  {chat}: {e}");
    }
    if let Some(e) = &report.listing {
        println!("   ⚠️  Could not list stored chats: {e}");
    }

    if report.is_complete() {
        Ok(())
    } else {
        Err("history was only partially cleared".into())
    }
}
