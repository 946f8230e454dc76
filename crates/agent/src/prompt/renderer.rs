//! Render a chat's history into the prompt sent to the model.

use chatrelay_config::PromptConfig;
use chatrelay_core::message::{ChatId, Message};
use chrono::{DateTime, Local, TimeZone};
use quick_xml::escape::escape;
use std::fmt::Display;

use super::template::{Placeholder, PromptTemplate, Segment};

/// Format of the `{current_datetime}` token.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d:%H-%M-%S:%Z";

/// Turns a chat identity and its history into a prompt string.
#[derive(Debug, Clone)]
pub struct PromptRenderer {
    template: PromptTemplate,
}

impl PromptRenderer {
    pub fn new(template: PromptTemplate) -> Self {
        Self { template }
    }

    /// Load the configured template once; falls back to the built-in one.
    pub fn from_config(config: &PromptConfig) -> Self {
        Self::new(PromptTemplate::load(&config.template_file()))
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// Render with the current local time.
    pub fn render(&self, chat: &ChatId, history: &[Message]) -> String {
        self.render_at(chat, history, &Local::now())
    }

    /// Render with an explicit timestamp.
    pub fn render_at<Tz>(&self, chat: &ChatId, history: &[Message], now: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let mut prompt = String::new();
        for segment in &self.template.segments {
            match segment {
                Segment::Literal(text) => prompt.push_str(text),
                Segment::Value(Placeholder::ChatName) => prompt.push_str(chat.as_str()),
                Segment::Value(Placeholder::ChatHistory) => prompt.push_str(&format_history(history)),
                Segment::Value(Placeholder::CurrentDatetime) => {
                    prompt.push_str(&now.format(DATETIME_FORMAT).to_string())
                }
            }
        }
        prompt
    }
}

/// One `<Message sender="…" date="…" time="…">text</Message>` line per
/// entry, oldest first. Attribute values are escaped; the text is verbatim.
pub fn format_history(history: &[Message]) -> String {
    history
        .iter()
        .map(|m| {
            format!(
                r#"<Message sender="{}" date="{}" time="{}">{}</Message>"#,
                escape(m.sender.as_str()),
                escape(m.date.as_str()),
                escape(m.time.as_str()),
                m.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
