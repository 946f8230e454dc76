//! Recover user-facing messages from raw model output.
//!
//! Models are asked to answer with markup like
//!
//! ```text
//! <Response>
//!   <Message>Hi Ana!</Message>
//!   <Message>Your order ships tomorrow.</Message>
//! </Response>
//! ```
//!
//! but what comes back is free-form: prose around the markup, markup inside
//! fenced code blocks, several top-level elements, unescaped `&`, unclosed
//! tags. Extraction walks an ordered chain of [`Strategy`] values and keeps
//! the first non-empty result:
//!
//! 1. [`Strategy::FencedBlocks`]: structured parse of each ```` ```xml ```` or
//!    untagged fenced block that contains a tag pair, results concatenated.
//! 2. [`Strategy::WholeDocument`]: structured parse of the entire text.
//! 3. [`Strategy::TagScan`]: regex scan for literal `<Message>…</Message>`.
//!
//! Nothing here fails. A parse error is a strategy with no result, and an
//! empty list is a valid answer: the caller decides what to send instead
//! (usually the raw output itself).

mod markup;
mod strategy;

pub use markup::{normalize_root, parse_messages, MarkupError};
pub use strategy::{Strategy, StrategyOutcome};

use serde::Serialize;
use tracing::debug;

/// Element whose text is meant for the end user.
pub const MESSAGE_TAG: &str = "Message";

/// Synthetic root wrapped around candidates without a single outer element.
pub const ROOT_TAG: &str = "Response";

/// Extraction result with the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extraction {
    /// Trimmed, non-empty messages in discovery order
    pub messages: Vec<String>,

    /// Which strategy won; `None` when every strategy came up empty
    pub strategy: Option<Strategy>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Canonical single-string form: messages joined by newlines.
    pub fn joined(&self) -> Option<String> {
        (!self.messages.is_empty()).then(|| self.messages.join("\n"))
    }
}

/// Run the strategy chain and report which strategy won.
pub fn extract_detailed(raw: &str) -> Extraction {
    for strategy in Strategy::CHAIN {
        match strategy.attempt(raw) {
            StrategyOutcome::Found(messages) => {
                debug!(%strategy, count = messages.len(), "Extracted messages");
                return Extraction {
                    messages,
                    strategy: Some(strategy),
                };
            }
            StrategyOutcome::Empty => {
                debug!(%strategy, "Strategy found nothing");
            }
            StrategyOutcome::Malformed(e) => {
                debug!(%strategy, error = %e, "Strategy degraded on malformed markup");
            }
        }
    }

    Extraction {
        messages: Vec::new(),
        strategy: None,
    }
}

/// Extract the ordered user-facing messages from raw model output.
pub fn extract(raw: &str) -> Vec<String> {
    extract_detailed(raw).messages
}

/// Extract and join with newlines; `None` when nothing was found.
pub fn extract_text(raw: &str) -> Option<String> {
    extract_detailed(raw).joined()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_response() {
        let raw = "<Response><Message>Hi</Message><Message>Bye</Message></Response>";
        assert_eq!(extract(raw), vec!["Hi", "Bye"]);
    }

    #[test]
    fn fenced_block_wins_over_bare_markup() {
        let raw = "Here you go:\n```xml\n<Message>A</Message>\n```\nAlso <Message>B</Message>";
        let extraction = extract_detailed(raw);
        assert_eq!(extraction.messages, vec!["A"]);
        assert_eq!(extraction.strategy, Some(Strategy::FencedBlocks));
    }

    #[test]
    fn empty_fenced_block_falls_through_to_whole_text() {
        let raw = "```xml\n<Response><Message>  </Message></Response>\n```\n<Message>B</Message>";
        let extraction = extract_detailed(raw);
        assert_eq!(extraction.messages, vec!["B"]);
        assert_eq!(extraction.strategy, Some(Strategy::WholeDocument));
    }

    #[test]
    fn unclosed_markup_without_pair_yields_nothing() {
        let extraction = extract_detailed("<Message>Oops<Message>");
        assert!(extraction.is_empty());
        assert_eq!(extraction.strategy, None);
    }

    #[test]
    fn unclosed_markup_recovered_by_tag_scan() {
        let raw = "<Message>Oops</Message> <Message>broken";
        let extraction = extract_detailed(raw);
        assert_eq!(extraction.messages, vec!["Oops"]);
        assert_eq!(extraction.strategy, Some(Strategy::TagScan));
    }

    #[test]
    fn multiple_roots_are_wrapped() {
        let extraction = extract_detailed("<Message>A</Message><Message>B</Message>");
        assert_eq!(extraction.messages, vec!["A", "B"]);
        assert_eq!(extraction.strategy, Some(Strategy::WholeDocument));
    }

    #[test]
    fn blank_messages_are_excluded() {
        assert_eq!(
            extract("<Message></Message><Message>  </Message><Message>C</Message>"),
            vec!["C"]
        );
    }

    #[test]
    fn prose_around_markup_is_wrapped() {
        let raw = "Sure, replying now.\n<Message>On my way</Message>\nHope that helps.";
        assert_eq!(extract(raw), vec!["On my way"]);
    }

    #[test]
    fn bare_ampersand_falls_back_to_tag_scan() {
        let raw = "<Response><Message>fish & chips</Message></Response>";
        let extraction = extract_detailed(raw);
        assert_eq!(extraction.messages, vec!["fish & chips"]);
        assert_eq!(extraction.strategy, Some(Strategy::TagScan));
    }

    #[test]
    fn plain_text_yields_empty_list() {
        assert!(extract("Just a normal answer without markup.").is_empty());
        assert_eq!(extract_text("Just a normal answer without markup."), None);
    }

    #[test]
    fn messages_are_trimmed_and_joined() {
        let raw = "<Response><Message>\n  first\n</Message><Message> second </Message></Response>";
        assert_eq!(extract_text(raw).as_deref(), Some("first\nsecond"));
    }

    #[test]
    fn multiline_message_keeps_inner_newlines() {
        let raw = "<Response><Message>line 1\nline 2</Message></Response>";
        assert_eq!(extract(raw), vec!["line 1\nline 2"]);
    }

    #[test]
    fn deterministic_for_same_input() {
        let raw = "```\n<Message>x</Message>\n```<Message>y</Message>";
        assert_eq!(extract_detailed(raw), extract_detailed(raw));
    }

    #[test]
    fn extraction_serializes_strategy_name() {
        let json = serde_json::to_string(&extract_detailed("<Message>x</Message>")).unwrap();
        assert!(json.contains("whole_document"));
    }
}
