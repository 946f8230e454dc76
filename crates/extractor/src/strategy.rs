//! The ordered extraction strategies.
//!
//! ```text
//! FencedBlocks ──empty──▶ WholeDocument ──empty──▶ TagScan ──empty──▶ []
//!      │                       │                      │
//!    found                   found                  found
//!      ▼                       ▼                      ▼
//!   trimmed, non-empty messages in discovery order
//! ```

use regex_lite::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::debug;

use crate::markup::{self, MarkupError};

/// Fenced code blocks: optional info word, then the body up to the next fence.
static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(\w*)(.*?)```").expect("fenced block pattern is valid")
});

/// At least one open/close tag pair somewhere in a block.
static TAG_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<[^<>/!?][^<>]*>.*</[^<>]+>").expect("tag pair pattern is valid")
});

/// Literal message tag pairs, non-greedy, across lines.
static MESSAGE_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<Message>(.*?)</Message>").expect("message span pattern is valid")
});

/// One step of the extraction chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Structured parse of each markup-looking fenced code block
    FencedBlocks,
    /// Structured parse of the whole raw text
    WholeDocument,
    /// Regex scan for literal `<Message>…</Message>` spans
    TagScan,
}

impl Strategy {
    /// Strict attempt order.
    pub const CHAIN: [Strategy; 3] = [
        Strategy::FencedBlocks,
        Strategy::WholeDocument,
        Strategy::TagScan,
    ];

    /// Run this strategy against raw model output.
    ///
    /// Returned messages are already trimmed with empties removed.
    pub fn attempt(self, raw: &str) -> StrategyOutcome {
        let collected = match self {
            Strategy::FencedBlocks => {
                let mut collected = Vec::new();
                for block in markup_blocks(raw) {
                    match markup::parse_messages(block) {
                        Ok(found) => collected.extend(found),
                        Err(e) => debug!(error = %e, "Skipping fenced block that failed to parse"),
                    }
                }
                collected
            }
            Strategy::WholeDocument => match markup::parse_messages(raw) {
                Ok(found) => found,
                Err(e) => return StrategyOutcome::Malformed(e),
            },
            Strategy::TagScan => MESSAGE_SPAN
                .captures_iter(raw)
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
                .collect(),
        };

        let messages = clean(collected);
        if messages.is_empty() {
            StrategyOutcome::Empty
        } else {
            StrategyOutcome::Found(messages)
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Strategy::FencedBlocks => "fenced_blocks",
            Strategy::WholeDocument => "whole_document",
            Strategy::TagScan => "tag_scan",
        };
        f.write_str(name)
    }
}

/// Result of a single strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyOutcome {
    /// At least one non-empty message
    Found(Vec<String>),
    /// Ran cleanly, nothing to show the user
    Empty,
    /// The candidate was not well-formed markup
    Malformed(MarkupError),
}

/// Bodies of fenced blocks tagged `xml` or untagged that contain a tag pair.
fn markup_blocks(raw: &str) -> Vec<&str> {
    FENCED_BLOCK
        .captures_iter(raw)
        .filter(|caps| {
            caps.get(1)
                .is_none_or(|info| info.as_str().is_empty() || info.as_str().eq_ignore_ascii_case("xml"))
        })
        .filter_map(|caps| caps.get(2))
        .map(|body| body.as_str())
        .filter(|body| TAG_PAIR.is_match(body))
        .collect()
}

fn clean(collected: Vec<String>) -> Vec<String> {
    collected
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_xml_and_untagged_blocks() {
        let raw = "intro\n```xml\n<Message>a</Message>\n```\nmiddle\n```\n<Message>b</Message>\n```";
        let blocks = markup_blocks(raw);
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].contains("<Message>a</Message>"));
        assert!(blocks[1].contains("<Message>b</Message>"));
    }

    #[test]
    fn ignores_blocks_in_other_languages() {
        let raw = "```json\n{\"x\": \"<Message>a</Message>\"}\n```";
        assert!(markup_blocks(raw).is_empty());
    }

    #[test]
    fn ignores_blocks_without_tag_pairs() {
        let raw = "```\nfn main() {}\n```";
        assert!(markup_blocks(raw).is_empty());
    }

    #[test]
    fn info_string_is_case_insensitive() {
        let raw = "```XML\n<Response><Message>a</Message></Response>\n```";
        assert_eq!(markup_blocks(raw).len(), 1);
    }

    #[test]
    fn fenced_blocks_concatenate_in_order() {
        let raw = "```xml\n<Response><Message>1</Message><Message>2</Message></Response>\n```\n\
                   ```xml\n<Message>3</Message>\n```";
        assert_eq!(
            Strategy::FencedBlocks.attempt(raw),
            StrategyOutcome::Found(vec!["1".into(), "2".into(), "3".into()])
        );
    }

    #[test]
    fn broken_block_does_not_spoil_others() {
        let raw = "```xml\n<Message>bad & worse</Message>\n```\n```xml\n<Message>good</Message>\n```";
        assert_eq!(
            Strategy::FencedBlocks.attempt(raw),
            StrategyOutcome::Found(vec!["good".into()])
        );
    }

    #[test]
    fn whole_document_reports_malformed() {
        let outcome = Strategy::WholeDocument.attempt("<Message>x</Reply>");
        assert!(matches!(outcome, StrategyOutcome::Malformed(_)));
    }

    #[test]
    fn tag_scan_spans_lines() {
        let raw = "<Message>line one\nline two</Message> & <Message>next</Message>";
        assert_eq!(
            Strategy::TagScan.attempt(raw),
            StrategyOutcome::Found(vec!["line one\nline two".into(), "next".into()])
        );
    }

    #[test]
    fn tag_scan_empty_when_no_pairs() {
        assert_eq!(Strategy::TagScan.attempt("no tags here"), StrategyOutcome::Empty);
    }

    #[test]
    fn strategy_names() {
        assert_eq!(Strategy::WholeDocument.to_string(), "whole_document");
    }
}
