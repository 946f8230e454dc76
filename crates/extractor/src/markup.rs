//! Structured parse of candidate markup.
//!
//! Candidate text is first normalized to a single root element, then parsed
//! as XML with `quick-xml`. Every `<Message>` element at any depth yields its
//! own leading text (everything before its first child element), in document
//! order. Anything that is not well-formed XML is a [`MarkupError`]; callers
//! treat that as "nothing found here" and move on.

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::borrow::Cow;

use crate::{MESSAGE_TAG, ROOT_TAG};

/// Why a structured parse produced nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarkupError {
    #[error("malformed markup: {0}")]
    Syntax(String),

    #[error("invalid attribute: {0}")]
    Attribute(String),

    #[error("invalid text content: {0}")]
    Text(String),

    #[error("closing tag </{found}> does not match <{expected}>")]
    MismatchedClose { expected: String, found: String },

    #[error("closing tag </{0}> without an open element")]
    UnexpectedClose(String),

    #[error("element <{0}> is never closed")]
    Unclosed(String),

    #[error("content outside the root element")]
    OutsideRoot,

    #[error("more than one root element")]
    MultipleRoots,

    #[error("no root element")]
    NoRoot,
}

/// An element on the open-element stack.
struct OpenElement {
    name: Vec<u8>,
    /// Index into the collected texts when this is a message element
    slot: Option<usize>,
    /// Set once the first child element starts; later text is tail text
    sealed: bool,
}

/// Ensure the candidate has exactly one outer element.
///
/// Trimmed text that is empty, does not start with `<`, or is not a single
/// element wrapping everything gets wrapped in a synthetic `<Response>` root.
pub fn normalize_root(candidate: &str) -> Cow<'_, str> {
    let trimmed = candidate.trim();
    if trimmed.starts_with('<') && has_single_root(trimmed) {
        Cow::Borrowed(trimmed)
    } else {
        Cow::Owned(format!("<{ROOT_TAG}>{trimmed}</{ROOT_TAG}>"))
    }
}

/// Whether the text is one element with nothing but whitespace, comments or
/// processing instructions around it. Unreadable input counts as "no".
fn has_single_root(text: &str) -> bool {
    let mut reader = Reader::from_str(text);
    let mut depth = 0usize;
    let mut roots = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(_)) => {
                if depth == 0 {
                    roots += 1;
                    if roots > 1 {
                        return false;
                    }
                }
                depth += 1;
            }
            Ok(Event::Empty(_)) => {
                if depth == 0 {
                    roots += 1;
                    if roots > 1 {
                        return false;
                    }
                }
            }
            Ok(Event::End(_)) => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            Ok(Event::Text(t)) => {
                if depth == 0 && !t.iter().all(u8::is_ascii_whitespace) {
                    return false;
                }
            }
            Ok(Event::CData(_)) => {
                if depth == 0 {
                    return false;
                }
            }
            Ok(Event::Eof) => return roots == 1 && depth == 0,
            Ok(_) => {}
            Err(_) => return false,
        }
    }
}

/// Normalize and parse a candidate, returning the raw (untrimmed) text of
/// every non-empty message element in document order.
pub fn parse_messages(candidate: &str) -> Result<Vec<String>, MarkupError> {
    let document = normalize_root(candidate);
    let mut reader = Reader::from_str(&document);
    let mut open: Vec<OpenElement> = Vec::new();
    let mut texts: Vec<String> = Vec::new();
    let mut roots = 0usize;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| MarkupError::Syntax(e.to_string()))?;

        match event {
            Event::Start(start) => {
                for attr in start.attributes() {
                    attr.map_err(|e| MarkupError::Attribute(e.to_string()))?;
                }
                enter_child(&mut open, &mut roots)?;
                let name = start.name().as_ref().to_vec();
                let slot = (name == MESSAGE_TAG.as_bytes()).then(|| {
                    texts.push(String::new());
                    texts.len() - 1
                });
                open.push(OpenElement {
                    name,
                    slot,
                    sealed: false,
                });
            }
            Event::Empty(empty) => {
                for attr in empty.attributes() {
                    attr.map_err(|e| MarkupError::Attribute(e.to_string()))?;
                }
                enter_child(&mut open, &mut roots)?;
            }
            Event::End(end) => {
                let found = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                let Some(element) = open.pop() else {
                    return Err(MarkupError::UnexpectedClose(found));
                };
                if element.name != end.name().as_ref() {
                    return Err(MarkupError::MismatchedClose {
                        expected: String::from_utf8_lossy(&element.name).into_owned(),
                        found,
                    });
                }
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| MarkupError::Text(e.to_string()))?;
                collect_text(&open, &mut texts, &text)?;
            }
            Event::CData(cdata) => {
                let text = String::from_utf8_lossy(&cdata);
                collect_text(&open, &mut texts, &text)?;
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if let Some(element) = open.last() {
        return Err(MarkupError::Unclosed(
            String::from_utf8_lossy(&element.name).into_owned(),
        ));
    }
    if roots == 0 {
        return Err(MarkupError::NoRoot);
    }

    Ok(texts.into_iter().filter(|t| !t.is_empty()).collect())
}

/// Account for a new element: seal the parent's leading text, or count a root.
fn enter_child(open: &mut [OpenElement], roots: &mut usize) -> Result<(), MarkupError> {
    match open.last_mut() {
        Some(parent) => parent.sealed = true,
        None => {
            *roots += 1;
            if *roots > 1 {
                return Err(MarkupError::MultipleRoots);
            }
        }
    }
    Ok(())
}

fn collect_text(open: &[OpenElement], texts: &mut [String], text: &str) -> Result<(), MarkupError> {
    match open.last() {
        Some(OpenElement {
            slot: Some(slot),
            sealed: false,
            ..
        }) => texts[*slot].push_str(text),
        Some(_) => {}
        None if text.trim().is_empty() => {}
        None => return Err(MarkupError::OutsideRoot),
    }
    Ok(())
}
