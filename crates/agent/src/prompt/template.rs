//! Prompt templates.
//!
//! A template is plain text with three placeholders:
//!
//! | Placeholder | Replaced with |
//! |-------------|---------------|
//! | `{chat_name}` | the chat identity |
//! | `{chat_history}` | one `<Message …>` line per history entry |
//! | `{current_datetime}` | local time as `%Y-%m-%d:%H-%M-%S:%Z` |
//!
//! `{{` and `}}` produce literal braces. Templates are parsed once, when
//! loaded, so a bad template is caught at startup and rendering cannot fail.

use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Written by `chatrelay init` as the starting template.
pub const DEFAULT_TEMPLATE: &str = r#"<VirtualAssistant>
    <Role>
        <Name>Assistant</Name>
        <Description>Virtual assistant that answers chat messages on behalf of its owner.</Description>
    </Role>
    <UserInformation>
        <Name>{chat_name}</Name>
        <PreviousInteractions>
{chat_history}
        </PreviousInteractions>
    </UserInformation>
    <CurrentDateTime>{current_datetime}</CurrentDateTime>
    <ResponseFormat>
        Answer with a single <Response> element containing one <Message> element
        per chat message to send, for example:
        <Response><Message>Hello!</Message></Response>
    </ResponseFormat>
</VirtualAssistant>
"#;

/// Used whenever the configured template cannot be used.
pub const BUILT_IN_TEMPLATE: &str =
    "You are a chat assistant. Give a brief, helpful reply to this conversation:\n{chat_history}";

/// A value substituted at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    ChatName,
    ChatHistory,
    CurrentDatetime,
}

impl Placeholder {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "chat_name" => Some(Self::ChatName),
            "chat_history" => Some(Self::ChatHistory),
            "current_datetime" => Some(Self::CurrentDatetime),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Literal(String),
    Value(Placeholder),
}

/// Where a loaded template came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    File(PathBuf),
    /// Parsed from text supplied directly
    Inline,
    BuiltIn,
}

impl fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateSource::File(path) => write!(f, "{}", path.display()),
            TemplateSource::Inline => f.write_str("inline"),
            TemplateSource::BuiltIn => f.write_str("built-in"),
        }
    }
}

/// Why a template could not be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("Failed to read template at {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Template is empty")]
    Empty,

    #[error("Placeholder starting at byte {0} is never closed")]
    Unterminated(usize),

    #[error("Unmatched '{brace}' at byte {offset}; use '{brace}{brace}' for a literal brace")]
    UnmatchedBrace { brace: char, offset: usize },

    #[error("Unknown placeholder '{{{0}}}'")]
    UnknownPlaceholder(String),
}

/// A parsed prompt template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    pub(crate) segments: Vec<Segment>,
    source: TemplateSource,
}

impl PromptTemplate {
    /// Parse template text.
    pub fn parse(text: &str) -> Result<Self, TemplateError> {
        if text.trim().is_empty() {
            return Err(TemplateError::Empty);
        }

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = text.char_indices().peekable();

        while let Some((offset, c)) = chars.next() {
            match c {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    literal.push('{');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        if c == '{' {
                            return Err(TemplateError::UnmatchedBrace { brace: '{', offset });
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(TemplateError::Unterminated(offset));
                    }
                    let placeholder = Placeholder::parse(name.trim())
                        .ok_or(TemplateError::UnknownPlaceholder(name))?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Value(placeholder));
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(TemplateError::UnmatchedBrace { brace: '}', offset }),
                c => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            segments,
            source: TemplateSource::Inline,
        })
    }

    /// Read and parse a template file.
    pub fn from_file(path: &Path) -> Result<Self, TemplateError> {
        let text = std::fs::read_to_string(path).map_err(|e| TemplateError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let mut template = Self::parse(&text)?;
        template.source = TemplateSource::File(path.to_path_buf());
        Ok(template)
    }

    /// Load a template file, falling back to the built-in template on any
    /// problem. Never fails.
    pub fn load(path: &Path) -> Self {
        match Self::from_file(path) {
            Ok(template) => {
                info!(path = %path.display(), "Prompt template loaded");
                template
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Using built-in prompt template");
                Self::built_in()
            }
        }
    }

    /// The minimal template used when nothing else is available.
    pub fn built_in() -> Self {
        debug!("Built-in prompt template selected");
        Self {
            segments: vec![
                Segment::Literal(
                    BUILT_IN_TEMPLATE
                        .trim_end_matches("{chat_history}")
                        .to_string(),
                ),
                Segment::Value(Placeholder::ChatHistory),
            ],
            source: TemplateSource::BuiltIn,
        }
    }

    pub fn source(&self) -> &TemplateSource {
        &self.source
    }

    /// Placeholders the template uses, in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = Placeholder> + '_ {
        self.segments.iter().filter_map(|s| match s {
            Segment::Value(p) => Some(*p),
            Segment::Literal(_) => None,
        })
    }
}
