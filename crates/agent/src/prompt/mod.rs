//! Prompt construction: templates loaded once at startup and the renderer
//! that fills them with a chat's bounded history.

pub mod renderer;
pub mod template;

pub use renderer::{format_history, PromptRenderer, DATETIME_FORMAT};
pub use template::{
    Placeholder, PromptTemplate, TemplateError, TemplateSource, BUILT_IN_TEMPLATE,
    DEFAULT_TEMPLATE,
};
