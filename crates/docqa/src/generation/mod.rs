//! Answer generation: prompt assembly and citation handling

pub mod citation;
pub mod prompt;

pub use citation::{build_citations, truncate_snippet, SNIPPET_CHARS};
pub use prompt::PromptBuilder;
