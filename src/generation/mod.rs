//! Prompt construction, answer generation, and reference handling

mod answer;
mod prompt;
mod references;

pub use answer::AnswerPipeline;
pub use prompt::PromptBuilder;
pub use references::{append_references, collect_sources};
