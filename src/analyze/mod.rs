// src/analyze/mod.rs
//! Analysis stage: prompt construction, model transport, strict validation.

pub mod gemini;
pub mod prompt;
pub mod schema;

// Re-export convenient types.
pub use gemini::{GeminiClient, ModelClient, DEFAULT_GEMINI_MODEL};
pub use prompt::build_prompt;
pub use schema::{AnalysisResult, IdeaSuggestion, ResponseValidator, DEFAULT_MAX_IDEAS};
