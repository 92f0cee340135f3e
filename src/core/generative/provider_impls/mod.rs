//! Provider Implementations
//!
//! Concrete adapters for external generative AI services.

pub mod gemini;

pub use gemini::GeminiProvider;
