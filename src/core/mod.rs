//! AdGenius Core Engine
//!
//! Core production engine module.
//! Handles scripting, asset generation, timeline math, synchronized
//! preview playback, and sequential export.

pub mod assets;
pub mod generative;
pub mod logging;
pub mod playback;
pub mod production;
pub mod project;
pub mod render;
pub mod script;
pub mod timeline;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;
