//! AdGenius Engine
//!
//! Headless engine for scene-based AI ad production. An LLM drafts a
//! multi-scene commercial script, generative providers render per-scene
//! video and voiceover, and this crate previews the assembled ad across
//! scene boundaries and exports it as one continuous recording.
//!
//! The crate is the engine only. Storage backends, authentication, billing,
//! and every pixel of UI belong to the embedding application; the engine is
//! driven through explicit session and engine objects and reports back via
//! return values, accessors, and channels.

pub mod core;

pub use core::{CoreError, CoreResult};
