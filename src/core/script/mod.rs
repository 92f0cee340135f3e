//! Ad Script Domain
//!
//! Script data model plus the script-generation seam: a provider trait for
//! LLM-backed drafting and a studio engine that applies the primary/fallback
//! model strategy.

mod models;
pub mod provider;
pub mod studio;

pub use models::{AdScript, Scene};
pub use provider::{
    parse_script_json, BrandContext, MockScriptProvider, ScriptProvider, ScriptRequest,
    MODEL_SCRIPT_FALLBACK, MODEL_SCRIPT_PRIMARY, SCRIPT_THINKING_BUDGET,
};
pub use studio::{ScriptStudio, ScriptStudioConfig};
