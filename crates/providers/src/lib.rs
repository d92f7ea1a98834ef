//! LLM provider implementations for Parley.
//!
//! All providers implement the `parley_core::Provider` trait.
//! [`router::build_from_config`] wires the fast and pro tiers.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::{ModelSet, build_from_config};
