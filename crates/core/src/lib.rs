//! # Parley Core
//!
//! Domain types, traits, and error definitions for the Parley conversational
//! orchestration engine. Every external capability (language model, vector
//! store, tools) is defined as a trait here; implementations live in their
//! respective crates.
//!
//! The only shared mutable state the engine owns is also defined here: the
//! [`TtlCache`] used for memoized lookups. Per-session violation tracking
//! lives in `parley-security`.

pub mod cache;
pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod retrieval;
pub mod token;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use cache::TtlCache;
pub use error::{Error, Result};
pub use event::{DomainEvent, EventBus};
pub use message::{ChatReply, Language, Message, Role, Turn};
pub use provider::{ModelHandle, ModelTier, Provider, ProviderRequest, ProviderResponse};
pub use retrieval::{Document, IndexStats, VectorStore};
pub use token::estimate_tokens;
pub use tool::{Tool, ToolCall, ToolContext, ToolRegistry, ToolResult};
