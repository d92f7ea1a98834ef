//! The orchestration session for Parley.
//!
//! Every `chat` call follows one fixed pipeline:
//!
//! 1. **Gate** the message (greeting, validation, abuse lockout)
//! 2. **Window** the caller's history to the token budget
//! 3. **Dispatch** to the pro-tier model, which may call tools
//! 4. **Sanitize** the final text before it reaches the caller
//!
//! The loop in step 3 continues until the model answers with text only or
//! the iteration limit is reached.

pub mod builder;
pub mod context;
pub mod engine;
pub mod prompt;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use builder::{assemble, build_engine, build_store};
pub use context::{build_window, estimate_tokens};
pub use engine::{ChatEngine, DEFAULT_SESSION, Stage};
pub use prompt::{BuiltinPromptSource, FilePromptSource, PromptMode, PromptSource};
