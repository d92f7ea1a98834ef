//! Context preparation: the token-budgeted history window.

pub mod window;

pub use parley_core::token::estimate_tokens;
pub use window::{build_window, window_cost};
