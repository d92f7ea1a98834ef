//! History window builder.
//!
//! Selects the most recent user/assistant turns that fit a token budget and
//! prefixes them with a synthetic system marker turn.
//!
//! Selection walks newest to oldest and stops at the first turn that does
//! not fit. It never skips an oversized turn to pack an older one, so the
//! window is always a contiguous tail of the conversation.

use parley_core::message::{Role, Turn};
use parley_core::token::estimate_tokens;

/// Build the windowed context for one `chat` call.
///
/// The marker's cost is committed before any turn is considered. The result
/// is `[marker, oldest selected, ..., newest selected]`.
pub fn build_window(history: &[Turn], marker: &str, budget: usize) -> Vec<Turn> {
    let mut used = estimate_tokens(marker);
    let mut selected: Vec<&Turn> = Vec::new();

    for turn in history.iter().rev() {
        if !matches!(turn.role, Role::User | Role::Assistant) {
            continue;
        }
        let cost = estimate_tokens(&turn.content);
        if used + cost > budget {
            break;
        }
        used += cost;
        selected.push(turn);
    }

    let mut window = Vec::with_capacity(selected.len() + 1);
    window.push(Turn::system(marker));
    window.extend(selected.into_iter().rev().cloned());
    window
}

/// Total estimated cost of a window, marker included.
pub fn window_cost(window: &[Turn]) -> usize {
    window.iter().map(|t| estimate_tokens(&t.content)).sum()
}
