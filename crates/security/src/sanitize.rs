//! Output sanitization for text shown to the user.
//!
//! Strips:
//! - Citation and tool tags a model may leak (`〔12〕`, `〔tool_3〕`)
//! - ANSI escape sequences (CSI, OSC, two-character escapes)
//! - Control characters except `\n`, `\t`, `\r`
//!
//! then trims surrounding whitespace.

use std::sync::LazyLock;

use regex_lite::Regex;

static CITATION_TAG: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"〔(?:\d+|tool_\d+)〕").ok());

static ANSI_ESCAPE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\x1b\[[0-9;?]*[ -/]*[@-~]",       // CSI
        r"|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)?", // OSC
        r"|\x1b[@-Z\\-_]",                    // two-character
    ))
    .ok()
});

fn strip(pattern: &LazyLock<Option<Regex>>, text: String) -> String {
    match pattern.as_ref() {
        Some(re) if re.is_match(&text) => re.replace_all(&text, "").into_owned(),
        _ => text,
    }
}

/// Make model or canned text safe to hand to the caller.
pub fn sanitize_output(text: &str) -> String {
    let text = strip(&CITATION_TAG, text.to_string());
    let text = strip(&ANSI_ESCAPE, text);
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\t' | '\r'))
        .collect::<String>()
        .trim()
        .to_string()
}
