//! Greeting detection.

use regex_lite::Regex;

const GREETING_PATTERN: &str = r"(?i)^(?:(?:hi|hello|hey|yo)\b|こんにちは)";

/// Recognizes messages that open with a greeting word.
///
/// English words must stand alone ("hi there", not "hiring").
#[derive(Debug, Clone)]
pub struct GreetingDetector {
    pattern: Option<Regex>,
}

impl GreetingDetector {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(GREETING_PATTERN).ok(),
        }
    }

    pub fn is_greeting(&self, message: &str) -> bool {
        self.pattern
            .as_ref()
            .is_some_and(|p| p.is_match(message.trim()))
    }
}

impl Default for GreetingDetector {
    fn default() -> Self {
        Self::new()
    }
}
