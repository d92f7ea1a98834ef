//! Input validation: structural checks on raw user text.

/// Why a message was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationIssue {
    #[error("message is empty")]
    Empty,

    #[error("message has {chars} characters, limit is {limit}")]
    TooLong { chars: usize, limit: usize },

    #[error("message contains control character U+{0:04X}")]
    ControlCharacter(u32),

    #[error("message contains markup injection pattern '{0}'")]
    Injection(&'static str),
}

const INJECTION_PATTERNS: &[&str] = &["<script", "javascript:", "onerror=", "onload="];

#[derive(Debug, Clone)]
pub struct InputValidator {
    max_chars: usize,
}

impl InputValidator {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// `true` when the message may enter the pipeline.
    pub fn validate(&self, message: &str) -> bool {
        self.check(message).is_ok()
    }

    pub fn check(&self, message: &str) -> Result<(), ValidationIssue> {
        if message.trim().is_empty() {
            return Err(ValidationIssue::Empty);
        }

        let chars = message.chars().count();
        if chars > self.max_chars {
            return Err(ValidationIssue::TooLong {
                chars,
                limit: self.max_chars,
            });
        }

        if let Some(c) = message
            .chars()
            .find(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
        {
            return Err(ValidationIssue::ControlCharacter(c as u32));
        }

        let lower = message.to_lowercase();
        if let Some(pattern) = INJECTION_PATTERNS.iter().find(|p| lower.contains(*p)) {
            return Err(ValidationIssue::Injection(pattern));
        }

        Ok(())
    }
}

impl Default for InputValidator {
    fn default() -> Self {
        Self::new(2000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinary_questions_pass() {
        let v = InputValidator::default();
        assert!(v.validate("Any Rust jobs in Tokyo?"));
        assert!(v.validate("東京のエンジニア求人はありますか？"));
        assert!(v.validate("line one\nline two\ttabbed"));
    }

    #[test]
    fn empty_and_blank_rejected() {
        let v = InputValidator::default();
        assert_eq!(v.check(""), Err(ValidationIssue::Empty));
        assert_eq!(v.check("  \n "), Err(ValidationIssue::Empty));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let v = InputValidator::new(5);
        assert!(v.validate("こんにちは"));
        assert!(matches!(v.check("こんにちは!"), Err(ValidationIssue::TooLong { chars: 6, .. })));
    }

    #[test]
    fn control_characters_rejected() {
        let v = InputValidator::default();
        assert_eq!(v.check("nul\0byte"), Err(ValidationIssue::ControlCharacter(0)));
        assert!(!v.validate("bell\x07"));
        assert!(!v.validate("esc\x1b[2J"));
    }

    #[test]
    fn markup_injection_rejected_case_insensitively() {
        let v = InputValidator::default();
        assert_eq!(
            v.check("<SCRIPT>alert(1)</script>"),
            Err(ValidationIssue::Injection("<script"))
        );
        assert!(!v.validate("click javascript:void(0)"));
        assert!(!v.validate("<img src=x onerror=alert(1)>"));
    }
}
