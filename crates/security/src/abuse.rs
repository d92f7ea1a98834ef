//! Abuse classification: prompt-injection and jailbreak phrasing.
//!
//! The gate only needs a yes/no answer, so any classifier can stand in for
//! the default pattern set.

use regex_lite::Regex;

pub trait AbuseClassifier: Send + Sync {
    fn is_abusive(&self, message: &str) -> bool;
}

/// Matches messages against a list of regular expressions.
#[derive(Debug, Clone)]
pub struct PatternClassifier {
    patterns: Vec<Regex>,
}

impl PatternClassifier {
    pub const DEFAULT_PATTERN: &'static str = r"(?i)jailbreak|ignore.*system";

    pub fn new(patterns: &[&str]) -> Result<Self, regex_lite::Error> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }
}

impl Default for PatternClassifier {
    fn default() -> Self {
        let patterns = Regex::new(Self::DEFAULT_PATTERN).into_iter().collect();
        Self { patterns }
    }
}

impl AbuseClassifier for PatternClassifier {
    fn is_abusive(&self, message: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(message))
    }
}
