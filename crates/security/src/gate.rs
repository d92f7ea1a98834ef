//! The safety gate: decides whether a message may reach the dispatcher.
//!
//! Checks run in a fixed order (greeting, validation, abuse). A greeting
//! wins even if the same text would also trip validation or the abuse
//! classifier.

use std::sync::Arc;

use parley_config::SafetyConfig;
use tracing::{debug, warn};

use crate::abuse::{AbuseClassifier, PatternClassifier};
use crate::greeting::GreetingDetector;
use crate::ledger::{AbuseLedger, SessionLedger, TracingAuditSink};
use crate::validation::InputValidator;

/// Reply for messages that fail validation.
pub const UNSAFE_INPUT_MESSAGE: &str = "⚠️ That doesn’t look safe. Could you rephrase?";

/// Reply for sessions past the abuse threshold.
pub const LOCKOUT_MESSAGE: &str = "🚫 Too many suspicious requests. Please try again later.";

/// Outcome of [`SafetyGate::inspect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Answer with the greeting; skip everything else.
    Greeting,
    /// Failed validation; answer with [`UNSAFE_INPUT_MESSAGE`].
    Rejected,
    /// Session is locked out; answer with [`LOCKOUT_MESSAGE`]. `flagged` is
    /// set when this message was itself counted as a hit.
    Locked { hits: u32, flagged: bool },
    /// Continue to windowing and dispatch. `flagged` is set when this
    /// message was counted as an abuse hit below the threshold.
    Proceed { flagged: Option<u32> },
}

pub struct SafetyGate {
    greeting: GreetingDetector,
    validator: InputValidator,
    classifier: Box<dyn AbuseClassifier>,
    ledger: Arc<dyn AbuseLedger>,
    lockout_threshold: u32,
}

impl SafetyGate {
    pub fn new(
        validator: InputValidator,
        classifier: Box<dyn AbuseClassifier>,
        ledger: Arc<dyn AbuseLedger>,
        lockout_threshold: u32,
    ) -> Self {
        Self {
            greeting: GreetingDetector::new(),
            validator,
            classifier,
            ledger,
            lockout_threshold,
        }
    }

    /// Default classifier and an in-memory ledger that audits to tracing.
    pub fn from_config(config: &SafetyConfig) -> Self {
        let ledger = SessionLedger::new(config.max_tracked_sessions, config.lockout_threshold)
            .with_sinks(vec![Box::new(TracingAuditSink)]);
        Self::new(
            InputValidator::new(config.max_message_chars),
            Box::new(PatternClassifier::default()),
            Arc::new(ledger),
            config.lockout_threshold,
        )
    }

    pub fn ledger(&self) -> &Arc<dyn AbuseLedger> {
        &self.ledger
    }

    pub fn inspect(&self, message: &str, session_id: &str) -> GateDecision {
        if self.greeting.is_greeting(message) {
            return GateDecision::Greeting;
        }

        if let Err(issue) = self.validator.check(message) {
            warn!(session_id, %issue, "Input rejected");
            return GateDecision::Rejected;
        }

        if self.classifier.is_abusive(message) {
            let hits = self.ledger.record_hit(session_id, message);
            warn!(session_id, hits, "Abuse pattern detected");
            if hits >= self.lockout_threshold {
                return GateDecision::Locked {
                    hits,
                    flagged: true,
                };
            }
            return GateDecision::Proceed {
                flagged: Some(hits),
            };
        }

        // A locked session stays locked for non-abusive messages too.
        let hits = self.ledger.hit_count(session_id);
        if hits >= self.lockout_threshold {
            debug!(session_id, hits, "Session is locked out");
            return GateDecision::Locked {
                hits,
                flagged: false,
            };
        }

        GateDecision::Proceed { flagged: None }
    }
}

impl std::fmt::Debug for SafetyGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SafetyGate")
            .field("validator", &self.validator)
            .field("lockout_threshold", &self.lockout_threshold)
            .finish()
    }
}
