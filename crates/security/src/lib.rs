//! Safety gate for Parley: input validation, abuse detection with
//! session-scoped lockout, and output sanitization.
//!
//! Provides:
//! - **Validation**: length, control-character and markup-injection checks
//! - **Abuse classification**: pluggable jailbreak / prompt-injection detector
//! - **Ledger**: per-session violation counters with an audit trail
//! - **Gate**: greeting, validation and abuse checks in a fixed order
//! - **Sanitization**: cleanup of every user-visible reply

pub mod abuse;
pub mod gate;
pub mod greeting;
pub mod ledger;
pub mod sanitize;
pub mod validation;

pub use abuse::{AbuseClassifier, PatternClassifier};
pub use gate::{GateDecision, LOCKOUT_MESSAGE, SafetyGate, UNSAFE_INPUT_MESSAGE};
pub use greeting::GreetingDetector;
pub use ledger::{AbuseLedger, AuditSink, HitRecord, SessionLedger, TracingAuditSink};
pub use sanitize::sanitize_output;
pub use validation::{InputValidator, ValidationIssue};
