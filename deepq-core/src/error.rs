//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug, PartialEq)]
pub enum DeepQError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),

    /// The length of an observation or a batch does not match the expected one.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Given length.
        actual: usize,
    },

    /// The replay memory does not hold enough transitions to build a window.
    #[error("Insufficient history: {count} transitions stored, at least {required} required")]
    InsufficientHistory {
        /// Number of stored transitions.
        count: usize,
        /// Required number of transitions.
        required: usize,
    },

    /// No sampling window avoiding the write cursor was found.
    #[error("No valid sampling window found after {0} attempts")]
    NoValidWindow(usize),

    /// The target network was synchronized before being bound to the online network.
    #[error("Target network is not bound to an online network, call bind() before sync()")]
    TargetNotBound,

    /// The online and target networks are not structurally identical.
    #[error("Incompatible networks: {0}")]
    IncompatibleNetworks(String),

    /// A configuration value is out of range.
    #[error("Invalid configuration '{name}': {reason}")]
    InvalidConfig {
        /// Name of the parameter.
        name: String,
        /// Why the value is rejected.
        reason: String,
    },
}

impl DeepQError {
    pub(crate) fn invalid_config(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
