//! Error taxonomy for witness assembly and proof generation.
//!
//! Input and encoding errors are fail-fast and always name the offending
//! signal; evaluator and backend faults are deterministic for a given input,
//! so nothing in this crate retries them.

use thiserror::Error;

use crate::prover::BackendKind;

/// Errors that can occur during witness assembly or proof generation.
#[derive(Debug, Error)]
pub enum ProofError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    #[error("evaluator fault: {0}")]
    EvaluatorFault(String),

    #[error(
        "encoding overflow: `{signal}`[{index}] needs {required} limbs but the field uses {available}"
    )]
    EncodingOverflow {
        signal: String,
        index: usize,
        required: usize,
        available: usize,
    },

    #[error("{backend} backend fault: {message}")]
    BackendFault {
        backend: BackendKind,
        message: String,
    },

    #[error("proving key unavailable: {0}")]
    KeyUnavailable(String),

    #[error("serialization error: {0}")]
    SerializationError(String),
}

impl ProofError {
    pub(crate) fn backend(backend: BackendKind, message: impl Into<String>) -> Self {
        Self::BackendFault {
            backend,
            message: message.into(),
        }
    }

    /// Short category label used for metrics and log fields.
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::EvaluatorFault(_) => "evaluator_fault",
            Self::EncodingOverflow { .. } => "encoding_overflow",
            Self::BackendFault { .. } => "backend_fault",
            Self::KeyUnavailable(_) => "key_unavailable",
            Self::SerializationError(_) => "serialization",
        }
    }
}

/// Malformed or incomplete circuit input.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("unknown signal `{signal}` (element {index})")]
    UnknownSignal { signal: String, index: usize },

    #[error("element {index} of `{signal}` is out of range (signal has {len} elements)")]
    IndexOutOfRange {
        signal: String,
        index: usize,
        len: usize,
    },

    #[error("element {index} of `{signal}` was already set")]
    AlreadySet { signal: String, index: usize },

    #[error("incomplete input: only {provided} of {expected} input signals were set")]
    Incomplete { provided: usize, expected: usize },

    #[error("signal `{signal}`: {reason}")]
    Malformed { signal: String, reason: String },

    #[error("signal `{0}` appears more than once")]
    Duplicate(String),
}
