//! Error types for move decoding and secret derivation.

use thiserror::Error;

/// A numeric or textual move did not name rock, paper, or scissors.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("move code {0} is not one of 0 (rock), 1 (paper), 2 (scissors)")]
    InvalidCode(u64),

    #[error("revealed value {0} does not fit a move code")]
    OutOfRange(String),

    #[error("unknown move name `{0}`")]
    UnknownName(String),
}

/// A wallet signature could not be turned into a round secret.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SecretError {
    #[error("signature is empty")]
    Empty,

    #[error("signature is not valid hex: {0}")]
    InvalidHex(String),
}
