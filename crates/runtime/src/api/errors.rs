//! Error type surfaced by the proof service.
//!
//! Wraps proving failures and worker coordination failures so callers can
//! bubble them up with one type.
use thiserror::Error;
use tokio::sync::oneshot;

use game_core::{MoveError, SecretError};
use zk::ProofError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Proof(#[from] ProofError),

    #[error("circuit `{0}` is not registered with this service")]
    UnknownCircuit(String),

    #[error("no secret source configured")]
    SecretSourceNotSet,

    #[error("secret source failed: {0}")]
    SecretSource(String),

    #[error("invalid round signature")]
    Signature(#[from] SecretError),

    #[error("revealed value is not a move")]
    RevealedMove(#[from] MoveError),

    #[error("`{circuit}` proof carries no public signal")]
    MissingPublicSignal { circuit: String },

    #[error("prover worker command channel closed")]
    CommandChannelClosed,

    #[error("prover worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("prover worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),
}

impl RuntimeError {
    /// Metrics label: the proof error's category, or `runtime` otherwise.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Proof(e) => e.category(),
            Self::UnknownCircuit(_) => "unknown_circuit",
            _ => "runtime",
        }
    }
}
