//! Cloneable façade for issuing proof requests.
//!
//! [`ProofServiceHandle`] hides the channel plumbing and offers async helpers
//! for the two move flows on top of raw `prove`.
use std::sync::Arc;

use num_bigint::BigUint;
use tokio::sync::{mpsc, oneshot};
use tracing::info;

use game_core::Move;
use zk::circuit::{AttestValidMove, RevealMove};
use zk::{CircuitInput, GeneratedProof, ProofError};

use super::errors::{Result, RuntimeError};
use crate::secret::{SecretSource, round_secret};
use crate::workers::{Command, MetricsSnapshot, ProofMetrics};

/// A move commitment and the proof that it hides a valid move.
#[derive(Clone, Debug)]
pub struct AttestedMove {
    pub attestation: BigUint,
    pub proof: GeneratedProof,
}

/// A move opened from its commitment, with the proof of the opening.
#[derive(Clone, Debug)]
pub struct RevealedMove {
    pub mv: Move,
    pub proof: GeneratedProof,
}

/// Client-facing handle to the proof service.
#[derive(Clone)]
pub struct ProofServiceHandle {
    command_tx: mpsc::Sender<Command>,
    metrics: Arc<ProofMetrics>,
    secrets: Option<Arc<dyn SecretSource>>,
}

impl ProofServiceHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<Command>,
        metrics: Arc<ProofMetrics>,
        secrets: Option<Arc<dyn SecretSource>>,
    ) -> Self {
        Self {
            command_tx,
            metrics,
            secrets,
        }
    }

    /// Proves `input` against the named circuit.
    pub async fn prove(&self, circuit: &str, input: CircuitInput) -> Result<GeneratedProof> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.metrics.enqueue();
        let sent = self
            .command_tx
            .send(Command::Prove {
                circuit: circuit.to_string(),
                input,
                reply: reply_tx,
            })
            .await;
        if sent.is_err() {
            self.metrics.dequeue();
            return Err(RuntimeError::CommandChannelClosed);
        }

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)?
    }

    /// Commits to `mv` for the round at `nonce` and proves the commitment
    /// hides a valid move.
    pub async fn attest_move(&self, mv: Move, nonce: u64) -> Result<AttestedMove> {
        let secret = self.round_secret(nonce).await?;
        let input = CircuitInput::new()
            .scalar("move", mv.code())
            .and_then(|input| input.scalar("secret", secret))
            .map_err(ProofError::from)?;

        let proof = self.prove(AttestValidMove::NAME, input).await?;
        let attestation = first_signal(&proof)?.clone();
        info!(nonce, "move attested");

        Ok(AttestedMove { attestation, proof })
    }

    /// Opens `attestation` with the round secret for `nonce`.
    pub async fn reveal_move(&self, attestation: &BigUint, nonce: u64) -> Result<RevealedMove> {
        let secret = self.round_secret(nonce).await?;
        let input = CircuitInput::new()
            .scalar("moveAttestation", attestation.clone())
            .and_then(|input| input.scalar("secret", secret))
            .map_err(ProofError::from)?;

        let proof = self.prove(RevealMove::NAME, input).await?;
        let mv = Move::try_from(first_signal(&proof)?)?;
        info!(nonce, %mv, "move revealed");

        Ok(RevealedMove { mv, proof })
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Asks the worker to stop once in-flight proofs finish.
    ///
    /// Later requests from any handle fail with
    /// [`RuntimeError::CommandChannelClosed`].
    pub async fn shutdown(&self) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::Shutdown { reply: reply_tx })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    async fn round_secret(&self, nonce: u64) -> Result<BigUint> {
        let source = self.secrets.as_deref().ok_or(RuntimeError::SecretSourceNotSet)?;
        round_secret(source, nonce).await
    }
}

fn first_signal(proof: &GeneratedProof) -> Result<&BigUint> {
    proof
        .public_signals
        .first()
        .ok_or_else(|| RuntimeError::MissingPublicSignal {
            circuit: proof.circuit.clone(),
        })
}
