//! Move commitment with a validity proof.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use game_core::Move;
use runtime::{LocalSigner, ProofService, RuntimeConfig};
use serde_json::json;

use super::emit_json;
use super::prove::render;

/// Commit to a move for a round and prove it is rock, paper or scissors
#[derive(Debug, Parser)]
pub struct Attest {
    /// `rock`, `paper`, `scissors` (or 0, 1, 2)
    #[arg(value_name = "MOVE")]
    pub mv: Move,

    /// Round nonce the secret is derived for
    #[arg(long)]
    pub nonce: u64,

    /// Seed of the local signer standing in for the wallet
    #[arg(long, env = "RPS_SIGNER_SEED", hide_env_values = true)]
    pub seed: String,

    /// Write the result JSON here instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

impl Attest {
    pub async fn execute(&self, config: RuntimeConfig) -> Result<()> {
        let service = ProofService::builder()
            .config(config)
            .secret_source(LocalSigner::new(self.seed.as_bytes()))
            .build()
            .await?;
        let attested = service.handle().attest_move(self.mv, self.nonce).await;
        service.shutdown().await?;
        let attested = attested?;

        emit_json(
            &json!({
                "nonce": self.nonce,
                "attestation": attested.attestation.to_string(),
                "proof": render(&attested.proof, false)?,
            }),
            self.out.as_deref(),
        )
    }
}
