//! Opening a move commitment.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use runtime::{LocalSigner, ProofService, RuntimeConfig};
use serde_json::json;

use super::prove::render;
use super::{emit_json, parse_biguint};

/// Open a move commitment made with `attest`
#[derive(Debug, Parser)]
pub struct Reveal {
    /// Attestation (decimal or 0x hex)
    pub attestation: String,

    /// Round nonce the commitment was made for
    #[arg(long)]
    pub nonce: u64,

    /// Seed of the local signer standing in for the wallet
    #[arg(long, env = "RPS_SIGNER_SEED", hide_env_values = true)]
    pub seed: String,

    /// Write the result JSON here instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

impl Reveal {
    pub async fn execute(&self, config: RuntimeConfig) -> Result<()> {
        let attestation = parse_biguint(&self.attestation)?;

        let service = ProofService::builder()
            .config(config)
            .secret_source(LocalSigner::new(self.seed.as_bytes()))
            .build()
            .await?;
        let revealed = service.handle().reveal_move(&attestation, self.nonce).await;
        service.shutdown().await?;
        let revealed = revealed?;

        emit_json(
            &json!({
                "nonce": self.nonce,
                "move": revealed.mv,
                "code": revealed.mv.code(),
                "proof": render(&revealed.proof, false)?,
            }),
            self.out.as_deref(),
        )
    }
}
