//! Prove raw circuit input through the proof service.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use runtime::{ProofService, RuntimeConfig};
use serde_json::json;
use zk::GeneratedProof;

use super::{circuit, emit_json, read_input};

/// Prove circuit input JSON
#[derive(Debug, Parser)]
pub struct Prove {
    /// Circuit name
    pub circuit: String,

    /// Input JSON file (`-` for stdin)
    pub input: PathBuf,

    /// Write the proof JSON here instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Render proof elements as 0x-prefixed hex (calldata form)
    #[arg(long)]
    pub hex: bool,
}

impl Prove {
    pub async fn execute(&self, config: RuntimeConfig) -> Result<()> {
        circuit(&self.circuit)?;
        let input = read_input(&self.input)?;

        let service = ProofService::builder().config(config).build().await?;
        let proof = service.handle().prove(&self.circuit, input).await;
        service.shutdown().await?;
        let proof = proof?;

        emit_json(&render(&proof, self.hex)?, self.out.as_deref())
    }
}

/// Proof JSON as written by `prove`, `attest` and `reveal`.
///
/// The decimal form round-trips through `verify`.
pub(crate) fn render(proof: &GeneratedProof, hex: bool) -> Result<serde_json::Value> {
    if !hex {
        return Ok(serde_json::to_value(proof)?);
    }
    let public_signals: Vec<String> = proof
        .public_signals
        .iter()
        .map(|s| format!("0x{s:064x}"))
        .collect();
    Ok(json!({
        "circuit": proof.circuit,
        "backend": proof.backend,
        "proof": proof.proof.to_hex_strings(),
        "public_signals": public_signals,
    }))
}
