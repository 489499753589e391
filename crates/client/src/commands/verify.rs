//! Verification of proof JSON against the circuit's verifying key.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use runtime::RuntimeConfig;
use zk::GeneratedProof;
use zk::circuit::groth16::{deserialize_verifying_key, verifying_key_path};

/// Verify a proof JSON file (decimal form, as written by `prove`)
#[derive(Debug, Parser)]
pub struct Verify {
    /// Proof JSON file
    pub proof: PathBuf,

    /// Verify against this circuit instead of the one named in the file
    #[arg(short, long)]
    pub circuit: Option<String>,
}

impl Verify {
    pub fn execute(&self, config: &RuntimeConfig) -> Result<()> {
        let text = std::fs::read_to_string(&self.proof)
            .with_context(|| format!("reading {}", self.proof.display()))?;
        let proof: GeneratedProof =
            serde_json::from_str(&text).context("parsing proof JSON (hex form cannot be verified)")?;
        let circuit = self.circuit.as_deref().unwrap_or(&proof.circuit);

        let vkey = verifying_key_path(&config.key_dir, circuit);
        let vk_bytes =
            std::fs::read(&vkey).with_context(|| format!("reading verifying key {}", vkey.display()))?;
        let vk = deserialize_verifying_key(&vk_bytes)?;

        if !zk::verify_canonical(&proof.proof, &proof.public_signals, &vk)? {
            bail!("proof does not verify against `{circuit}`");
        }

        tracing::info!(circuit, backend = %proof.backend, "proof verified");
        println!("ok: {circuit} proof verifies");
        Ok(())
    }
}
