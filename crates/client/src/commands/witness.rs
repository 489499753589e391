//! Witness computation without proving.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use runtime::RuntimeConfig;
use serde_json::json;
use zk::WitnessAssembler;

use super::{circuit, emit_json, read_input};

/// Compute the witness for circuit input JSON
#[derive(Debug, Parser)]
pub struct Witness {
    /// Circuit name
    pub circuit: String,

    /// Input JSON file (`-` for stdin)
    pub input: PathBuf,

    /// Write the witness buffer here (little-endian 32-bit limbs)
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Write the buffer base64-encoded instead of raw
    #[arg(long, requires = "out")]
    pub base64: bool,
}

impl Witness {
    pub fn execute(&self, config: &RuntimeConfig) -> Result<()> {
        let num_signals = circuit(&self.circuit)?.public_signals();
        let input = read_input(&self.input)?;

        let evaluator = zk::shared_evaluator(&self.circuit)?;
        let output = {
            let mut adapter = evaluator.lock()?;
            WitnessAssembler::new(&mut adapter).assemble(&input, num_signals, config.sanity_check)?
        };

        if let Some(path) = &self.out {
            let written = if self.base64 {
                std::fs::write(path, output.buffer.to_base64().as_bytes())
            } else {
                std::fs::write(path, output.buffer.as_bytes())
            };
            written.with_context(|| format!("writing witness to {}", path.display()))?;
            tracing::info!("Wrote {} witness elements to {}", output.buffer.len(), path.display());
        }

        let public_signals: Vec<String> = output.public_signals.iter().map(|s| s.to_string()).collect();
        emit_json(
            &json!({
                "circuit": self.circuit,
                "elements": output.buffer.len(),
                "limbs_per_element": output.buffer.n32(),
                "public_signals": public_signals,
            }),
            None,
        )
    }
}
