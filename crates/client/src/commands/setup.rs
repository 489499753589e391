//! Circuit-specific Groth16 key generation.

use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::{OsRng, StdRng};
use runtime::RuntimeConfig;
use zk::{CIRCUIT_NAMES, CircuitKeys, fingerprint};

use super::circuit;

/// Generate proving and verifying keys for one or all circuits
#[derive(Debug, Parser)]
pub struct Setup {
    /// Circuit to set up (default: every registered circuit)
    #[arg(short, long)]
    pub circuit: Option<String>,

    /// Deterministic setup seed, for reproducible development keys
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Setup {
    pub fn execute(&self, config: &RuntimeConfig) -> Result<()> {
        let names: Vec<&str> = match &self.circuit {
            Some(name) => vec![name.as_str()],
            None => CIRCUIT_NAMES.to_vec(),
        };

        if self.seed.is_some() {
            tracing::warn!("Seeded setup: keys are reproducible and unsuitable for production");
        }

        for name in names {
            let keys = match self.seed {
                Some(seed) => CircuitKeys::setup(circuit(name)?, &mut StdRng::seed_from_u64(seed)),
                None => CircuitKeys::setup(circuit(name)?, &mut OsRng),
            }
            .with_context(|| format!("setting up `{name}`"))?;

            let (zkey, vkey) = keys
                .write_to_dir(&config.key_dir, name)
                .with_context(|| format!("writing `{name}` keys"))?;
            let digest = fingerprint(&keys.to_bytes()?);

            tracing::info!(circuit = name, key = %digest, "keys written");
            println!("{name}");
            println!("  proving key:   {}", zkey.display());
            println!("  verifying key: {}", vkey.display());
            println!("  fingerprint:   {digest}");
            println!("  public inputs: {}", keys.num_public_inputs());
        }

        Ok(())
    }
}
