//! Subcommand implementations.
//!
//! Each command owns its clap arguments and an `execute` method.

mod attest;
mod prove;
mod reveal;
mod setup;
mod verify;
mod witness;

pub use attest::Attest;
pub use prove::Prove;
pub use reveal::Reveal;
pub use setup::Setup;
pub use verify::Verify;
pub use witness::Witness;

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use num_bigint::BigUint;
use zk::{CircuitInput, NativeCircuit};

/// Resolves a registered circuit, listing the valid names on failure.
fn circuit(name: &str) -> Result<Arc<dyn NativeCircuit>> {
    zk::circuit_by_name(name).ok_or_else(|| {
        anyhow!(
            "unknown circuit `{name}` (expected one of: {})",
            zk::CIRCUIT_NAMES.join(", ")
        )
    })
}

/// Reads circuit input JSON from `path`, or stdin when `path` is `-`.
fn read_input(path: &Path) -> Result<CircuitInput> {
    let json = if path.as_os_str() == "-" {
        let mut json = String::new();
        std::io::stdin()
            .read_to_string(&mut json)
            .context("reading input JSON from stdin")?;
        json
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("reading input JSON from {}", path.display()))?
    };
    CircuitInput::from_json(&json).context("parsing circuit input")
}

/// Parses a decimal or `0x`-prefixed hex integer.
fn parse_biguint(text: &str) -> Result<BigUint> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => BigUint::parse_bytes(hex.as_bytes(), 16),
        None => BigUint::parse_bytes(text.as_bytes(), 10),
    };
    parsed.ok_or_else(|| anyhow!("`{text}` is not a decimal or 0x-hex integer"))
}

/// Writes `value` as pretty JSON to `out`, or stdout when unset.
fn emit_json(value: &serde_json::Value, out: Option<&Path>) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => {
            std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}
