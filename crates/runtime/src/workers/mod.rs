//! Worker tasks behind the proof service.

mod metrics;
mod prover;

pub use metrics::{MetricsSnapshot, ProofMetrics};
pub use prover::{Command, ProverWorker};
