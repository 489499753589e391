//! Async proof service for rock/paper/scissors move attestation.
//!
//! This crate wires the `zk` orchestrators into a long-lived service: one
//! evaluator and orchestrator per circuit, a background prover worker fed by
//! a bounded command channel, shared metrics, and a wallet seam for round
//! secrets. Consumers build a [`ProofService`] and talk to it through
//! [`ProofServiceHandle`].
//!
//! Modules are organized by responsibility:
//! - [`service`] hosts the service and its builder
//! - [`api`] exposes the handle and error types
//! - [`config`] reads configuration from the environment
//! - [`secret`] derives round secrets from a signing wallet
//! - `workers` keeps the background task internal to the crate
pub mod api;
pub mod config;
pub mod secret;
pub mod service;

mod workers;

pub use api::{AttestedMove, ProofServiceHandle, Result, RevealedMove, RuntimeError};
pub use config::{RuntimeConfig, default_key_dir};
pub use secret::{LocalSigner, SecretSource, round_secret};
pub use service::{ProofService, ProofServiceBuilder, backend_for};
pub use workers::{MetricsSnapshot, ProofMetrics};
