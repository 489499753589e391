//! Types downstream clients interact with.
mod errors;
mod handle;

pub use errors::{Result, RuntimeError};
pub use handle::{AttestedMove, ProofServiceHandle, RevealedMove};
