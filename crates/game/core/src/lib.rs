//! Rock/paper/scissors rules shared across the proving stack.
//!
//! `game-core` defines the move encoding the circuits constrain
//! (`0 = rock`, `1 = paper`, `2 = scissors`), the round outcome codes the
//! on-chain contract reports, and the helpers that turn a wallet signature
//! into the per-round secret used as the commitment blinding value.
pub mod error;
pub mod moves;
pub mod secret;

pub use error::{MoveError, SecretError};
pub use moves::{Move, RoundOutcome};
pub use secret::{round_signature_message, secret_from_signature};
