//! Arkworks R1CS circuits for move attestation.
//!
//! Circuits describe their named input signals and synthesize constraints
//! over BN254. The same synthesis code runs in setup mode (no values, used for
//! key generation and witness-size discovery) and in prove mode (values taken
//! from [`SignalValues`]), so variable layout is identical in both.
//!
//! Public variables are allocated outputs first, then public inputs, which
//! puts the circuit's outputs at witness indices `1..`.

pub mod attest_valid_move;
pub mod commitment;
pub mod gadgets;
pub mod groth16;
pub mod reveal_move;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ark_bn254::Fr as Fp254;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

pub use attest_valid_move::AttestValidMove;
pub use reveal_move::RevealMove;

/// A named input signal and its element count (1 for scalars).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignalSpec {
    pub name: &'static str,
    pub len: usize,
}

impl SignalSpec {
    pub const fn scalar(name: &'static str) -> Self {
        Self { name, len: 1 }
    }
}

/// Input assignment handed to a circuit during prove-mode synthesis.
#[derive(Clone, Debug, Default)]
pub struct SignalValues {
    values: HashMap<&'static str, Vec<Fp254>>,
}

impl SignalValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &'static str, elements: Vec<Fp254>) {
        self.values.insert(name, elements);
    }

    pub fn get(&self, name: &str, index: usize) -> Option<Fp254> {
        self.values.get(name).and_then(|v| v.get(index)).copied()
    }

    /// Value lookup for allocation closures; absent in setup mode.
    pub fn lookup(
        values: Option<&Self>,
        name: &str,
        index: usize,
    ) -> Result<Fp254, SynthesisError> {
        values
            .and_then(|v| v.get(name, index))
            .ok_or(SynthesisError::AssignmentMissing)
    }
}

/// A circuit the native evaluator can run.
pub trait NativeCircuit: Send + Sync + fmt::Debug {
    /// Registry name, e.g. `attestValidMove`.
    fn name(&self) -> &'static str;

    /// Declared input signals in assignment order.
    fn inputs(&self) -> &'static [SignalSpec];

    /// Number of public variables (outputs, then public inputs).
    fn public_signals(&self) -> usize;

    fn synthesize(
        &self,
        cs: ConstraintSystemRef<Fp254>,
        values: Option<&SignalValues>,
    ) -> Result<(), SynthesisError>;

    /// Total number of input elements.
    fn input_size(&self) -> usize {
        self.inputs().iter().map(|s| s.len).sum()
    }
}

/// Owned circuit + optional assignment, for APIs that consume a
/// [`ConstraintSynthesizer`].
pub struct CircuitSynthesis {
    pub circuit: Arc<dyn NativeCircuit>,
    pub values: Option<SignalValues>,
}

impl CircuitSynthesis {
    pub fn setup(circuit: Arc<dyn NativeCircuit>) -> Self {
        Self {
            circuit,
            values: None,
        }
    }
}

impl ConstraintSynthesizer<Fp254> for CircuitSynthesis {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fp254>) -> Result<(), SynthesisError> {
        self.circuit.synthesize(cs, self.values.as_ref())
    }
}

/// Names of every registered circuit.
pub const CIRCUIT_NAMES: [&str; 2] = [AttestValidMove::NAME, RevealMove::NAME];

/// Resolves a registered circuit by name.
pub fn circuit_by_name(name: &str) -> Option<Arc<dyn NativeCircuit>> {
    match name {
        AttestValidMove::NAME => Some(Arc::new(AttestValidMove)),
        RevealMove::NAME => Some(Arc::new(RevealMove)),
        _ => None,
    }
}
