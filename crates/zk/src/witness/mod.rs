//! Witness assembly.
//!
//! [`WitnessAssembler`] drives an [`EvaluatorAdapter`] through the evaluator
//! protocol: init, read limb width and prime, set every input element by
//! hashed name, then read the full witness back. The result is a flat
//! little-endian word buffer plus the public-signal prefix.

mod codec;
mod hasher;
mod input;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use num_bigint::BigUint;
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::{InputError, ProofError};
use crate::evaluator::{EngineError, EvaluatorAdapter};

pub use codec::{FieldCodec, LimbOverflow, from_limbs, normalize, to_limbs};
pub use hasher::{SignalAddress, fnv1a};
pub use input::CircuitInput;

/// Flat witness: `len × n32` 32-bit words, least significant limb first,
/// each word little-endian. Wiped on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct WitnessBuffer {
    bytes: Zeroizing<Vec<u8>>,
    n32: usize,
}

impl WitnessBuffer {
    /// Wraps raw bytes; the length must be a whole number of elements.
    pub fn from_bytes(bytes: Vec<u8>, n32: usize) -> Result<Self, ProofError> {
        let bytes = Zeroizing::new(bytes);
        let stride = n32 * 4;
        if n32 == 0 || bytes.len() % stride != 0 {
            return Err(ProofError::SerializationError(format!(
                "witness buffer of {} bytes is not a multiple of {stride}",
                bytes.len()
            )));
        }
        Ok(Self { bytes, n32 })
    }

    pub fn from_elements(elements: &[BigUint], n32: usize) -> Result<Self, LimbOverflow> {
        let mut bytes = Zeroizing::new(Vec::with_capacity(elements.len() * n32 * 4));
        for element in elements {
            let mut limbs = to_limbs(element, n32)?;
            limbs.reverse();
            for word in limbs {
                bytes.extend_from_slice(&word.to_le_bytes());
            }
        }
        Ok(Self { bytes, n32 })
    }

    pub fn from_base64(encoded: &str, n32: usize) -> Result<Self, ProofError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| ProofError::SerializationError(format!("witness base64: {e}")))?;
        Self::from_bytes(bytes, n32)
    }

    pub fn to_base64(&self) -> Zeroizing<String> {
        Zeroizing::new(STANDARD.encode(self.bytes.as_slice()))
    }

    pub fn n32(&self) -> usize {
        self.n32
    }

    /// Number of field elements.
    pub fn len(&self) -> usize {
        self.bytes.len() / (self.n32 * 4)
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn element(&self, index: usize) -> Option<BigUint> {
        let stride = self.n32 * 4;
        let chunk = self.bytes.get(index * stride..(index + 1) * stride)?;
        let words = chunk
            .chunks_exact(4)
            .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
            .collect();
        Some(BigUint::new(words))
    }

    pub fn elements(&self) -> impl Iterator<Item = BigUint> + '_ {
        (0..self.len()).filter_map(|i| self.element(i))
    }
}

impl std::fmt::Debug for WitnessBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WitnessBuffer")
            .field("elements", &self.len())
            .field("n32", &self.n32)
            .finish_non_exhaustive()
    }
}

/// Witness plus the public signals read from it.
#[derive(Debug)]
pub struct WitnessOutput {
    pub buffer: WitnessBuffer,
    pub public_signals: Vec<BigUint>,
}

/// Assembles witnesses against one exclusively borrowed evaluator.
pub struct WitnessAssembler<'a> {
    evaluator: &'a mut EvaluatorAdapter,
}

impl<'a> WitnessAssembler<'a> {
    pub fn new(evaluator: &'a mut EvaluatorAdapter) -> Self {
        Self { evaluator }
    }

    /// Runs the full protocol. The evaluator is reset afterwards whether or
    /// not assembly succeeded.
    pub fn assemble(
        &mut self,
        input: &CircuitInput,
        num_signals: usize,
        sanity_check: bool,
    ) -> Result<WitnessOutput, ProofError> {
        let result = self.run(input, num_signals, sanity_check);
        self.evaluator.finish();
        result
    }

    fn run(
        &mut self,
        input: &CircuitInput,
        num_signals: usize,
        sanity_check: bool,
    ) -> Result<WitnessOutput, ProofError> {
        let evaluator = &mut *self.evaluator;
        evaluator.init(sanity_check);

        let n32 = evaluator.limb_width();
        let prime = evaluator.field_prime().map_err(fault)?;
        if prime.bits() < 2 || prime.bits() > (n32 as u64) * 32 {
            return Err(ProofError::EvaluatorFault(format!(
                "evaluator reported a {}-bit prime for {n32} limbs",
                prime.bits()
            )));
        }
        let codec = FieldCodec::new(prime, n32);
        debug!(
            circuit = evaluator.circuit_name(),
            n32,
            inputs = evaluator.input_size(),
            "assembling witness"
        );

        for (name, values) in input.iter() {
            let addr = SignalAddress::of(name);
            for (index, value) in values.iter().enumerate() {
                let words = codec.scratch_words(value).map_err(|e| ProofError::EncodingOverflow {
                    signal: name.to_string(),
                    index,
                    required: e.required,
                    available: e.available,
                })?;
                evaluator
                    .set_input(addr, index, &words)
                    .map_err(|e| signal_error(e, name, index))?;
            }
        }

        let expected = evaluator.input_size();
        let provided = evaluator.signals_set();
        if provided < expected {
            return Err(InputError::Incomplete { provided, expected }.into());
        }

        let witness_size = evaluator.witness_size();
        if num_signals >= witness_size {
            return Err(ProofError::EvaluatorFault(format!(
                "{num_signals} public signals requested from a witness of {witness_size} elements"
            )));
        }

        let mut bytes = Zeroizing::new(Vec::with_capacity(witness_size * n32 * 4));
        let mut public_signals = Vec::with_capacity(num_signals);
        for index in 0..witness_size {
            let words = evaluator.read_witness(index).map_err(fault)?;
            if (1..=num_signals).contains(&index) {
                public_signals.push(codec.from_scratch_words(&words));
            }
            for word in &words {
                bytes.extend_from_slice(&word.to_le_bytes());
            }
        }
        debug!(witness_size, num_signals, "witness extracted");

        Ok(WitnessOutput {
            buffer: WitnessBuffer { bytes, n32 },
            public_signals,
        })
    }
}

fn fault(err: EngineError) -> ProofError {
    ProofError::EvaluatorFault(err.to_string())
}

fn signal_error(err: EngineError, signal: &str, index: usize) -> ProofError {
    let signal = signal.to_string();
    match err {
        EngineError::UnknownSignal { .. } => InputError::UnknownSignal { signal, index }.into(),
        EngineError::IndexOutOfRange { len, .. } => {
            InputError::IndexOutOfRange { signal, index, len }.into()
        }
        EngineError::AlreadySet { .. } => InputError::AlreadySet { signal, index }.into(),
        other => fault(other),
    }
}
