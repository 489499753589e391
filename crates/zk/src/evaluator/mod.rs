//! Circuit evaluator protocol and its guarded adapter.
//!
//! An evaluator is a small state machine reached through a narrow,
//! memory-mapped style interface: one scratch register of `n32` 32-bit words,
//! signal assignment by hashed name, and witness reads one element at a time.
//! [`CircuitEvaluator`] is that raw interface. [`EvaluatorAdapter`] wraps it
//! and rejects every call the engine would treat as undefined behaviour
//! (assignment before `init`, witness reads before all inputs are set,
//! scratch offsets outside the limb width).

pub mod native;

use std::sync::{Arc, Mutex, MutexGuard};

use num_bigint::BigUint;
use thiserror::Error;
use tracing::debug;

use crate::error::ProofError;
use crate::witness::SignalAddress;

pub use native::NativeEvaluator;

/// Failures reported by an evaluator engine or by the adapter guarding it.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("evaluator used before init")]
    NotInitialized,

    #[error("no input signal with hash {hi:08x}{lo:08x}")]
    UnknownSignal { hi: u32, lo: u32 },

    #[error("signal index {index} out of range (signal has {len} elements)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("signal element {index} already set")]
    AlreadySet { index: usize },

    #[error("scratch offset {offset} outside limb width {n32}")]
    ScratchOutOfRange { offset: usize, n32: usize },

    #[error("scratch value is not a canonical field element")]
    NonCanonical,

    #[error("{missing} input signals still unset")]
    InputsPending { missing: usize },

    #[error("witness index {index} out of range (witness has {size} elements)")]
    WitnessIndexOutOfRange { index: usize, size: usize },

    #[error("{0}")]
    Fault(String),
}

/// Raw evaluator interface, one call per engine operation.
///
/// Implementations are not reentrant: the scratch register and the input
/// bookkeeping are mutated in place.
pub trait CircuitEvaluator: Send {
    /// Name of the compiled circuit this engine evaluates.
    fn circuit_name(&self) -> &str;

    /// Resets all signal state. Must precede every signal operation.
    fn init(&mut self, sanity_check: bool);

    /// Number of 32-bit limbs per field element.
    fn limb_width(&self) -> usize;

    /// Total number of input signal elements the circuit declares.
    fn input_size(&self) -> usize;

    /// Number of elements in the full witness vector.
    fn witness_size(&self) -> usize;

    /// Stages the field prime in the scratch register.
    fn load_prime(&mut self);

    fn read_scratch(&self, offset: usize) -> Result<u32, EngineError>;

    fn write_scratch(&mut self, offset: usize, word: u32) -> Result<(), EngineError>;

    /// Commits the scratch value as element `index` of the signal at `hi:lo`.
    fn set_input_signal(&mut self, hi: u32, lo: u32, index: usize) -> Result<(), EngineError>;

    /// Stages witness element `index` in the scratch register.
    fn stage_witness(&mut self, index: usize) -> Result<(), EngineError>;

    /// Drops any secret material held from the last evaluation.
    fn reset(&mut self) {
        self.init(false);
    }
}

/// Lifecycle of an adapter-guarded evaluator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvaluatorState {
    Uninitialized,
    /// `init` done; input signals being committed.
    Initialized,
    /// Every declared input set; witness elements may be read.
    Ready,
}

/// Single-owner wrapper that enforces the evaluator call protocol.
pub struct EvaluatorAdapter {
    engine: Box<dyn CircuitEvaluator>,
    state: EvaluatorState,
    n32: usize,
    signals_set: usize,
}

impl EvaluatorAdapter {
    pub fn new(engine: Box<dyn CircuitEvaluator>) -> Self {
        let n32 = engine.limb_width();
        Self {
            engine,
            state: EvaluatorState::Uninitialized,
            n32,
            signals_set: 0,
        }
    }

    pub fn circuit_name(&self) -> &str {
        self.engine.circuit_name()
    }

    pub fn state(&self) -> EvaluatorState {
        self.state
    }

    pub fn limb_width(&self) -> usize {
        self.n32
    }

    pub fn input_size(&self) -> usize {
        self.engine.input_size()
    }

    pub fn witness_size(&self) -> usize {
        self.engine.witness_size()
    }

    /// Number of input elements committed since the last `init`.
    pub fn signals_set(&self) -> usize {
        self.signals_set
    }

    pub fn init(&mut self, sanity_check: bool) {
        self.engine.init(sanity_check);
        self.signals_set = 0;
        self.state = if self.engine.input_size() == 0 {
            EvaluatorState::Ready
        } else {
            EvaluatorState::Initialized
        };
        debug!(
            circuit = self.engine.circuit_name(),
            sanity_check, "evaluator initialized"
        );
    }

    /// Reads the field prime through the scratch register.
    pub fn field_prime(&mut self) -> Result<BigUint, EngineError> {
        self.engine.load_prime();
        let words = self.read_scratch_words()?;
        Ok(BigUint::new(words))
    }

    /// Writes `words` (scratch order) and commits them as `addr[index]`.
    pub fn set_input(
        &mut self,
        addr: SignalAddress,
        index: usize,
        words: &[u32],
    ) -> Result<(), EngineError> {
        if self.state == EvaluatorState::Uninitialized {
            return Err(EngineError::NotInitialized);
        }
        if words.len() != self.n32 {
            return Err(EngineError::ScratchOutOfRange {
                offset: words.len(),
                n32: self.n32,
            });
        }

        for (offset, word) in words.iter().enumerate() {
            self.engine.write_scratch(offset, *word)?;
        }
        self.engine.set_input_signal(addr.hi, addr.lo, index)?;

        self.signals_set += 1;
        if self.signals_set >= self.engine.input_size() {
            self.state = EvaluatorState::Ready;
        }
        Ok(())
    }

    /// Reads witness element `index` as scratch-order words.
    pub fn read_witness(&mut self, index: usize) -> Result<Vec<u32>, EngineError> {
        match self.state {
            EvaluatorState::Uninitialized => return Err(EngineError::NotInitialized),
            EvaluatorState::Initialized => {
                return Err(EngineError::InputsPending {
                    missing: self.engine.input_size().saturating_sub(self.signals_set),
                });
            }
            EvaluatorState::Ready => {}
        }

        let size = self.engine.witness_size();
        if index >= size {
            return Err(EngineError::WitnessIndexOutOfRange { index, size });
        }
        self.engine.stage_witness(index)?;
        self.read_scratch_words()
    }

    /// Returns the engine to `Uninitialized`, dropping cached witness data.
    pub fn finish(&mut self) {
        self.engine.reset();
        self.signals_set = 0;
        self.state = EvaluatorState::Uninitialized;
    }

    fn read_scratch_words(&self) -> Result<Vec<u32>, EngineError> {
        (0..self.n32)
            .map(|offset| self.engine.read_scratch(offset))
            .collect()
    }
}

impl std::fmt::Debug for EvaluatorAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluatorAdapter")
            .field("circuit", &self.engine.circuit_name())
            .field("state", &self.state)
            .field("n32", &self.n32)
            .field("signals_set", &self.signals_set)
            .finish()
    }
}

/// Mutex-guarded evaluator shared between async tasks.
///
/// At most one witness assembly runs per evaluator at a time; independent
/// circuits get independent handles.
#[derive(Clone, Debug)]
pub struct SharedEvaluator {
    circuit: Arc<str>,
    inner: Arc<Mutex<EvaluatorAdapter>>,
}

impl SharedEvaluator {
    pub fn new(engine: Box<dyn CircuitEvaluator>) -> Self {
        let adapter = EvaluatorAdapter::new(engine);
        Self {
            circuit: adapter.circuit_name().into(),
            inner: Arc::new(Mutex::new(adapter)),
        }
    }

    /// Circuit name, readable without taking the lock.
    pub fn circuit_name(&self) -> &str {
        &self.circuit
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, EvaluatorAdapter>, ProofError> {
        self.inner
            .lock()
            .map_err(|_| ProofError::EvaluatorFault("evaluator mutex poisoned".to_string()))
    }
}
