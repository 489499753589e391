//! In-process evaluator for arkworks circuits.
//!
//! Speaks the same scratch-register protocol as a compiled circom witness
//! calculator: inputs are addressed by the FNV-1a hash of their name and
//! staged limb by limb; the witness is produced by synthesizing the circuit
//! in prove mode once every input element is set.

use std::collections::HashMap;
use std::sync::Arc;

use ark_bn254::Fr as Fp254;
use ark_relations::r1cs::{ConstraintSystem, OptimizationGoal, SynthesisMode};
use num_bigint::{BigInt, BigUint};
use tracing::{debug, warn};

use super::{CircuitEvaluator, EngineError};
use crate::circuit::{NativeCircuit, SignalValues, groth16::circuit_matrices};
use crate::witness::{FieldCodec, SignalAddress};

pub struct NativeEvaluator {
    circuit: Arc<dyn NativeCircuit>,
    codec: FieldCodec,
    symbols: HashMap<SignalAddress, usize>,
    witness_size: usize,
    scratch: Vec<u32>,
    assigned: Vec<Vec<Option<Fp254>>>,
    pending: usize,
    initialized: bool,
    sanity_check: bool,
    witness: Option<Vec<Fp254>>,
}

impl NativeEvaluator {
    /// Builds the symbol table and discovers the witness size by a
    /// setup-mode synthesis.
    pub fn new(circuit: Arc<dyn NativeCircuit>) -> Result<Self, EngineError> {
        let mut symbols = HashMap::new();
        for (slot, spec) in circuit.inputs().iter().enumerate() {
            if symbols.insert(SignalAddress::of(spec.name), slot).is_some() {
                return Err(EngineError::Fault(format!(
                    "signal `{}` collides with another input name",
                    spec.name
                )));
            }
        }

        let matrices =
            circuit_matrices(circuit.as_ref()).map_err(|e| EngineError::Fault(e.to_string()))?;
        let witness_size = matrices.num_instance_variables + matrices.num_witness_variables;
        let codec = FieldCodec::bn254();

        Ok(Self {
            scratch: vec![0; codec.n32()],
            assigned: Self::empty_assignment(circuit.as_ref()),
            pending: circuit.input_size(),
            circuit,
            codec,
            symbols,
            witness_size,
            initialized: false,
            sanity_check: false,
            witness: None,
        })
    }

    fn empty_assignment(circuit: &dyn NativeCircuit) -> Vec<Vec<Option<Fp254>>> {
        circuit.inputs().iter().map(|s| vec![None; s.len]).collect()
    }

    fn stage(&mut self, value: &BigUint) -> Result<(), EngineError> {
        let words = self
            .codec
            .scratch_words(&BigInt::from(value.clone()))
            .map_err(|e| EngineError::Fault(e.to_string()))?;
        self.scratch.copy_from_slice(&words);
        Ok(())
    }

    fn compute_witness(&self) -> Result<Vec<Fp254>, EngineError> {
        let mut values = SignalValues::new();
        for (spec, elements) in self.circuit.inputs().iter().zip(&self.assigned) {
            let elements = elements
                .iter()
                .map(|e| {
                    e.ok_or_else(|| EngineError::Fault(format!("`{}` has unset elements", spec.name)))
                })
                .collect::<Result<Vec<_>, _>>()?;
            values.insert(spec.name, elements);
        }

        let cs = ConstraintSystem::<Fp254>::new_ref();
        cs.set_optimization_goal(OptimizationGoal::Constraints);
        cs.set_mode(SynthesisMode::Prove {
            construct_matrices: self.sanity_check,
        });
        self.circuit
            .synthesize(cs.clone(), Some(&values))
            .map_err(|e| EngineError::Fault(format!("{} synthesis failed: {e}", self.circuit.name())))?;
        cs.finalize();

        if self.sanity_check {
            let unsatisfied = cs
                .which_is_unsatisfied()
                .map_err(|e| EngineError::Fault(e.to_string()))?;
            if let Some(constraint) = unsatisfied {
                warn!(circuit = self.circuit.name(), %constraint, "sanity check failed");
                return Err(EngineError::Fault(format!(
                    "{}: constraint {constraint} is not satisfied",
                    self.circuit.name()
                )));
            }
        }

        let cs = cs
            .borrow()
            .ok_or_else(|| EngineError::Fault("constraint system already consumed".into()))?;
        let mut witness = cs.instance_assignment.clone();
        witness.extend_from_slice(&cs.witness_assignment);

        if witness.len() != self.witness_size {
            return Err(EngineError::Fault(format!(
                "witness has {} elements, setup declared {}",
                witness.len(),
                self.witness_size
            )));
        }
        Ok(witness)
    }
}

impl CircuitEvaluator for NativeEvaluator {
    fn circuit_name(&self) -> &str {
        self.circuit.name()
    }

    fn init(&mut self, sanity_check: bool) {
        self.scratch.iter_mut().for_each(|w| *w = 0);
        self.assigned = Self::empty_assignment(self.circuit.as_ref());
        self.pending = self.circuit.input_size();
        self.witness = None;
        self.sanity_check = sanity_check;
        self.initialized = true;
    }

    fn limb_width(&self) -> usize {
        self.codec.n32()
    }

    fn input_size(&self) -> usize {
        self.circuit.input_size()
    }

    fn witness_size(&self) -> usize {
        self.witness_size
    }

    fn load_prime(&mut self) {
        // n32 is derived from the prime, so its digits always fit.
        let words: Vec<u32> = self.codec.prime().to_u32_digits();
        self.scratch.iter_mut().for_each(|w| *w = 0);
        self.scratch[..words.len()].copy_from_slice(&words);
    }

    fn read_scratch(&self, offset: usize) -> Result<u32, EngineError> {
        self.scratch
            .get(offset)
            .copied()
            .ok_or(EngineError::ScratchOutOfRange {
                offset,
                n32: self.scratch.len(),
            })
    }

    fn write_scratch(&mut self, offset: usize, word: u32) -> Result<(), EngineError> {
        let n32 = self.scratch.len();
        let slot = self
            .scratch
            .get_mut(offset)
            .ok_or(EngineError::ScratchOutOfRange { offset, n32 })?;
        *slot = word;
        Ok(())
    }

    fn set_input_signal(&mut self, hi: u32, lo: u32, index: usize) -> Result<(), EngineError> {
        if !self.initialized {
            return Err(EngineError::NotInitialized);
        }
        let slot = *self
            .symbols
            .get(&SignalAddress { hi, lo })
            .ok_or(EngineError::UnknownSignal { hi, lo })?;

        let value = self.codec.from_scratch_words(&self.scratch);
        if &value >= self.codec.prime() {
            return Err(EngineError::NonCanonical);
        }

        let elements = &mut self.assigned[slot];
        let len = elements.len();
        let element = elements
            .get_mut(index)
            .ok_or(EngineError::IndexOutOfRange { index, len })?;
        if element.is_some() {
            return Err(EngineError::AlreadySet { index });
        }
        *element = Some(Fp254::from(value));
        self.pending -= 1;
        self.witness = None;
        Ok(())
    }

    fn stage_witness(&mut self, index: usize) -> Result<(), EngineError> {
        if !self.initialized {
            return Err(EngineError::NotInitialized);
        }
        if self.pending > 0 {
            return Err(EngineError::InputsPending {
                missing: self.pending,
            });
        }
        if index >= self.witness_size {
            return Err(EngineError::WitnessIndexOutOfRange {
                index,
                size: self.witness_size,
            });
        }

        if self.witness.is_none() {
            debug!(circuit = self.circuit.name(), "synthesizing witness");
            self.witness = Some(self.compute_witness()?);
        }
        let element: BigUint = match &self.witness {
            Some(witness) => witness[index].into(),
            None => return Err(EngineError::Fault("witness unavailable".into())),
        };
        self.stage(&element)
    }

    fn reset(&mut self) {
        self.init(false);
        self.initialized = false;
    }
}
