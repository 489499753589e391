//! C ABI entry points for host bridges (iOS/Android).
//!
//! Status codes:
//!
//! | code | meaning |
//! |---|---|
//! | `0` | success, `*out_len` holds the bytes written |
//! | `1` | failure, NUL-terminated message in `err` |
//! | `2` | `out` too small, `*out_len` holds the required size |
//! | `3` | failure whose message does not fit in `err_cap` bytes |
//!
//! Nothing is ever truncated: a value that does not fit is reported, not cut.

use std::panic::{self, AssertUnwindSafe};
use std::slice;
use std::sync::Arc;

use crate::circuit::{NativeCircuit, circuit_by_name};
use crate::evaluator::{EvaluatorAdapter, NativeEvaluator};
use crate::prover::{BackendKind, prove_blob};
use crate::witness::{CircuitInput, FieldCodec, WitnessAssembler, WitnessBuffer};

pub const RPS_OK: i32 = 0;
pub const RPS_ERROR: i32 = 1;
pub const RPS_BUFFER_TOO_SMALL: i32 = 2;
pub const RPS_ERROR_TRUNCATED: i32 = 3;

/// Computes the witness for a registered circuit from input JSON.
///
/// On success `out` holds the raw witness buffer (little-endian words).
///
/// # Safety
///
/// Every pointer must be valid for its stated length; `out_len` must point
/// to the capacity of `out` and is overwritten with the result size.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rps_witness_calc(
    circuit: *const u8,
    circuit_len: usize,
    input_json: *const u8,
    input_json_len: usize,
    out: *mut u8,
    out_len: *mut usize,
    err: *mut u8,
    err_cap: usize,
) -> i32 {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let name = unsafe { read_str(circuit, circuit_len) }?;
        let json = unsafe { read_str(input_json, input_json_len) }?;
        witness_calc(name, json)
    }));
    unsafe { respond(result, out, out_len, err, err_cap) }
}

/// Proves a witness buffer against a proving-key blob.
///
/// On success `out` holds `{"proof": …, "public_signals": […]}` JSON.
///
/// # Safety
///
/// Same contract as [`rps_witness_calc`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rps_groth16_prove(
    zkey: *const u8,
    zkey_len: usize,
    witness: *const u8,
    witness_len: usize,
    out: *mut u8,
    out_len: *mut usize,
    err: *mut u8,
    err_cap: usize,
) -> i32 {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let key = unsafe { read_bytes(zkey, zkey_len) };
        let witness = unsafe { read_bytes(witness, witness_len) };
        groth16_prove(key, witness)
    }));
    unsafe { respond(result, out, out_len, err, err_cap) }
}

fn witness_calc(name: &str, json: &str) -> Result<Vec<u8>, String> {
    let circuit: Arc<dyn NativeCircuit> =
        circuit_by_name(name).ok_or_else(|| format!("unknown circuit `{name}`"))?;
    let num_signals = circuit.public_signals();
    let input = CircuitInput::from_json(json).map_err(|e| e.to_string())?;

    let engine = NativeEvaluator::new(circuit).map_err(|e| e.to_string())?;
    let mut evaluator = EvaluatorAdapter::new(Box::new(engine));
    let output = WitnessAssembler::new(&mut evaluator)
        .assemble(&input, num_signals, true)
        .map_err(|e| e.to_string())?;
    Ok(output.buffer.as_bytes().to_vec())
}

fn groth16_prove(key: &[u8], witness: &[u8]) -> Result<Vec<u8>, String> {
    let witness = WitnessBuffer::from_bytes(witness.to_vec(), FieldCodec::bn254().n32())
        .map_err(|e| e.to_string())?;
    let output = prove_blob(BackendKind::Bridged, key, &witness).map_err(|e| e.to_string())?;
    serde_json::to_vec(&output).map_err(|e| e.to_string())
}

unsafe fn read_bytes<'a>(ptr: *const u8, len: usize) -> &'a [u8] {
    if ptr.is_null() || len == 0 {
        &[]
    } else {
        unsafe { slice::from_raw_parts(ptr, len) }
    }
}

unsafe fn read_str<'a>(ptr: *const u8, len: usize) -> Result<&'a str, String> {
    std::str::from_utf8(unsafe { read_bytes(ptr, len) }).map_err(|e| format!("invalid UTF-8: {e}"))
}

unsafe fn respond(
    result: std::thread::Result<Result<Vec<u8>, String>>,
    out: *mut u8,
    out_len: *mut usize,
    err: *mut u8,
    err_cap: usize,
) -> i32 {
    let message = match result {
        Ok(Ok(bytes)) => {
            if out_len.is_null() {
                "null output length pointer".to_string()
            } else {
                let capacity = unsafe { *out_len };
                unsafe { *out_len = bytes.len() };
                if bytes.len() > capacity || (out.is_null() && !bytes.is_empty()) {
                    return RPS_BUFFER_TOO_SMALL;
                }
                if !bytes.is_empty() {
                    unsafe { std::ptr::copy_nonoverlapping(bytes.as_ptr(), out, bytes.len()) };
                }
                return RPS_OK;
            }
        }
        Ok(Err(message)) => message,
        Err(_) => "prover panicked".to_string(),
    };

    let bytes = message.as_bytes();
    if err.is_null() || bytes.len() + 1 > err_cap {
        return RPS_ERROR_TRUNCATED;
    }
    unsafe {
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), err, bytes.len());
        *err.add(bytes.len()) = 0;
    }
    RPS_ERROR
}
