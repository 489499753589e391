//! Bridged backend: proving across the C ABI.
//!
//! Mirrors how a mobile host calls the prover: byte arrays in, a status
//! code and bounded buffers out. Oversized witnesses, outputs or error
//! messages are hard failures.

use async_trait::async_trait;
use tracing::debug;

use super::{BackendKind, BackendOutput, ProofBackend, ProvingKeyRef};
use crate::ProofError;
use crate::ffi::{self, RPS_BUFFER_TOO_SMALL, RPS_ERROR, RPS_ERROR_TRUNCATED, RPS_OK};
use crate::witness::WitnessBuffer;

/// Largest witness the bridge accepts (8 MiB).
pub const MAX_WITNESS_BYTES: usize = 8 * 1024 * 1024;

/// Error buffer capacity handed across the bridge.
pub const MAX_ERROR_BYTES: usize = 256;

const DEFAULT_OUTPUT_BYTES: usize = 16 * 1024;

/// Signature of `rps_groth16_prove`.
pub type ProveFn = unsafe extern "C" fn(
    zkey: *const u8,
    zkey_len: usize,
    witness: *const u8,
    witness_len: usize,
    out: *mut u8,
    out_len: *mut usize,
    err: *mut u8,
    err_cap: usize,
) -> i32;

#[derive(Clone, Copy, Debug)]
pub struct BridgedBackend {
    entry: ProveFn,
    output_capacity: usize,
}

impl Default for BridgedBackend {
    fn default() -> Self {
        Self::new(ffi::rps_groth16_prove)
    }
}

impl BridgedBackend {
    /// `entry` must follow the `rps_groth16_prove` contract.
    pub fn new(entry: ProveFn) -> Self {
        Self {
            entry,
            output_capacity: DEFAULT_OUTPUT_BYTES,
        }
    }

    pub fn with_output_capacity(mut self, bytes: usize) -> Self {
        self.output_capacity = bytes;
        self
    }

    fn call(&self, key: &[u8], witness: &[u8]) -> Result<Vec<u8>, ProofError> {
        let fault = |message: String| ProofError::backend(BackendKind::Bridged, message);

        let mut out = vec![0u8; self.output_capacity];
        let mut out_len = out.len();
        let mut err = [0u8; MAX_ERROR_BYTES];

        // SAFETY: every pointer comes from a live slice whose length is
        // passed alongside it; `out_len` starts at the capacity of `out`.
        let status = unsafe {
            (self.entry)(
                key.as_ptr(),
                key.len(),
                witness.as_ptr(),
                witness.len(),
                out.as_mut_ptr(),
                &mut out_len,
                err.as_mut_ptr(),
                err.len(),
            )
        };

        match status {
            RPS_OK if out_len <= out.len() => {
                out.truncate(out_len);
                Ok(out)
            }
            RPS_OK => Err(fault(format!(
                "bridge reported {out_len} output bytes for a {}-byte buffer",
                out.len()
            ))),
            RPS_ERROR => {
                let end = err.iter().position(|b| *b == 0).unwrap_or(err.len());
                Err(fault(String::from_utf8_lossy(&err[..end]).into_owned()))
            }
            RPS_BUFFER_TOO_SMALL => Err(fault(format!(
                "output needs {out_len} bytes, buffer holds {}",
                out.len()
            ))),
            RPS_ERROR_TRUNCATED => Err(fault(format!(
                "error message exceeded {MAX_ERROR_BYTES} bytes"
            ))),
            other => Err(fault(format!("unknown bridge status {other}"))),
        }
    }
}

#[async_trait]
impl ProofBackend for BridgedBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Bridged
    }

    async fn prove(
        &self,
        witness: WitnessBuffer,
        key: &ProvingKeyRef,
    ) -> Result<BackendOutput, ProofError> {
        if witness.as_bytes().len() > MAX_WITNESS_BYTES {
            return Err(ProofError::backend(
                BackendKind::Bridged,
                format!(
                    "witness of {} bytes exceeds the {MAX_WITNESS_BYTES}-byte bridge limit",
                    witness.as_bytes().len()
                ),
            ));
        }
        let key = key.load().await?;

        let bridge = *self;
        let output = tokio::task::spawn_blocking(move || bridge.call(&key, witness.as_bytes()))
            .await
            .map_err(|e| ProofError::backend(BackendKind::Bridged, format!("bridge task failed: {e}")))??;
        debug!(bytes = output.len(), "bridge returned proof");

        serde_json::from_slice(&output).map_err(|e| {
            ProofError::backend(BackendKind::Bridged, format!("malformed bridge output: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe extern "C" fn chatty_failure(
        _zkey: *const u8,
        _zkey_len: usize,
        _witness: *const u8,
        _witness_len: usize,
        _out: *mut u8,
        _out_len: *mut usize,
        _err: *mut u8,
        _err_cap: usize,
    ) -> i32 {
        RPS_ERROR_TRUNCATED
    }

    unsafe extern "C" fn needs_more_room(
        _zkey: *const u8,
        _zkey_len: usize,
        _witness: *const u8,
        _witness_len: usize,
        _out: *mut u8,
        out_len: *mut usize,
        _err: *mut u8,
        _err_cap: usize,
    ) -> i32 {
        unsafe { *out_len = 1 << 20 };
        RPS_BUFFER_TOO_SMALL
    }

    fn witness(bytes: usize) -> WitnessBuffer {
        WitnessBuffer::from_bytes(vec![0; bytes], 8).unwrap()
    }

    fn key() -> ProvingKeyRef {
        ProvingKeyRef::from_bytes(vec![1, 2, 3])
    }

    #[tokio::test]
    async fn test_oversized_witness_is_rejected_before_the_call() {
        let backend = BridgedBackend::new(chatty_failure);
        let err = backend
            .prove(witness(MAX_WITNESS_BYTES + 32), &key())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProofError::BackendFault { backend: BackendKind::Bridged, ref message } if message.contains("limit")
        ));
    }

    #[tokio::test]
    async fn test_error_overflow_is_a_hard_failure() {
        let backend = BridgedBackend::new(chatty_failure);
        let err = backend.prove(witness(32), &key()).await.unwrap_err();
        assert!(matches!(
            err,
            ProofError::BackendFault { ref message, .. } if message.contains("exceeded 256 bytes")
        ));
    }

    #[tokio::test]
    async fn test_small_output_buffer_reports_required_size() {
        let backend = BridgedBackend::new(needs_more_room);
        let err = backend.prove(witness(32), &key()).await.unwrap_err();
        assert!(matches!(
            err,
            ProofError::BackendFault { ref message, .. } if message.contains("1048576")
        ));
    }

    #[tokio::test]
    async fn test_bridge_errors_carry_the_message() {
        let backend = BridgedBackend::default();
        let err = backend.prove(witness(32), &key()).await.unwrap_err();
        assert!(matches!(
            err,
            ProofError::BackendFault { ref message, .. } if message.contains("magic")
        ));
    }
}
