//! Proof service orchestrator.
//!
//! The service owns one [`ProofOrchestrator`] per registered circuit, the
//! background prover worker, and the shared metrics. Clients talk to it
//! through [`ProofServiceHandle`].

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use zk::circuit::groth16::proving_key_path;
use zk::{
    BackendKind, BridgedBackend, CIRCUIT_NAMES, FilePathBackend, InMemoryBackend, ProofBackend,
    ProofContext, ProofOrchestrator, ProvingKeyRef, circuit_by_name,
};

use crate::api::{ProofServiceHandle, Result, RuntimeError};
use crate::config::RuntimeConfig;
use crate::secret::SecretSource;
use crate::workers::{Command, MetricsSnapshot, ProofMetrics, ProverWorker};

/// Running proof service.
pub struct ProofService {
    handle: ProofServiceHandle,
    worker: JoinHandle<()>,
}

impl ProofService {
    pub fn builder() -> ProofServiceBuilder {
        ProofServiceBuilder::new()
    }

    /// Cloneable handle for clients and tasks.
    pub fn handle(&self) -> ProofServiceHandle {
        self.handle.clone()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.handle.metrics()
    }

    /// Stops the worker and waits for in-flight proofs.
    pub async fn shutdown(self) -> Result<()> {
        match self.handle.shutdown().await {
            // Another handle already shut the worker down.
            Ok(()) | Err(RuntimeError::CommandChannelClosed) => {}
            Err(e) => return Err(e),
        }
        self.worker.await.map_err(RuntimeError::WorkerJoin)
    }
}

/// Builder for [`ProofService`].
pub struct ProofServiceBuilder {
    config: RuntimeConfig,
    backend: Option<Arc<dyn ProofBackend>>,
    proving_keys: HashMap<String, ProvingKeyRef>,
    secrets: Option<Arc<dyn SecretSource>>,
}

impl ProofServiceBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            backend: None,
            proving_keys: HashMap::new(),
            secrets: None,
        }
    }

    /// Override service configuration.
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Use this backend instead of the one named by `config.backend`.
    pub fn backend(mut self, backend: Arc<dyn ProofBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Use this key for `circuit` instead of `<key_dir>/<circuit>.zkey`.
    pub fn proving_key(mut self, circuit: impl Into<String>, key: ProvingKeyRef) -> Self {
        self.proving_keys.insert(circuit.into(), key);
        self
    }

    /// Wallet used to derive round secrets for attest/reveal.
    pub fn secret_source(mut self, source: impl SecretSource + 'static) -> Self {
        self.secrets = Some(Arc::new(source));
        self
    }

    /// Build the service and spawn its worker.
    pub async fn build(mut self) -> Result<ProofService> {
        let backend = match self.backend.take() {
            Some(backend) => backend,
            None => backend_for(self.config.backend)?,
        };

        if let Some(unknown) = self.proving_keys.keys().find(|name| circuit_by_name(name).is_none()) {
            return Err(RuntimeError::UnknownCircuit(unknown.clone()));
        }

        let mut orchestrators = HashMap::new();
        for name in CIRCUIT_NAMES {
            let circuit = circuit_by_name(name).ok_or_else(|| RuntimeError::UnknownCircuit(name.to_string()))?;
            let proving_key = self
                .proving_keys
                .remove(name)
                .unwrap_or_else(|| ProvingKeyRef::Path(proving_key_path(&self.config.key_dir, name)));

            let context = ProofContext {
                backend: Arc::clone(&backend),
                proving_key,
                num_signals: circuit.public_signals(),
                sanity_check: self.config.sanity_check,
            };
            orchestrators.insert(
                name.to_string(),
                ProofOrchestrator::new(zk::shared_evaluator(name)?, context),
            );
        }

        let metrics = Arc::new(ProofMetrics::new());
        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.request_buffer.max(1));
        let handle = ProofServiceHandle::new(command_tx, Arc::clone(&metrics), self.secrets);

        let worker = ProverWorker::new(orchestrators, command_rx, metrics, self.config.save_proofs_dir.clone());
        let worker = tokio::spawn(async move {
            worker.run().await;
        });

        info!(
            backend = %backend.kind(),
            key_dir = %self.config.key_dir.display(),
            sanity_check = self.config.sanity_check,
            "proof service started"
        );

        Ok(ProofService { handle, worker })
    }
}

/// Instantiates the backend named by `kind`.
pub fn backend_for(kind: BackendKind) -> Result<Arc<dyn ProofBackend>> {
    let backend: Arc<dyn ProofBackend> = match kind {
        BackendKind::FilePath => Arc::new(FilePathBackend::default()),
        BackendKind::InMemory => Arc::new(InMemoryBackend::spawn()?),
        BackendKind::Bridged => Arc::new(BridgedBackend::default()),
    };
    Ok(backend)
}
