use std::sync::OnceLock;

use ark_std::test_rng;
use game_core::Move;
use runtime::{LocalSigner, ProofService, RuntimeConfig, RuntimeError, round_secret};
use zk::circuit::commitment::move_attestation;
use zk::circuit::{AttestValidMove, RevealMove};
use zk::{BackendKind, CircuitInput, CircuitKeys, InputError, ProofError, ProvingKeyRef, verify_canonical};

struct Fixture {
    keys: CircuitKeys,
    bytes: Vec<u8>,
}

fn fixture(name: &str) -> &'static Fixture {
    static ATTEST: OnceLock<Fixture> = OnceLock::new();
    static REVEAL: OnceLock<Fixture> = OnceLock::new();

    let cell = if name == AttestValidMove::NAME { &ATTEST } else { &REVEAL };
    cell.get_or_init(|| {
        let circuit = zk::circuit_by_name(name).expect("registered circuit");
        let keys = CircuitKeys::setup(circuit, &mut test_rng()).expect("setup");
        let bytes = keys.to_bytes().expect("serialize");
        Fixture { keys, bytes }
    })
}

async fn in_memory_service(signer: Option<LocalSigner>) -> ProofService {
    let mut builder = ProofService::builder()
        .config(RuntimeConfig {
            backend: BackendKind::InMemory,
            sanity_check: true,
            ..RuntimeConfig::default()
        })
        .proving_key(
            AttestValidMove::NAME,
            ProvingKeyRef::from_bytes(fixture(AttestValidMove::NAME).bytes.clone()),
        )
        .proving_key(
            RevealMove::NAME,
            ProvingKeyRef::from_bytes(fixture(RevealMove::NAME).bytes.clone()),
        );
    if let Some(signer) = signer {
        builder = builder.secret_source(signer);
    }
    builder.build().await.expect("service builds")
}

#[tokio::test]
async fn test_attest_then_reveal_every_move() {
    let signer = LocalSigner::new("player-one");
    let service = in_memory_service(Some(signer.clone())).await;
    let handle = service.handle();

    for (nonce, mv) in [(0u64, Move::Rock), (1, Move::Paper), (2, Move::Scissors)] {
        let attested = handle.attest_move(mv, nonce).await.expect("attest");
        let secret = round_secret(&signer, nonce).await.unwrap();
        assert_eq!(attested.attestation, move_attestation(mv, &secret).unwrap());
        assert!(
            verify_canonical(
                &attested.proof.proof,
                &attested.proof.public_signals,
                &fixture(AttestValidMove::NAME).keys.verifying_key,
            )
            .unwrap()
        );

        let revealed = handle
            .reveal_move(&attested.attestation, nonce)
            .await
            .expect("reveal");
        assert_eq!(revealed.mv, mv);
        assert!(
            verify_canonical(
                &revealed.proof.proof,
                &revealed.proof.public_signals,
                &fixture(RevealMove::NAME).keys.verifying_key,
            )
            .unwrap()
        );
    }

    let metrics = service.metrics();
    assert_eq!(metrics.generated, 6);
    assert_eq!(metrics.failed, 0);
    assert_eq!(metrics.queue_depth, 0);
    assert!(metrics.peak_queue_depth >= 1);

    service.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn test_reveal_in_another_round_fails() {
    let service = in_memory_service(Some(LocalSigner::new("player-two"))).await;
    let handle = service.handle();

    let attested = handle.attest_move(Move::Rock, 7).await.unwrap();
    let err = handle
        .reveal_move(&attested.attestation, 8)
        .await
        .expect_err("wrong round secret cannot open the commitment");
    assert!(matches!(err, RuntimeError::Proof(_)), "{err:?}");
    assert_eq!(service.metrics().failed, 1);

    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_failures_are_counted_by_category() {
    let service = in_memory_service(None).await;
    let handle = service.handle();

    let missing_secret = CircuitInput::new().scalar("move", 1).unwrap();
    let err = handle
        .prove(AttestValidMove::NAME, missing_secret)
        .await
        .expect_err("incomplete input");
    assert!(matches!(
        err,
        RuntimeError::Proof(ProofError::InvalidInput(InputError::Incomplete { .. }))
    ));

    let err = handle
        .prove("castSpell", CircuitInput::new())
        .await
        .expect_err("unknown circuit");
    assert!(matches!(err, RuntimeError::UnknownCircuit(name) if name == "castSpell"));

    let metrics = handle.metrics();
    assert_eq!(metrics.failed, 2);
    assert_eq!(metrics.failures_by_category["invalid_input"], 1);
    assert_eq!(metrics.failures_by_category["unknown_circuit"], 1);
    assert_eq!(metrics.success_rate, 0.0);

    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_move_flows_need_a_secret_source() {
    let service = in_memory_service(None).await;
    let err = service
        .handle()
        .attest_move(Move::Paper, 0)
        .await
        .expect_err("no wallet");
    assert!(matches!(err, RuntimeError::SecretSourceNotSet));
    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_file_path_backend_reads_keys_and_saves_proofs() {
    let keys_dir = tempfile::tempdir().unwrap();
    let proofs_dir = tempfile::tempdir().unwrap();
    fixture(AttestValidMove::NAME)
        .keys
        .write_to_dir(keys_dir.path(), AttestValidMove::NAME)
        .unwrap();

    let service = ProofService::builder()
        .config(RuntimeConfig {
            key_dir: keys_dir.path().to_path_buf(),
            backend: BackendKind::FilePath,
            sanity_check: false,
            save_proofs_dir: Some(proofs_dir.path().join("out")),
            request_buffer: 4,
        })
        .secret_source(LocalSigner::new("player-three"))
        .build()
        .await
        .unwrap();

    let attested = service.handle().attest_move(Move::Scissors, 0).await.unwrap();
    assert_eq!(attested.proof.backend, BackendKind::FilePath);

    let saved: Vec<_> = std::fs::read_dir(proofs_dir.path().join("out"))
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(saved.len(), 1);
    let name = saved[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("proof_attestValidMove_"), "{name}");

    let json: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&saved[0]).unwrap()).unwrap();
    assert_eq!(json["circuit"], "attestValidMove");
    assert_eq!(json["backend"], "file-path");
    assert_eq!(json["proof"].as_array().unwrap().len(), 8);
    assert_eq!(
        json["public_signals"][0].as_str().unwrap(),
        attested.attestation.to_string()
    );

    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_requests_after_shutdown_are_rejected() {
    let service = in_memory_service(None).await;
    let handle = service.handle();
    service.shutdown().await.unwrap();

    let input = CircuitInput::new()
        .scalar("move", 0)
        .and_then(|i| i.scalar("secret", 5))
        .unwrap();
    let err = handle
        .prove(AttestValidMove::NAME, input)
        .await
        .expect_err("worker stopped");
    assert!(matches!(err, RuntimeError::CommandChannelClosed));
    assert!(matches!(
        handle.shutdown().await,
        Err(RuntimeError::CommandChannelClosed)
    ));
}

#[tokio::test]
async fn test_builder_rejects_keys_for_unknown_circuits() {
    let result = ProofService::builder()
        .proving_key("castSpell", ProvingKeyRef::from_bytes(vec![1, 2, 3]))
        .backend(runtime::backend_for(BackendKind::Bridged).unwrap())
        .build()
        .await;
    assert!(matches!(result, Err(RuntimeError::UnknownCircuit(name)) if name == "castSpell"));
}
