//! Attest → reveal round trips through the full proving pipeline.

mod common;

use std::sync::Arc;

use game_core::Move;
use num_bigint::{BigInt, BigUint};
use zk::circuit::commitment::move_attestation;
use zk::{CircuitInput, InMemoryBackend, InputError, ProofError, verify_canonical};

use common::{attest_keys, orchestrator, reveal_keys, secret};

fn attest_input(mv: Move) -> CircuitInput {
    CircuitInput::new()
        .scalar("move", mv.code())
        .and_then(|i| i.scalar("secret", secret()))
        .expect("valid input")
}

#[tokio::test]
async fn test_attest_then_reveal_recovers_every_move() {
    let backend = Arc::new(InMemoryBackend::spawn().unwrap());
    let attest = orchestrator("attestValidMove", attest_keys(), backend.clone(), None);
    let reveal = orchestrator("revealMove", reveal_keys(), backend, None);
    let secret_uint = secret().to_biguint().unwrap();

    for mv in [Move::Rock, Move::Paper, Move::Scissors] {
        let attested = attest.prove(attest_input(mv)).await.unwrap();
        let attestation = move_attestation(mv, &secret_uint).unwrap();
        assert_eq!(attested.public_signals, vec![attestation.clone()]);
        assert!(
            verify_canonical(&attested.proof, &attested.public_signals, &attest_keys().verifying_key)
                .unwrap()
        );

        let reveal_input = CircuitInput::new()
            .scalar("moveAttestation", BigInt::from(attestation.clone()))
            .and_then(|i| i.scalar("secret", secret()))
            .unwrap();
        let revealed = reveal.prove(reveal_input).await.unwrap();

        assert_eq!(revealed.public_signals[0], BigUint::from(mv.code()));
        assert_eq!(revealed.public_signals[1], attestation);
        assert_eq!(Move::try_from(&revealed.public_signals[0]).unwrap(), mv);
        assert!(
            verify_canonical(&revealed.proof, &revealed.public_signals, &reveal_keys().verifying_key)
                .unwrap()
        );
    }
}

/// Attestations of each move under the shared test secret.
const PINNED_ATTESTATIONS: [(Move, &str); 3] = [
    (
        Move::Rock,
        "9681356673337627769358423608774991915535774111155992267877743735317099594468",
    ),
    (
        Move::Paper,
        "19292791111493295791945526732465602908286251841515304496371858846181477051879",
    ),
    (
        Move::Scissors,
        "9313698127298497082387330034443241789985883704273264572160335745771251654560",
    ),
];

#[tokio::test]
async fn test_attestations_match_pinned_values() {
    let backend = Arc::new(InMemoryBackend::spawn().unwrap());
    let attest = orchestrator("attestValidMove", attest_keys(), backend, None);
    let secret_uint = secret().to_biguint().unwrap();

    for (mv, expected) in PINNED_ATTESTATIONS {
        let expected: BigUint = expected.parse().unwrap();
        assert_eq!(move_attestation(mv, &secret_uint).unwrap(), expected, "{mv}");

        let proof = attest.prove(attest_input(mv)).await.unwrap();
        assert_eq!(proof.public_signals[0], expected, "{mv}");
    }
}

#[tokio::test]
async fn test_example_json_input_is_accepted() {
    let backend = Arc::new(InMemoryBackend::spawn().unwrap());
    let attest = orchestrator("attestValidMove", attest_keys(), backend, None);
    let input =
        CircuitInput::from_json(r#"{"move": 1, "secret": "123152419872319823719238712098"}"#)
            .unwrap();

    let proof = attest.prove(input).await.unwrap();
    assert_eq!(
        proof.public_signals,
        vec![move_attestation(Move::Paper, &secret().to_biguint().unwrap()).unwrap()]
    );
}

#[tokio::test]
async fn test_missing_input_is_reported_as_incomplete() {
    let backend = Arc::new(InMemoryBackend::spawn().unwrap());
    let attest = orchestrator("attestValidMove", attest_keys(), backend, None);
    let input = CircuitInput::new().scalar("move", 1).unwrap();

    let err = attest.prove(input).await.unwrap_err();
    assert!(matches!(
        err,
        ProofError::InvalidInput(InputError::Incomplete {
            provided: 1,
            expected: 2
        })
    ));
    assert!(err.to_string().contains("incomplete input"));
}

#[tokio::test]
async fn test_witness_is_deterministic() {
    let backend = Arc::new(InMemoryBackend::spawn().unwrap());
    let attest = orchestrator("attestValidMove", attest_keys(), backend, None);

    let first = attest.witness(attest_input(Move::Scissors)).await.unwrap();
    let second = attest.witness(attest_input(Move::Scissors)).await.unwrap();
    assert_eq!(first.buffer, second.buffer);
    assert_eq!(first.public_signals, second.public_signals);

    // Proof blinding differs, the public signals do not.
    let a = attest.prove(attest_input(Move::Scissors)).await.unwrap();
    let b = attest.prove(attest_input(Move::Scissors)).await.unwrap();
    assert_eq!(a.public_signals, b.public_signals);
    assert_ne!(a.proof, b.proof);
}

#[tokio::test]
async fn test_invalid_move_fails_sanity_check() {
    let backend = Arc::new(InMemoryBackend::spawn().unwrap());
    let attest = orchestrator("attestValidMove", attest_keys(), backend, None);
    let input = CircuitInput::new()
        .scalar("move", 3)
        .and_then(|i| i.scalar("secret", 5))
        .unwrap();

    let err = attest.prove(input).await.unwrap_err();
    assert!(matches!(err, ProofError::EvaluatorFault(_)), "{err}");
}

#[tokio::test]
async fn test_reveal_with_wrong_secret_fails() {
    let backend = Arc::new(InMemoryBackend::spawn().unwrap());
    let reveal = orchestrator("revealMove", reveal_keys(), backend, None);
    let attestation = move_attestation(Move::Rock, &BigUint::from(10u32)).unwrap();
    let input = CircuitInput::new()
        .scalar("moveAttestation", BigInt::from(attestation))
        .and_then(|i| i.scalar("secret", 11))
        .unwrap();

    let err = reveal.prove(input).await.unwrap_err();
    assert!(matches!(err, ProofError::EvaluatorFault(_)), "{err}");
}
