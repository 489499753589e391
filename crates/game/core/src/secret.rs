//! Round secrets derived from wallet signatures.
//!
//! The wallet signs a per-round message; the signature bytes, read as a
//! big-endian integer, become the commitment secret. The same nonce always
//! yields the same message, so the player can re-derive the secret when it is
//! time to reveal.

use num_bigint::BigUint;

use crate::error::SecretError;

/// Message the wallet signs for the round opened at `nonce`.
pub fn round_signature_message(nonce: u64) -> String {
    format!(
        "May the gods of round {} be in your favor.",
        u128::from(nonce) + 1
    )
}

/// Interprets a hex signature (with or without `0x`) as a big-endian integer.
pub fn secret_from_signature(signature: &str) -> Result<BigUint, SecretError> {
    let digits = signature
        .trim()
        .strip_prefix("0x")
        .or_else(|| signature.trim().strip_prefix("0X"))
        .unwrap_or(signature.trim());

    if digits.is_empty() {
        return Err(SecretError::Empty);
    }

    BigUint::parse_bytes(digits.as_bytes(), 16)
        .ok_or_else(|| SecretError::InvalidHex(signature.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_uses_one_based_round() {
        assert_eq!(
            round_signature_message(0),
            "May the gods of round 1 be in your favor."
        );
    }

    #[test]
    fn test_last_nonce_does_not_wrap() {
        assert_eq!(
            round_signature_message(u64::MAX),
            "May the gods of round 18446744073709551616 be in your favor."
        );
    }

    #[test]
    fn test_signature_is_big_endian() {
        let sig = format!("0x{}", hex::encode([0x01, 0x00]));
        assert_eq!(secret_from_signature(&sig), Ok(BigUint::from(256u32)));
        assert_eq!(secret_from_signature("ff"), Ok(BigUint::from(255u32)));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(secret_from_signature("0x"), Err(SecretError::Empty));
        assert!(matches!(
            secret_from_signature("0xzz"),
            Err(SecretError::InvalidHex(_))
        ));
    }
}
