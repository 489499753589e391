//! Signal name addressing.
//!
//! Evaluators locate input signals by the 64-bit FNV-1a hash of their name,
//! split into two 32-bit words. The hash must match the one the circuit
//! compiler used bit for bit: a mismatch silently addresses a different
//! signal.

use std::hash::Hasher;

use fnv::FnvHasher;

/// Two-word address of a named signal in the evaluator's symbol table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SignalAddress {
    pub hi: u32,
    pub lo: u32,
}

impl SignalAddress {
    /// Hashes `name` (its UTF-8 bytes) into an address.
    pub fn of(name: &str) -> Self {
        let h = fnv1a(name);
        Self {
            hi: (h >> 32) as u32,
            lo: h as u32,
        }
    }

    pub fn as_u64(self) -> u64 {
        ((self.hi as u64) << 32) | self.lo as u64
    }
}

/// 64-bit FNV-1a (offset basis `0xcbf29ce484222325`, prime `0x100000001b3`).
pub fn fnv1a(name: &str) -> u64 {
    let mut hasher = FnvHasher::default();
    hasher.write(name.as_bytes());
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_fnv1a(bytes: &[u8]) -> u64 {
        bytes.iter().fold(0xCBF2_9CE4_8422_2325u64, |hash, byte| {
            (hash ^ *byte as u64).wrapping_mul(0x0000_0100_0000_01B3)
        })
    }

    #[test]
    fn test_empty_name_is_offset_basis() {
        assert_eq!(fnv1a(""), 0xCBF2_9CE4_8422_2325);
    }

    #[test]
    fn test_pinned_reference_names() {
        // Published FNV-1a 64 test vectors.
        assert_eq!(fnv1a("a"), 0xAF63_DC4C_8601_EC8C);
        assert_eq!(fnv1a("foobar"), 0x8594_4171_F739_67E8);
        assert_eq!(fnv1a("move"), 0x0D0F_17A2_C3F6_87B4);
        assert_eq!(fnv1a("secret"), 0xAB23_F0EE_C020_C951);
    }

    #[test]
    fn test_matches_byte_wise_definition_for_circuit_signals() {
        for name in ["move", "secret", "moveAttestation", "main.in[3]"] {
            assert_eq!(fnv1a(name), reference_fnv1a(name.as_bytes()), "{name}");
        }
    }

    #[test]
    fn test_address_splits_high_and_low_words() {
        let addr = SignalAddress::of("foobar");
        assert_eq!(addr.hi, 0x8594_4171);
        assert_eq!(addr.lo, 0xF739_67E8);
        assert_eq!(addr.as_u64(), fnv1a("foobar"));
    }
}
