//! Difficulty/target conversion and the 32-byte hash used to seal a header.
//!
//! A header is sealed with plain SHA-256 (single round — there is no stated
//! reason to double-hash here, unlike the Bitcoin-style construction this
//! scheme otherwise resembles).

use vaultmesh_crypto::hash::sha256;

/// `target = floor(2^256 / difficulty)`, as a 32-byte big-endian integer.
///
/// `difficulty` is always `>= 256` by the time this is called (the server
/// floor), so the quotient never needs more than 256 bits:
/// the numerator is `2^256`, a 257-bit value whose leading bit always
/// divides out to zero once the divisor exceeds 1.
pub fn difficulty_to_target(difficulty: u64) -> [u8; 32] {
    let divisor = difficulty.max(1) as u128;
    let mut remainder: u128 = 0;
    let mut bits = [0u8; 257];

    // 2^256 in binary is a single 1 bit followed by 256 zero bits.
    for (i, bit) in bits.iter_mut().enumerate() {
        let numerator_bit: u128 = if i == 0 { 1 } else { 0 };
        remainder = (remainder << 1) | numerator_bit;
        if remainder >= divisor {
            remainder -= divisor;
            *bit = 1;
        }
    }

    bits_to_be_bytes(&bits[1..])
}

fn bits_to_be_bytes(bits: &[u8]) -> [u8; 32] {
    debug_assert_eq!(bits.len(), 256);
    let mut out = [0u8; 32];
    for (byte_idx, chunk) in bits.chunks(8).enumerate() {
        let mut byte = 0u8;
        for bit in chunk {
            byte = (byte << 1) | bit;
        }
        out[byte_idx] = byte;
    }
    out
}

/// `hash <= target`, both read as big-endian unsigned integers.
pub fn hash_meets_target(hash: &[u8; 32], target: &[u8; 32]) -> bool {
    hash.as_slice() <= target.as_slice()
}

/// The 32-byte proof hash derived from a solved header.
pub fn derive_hash(header: &[u8]) -> [u8; 32] {
    sha256(header)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_shrinks_as_difficulty_grows() {
        let low = difficulty_to_target(256);
        let high = difficulty_to_target(256 * 1024);
        assert!(high.as_slice() < low.as_slice());
    }

    #[test]
    fn target_matches_hand_computed_value_at_difficulty_two() {
        // floor(2^256 / 2) = 2^255, i.e. a single leading 1 bit then zeros.
        let target = difficulty_to_target(2);
        let mut expected = [0u8; 32];
        expected[0] = 0x80;
        assert_eq!(target, expected);
    }

    #[test]
    fn hash_meets_target_is_lexicographic() {
        let target = [0x10u8; 32];
        let mut lower = [0x10u8; 32];
        lower[31] = 0x0f;
        let mut higher = [0x10u8; 32];
        higher[31] = 0x11;

        assert!(hash_meets_target(&lower, &target));
        assert!(hash_meets_target(&target, &target));
        assert!(!hash_meets_target(&higher, &target));
    }
}
