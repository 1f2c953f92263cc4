//! Iterated-SHA-256 key derivation, used both for the server-side
//! `deriveHashedLoginKey` and (by the client, out of scope here, which is
//! why this takes a generic `salt` rather than hard-coding "vault id") the
//! password → login-key derivation. See DESIGN.md, Open Question 2.

use crate::hash::{constant_time_eq, sha256, sha256_concat};

/// Total number of SHA-256 invocations in the KDF chain.
pub const ITERATIONS: u32 = 100_000;

/// `deriveHashedLoginKey(loginKey32, salt) -> 32`.
///
/// Round 1 hashes `loginKey || salt`; every subsequent round rehashes the
/// previous 32-byte digest alone, for `ITERATIONS` total SHA-256 calls.
pub fn derive_hashed_login_key(login_key: &[u8], salt: &[u8]) -> [u8; 32] {
    let mut digest = sha256_concat(login_key, salt);
    for _ in 1..ITERATIONS {
        digest = sha256(&digest);
    }
    digest
}

/// Constant-time comparison of a freshly-derived login key hash against the
/// value stored at registration time.
pub fn hashed_login_key_matches(login_key: &[u8], salt: &[u8], stored: &[u8; 32]) -> bool {
    let derived = derive_hashed_login_key(login_key, salt);
    constant_time_eq(&derived, stored)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic_given_same_inputs() {
        let a = derive_hashed_login_key(b"correct horse battery staple", b"01JDQXZ9K8XQXQXQXQXQXQXQXQ");
        let b = derive_hashed_login_key(b"correct horse battery staple", b"01JDQXZ9K8XQXQXQXQXQXQXQXQ");
        assert_eq!(a, b);
    }

    #[test]
    fn different_salts_produce_different_hashes() {
        let a = derive_hashed_login_key(b"same login key", b"vault-a");
        let b = derive_hashed_login_key(b"same login key", b"vault-b");
        assert_ne!(a, b);
    }

    #[test]
    fn matches_only_the_exact_login_key() {
        let salt = b"01JDQXZ9K8XQXQXQXQXQXQXQXQ";
        let stored = derive_hashed_login_key(b"the real login key", salt);
        assert!(hashed_login_key_matches(b"the real login key", salt, &stored));
        assert!(!hashed_login_key_matches(b"a wrong login key", salt, &stored));
    }
}
