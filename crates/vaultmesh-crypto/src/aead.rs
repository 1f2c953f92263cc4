//! AES-CBC encryption and an authenticated construction built from it plus
//! HMAC-SHA256 (encrypt-then-MAC).

use aes::Aes256;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::generic_array::GenericArray;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;

use crate::error::{CryptoError, CryptoResult};
use crate::hash::{constant_time_eq, hmac_sha256};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

const MAC_LEN: usize = 32;
const IV_LEN: usize = 16;

/// `aesCbcEncrypt(key, iv, bytes)` — the raw primitive, unauthenticated.
pub fn aes_cbc_encrypt(key: &[u8; 32], iv: &[u8; 16], plaintext: &[u8]) -> Vec<u8> {
    let key = GenericArray::from_slice(key);
    let iv = GenericArray::from_slice(iv);
    Aes256CbcEnc::new(key, iv).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

/// `aesCbcDecrypt(key, iv, bytes)`.
pub fn aes_cbc_decrypt(key: &[u8; 32], iv: &[u8; 16], ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
    let key = GenericArray::from_slice(key);
    let iv = GenericArray::from_slice(iv);
    Aes256CbcDec::new(key, iv)
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptoError::DecryptionFailed)
}

fn derive_subkeys(key: &[u8; 32]) -> ([u8; 32], [u8; 32]) {
    let enc_key = hmac_sha256(key, b"vaultmesh-aead-enc");
    let mac_key = hmac_sha256(key, b"vaultmesh-aead-mac");
    (enc_key, mac_key)
}

/// Authenticated encryption: a random IV is generated, the plaintext is
/// AES-256-CBC encrypted, and an HMAC-SHA256 tag is computed over
/// `iv || ciphertext`. Output layout: `iv || ciphertext || tag`.
pub fn seal(key: &[u8; 32], plaintext: &[u8]) -> Vec<u8> {
    let (enc_key, mac_key) = derive_subkeys(key);

    let mut iv = [0u8; IV_LEN];
    rand::thread_rng().fill_bytes(&mut iv);

    let ciphertext = aes_cbc_encrypt(&enc_key, &iv, plaintext);

    let mut to_mac = Vec::with_capacity(IV_LEN + ciphertext.len());
    to_mac.extend_from_slice(&iv);
    to_mac.extend_from_slice(&ciphertext);
    let tag = hmac_sha256(&mac_key, &to_mac);

    let mut out = to_mac;
    out.extend_from_slice(&tag);
    out
}

/// Verifies the tag in constant time, then decrypts. Returns
/// `DecryptionFailed` for a bad tag, truncated input, or bad padding —
/// the caller never learns which, so failures don't leak
/// oracle-distinguishable detail.
pub fn open(key: &[u8; 32], sealed: &[u8]) -> CryptoResult<Vec<u8>> {
    if sealed.len() < IV_LEN + MAC_LEN {
        return Err(CryptoError::DecryptionFailed);
    }
    let (enc_key, mac_key) = derive_subkeys(key);

    let (body, tag) = sealed.split_at(sealed.len() - MAC_LEN);
    let expected_tag = hmac_sha256(&mac_key, body);
    if !constant_time_eq(tag, &expected_tag) {
        return Err(CryptoError::DecryptionFailed);
    }

    let (iv, ciphertext) = body.split_at(IV_LEN);
    let iv: [u8; IV_LEN] = iv.try_into().map_err(|_| CryptoError::DecryptionFailed)?;
    aes_cbc_decrypt(&enc_key, &iv, ciphertext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_round_trip() {
        let key = [9u8; 32];
        let plaintext = b"opaque client-encrypted blob";
        let sealed = seal(&key, plaintext);
        let opened = open(&key, &sealed).unwrap();
        assert_eq!(opened, plaintext);
    }

    #[test]
    fn open_fails_on_tampered_ciphertext() {
        let key = [3u8; 32];
        let mut sealed = seal(&key, b"hello");
        let last = sealed.len() - 1;
        sealed[last] ^= 0xFF;
        assert!(open(&key, &sealed).is_err());
    }

    #[test]
    fn open_fails_with_wrong_key() {
        let sealed = seal(&[1u8; 32], b"hello");
        assert!(open(&[2u8; 32], &sealed).is_err());
    }

    #[test]
    fn distinct_seals_use_distinct_ivs() {
        let key = [5u8; 32];
        let a = seal(&key, b"same plaintext");
        let b = seal(&key, b"same plaintext");
        assert_ne!(a, b, "random IV must make ciphertexts differ");
    }

    #[test]
    fn raw_cbc_round_trips() {
        let key = [1u8; 32];
        let iv = [2u8; 16];
        let ct = aes_cbc_encrypt(&key, &iv, b"raw primitive");
        let pt = aes_cbc_decrypt(&key, &iv, &ct).unwrap();
        assert_eq!(pt, b"raw primitive");
    }
}
