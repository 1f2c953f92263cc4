//! secp256k1 key operations: signing, verification, scalar addition, point
//! addition, and ECDH. All functions here are pure — no I/O.

use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::generic_array::GenericArray;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::elliptic_curve::PrimeField;
use k256::{ProjectivePoint, Scalar};

use crate::error::{CryptoError, CryptoResult};

pub type PrivKeyBytes = [u8; 32];
pub type PubKeyBytes = [u8; 33];
pub type SignatureBytes = [u8; 64];

fn bytes_to_scalar(bytes: &[u8; 32]) -> CryptoResult<Scalar> {
    let repr = GenericArray::clone_from_slice(bytes);
    Option::<Scalar>::from(Scalar::from_repr(repr)).ok_or(CryptoError::InvalidKey)
}

fn scalar_to_bytes(s: &Scalar) -> [u8; 32] {
    let repr = s.to_bytes();
    let mut out = [0u8; 32];
    out.copy_from_slice(repr.as_slice());
    out
}

fn signing_key_from_bytes(priv_key: &PrivKeyBytes) -> CryptoResult<SigningKey> {
    SigningKey::from_bytes(GenericArray::from_slice(priv_key)).map_err(|_| CryptoError::InvalidKey)
}

fn verifying_key_from_bytes(pub_key: &PubKeyBytes) -> CryptoResult<VerifyingKey> {
    VerifyingKey::from_sec1_bytes(pub_key).map_err(|_| CryptoError::InvalidKey)
}

fn projective_from_pub(pub_key: &PubKeyBytes) -> CryptoResult<ProjectivePoint> {
    let vk = verifying_key_from_bytes(pub_key)?;
    Ok(ProjectivePoint::from(*vk.as_affine()))
}

fn compress_point(p: ProjectivePoint) -> PubKeyBytes {
    let encoded = p.to_affine().to_encoded_point(true);
    let mut out = [0u8; 33];
    out.copy_from_slice(encoded.as_bytes());
    out
}

/// `publicKeyCreate(privKey) -> pubKey33`
pub fn public_key_create(priv_key: &PrivKeyBytes) -> CryptoResult<PubKeyBytes> {
    let sk = signing_key_from_bytes(priv_key)?;
    let vk = sk.verifying_key();
    let encoded = vk.to_encoded_point(true);
    let mut out = [0u8; 33];
    out.copy_from_slice(encoded.as_bytes());
    Ok(out)
}

/// `sign(msg32, privKey) -> sig`. `msg32` is already a 32-byte hash (e.g.
/// `solvedHash`); it is signed directly via the prehash ECDSA API, never
/// re-hashed. Nonce derivation is RFC 6979 deterministic, which is already
/// misuse-resistant, so no caller-supplied nonce input is exposed here.
pub fn sign(priv_key: &PrivKeyBytes, msg32: &[u8; 32]) -> CryptoResult<SignatureBytes> {
    let sk = signing_key_from_bytes(priv_key)?;
    let sig: Signature = sk
        .sign_prehash(msg32)
        .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
    let mut out = [0u8; 64];
    out.copy_from_slice(&sig.to_bytes());
    Ok(out)
}

/// `verify(sig, msg32, pubKey) -> bool`
pub fn verify(sig: &SignatureBytes, msg32: &[u8; 32], pub_key: &PubKeyBytes) -> bool {
    let vk = match verifying_key_from_bytes(pub_key) {
        Ok(vk) => vk,
        Err(_) => return false,
    };
    let signature = match Signature::from_slice(sig) {
        Ok(s) => s,
        Err(_) => return false,
    };
    vk.verify_prehash(msg32, &signature).is_ok()
}

/// `privateKeyAdd(a, b) -> (a + b mod n)`
pub fn private_key_add(a: &PrivKeyBytes, b: &PrivKeyBytes) -> CryptoResult<PrivKeyBytes> {
    let sa = bytes_to_scalar(a)?;
    let sb = bytes_to_scalar(b)?;
    Ok(scalar_to_bytes(&(sa + sb)))
}

/// Elliptic-curve point addition: `p1 ⊕ p2`.
pub fn point_add(p1: &PubKeyBytes, p2: &PubKeyBytes) -> CryptoResult<PubKeyBytes> {
    let a = projective_from_pub(p1)?;
    let b = projective_from_pub(p2)?;
    Ok(compress_point(a + b))
}

/// `d·G` — scalar multiplication against the generator. Used to derive an
/// engagement key's public contribution from its derivation scalar.
pub fn scalar_base_mul(d: &PrivKeyBytes) -> CryptoResult<PubKeyBytes> {
    let scalar = bytes_to_scalar(d)?;
    Ok(compress_point(ProjectivePoint::GENERATOR * scalar))
}

/// `vaultPubKey ⊕ d·G`, the engagement-key public derivation law.
pub fn derive_engagement_pub_key(
    vault_pub_key: &PubKeyBytes,
    derivation_priv_key: &PrivKeyBytes,
) -> CryptoResult<PubKeyBytes> {
    let d_g = scalar_base_mul(derivation_priv_key)?;
    point_add(vault_pub_key, &d_g)
}

/// `sharedSecret(priv, pub) -> point33`: `priv · pub`, compressed.
pub fn shared_secret(priv_key: &PrivKeyBytes, pub_key: &PubKeyBytes) -> CryptoResult<PubKeyBytes> {
    let scalar = bytes_to_scalar(priv_key)?;
    let point = projective_from_pub(pub_key)?;
    Ok(compress_point(point * scalar))
}

/// Generate a fresh random 32-byte scalar suitable as a private key or
/// engagement-key derivation scalar.
pub fn random_scalar() -> PrivKeyBytes {
    use rand::RngCore;
    loop {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        if bytes_to_scalar(&bytes).is_ok() {
            return bytes;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_round_trip_over_prehash() {
        let priv_key = random_scalar();
        let pub_key = public_key_create(&priv_key).unwrap();
        let msg = [7u8; 32];
        let sig = sign(&priv_key, &msg).unwrap();
        assert!(verify(&sig, &msg, &pub_key));
    }

    #[test]
    fn verify_fails_on_tampered_message() {
        let priv_key = random_scalar();
        let pub_key = public_key_create(&priv_key).unwrap();
        let sig = sign(&priv_key, &[1u8; 32]).unwrap();
        assert!(!verify(&sig, &[2u8; 32], &pub_key));
    }

    #[test]
    fn verify_fails_under_wrong_key() {
        let priv_a = random_scalar();
        let priv_b = random_scalar();
        let pub_b = public_key_create(&priv_b).unwrap();
        let sig = sign(&priv_a, &[3u8; 32]).unwrap();
        assert!(!verify(&sig, &[3u8; 32], &pub_b));
    }

    #[test]
    fn engagement_key_derivation_matches_law() {
        let vault_priv = random_scalar();
        let vault_pub = public_key_create(&vault_priv).unwrap();
        let d = random_scalar();

        let engagement_pub = derive_engagement_pub_key(&vault_pub, &d).unwrap();

        // Owner-side: engagementPrivKey = vaultPrivKey + d mod n
        let engagement_priv = private_key_add(&vault_priv, &d).unwrap();
        let engagement_pub_from_priv = public_key_create(&engagement_priv).unwrap();

        assert_eq!(engagement_pub, engagement_pub_from_priv);
    }

    #[test]
    fn shared_secret_is_symmetric() {
        let priv_a = random_scalar();
        let priv_b = random_scalar();
        let pub_a = public_key_create(&priv_a).unwrap();
        let pub_b = public_key_create(&priv_b).unwrap();

        let secret_ab = shared_secret(&priv_a, &pub_b).unwrap();
        let secret_ba = shared_secret(&priv_b, &pub_a).unwrap();
        assert_eq!(secret_ab, secret_ba);
    }

    #[test]
    fn invalid_private_key_encoding_is_rejected() {
        assert!(public_key_create(&[0u8; 32]).is_err());
    }

    #[test]
    fn invalid_public_key_encoding_is_rejected() {
        let mut bogus = [0u8; 33];
        bogus[0] = 0xFF;
        assert!(!verify(&[0u8; 64], &[0u8; 32], &bogus));
    }
}
