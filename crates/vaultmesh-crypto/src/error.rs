use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid key or point encoding")]
    InvalidKey,
    #[error("signing failed: {0}")]
    SigningFailed(String),
    #[error("signature verification failed")]
    VerificationFailed,
    #[error("authenticated decryption failed: tag mismatch or malformed ciphertext")]
    DecryptionFailed,
}

pub type CryptoResult<T> = Result<T, CryptoError>;
