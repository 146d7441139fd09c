//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Signature verification failed (wrong key, wrong payload, or wrong context).
    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    /// A hex-encoded public key did not decode to a valid curve point.
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// A hex-encoded signature was not 64 bytes, or was malformed hex.
    #[error("Invalid signature format")]
    InvalidSignatureFormat,
}
