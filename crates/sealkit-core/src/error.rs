use thiserror::Error;

pub type SealResult<T> = Result<T, SealError>;

/// Failure taxonomy shared by every sealkit operation.
///
/// Cryptographic failures (`FileCrypto`, `PrivateKey`) deliberately carry a
/// single fixed message: an authentication-tag failure, a wrong password, and
/// a commitment mismatch must be indistinguishable to an observer.
#[derive(Debug, Error)]
pub enum SealError {
    /// Pre-flight input problem (bad key length, oversized comment, ...).
    /// Reported per file; a batch continues past it.
    #[error("{0}")]
    Validation(String),

    /// File decryption failed. The root cause is never disclosed.
    #[error("incorrect password/key or the file has been tampered with")]
    FileCrypto,

    /// Private key blob decryption failed. The root cause is never disclosed.
    #[error("incorrect password or the private key has been tampered with")]
    PrivateKey,

    /// Structural violation: bad magic, unknown version, malformed layout.
    /// Rejected before any cryptographic processing.
    #[error("tampered or unrecognized file: {0}")]
    Tamper(String),

    /// I/O or permission failure; the affected file is skipped.
    #[error("file access error: {0}")]
    Io(#[from] std::io::Error),
}
