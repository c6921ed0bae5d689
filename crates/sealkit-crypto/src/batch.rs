//! Sequential batch driver with per-file failure isolation
//!
//! One bad file (missing, unreadable, corrupt) is recorded in the result and
//! the batch moves on; the caller gets the aggregate outcome as a value.

use std::path::PathBuf;

use tracing::{info, warn};

use sealkit_core::BatchResult;

use crate::file::{decrypt_file, encrypt_file, DecryptKey, EncryptKey};

/// Encrypt each file in order. Key material is established per the mode in
/// `key`; every file gets its own salt, nonce, and (in key-exchange modes)
/// ephemeral key pair.
pub fn encrypt_files(paths: &[PathBuf], key: &EncryptKey<'_>) -> BatchResult {
    let mut result = BatchResult::default();
    for path in paths {
        match encrypt_file(path, key) {
            Ok(_) => result.record_success(),
            Err(error) => {
                warn!(path = %path.display(), %error, "failed to encrypt file");
                result.record_failure(path.clone(), error);
            }
        }
    }
    info!(
        succeeded = result.succeeded,
        failed = result.failures.len(),
        "batch encryption finished"
    );
    result
}

/// Decrypt each file in order, with the same isolation rules.
pub fn decrypt_files(paths: &[PathBuf], key: &DecryptKey<'_>) -> BatchResult {
    let mut result = BatchResult::default();
    for path in paths {
        match decrypt_file(path, key) {
            Ok(_) => result.record_success(),
            Err(error) => {
                warn!(path = %path.display(), %error, "failed to decrypt file");
                result.record_failure(path.clone(), error);
            }
        }
    }
    info!(
        succeeded = result.succeeded,
        failed = result.failures.len(),
        "batch decryption finished"
    );
    result
}
