//! Key derivation: Argon2id for passwords, HKDF-SHA256 for shared secrets

use argon2::{Algorithm, Argon2, Params, Version};
use hkdf::Hkdf;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use zeroize::Zeroizing;

use sealkit_core::{SealError, SealResult};

use crate::keys::SymmetricKey;
use crate::{KEY_SIZE, SALT_SIZE};

/// Argon2id lanes. Fixed at format version 1; not recorded per file.
pub const KDF_PARALLELISM: u32 = 4;

/// Upper bound accepted when reading cost parameters back from a header or
/// key blob, so a crafted file cannot drive Argon2 into a memory DoS.
pub const MAX_MEM_COST_KIB: u32 = 4 * 1024 * 1024;

/// Upper bound on iterations read back from a header or key blob.
pub const MAX_ITERATIONS: u32 = 64;

/// Argon2id cost parameters recorded in every encrypted file header and
/// private key blob, so decryption reproduces them exactly and defaults can
/// be raised later without breaking old files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB
    pub mem_cost_kib: u32,
    /// Iteration count
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            mem_cost_kib: 65536,
            iterations: 3,
        }
    }
}

impl KdfParams {
    /// Reject parameters outside the range this format is willing to run.
    pub fn validate(&self) -> SealResult<()> {
        if self.mem_cost_kib < 8 || self.mem_cost_kib > MAX_MEM_COST_KIB {
            return Err(SealError::Tamper(format!(
                "KDF memory cost out of range: {} KiB",
                self.mem_cost_kib
            )));
        }
        if self.iterations < 1 || self.iterations > MAX_ITERATIONS {
            return Err(SealError::Tamper(format!(
                "KDF iteration count out of range: {}",
                self.iterations
            )));
        }
        Ok(())
    }
}

/// Derive a 256-bit key from a password and salt using Argon2id.
///
/// The salt is 16 random bytes stored in the clear alongside the ciphertext.
pub fn derive_password_key(
    password: &SecretString,
    salt: &[u8; SALT_SIZE],
    params: &KdfParams,
) -> SealResult<SymmetricKey> {
    if password.expose_secret().is_empty() {
        return Err(SealError::Validation("password must not be empty".into()));
    }
    params.validate()?;

    let argon2_params = Params::new(
        params.mem_cost_kib,
        params.iterations,
        KDF_PARALLELISM,
        Some(KEY_SIZE),
    )
    .map_err(|e| SealError::Validation(format!("invalid Argon2id params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key = [0u8; KEY_SIZE];
    argon2
        .hash_password_into(password.expose_secret().as_bytes(), salt, &mut key)
        .map_err(|e| SealError::Validation(format!("Argon2id KDF failed: {e}")))?;

    Ok(SymmetricKey::from_bytes(key))
}

/// Derive a 256-bit key from one or two Diffie-Hellman shared secrets.
///
/// HKDF-SHA256 with the header salt and a fixed domain string; the domain
/// separates each key-exchange mode's output space from the others and from
/// every other hashing use in sealkit. The concatenated input keying
/// material is zeroized before returning.
pub fn derive_exchange_key(
    shared_secrets: &[&[u8; KEY_SIZE]],
    salt: &[u8; SALT_SIZE],
    domain: &[u8],
) -> SealResult<SymmetricKey> {
    let mut ikm = Zeroizing::new(Vec::with_capacity(shared_secrets.len() * KEY_SIZE));
    for secret in shared_secrets {
        ikm.extend_from_slice(*secret);
    }

    let hkdf = Hkdf::<Sha256>::new(Some(salt), &ikm);
    let mut okm = [0u8; KEY_SIZE];
    hkdf.expand(domain, &mut okm)
        .map_err(|e| SealError::Validation(format!("HKDF expand failed: {e}")))?;

    Ok(SymmetricKey::from_bytes(okm))
}
