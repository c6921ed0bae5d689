//! Private key at rest: password-encrypted blob with key commitment
//!
//! Blob layout (112 bytes):
//! ```text
//! [ 0.. 4)  Argon2id memory cost, KiB, u32 BE
//! [ 4.. 8)  Argon2id iterations, u32 BE
//! [ 8..24)  salt (16)
//! [24..48)  nonce (24)
//! [48..112) XChaCha20-Poly1305(commitment ‖ private key), AAD = bytes 0..8
//! ```
//!
//! The fixed commitment block is prepended to the key before encryption and
//! checked after decryption. Without it, a crafted ciphertext can decrypt
//! validly under two different derived keys with attacker-chosen differing
//! plaintexts; with it, a ciphertext commits to exactly one key.
//!
//! A wrong password, a flipped ciphertext bit, and a mismatched commitment
//! all produce the same error value, so an observer learns nothing about
//! which of them happened.

use std::ops::Range;

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;
use secrecy::SecretString;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, Zeroizing};

use sealkit_core::{SealError, SealResult};

use crate::kdf::{derive_password_key, KdfParams};
use crate::{KEY_SIZE, NONCE_SIZE, SALT_SIZE, TAG_SIZE};

/// Commitment constant bound into every blob. Pinned at format version 1.
pub const KEY_COMMITMENT: [u8; 16] = *b"sealkit/commit/1";

const KDF_PARAMS_RANGE: Range<usize> = 0..8;
const SALT_RANGE: Range<usize> = 8..24;
const NONCE_RANGE: Range<usize> = 24..48;
const CIPHERTEXT_RANGE: Range<usize> = 48..112;

/// Total blob size: 8 + 16 + 24 + (16 + 32 + 16).
pub const PRIVATE_KEY_BLOB_SIZE: usize =
    8 + SALT_SIZE + NONCE_SIZE + KEY_COMMITMENT.len() + KEY_SIZE + TAG_SIZE;

/// Encrypt a raw 32-byte private key under a password.
///
/// The derived key and the commitment-prefixed plaintext are zeroized before
/// returning on every path.
pub fn encrypt_private_key(
    password: &SecretString,
    private_key: &[u8; KEY_SIZE],
) -> SealResult<Vec<u8>> {
    encrypt_private_key_with(password, private_key, &KdfParams::default())
}

/// [`encrypt_private_key`] with explicit KDF cost parameters.
pub fn encrypt_private_key_with(
    password: &SecretString,
    private_key: &[u8; KEY_SIZE],
    params: &KdfParams,
) -> SealResult<Vec<u8>> {
    let mut salt = [0u8; SALT_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);

    let key = derive_password_key(password, &salt, params)?;

    let mut kdf_fields = [0u8; 8];
    kdf_fields[..4].copy_from_slice(&params.mem_cost_kib.to_be_bytes());
    kdf_fields[4..].copy_from_slice(&params.iterations.to_be_bytes());

    let mut plaintext = Zeroizing::new([0u8; KEY_COMMITMENT.len() + KEY_SIZE]);
    plaintext[..KEY_COMMITMENT.len()].copy_from_slice(&KEY_COMMITMENT);
    plaintext[KEY_COMMITMENT.len()..].copy_from_slice(private_key);

    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let ciphertext = cipher
        .encrypt(
            XNonce::from_slice(&nonce_bytes),
            Payload {
                msg: plaintext.as_ref(),
                aad: &kdf_fields,
            },
        )
        .map_err(|_| SealError::Validation("private key encryption failed".into()))?;

    let mut blob = Vec::with_capacity(PRIVATE_KEY_BLOB_SIZE);
    blob.extend_from_slice(&kdf_fields);
    blob.extend_from_slice(&salt);
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(&ciphertext);
    debug_assert_eq!(blob.len(), PRIVATE_KEY_BLOB_SIZE);
    Ok(blob)
}

/// Recover the raw private key from a blob.
///
/// AEAD failure and commitment mismatch are indistinguishable: both return
/// [`SealError::PrivateKey`].
pub fn decrypt_private_key(
    password: &SecretString,
    blob: &[u8],
) -> SealResult<Zeroizing<[u8; KEY_SIZE]>> {
    if blob.len() != PRIVATE_KEY_BLOB_SIZE {
        return Err(SealError::Tamper(format!(
            "private key blob is {} bytes, expected {PRIVATE_KEY_BLOB_SIZE}",
            blob.len()
        )));
    }

    let kdf_fields = &blob[KDF_PARAMS_RANGE];
    let params = KdfParams {
        mem_cost_kib: u32::from_be_bytes(kdf_fields[..4].try_into().unwrap()),
        iterations: u32::from_be_bytes(kdf_fields[4..].try_into().unwrap()),
    };
    params.validate()?;

    let salt: [u8; SALT_SIZE] = blob[SALT_RANGE].try_into().unwrap();
    let key = derive_password_key(password, &salt, &params)?;

    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let mut plaintext = cipher
        .decrypt(
            XNonce::from_slice(&blob[NONCE_RANGE]),
            Payload {
                msg: &blob[CIPHERTEXT_RANGE],
                aad: kdf_fields,
            },
        )
        .map_err(|_| SealError::PrivateKey)?;

    if plaintext.len() != KEY_COMMITMENT.len() + KEY_SIZE {
        plaintext.zeroize();
        return Err(SealError::PrivateKey);
    }
    let committed: bool = plaintext[..KEY_COMMITMENT.len()].ct_eq(&KEY_COMMITMENT).into();
    if !committed {
        plaintext.zeroize();
        return Err(SealError::PrivateKey);
    }

    let mut recovered = Zeroizing::new([0u8; KEY_SIZE]);
    recovered.copy_from_slice(&plaintext[KEY_COMMITMENT.len()..]);
    plaintext.zeroize();
    Ok(recovered)
}
