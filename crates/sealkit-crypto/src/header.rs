//! Fixed-offset codec for the 90-byte encrypted file header
//!
//! ```text
//! [ 0.. 8)  magic
//! [ 8..10)  format version
//! [10..26)  KDF salt (16)
//! [26..58)  key slot (32): ephemeral X25519 public key, or a throwaway
//!           public key as filler in password mode
//! [58..82)  base nonce (24)
//! [82..86)  Argon2id memory cost, KiB, u32 BE
//! [86..90)  Argon2id iterations, u32 BE
//! ```
//!
//! The layout is identical in every mode so a file does not reveal how it
//! was keyed. This module is pure byte layout; every offset lives here and
//! nowhere else, and no cryptography happens below this comment.

use std::ops::Range;

use sealkit_core::{SealError, SealResult};

use crate::kdf::KdfParams;
use crate::{KEY_SIZE, NONCE_SIZE, SALT_SIZE};

pub const ENCRYPTED_MAGIC: [u8; 8] = *b"SEALKIT\xC1";
pub const FORMAT_VERSION: [u8; 2] = [1, 0];

pub const MAGIC_RANGE: Range<usize> = 0..8;
pub const VERSION_RANGE: Range<usize> = 8..10;
pub const SALT_RANGE: Range<usize> = 10..26;
pub const KEY_SLOT_RANGE: Range<usize> = 26..58;
pub const NONCE_RANGE: Range<usize> = 58..82;
pub const KDF_MEM_RANGE: Range<usize> = 82..86;
pub const KDF_ITER_RANGE: Range<usize> = 86..90;

/// Total header size in bytes.
pub const HEADER_SIZE: usize = 90;

/// Decoded header of an encrypted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub salt: [u8; SALT_SIZE],
    pub key_slot: [u8; KEY_SIZE],
    pub base_nonce: [u8; NONCE_SIZE],
    pub kdf: KdfParams,
}

impl FileHeader {
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[MAGIC_RANGE].copy_from_slice(&ENCRYPTED_MAGIC);
        out[VERSION_RANGE].copy_from_slice(&FORMAT_VERSION);
        out[SALT_RANGE].copy_from_slice(&self.salt);
        out[KEY_SLOT_RANGE].copy_from_slice(&self.key_slot);
        out[NONCE_RANGE].copy_from_slice(&self.base_nonce);
        out[KDF_MEM_RANGE].copy_from_slice(&self.kdf.mem_cost_kib.to_be_bytes());
        out[KDF_ITER_RANGE].copy_from_slice(&self.kdf.iterations.to_be_bytes());
        out
    }

    pub fn decode(bytes: &[u8]) -> SealResult<Self> {
        if bytes.len() != HEADER_SIZE {
            return Err(SealError::Tamper(format!(
                "header is {} bytes, expected {HEADER_SIZE}",
                bytes.len()
            )));
        }
        if bytes[MAGIC_RANGE] != ENCRYPTED_MAGIC {
            return Err(SealError::Tamper("not a sealkit encrypted file".into()));
        }
        if bytes[VERSION_RANGE] != FORMAT_VERSION {
            return Err(SealError::Tamper(format!(
                "unsupported format version {:?}",
                &bytes[VERSION_RANGE]
            )));
        }

        let mut salt = [0u8; SALT_SIZE];
        salt.copy_from_slice(&bytes[SALT_RANGE]);
        let mut key_slot = [0u8; KEY_SIZE];
        key_slot.copy_from_slice(&bytes[KEY_SLOT_RANGE]);
        let mut base_nonce = [0u8; NONCE_SIZE];
        base_nonce.copy_from_slice(&bytes[NONCE_RANGE]);

        let kdf = KdfParams {
            mem_cost_kib: u32::from_be_bytes(bytes[KDF_MEM_RANGE].try_into().unwrap()),
            iterations: u32::from_be_bytes(bytes[KDF_ITER_RANGE].try_into().unwrap()),
        };
        kdf.validate()?;

        Ok(Self {
            salt,
            key_slot,
            base_nonce,
            kdf,
        })
    }
}
