//! Fixed-offset codec for the signature file
//!
//! ```text
//! [ 0.. 8)  magic
//! [ 8..10)  format version
//! [10..11)  prehash flag (0x00 or 0x01; anything else is tamper)
//! [11..75)  file signature (64)
//! [75..N-64) comment, UTF-8, length = N - 139
//! [N-64..N) global signature (64) over bytes [0..N-64)
//! ```
//!
//! Pure byte layout, no cryptography: the engine decides what the
//! signatures mean, this module only moves bytes.

use std::ops::Range;

use sealkit_core::{SealError, SealResult};

pub const SIGNATURE_MAGIC: [u8; 8] = *b"SEALSIG\xC1";
pub const FORMAT_VERSION: [u8; 2] = [1, 0];

/// Length of an Ed25519 signature
pub const SIGNATURE_SIZE: usize = 64;

/// Longest comment accepted, in UTF-8 bytes
pub const MAX_COMMENT_SIZE: usize = 500;

pub const MAGIC_RANGE: Range<usize> = 0..8;
pub const VERSION_RANGE: Range<usize> = 8..10;
pub const PREHASH_FLAG_RANGE: Range<usize> = 10..11;
pub const FILE_SIGNATURE_RANGE: Range<usize> = 11..75;

/// Fixed bytes before the variable-length comment.
pub const FIXED_PREFIX_SIZE: usize = FILE_SIGNATURE_RANGE.end;

/// Smallest valid signature file: empty comment.
pub const MIN_SIZE: usize = FIXED_PREFIX_SIZE + SIGNATURE_SIZE;

/// Decoded signature file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureFile {
    pub prehash: bool,
    pub file_signature: [u8; SIGNATURE_SIZE],
    pub comment: String,
    pub global_signature: [u8; SIGNATURE_SIZE],
}

impl SignatureFile {
    /// The byte region the global signature covers: everything before it,
    /// in serialized order.
    pub fn signed_region(&self) -> Vec<u8> {
        let mut region = Vec::with_capacity(FIXED_PREFIX_SIZE + self.comment.len());
        region.extend_from_slice(&SIGNATURE_MAGIC);
        region.extend_from_slice(&FORMAT_VERSION);
        region.push(u8::from(self.prehash));
        region.extend_from_slice(&self.file_signature);
        region.extend_from_slice(self.comment.as_bytes());
        region
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = self.signed_region();
        out.extend_from_slice(&self.global_signature);
        out
    }

    pub fn decode(bytes: &[u8]) -> SealResult<Self> {
        if bytes.len() < MIN_SIZE {
            return Err(SealError::Tamper(format!(
                "signature file is {} bytes, minimum is {MIN_SIZE}",
                bytes.len()
            )));
        }
        if bytes[MAGIC_RANGE] != SIGNATURE_MAGIC {
            return Err(SealError::Tamper("not a sealkit signature file".into()));
        }
        if bytes[VERSION_RANGE] != FORMAT_VERSION {
            return Err(SealError::Tamper(format!(
                "unsupported signature format version {:?}",
                &bytes[VERSION_RANGE]
            )));
        }
        let prehash = match bytes[PREHASH_FLAG_RANGE.start] {
            0 => false,
            1 => true,
            other => {
                return Err(SealError::Tamper(format!(
                    "invalid prehash flag byte {other:#04x}"
                )))
            }
        };

        let comment_len = bytes.len() - MIN_SIZE;
        if comment_len > MAX_COMMENT_SIZE {
            return Err(SealError::Tamper(format!(
                "comment of {comment_len} bytes exceeds the {MAX_COMMENT_SIZE}-byte limit"
            )));
        }
        let comment_bytes = &bytes[FIXED_PREFIX_SIZE..FIXED_PREFIX_SIZE + comment_len];
        let comment = std::str::from_utf8(comment_bytes)
            .map_err(|_| SealError::Tamper("comment is not valid UTF-8".into()))?
            .to_owned();

        let mut file_signature = [0u8; SIGNATURE_SIZE];
        file_signature.copy_from_slice(&bytes[FILE_SIGNATURE_RANGE]);
        let mut global_signature = [0u8; SIGNATURE_SIZE];
        global_signature.copy_from_slice(&bytes[bytes.len() - SIGNATURE_SIZE..]);

        Ok(Self {
            prehash,
            file_signature,
            comment,
            global_signature,
        })
    }
}
