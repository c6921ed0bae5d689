//! Per-chunk XChaCha20-Poly1305 seal/open with counter-derived nonces
//!
//! Chunk frame on disk: `[N bytes ciphertext][16 bytes tag]` — no per-chunk
//! nonce is stored. Chunk i's nonce is the header's base nonce with its
//! trailing 8 bytes treated as a big-endian counter and incremented by i,
//! so nonces are pairwise distinct within a file.
//!
//! ```text
//! AAD = header (90 bytes) || chunk index (8 bytes BE) || last flag (1 byte)
//! ```
//!
//! Binding the full header authenticates every header field through every
//! chunk tag; the index prevents reordering; the last flag makes stream
//! truncation fail authentication instead of yielding a silently short file.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    XChaCha20Poly1305, XNonce,
};

use sealkit_core::{SealError, SealResult};

use crate::keys::SymmetricKey;
use crate::{NONCE_SIZE, TAG_SIZE};

/// Derive chunk i's nonce from the base nonce.
///
/// Bytes 16..24 are a big-endian counter region; the first 16 bytes pass
/// through untouched. Addition wraps, so uniqueness holds for any stream of
/// fewer than 2^64 chunks.
pub fn chunk_nonce(base_nonce: &[u8; NONCE_SIZE], index: u64) -> [u8; NONCE_SIZE] {
    let mut nonce = *base_nonce;
    let counter = u64::from_be_bytes(nonce[16..24].try_into().unwrap());
    nonce[16..24].copy_from_slice(&counter.wrapping_add(index).to_be_bytes());
    nonce
}

fn build_aad(header: &[u8], index: u64, last: bool) -> Vec<u8> {
    let mut aad = Vec::with_capacity(header.len() + 8 + 1);
    aad.extend_from_slice(header);
    aad.extend_from_slice(&index.to_be_bytes());
    aad.push(u8::from(last));
    aad
}

/// Encrypt one chunk. Returns `ciphertext || tag`.
pub fn seal_chunk(
    key: &SymmetricKey,
    header: &[u8],
    base_nonce: &[u8; NONCE_SIZE],
    index: u64,
    last: bool,
    plaintext: &[u8],
) -> SealResult<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let nonce_bytes = chunk_nonce(base_nonce, index);
    let nonce = XNonce::from_slice(&nonce_bytes);
    let aad = build_aad(header, index, last);

    cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad: &aad,
            },
        )
        .map_err(|_| SealError::Validation("chunk encryption failed".into()))
}

/// Decrypt and authenticate one chunk frame (`ciphertext || tag`).
///
/// Any failure — bad tag, wrong index, wrong last flag, tampered header —
/// surfaces as the uniform [`SealError::FileCrypto`].
pub fn open_chunk(
    key: &SymmetricKey,
    header: &[u8],
    base_nonce: &[u8; NONCE_SIZE],
    index: u64,
    last: bool,
    frame: &[u8],
) -> SealResult<Vec<u8>> {
    if frame.len() < TAG_SIZE {
        return Err(SealError::FileCrypto);
    }

    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let nonce_bytes = chunk_nonce(base_nonce, index);
    let nonce = XNonce::from_slice(&nonce_bytes);
    let aad = build_aad(header, index, last);

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: frame,
                aad: &aad,
            },
        )
        .map_err(|_| SealError::FileCrypto)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KEY_SIZE;
    use std::collections::HashSet;

    fn test_key() -> SymmetricKey {
        SymmetricKey::from_bytes([0x42; KEY_SIZE])
    }

    const HEADER: [u8; 90] = [0xA5; 90];
    const BASE: [u8; NONCE_SIZE] = [0x10; NONCE_SIZE];

    #[test]
    fn seal_open_roundtrip() {
        let key = test_key();
        let frame = seal_chunk(&key, &HEADER, &BASE, 0, true, b"hello, sealed world").unwrap();
        let plain = open_chunk(&key, &HEADER, &BASE, 0, true, &frame).unwrap();
        assert_eq!(plain, b"hello, sealed world");
    }

    #[test]
    fn empty_chunk_roundtrip() {
        let key = test_key();
        let frame = seal_chunk(&key, &HEADER, &BASE, 0, true, b"").unwrap();
        assert_eq!(frame.len(), TAG_SIZE);
        let plain = open_chunk(&key, &HEADER, &BASE, 0, true, &frame).unwrap();
        assert!(plain.is_empty());
    }

    #[test]
    fn wrong_index_fails() {
        let key = test_key();
        let frame = seal_chunk(&key, &HEADER, &BASE, 3, false, b"data").unwrap();
        assert!(matches!(
            open_chunk(&key, &HEADER, &BASE, 4, false, &frame),
            Err(SealError::FileCrypto)
        ));
    }

    #[test]
    fn wrong_last_flag_fails() {
        let key = test_key();
        let frame = seal_chunk(&key, &HEADER, &BASE, 0, false, b"data").unwrap();
        assert!(matches!(
            open_chunk(&key, &HEADER, &BASE, 0, true, &frame),
            Err(SealError::FileCrypto)
        ));
    }

    #[test]
    fn tampered_header_fails() {
        let key = test_key();
        let frame = seal_chunk(&key, &HEADER, &BASE, 0, true, b"data").unwrap();
        let mut header = HEADER;
        header[26] ^= 0x01;
        assert!(matches!(
            open_chunk(&key, &header, &BASE, 0, true, &frame),
            Err(SealError::FileCrypto)
        ));
    }

    #[test]
    fn every_tampered_frame_bit_fails() {
        let key = test_key();
        let frame = seal_chunk(&key, &HEADER, &BASE, 0, true, b"ab").unwrap();
        for byte in 0..frame.len() {
            for bit in 0..8 {
                let mut mutated = frame.clone();
                mutated[byte] ^= 1 << bit;
                assert!(
                    open_chunk(&key, &HEADER, &BASE, 0, true, &mutated).is_err(),
                    "flip of byte {byte} bit {bit} must fail"
                );
            }
        }
    }

    #[test]
    fn short_frame_fails() {
        let key = test_key();
        assert!(matches!(
            open_chunk(&key, &HEADER, &BASE, 0, true, &[0u8; TAG_SIZE - 1]),
            Err(SealError::FileCrypto)
        ));
    }

    #[test]
    fn nonces_are_pairwise_distinct() {
        let mut seen = HashSet::new();
        for i in 0..4096u64 {
            assert!(seen.insert(chunk_nonce(&BASE, i)), "nonce {i} repeated");
        }
    }

    #[test]
    fn nonce_counter_wraps_without_touching_prefix() {
        let mut base = [0u8; NONCE_SIZE];
        base[16..24].copy_from_slice(&u64::MAX.to_be_bytes());
        let wrapped = chunk_nonce(&base, 1);
        assert_eq!(&wrapped[..16], &base[..16]);
        assert_eq!(&wrapped[16..24], &0u64.to_be_bytes());
    }
}
