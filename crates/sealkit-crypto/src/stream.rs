//! Streaming chunked encryption and decryption
//!
//! Both directions hold at most two chunk buffers in memory. A one-chunk
//! lookahead decides which chunk is last, so the final chunk (possibly
//! empty, possibly full-size) is sealed with the last flag set and a
//! truncated stream fails authentication at the cut.

use std::io::{Read, Write};

use sealkit_core::{SealError, SealResult};

use crate::chunk::{open_chunk, seal_chunk};
use crate::header::{HEADER_SIZE, NONCE_RANGE};
use crate::keys::SymmetricKey;
use crate::{CHUNK_SIZE, NONCE_SIZE, TAG_SIZE};

/// Read until `buf` is full or EOF; returns the number of bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

fn base_nonce(header: &[u8; HEADER_SIZE]) -> [u8; NONCE_SIZE] {
    header[NONCE_RANGE].try_into().unwrap()
}

/// Encrypt `reader` into `writer`: header bytes first, then the chunk
/// stream. The header must already contain the salt/nonce/key-slot used to
/// derive `key`.
pub fn encrypt_stream<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    key: &SymmetricKey,
    header: &[u8; HEADER_SIZE],
) -> SealResult<()> {
    let nonce = base_nonce(header);
    writer.write_all(header)?;

    let mut current = vec![0u8; CHUNK_SIZE];
    let mut lookahead = vec![0u8; CHUNK_SIZE];
    let mut current_len = read_full(reader, &mut current)?;
    let mut index = 0u64;

    loop {
        let lookahead_len = read_full(reader, &mut lookahead)?;
        let last = lookahead_len == 0;

        let frame = seal_chunk(key, header, &nonce, index, last, &current[..current_len])?;
        writer.write_all(&frame)?;

        if last {
            break;
        }
        std::mem::swap(&mut current, &mut lookahead);
        current_len = lookahead_len;
        index += 1;
    }
    writer.flush()?;
    Ok(())
}

/// Decrypt the chunk stream following an already-consumed header.
///
/// Chunks are verified strictly in order; a chunk's plaintext is written
/// only after its tag verifies, and the first failure aborts with the
/// uniform [`SealError::FileCrypto`] — nothing past the last verified chunk
/// is released.
pub fn decrypt_stream<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    key: &SymmetricKey,
    header: &[u8; HEADER_SIZE],
) -> SealResult<()> {
    let nonce = base_nonce(header);
    let frame_size = CHUNK_SIZE + TAG_SIZE;

    let mut current = vec![0u8; frame_size];
    let mut lookahead = vec![0u8; frame_size];
    let mut current_len = read_full(reader, &mut current)?;
    let mut index = 0u64;

    loop {
        let lookahead_len = read_full(reader, &mut lookahead)?;
        let last = lookahead_len == 0;

        // An interior frame must be full-size; the final frame just needs
        // room for a tag. Either violation means the stream was cut.
        if current_len < TAG_SIZE || (!last && current_len != frame_size) {
            return Err(SealError::FileCrypto);
        }

        let plaintext = open_chunk(key, header, &nonce, index, last, &current[..current_len])?;
        writer.write_all(&plaintext)?;

        if last {
            break;
        }
        std::mem::swap(&mut current, &mut lookahead);
        current_len = lookahead_len;
        index += 1;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::FileHeader;
    use crate::kdf::KdfParams;
    use crate::{KEY_SIZE, SALT_SIZE};

    fn test_key() -> SymmetricKey {
        SymmetricKey::from_bytes([0x24; KEY_SIZE])
    }

    fn test_header() -> [u8; HEADER_SIZE] {
        FileHeader {
            salt: [1u8; SALT_SIZE],
            key_slot: [2u8; KEY_SIZE],
            base_nonce: [3u8; NONCE_SIZE],
            kdf: KdfParams::default(),
        }
        .encode()
    }

    fn roundtrip(plaintext: &[u8]) -> Vec<u8> {
        let key = test_key();
        let header = test_header();

        let mut sealed = Vec::new();
        encrypt_stream(&mut &plaintext[..], &mut sealed, &key, &header).unwrap();

        let mut opened = Vec::new();
        decrypt_stream(&mut &sealed[HEADER_SIZE..], &mut opened, &key, &header).unwrap();
        assert_eq!(opened, plaintext);
        sealed
    }

    #[test]
    fn roundtrip_boundary_lengths() {
        for len in [0, 1, CHUNK_SIZE - 1, CHUNK_SIZE, CHUNK_SIZE + 1, 3 * CHUNK_SIZE + 7] {
            let plaintext: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let sealed = roundtrip(&plaintext);
            let chunks = std::cmp::max(1, len.div_ceil(CHUNK_SIZE));
            assert_eq!(
                sealed.len(),
                HEADER_SIZE + len + chunks * TAG_SIZE,
                "unexpected sealed size for plaintext of {len}"
            );
        }
    }

    #[test]
    fn exact_multiple_ends_with_full_last_chunk() {
        // CHUNK_SIZE plaintext: the lookahead sees EOF, so the single full
        // chunk itself carries the last flag; no empty trailer is emitted.
        let plaintext = vec![0u8; CHUNK_SIZE];
        let sealed = roundtrip(&plaintext);
        assert_eq!(sealed.len(), HEADER_SIZE + CHUNK_SIZE + TAG_SIZE);
    }

    #[test]
    fn truncation_at_chunk_boundary_fails() {
        let key = test_key();
        let header = test_header();
        let plaintext = vec![7u8; 2 * CHUNK_SIZE + 5];

        let mut sealed = Vec::new();
        encrypt_stream(&mut &plaintext[..], &mut sealed, &key, &header).unwrap();

        // Drop the final (last-flagged) frame entirely.
        let cut = HEADER_SIZE + 2 * (CHUNK_SIZE + TAG_SIZE);
        let mut out = Vec::new();
        let result = decrypt_stream(&mut &sealed[HEADER_SIZE..cut], &mut out, &key, &header);
        assert!(matches!(result, Err(SealError::FileCrypto)));
        // Only chunks verified before the cut were released.
        assert_eq!(out.len(), CHUNK_SIZE);
    }

    #[test]
    fn truncation_mid_frame_fails() {
        let key = test_key();
        let header = test_header();
        let plaintext = vec![7u8; CHUNK_SIZE + 100];

        let mut sealed = Vec::new();
        encrypt_stream(&mut &plaintext[..], &mut sealed, &key, &header).unwrap();
        sealed.truncate(sealed.len() - 1);

        let mut out = Vec::new();
        let result = decrypt_stream(&mut &sealed[HEADER_SIZE..], &mut out, &key, &header);
        assert!(matches!(result, Err(SealError::FileCrypto)));
    }

    #[test]
    fn empty_stream_fails() {
        let key = test_key();
        let header = test_header();
        let mut out = Vec::new();
        let result = decrypt_stream(&mut &[][..], &mut out, &key, &header);
        assert!(matches!(result, Err(SealError::FileCrypto)));
    }

    #[test]
    fn swapped_chunks_fail() {
        let key = test_key();
        let header = test_header();
        let plaintext = vec![9u8; 2 * CHUNK_SIZE + 1];

        let mut sealed = Vec::new();
        encrypt_stream(&mut &plaintext[..], &mut sealed, &key, &header).unwrap();

        // Swap the two full interior frames.
        let frame = CHUNK_SIZE + TAG_SIZE;
        let body = &mut sealed[HEADER_SIZE..];
        let (first, rest) = body.split_at_mut(frame);
        first.swap_with_slice(&mut rest[..frame]);

        let mut out = Vec::new();
        let result = decrypt_stream(&mut &sealed[HEADER_SIZE..], &mut out, &key, &header);
        assert!(matches!(result, Err(SealError::FileCrypto)));
        assert!(out.is_empty(), "no plaintext may leak from a reordered stream");
    }
}
