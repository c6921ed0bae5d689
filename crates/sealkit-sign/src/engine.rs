//! Signing and verification of detached signatures
//!
//! Verification is strictly staged: parse the signature file, check the
//! global signature over its exact serialized prefix, and only then open
//! the target file and check the content signature. A forged or re-commented
//! signature file is rejected without a single byte of target I/O, which
//! also stops a stolen file-signature/prehash pair from being replayed
//! under new metadata.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use tracing::debug;

use sealkit_core::{SealError, SealResult};

use crate::format::{SignatureFile, MAX_COMMENT_SIZE};
use crate::keys::SigningKeyPair;
use crate::{PREHASH_SIZE, SIGNATURE_EXTENSION};

/// Files at or above this size are always prehashed (1 GiB).
pub const PREHASH_THRESHOLD: u64 = 1024 * 1024 * 1024;

/// Outcome of verifying a signature file against a target file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub valid: bool,
    /// The signer's comment; empty when the global signature is invalid.
    pub comment: String,
}

/// `<file>` → `<file>.sealsig`
pub fn signature_output_path(file: &Path) -> PathBuf {
    let mut name = file.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(SIGNATURE_EXTENSION);
    file.with_file_name(name)
}

/// The byte sequence the file signature covers: the raw content, or its
/// 64-byte BLAKE3 prehash when `prehash` is set.
fn file_representation(file: &Path, prehash: bool) -> SealResult<Vec<u8>> {
    if !prehash {
        return Ok(std::fs::read(file)?);
    }
    let mut reader = File::open(file)?;
    let mut hasher = blake3::Hasher::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    let mut digest = vec![0u8; PREHASH_SIZE];
    hasher.finalize_xof().fill(&mut digest);
    Ok(digest)
}

/// Sign `file`, writing a detached signature next to it (or at
/// `signature_path` when given). Returns the signature file's path.
///
/// `prehash` is forced on for files at or above [`PREHASH_THRESHOLD`], so a
/// huge file is never pulled into memory just to be signed.
pub fn sign_file(
    file: &Path,
    signature_path: Option<&Path>,
    comment: &str,
    prehash: bool,
    keypair: &SigningKeyPair,
) -> SealResult<PathBuf> {
    if comment.len() > MAX_COMMENT_SIZE {
        return Err(SealError::Validation(format!(
            "comment of {} bytes exceeds the {MAX_COMMENT_SIZE}-byte limit",
            comment.len()
        )));
    }

    let file_len = std::fs::metadata(file)?.len();
    let prehash = prehash || file_len >= PREHASH_THRESHOLD;

    let representation = file_representation(file, prehash)?;
    let file_signature = keypair.sign(&representation).to_bytes();

    let mut signature_file = SignatureFile {
        prehash,
        file_signature,
        comment: comment.to_owned(),
        global_signature: [0u8; crate::SIGNATURE_SIZE],
    };
    signature_file.global_signature = keypair.sign(&signature_file.signed_region()).to_bytes();

    let output = signature_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| signature_output_path(file));

    // A previous signature run leaves the file read-only; clear that before
    // overwriting.
    if let Ok(metadata) = std::fs::metadata(&output) {
        let mut permissions = metadata.permissions();
        if permissions.readonly() {
            permissions.set_readonly(false);
            std::fs::set_permissions(&output, permissions)?;
        }
    }
    std::fs::write(&output, signature_file.encode())?;

    // Read-only is a tamper hint for the user, not a security boundary.
    let mut permissions = std::fs::metadata(&output)?.permissions();
    permissions.set_readonly(true);
    std::fs::set_permissions(&output, permissions)?;

    debug!(file = %file.display(), signature = %output.display(), prehash, "signed file");
    Ok(output)
}

/// Verify a detached signature.
///
/// Stages: parse → global signature → target content signature. Returns
/// `valid = false` (with no comment) when the global signature fails, and
/// the recovered comment once the metadata is authentic — even if the
/// content signature then fails, so callers can report which signed comment
/// did not match.
pub fn verify_file(
    signature_path: &Path,
    file: &Path,
    public_key: &VerifyingKey,
) -> SealResult<Verification> {
    let bytes = std::fs::read(signature_path)?;
    let signature_file = SignatureFile::decode(&bytes)?;

    let global = Signature::from_bytes(&signature_file.global_signature);
    if public_key
        .verify(&signature_file.signed_region(), &global)
        .is_err()
    {
        debug!(signature = %signature_path.display(), "global signature rejected");
        return Ok(Verification {
            valid: false,
            comment: String::new(),
        });
    }

    let representation = file_representation(file, signature_file.prehash)?;
    let content = Signature::from_bytes(&signature_file.file_signature);
    let valid = public_key.verify(&representation, &content).is_ok();

    debug!(signature = %signature_path.display(), file = %file.display(), valid, "verified file");
    Ok(Verification {
        valid,
        comment: signature_file.comment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{FIXED_PREFIX_SIZE, PREHASH_FLAG_RANGE};
    use std::fs;
    use tempfile::TempDir;

    fn setup(content: &[u8]) -> (TempDir, PathBuf, SigningKeyPair) {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("artifact.bin");
        fs::write(&file, content).unwrap();
        (dir, file, SigningKeyPair::generate())
    }

    #[test]
    fn sign_verify_roundtrip_with_comments() {
        for comment in ["", "release build 2024-06", "コメント ✓ émoji", &"x".repeat(MAX_COMMENT_SIZE)] {
            let (_dir, file, keypair) = setup(b"signed content");
            let sig = sign_file(&file, None, comment, false, &keypair).unwrap();
            assert_eq!(sig.extension().unwrap(), SIGNATURE_EXTENSION);

            let result = verify_file(&sig, &file, &keypair.verifying_key()).unwrap();
            assert!(result.valid);
            assert_eq!(result.comment, comment);
        }
    }

    #[test]
    fn oversized_comment_is_validation_error() {
        let (_dir, file, keypair) = setup(b"data");
        let comment = "x".repeat(MAX_COMMENT_SIZE + 1);
        assert!(matches!(
            sign_file(&file, None, &comment, false, &keypair),
            Err(SealError::Validation(_))
        ));
    }

    #[test]
    fn wrong_key_fails_at_global_stage() {
        let (_dir, file, keypair) = setup(b"data");
        let sig = sign_file(&file, None, "note", false, &keypair).unwrap();

        let other = SigningKeyPair::generate();
        let result = verify_file(&sig, &file, &other.verifying_key()).unwrap();
        assert!(!result.valid);
        assert!(result.comment.is_empty(), "comment withheld on forged metadata");
    }

    #[test]
    fn modified_target_fails_but_returns_comment() {
        let (_dir, file, keypair) = setup(b"data");
        let sig = sign_file(&file, None, "note", false, &keypair).unwrap();

        fs::write(&file, b"tampered").unwrap();
        let result = verify_file(&sig, &file, &keypair.verifying_key()).unwrap();
        assert!(!result.valid);
        assert_eq!(result.comment, "note");
    }

    #[test]
    fn comment_tamper_rejected_before_target_io() {
        let (dir, file, keypair) = setup(b"data");
        let sig = sign_file(&file, None, "paid invoice", false, &keypair).unwrap();

        let mut bytes = fs::read(&sig).unwrap();
        let comment_at = FIXED_PREFIX_SIZE;
        bytes[comment_at] = bytes[comment_at].wrapping_add(1);
        let forged = dir.path().join("forged.sealsig");
        fs::write(&forged, &bytes).unwrap();

        // Point at a target that does not exist: if verification stopped at
        // the global-signature stage as required, no I/O error can surface.
        let missing = dir.path().join("never-created");
        let result = verify_file(&forged, &missing, &keypair.verifying_key()).unwrap();
        assert!(!result.valid);
        assert!(result.comment.is_empty());
    }

    #[test]
    fn flag_tamper_rejected_as_structural_or_global_failure() {
        let (dir, file, keypair) = setup(b"data");
        let sig = sign_file(&file, None, "", false, &keypair).unwrap();
        let bytes = fs::read(&sig).unwrap();

        // Flip the prehash flag to the other valid value: layout still
        // parses, but the global signature no longer matches.
        let mut flipped = bytes.clone();
        flipped[PREHASH_FLAG_RANGE.start] = 1;
        let forged = dir.path().join("flag.sealsig");
        fs::write(&forged, &flipped).unwrap();
        let result = verify_file(&forged, &file, &keypair.verifying_key()).unwrap();
        assert!(!result.valid);

        // An out-of-range flag byte is rejected while parsing.
        let mut invalid = bytes;
        invalid[PREHASH_FLAG_RANGE.start] = 7;
        fs::write(&forged, &invalid).unwrap();
        assert!(matches!(
            verify_file(&forged, &file, &keypair.verifying_key()),
            Err(SealError::Tamper(_))
        ));
    }

    #[test]
    fn prehash_small_file_verifies_like_large() {
        // Forcing prehash on a small file exercises the exact path that
        // auto-prehashed large files take.
        let (_dir, file, keypair) = setup(b"small but prehashed");
        let sig = sign_file(&file, None, "pre", true, &keypair).unwrap();

        let result = verify_file(&sig, &file, &keypair.verifying_key()).unwrap();
        assert!(result.valid);
        assert_eq!(result.comment, "pre");

        let decoded = SignatureFile::decode(&fs::read(&sig).unwrap()).unwrap();
        assert!(decoded.prehash);
    }

    #[test]
    fn prehash_and_raw_signatures_differ() {
        let (dir, file, keypair) = setup(b"same content");
        let raw_sig = sign_file(&file, Some(&dir.path().join("raw.sealsig")), "", false, &keypair)
            .unwrap();
        let pre_sig = sign_file(&file, Some(&dir.path().join("pre.sealsig")), "", true, &keypair)
            .unwrap();

        let raw = SignatureFile::decode(&fs::read(raw_sig).unwrap()).unwrap();
        let pre = SignatureFile::decode(&fs::read(pre_sig).unwrap()).unwrap();
        assert_ne!(raw.file_signature, pre.file_signature);
    }

    #[test]
    fn signature_file_is_read_only_and_resignable() {
        let (_dir, file, keypair) = setup(b"v1");
        let sig = sign_file(&file, None, "first", false, &keypair).unwrap();
        assert!(fs::metadata(&sig).unwrap().permissions().readonly());

        // Re-signing clears the read-only bit, rewrites, and restores it.
        fs::write(&file, b"v2").unwrap();
        let sig = sign_file(&file, None, "second", false, &keypair).unwrap();
        assert!(fs::metadata(&sig).unwrap().permissions().readonly());

        let result = verify_file(&sig, &file, &keypair.verifying_key()).unwrap();
        assert!(result.valid);
        assert_eq!(result.comment, "second");
    }

    #[test]
    fn missing_target_surfaces_io_error_when_metadata_is_authentic() {
        let (dir, file, keypair) = setup(b"data");
        let sig = sign_file(&file, None, "", false, &keypair).unwrap();

        let missing = dir.path().join("gone");
        assert!(matches!(
            verify_file(&sig, &missing, &keypair.verifying_key()),
            Err(SealError::Io(_))
        ));
    }
}
