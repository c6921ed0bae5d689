//! sealkit-sign: detached digital signatures
//!
//! A signature file carries two Ed25519 signatures:
//!
//! ```text
//! magic ‖ version ‖ prehash flag ‖ file signature ‖ comment ‖ global signature
//! ```
//!
//! The file signature covers the target's content (or its 64-byte BLAKE3
//! prehash for large files); the global signature covers every preceding
//! byte of the signature file itself, so the comment and flags cannot be
//! swapped under a replayed file signature. Verification checks the global
//! signature before the target file is ever opened.

pub mod engine;
pub mod format;
pub mod keys;

pub use engine::{sign_file, verify_file, Verification, PREHASH_THRESHOLD};
pub use format::{SignatureFile, MAX_COMMENT_SIZE, SIGNATURE_SIZE};
pub use keys::SigningKeyPair;

/// Extension appended to signature files
pub const SIGNATURE_EXTENSION: &str = "sealsig";

/// Length of the BLAKE3 prehash of a large file's content
pub const PREHASH_SIZE: usize = 64;
